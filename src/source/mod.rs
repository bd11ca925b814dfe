//! Where broker snapshots come from.
//!
//! A [`DataSource`] hands the scanner the latest [`BrokerSnapshot`] when one
//! is available. The file source polls a JSON file written by a collector;
//! the channel source receives snapshots pushed by an in-process producer.

mod channel;
mod file;

pub use channel::ChannelSource;
pub use file::{read_snapshot, FileSource};

use std::fmt::Debug;

use brokerprobe_types::BrokerSnapshot;

/// Trait for receiving broker snapshots from various sources.
///
/// # Example
///
/// ```no_run
/// use brokerprobe::{DataSource, FileSource};
///
/// let mut source = FileSource::new("snapshot.json");
/// if let Some(snapshot) = source.poll() {
///     println!("{} nodes", snapshot.nodes.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(snapshot)` if new data is available, `None` otherwise.
    /// Never blocks.
    fn poll(&mut self) -> Option<BrokerSnapshot>;

    /// Human-readable description of the source, for log lines.
    fn description(&self) -> &str;

    /// The error from the last poll, if it failed.
    fn error(&self) -> Option<&str>;
}
