//! Channel-based snapshot source.
//!
//! Receives snapshots over a tokio watch channel, for producers that push
//! snapshots (an in-process collector, a test harness) rather than writing
//! files.

use brokerprobe_types::BrokerSnapshot;
use tokio::sync::watch;

use super::DataSource;

/// A data source fed through a watch channel.
///
/// The channel starts empty; `poll` returns each snapshot the producer sends
/// at most once, and only the newest one if several arrive between polls.
///
/// # Example
///
/// ```
/// use brokerprobe::{BrokerSnapshot, ChannelSource, DataSource};
///
/// let (tx, mut source) = ChannelSource::create("collector");
/// assert!(source.poll().is_none());
///
/// tx.send(Some(BrokerSnapshot::builder().cluster("prod").build())).unwrap();
/// assert_eq!(source.poll().unwrap().cluster, "prod");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Option<BrokerSnapshot>>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    pub fn new(receiver: watch::Receiver<Option<BrokerSnapshot>>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a sender and the source it feeds.
    pub fn create(source_description: &str) -> (watch::Sender<Option<BrokerSnapshot>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }

    /// Wait until the producer sends a new snapshot.
    ///
    /// Returns `None` once the sender has been dropped.
    pub async fn changed(&mut self) -> Option<BrokerSnapshot> {
        loop {
            if self.receiver.changed().await.is_err() {
                self.closed = true;
                return None;
            }
            if let Some(snapshot) = self.receiver.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<BrokerSnapshot> {
        match self.receiver.has_changed() {
            Ok(true) => self.receiver.borrow_and_update().clone(),
            Ok(false) => None,
            Err(_) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.closed.then_some("sender closed")
    }
}
