//! # brokerprobe-types
//!
//! Snapshot data model for broker diagnostics. A snapshot tree captures one
//! collection pass over a message broker's management API: cluster-wide
//! aggregates, every node with its OS process, memory, disk and client
//! connections (and their channels), and every virtual host with its queues.
//!
//! The types are plain values. Whatever collects them (a management API
//! client, a test fixture, a JSON file) builds the tree once; consumers such
//! as the `brokerprobe` diagnostics engine only read it.
//!
//! ## Features
//!
//! - `std` (default): Standard library support (timestamps in builders)
//! - `serde`: Serialization of the whole tree via serde
//!
//! ## Example
//!
//! ```rust
//! use brokerprobe_types::BrokerSnapshot;
//!
//! let snapshot = BrokerSnapshot::builder()
//!     .cluster("rabbit@prod")
//!     .node("rabbit@host-1", |n| n.cores(4).memory(1_000, 4_000, false))
//!     .queue("/", "orders", |q| q.incoming(1500, 12.0).acknowledged(1490, 11.8))
//!     .connection_churn(3.0, 2.5)
//!     .build();
//!
//! assert_eq!(snapshot.nodes.len(), 1);
//! assert_eq!(snapshot.queue_count(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod broker;
mod connection;
mod node;
mod queue;
mod rate;
mod snapshot;
mod version;

pub use broker::*;
pub use connection::*;
pub use node::*;
pub use queue::*;
pub use rate::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const SCHEMA_VERSION: u32 = 1;
