//! Per-node snapshots: the node itself, its OS process, memory and disk.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{ConnectionSnapshot, ConnectionSnapshotBuilder, Rate};

/// A point-in-time view of one broker node.
///
/// A node owns exactly one operating-system, memory and disk snapshot, plus
/// the client connections it currently terminates.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeSnapshot {
    /// Node name, e.g. `rabbit@host-1`.
    pub identifier: String,

    /// Number of CPU cores the runtime detected on the host.
    pub available_cores_detected: u64,

    /// Names of the nodes this node is partitioned from.
    pub network_partitions: Vec<String>,

    pub uptime_ms: u64,

    pub os: OperatingSystemSnapshot,

    pub memory: MemorySnapshot,

    pub disk: DiskSnapshot,

    /// Client connections on this node, in the order the broker listed them.
    pub connections: Vec<ConnectionSnapshot>,
}

impl NodeSnapshot {
    /// Create a builder for a node snapshot.
    pub fn builder(identifier: impl Into<String>) -> NodeSnapshotBuilder {
        NodeSnapshotBuilder::new(identifier)
    }

    /// Total channels open across every connection on this node.
    pub fn total_channels(&self) -> usize {
        self.connections.iter().map(|c| c.channels.len()).sum()
    }
}

/// Usage of a bounded OS resource (file or socket descriptors).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResourceUsage {
    /// Hard limit for the resource.
    pub available: u64,
    pub used: u64,
    pub usage_rate: Rate,
}

impl ResourceUsage {
    pub const fn new(available: u64, used: u64) -> Self {
        Self {
            available,
            used,
            usage_rate: Rate::new(0.0),
        }
    }
}

/// The broker's OS process on a node.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OperatingSystemSnapshot {
    pub node_identifier: String,
    pub process_id: String,
    pub file_descriptors: ResourceUsage,
    pub socket_descriptors: ResourceUsage,
}

/// Memory consumption of a node against its high watermark.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemorySnapshot {
    pub node_identifier: String,
    /// Bytes in use.
    pub used: u64,
    /// Memory high watermark in bytes.
    pub limit: u64,
    /// Whether the broker has raised its memory alarm and is blocking
    /// publishers.
    pub alarm_in_effect: bool,
}

/// Free disk space of a node against its configured limit.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiskSnapshot {
    pub node_identifier: String,
    /// Free bytes on the data directory's volume.
    pub available: u64,
    /// Free space limit in bytes; below it the disk alarm fires.
    pub limit: u64,
    pub alarm_in_effect: bool,
}

/// Builder for `NodeSnapshot`.
///
/// The OS, memory and disk snapshots inherit the node identifier.
#[derive(Debug, Default)]
pub struct NodeSnapshotBuilder {
    node: NodeSnapshot,
}

impl NodeSnapshotBuilder {
    /// Create a new builder for the named node.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let mut node = NodeSnapshot {
            identifier: identifier.clone(),
            ..Default::default()
        };
        node.os.node_identifier = identifier.clone();
        node.memory.node_identifier = identifier.clone();
        node.disk.node_identifier = identifier;
        Self { node }
    }

    pub fn cores(mut self, cores: u64) -> Self {
        self.node.available_cores_detected = cores;
        self
    }

    /// Record a partition from another node.
    pub fn partitioned_from(mut self, node: impl Into<String>) -> Self {
        self.node.network_partitions.push(node.into());
        self
    }

    pub fn uptime_ms(mut self, uptime_ms: u64) -> Self {
        self.node.uptime_ms = uptime_ms;
        self
    }

    pub fn process_id(mut self, pid: impl Into<String>) -> Self {
        self.node.os.process_id = pid.into();
        self
    }

    /// Set file descriptor usage (limit, used).
    pub fn file_descriptors(mut self, available: u64, used: u64) -> Self {
        self.node.os.file_descriptors = ResourceUsage::new(available, used);
        self
    }

    /// Set socket descriptor usage (limit, used).
    pub fn sockets(mut self, available: u64, used: u64) -> Self {
        self.node.os.socket_descriptors = ResourceUsage::new(available, used);
        self
    }

    pub fn memory(mut self, used: u64, limit: u64, alarm_in_effect: bool) -> Self {
        self.node.memory.used = used;
        self.node.memory.limit = limit;
        self.node.memory.alarm_in_effect = alarm_in_effect;
        self
    }

    pub fn disk(mut self, available: u64, limit: u64, alarm_in_effect: bool) -> Self {
        self.node.disk.available = available;
        self.node.disk.limit = limit;
        self.node.disk.alarm_in_effect = alarm_in_effect;
        self
    }

    /// Add a connection built using a closure.
    pub fn connection<F>(mut self, identifier: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ConnectionSnapshotBuilder) -> ConnectionSnapshotBuilder,
    {
        let builder = ConnectionSnapshotBuilder::new(identifier).node(self.node.identifier.clone());
        self.node.connections.push(f(builder).build());
        self
    }

    pub fn build(self) -> NodeSnapshot {
        self.node
    }
}
