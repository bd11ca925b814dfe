//! BrokerSnapshot - a point-in-time view of a whole cluster.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{
    BrokerConnectivitySnapshot, BrokerQueuesSnapshot, BrokerRuntimeSnapshot, MessageStat,
    NodeSnapshot, NodeSnapshotBuilder, QueueSnapshot, QueueSnapshotBuilder, Rate,
    RuntimeProcesses, SchemaVersion, VirtualHostSnapshot,
};

/// The root of a snapshot tree.
///
/// ```text
/// BrokerSnapshot
/// ├── connectivity / queues / runtime   (cluster-wide aggregates)
/// ├── nodes[]
/// │   ├── os, memory, disk
/// │   └── connections[]
/// │       └── channels[]
/// └── virtual_hosts[]
///     └── queues[]
/// ```
///
/// Snapshots are assembled once per collection and then only read.
///
/// # Example
///
/// ```rust
/// use brokerprobe_types::{BrokerSnapshot, ConnectionState};
///
/// let snapshot = BrokerSnapshot::builder()
///     .cluster("rabbit@prod")
///     .node("rabbit@host-1", |n| {
///         n.cores(8)
///             .file_descriptors(65_536, 1_200)
///             .connection("10.0.0.7:51234 -> 10.0.0.1:5672", |c| {
///                 c.state(ConnectionState::Running)
///                     .open_channels_limit(2047)
///                     .channel("ch-1", |ch| ch.prefetch_count(50))
///             })
///     })
///     .queue("/", "orders", |q| q.consumers(2).consumer_utilization(0.9))
///     .build();
///
/// assert_eq!(snapshot.nodes.len(), 1);
/// assert_eq!(snapshot.queue_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrokerSnapshot {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Cluster name.
    pub cluster: String,

    pub connectivity: BrokerConnectivitySnapshot,
    pub queues: BrokerQueuesSnapshot,
    pub runtime: BrokerRuntimeSnapshot,

    pub nodes: Vec<NodeSnapshot>,
    pub virtual_hosts: Vec<VirtualHostSnapshot>,
}

impl BrokerSnapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> BrokerSnapshotBuilder {
        BrokerSnapshotBuilder::new()
    }

    /// Number of connections across all nodes.
    pub fn connection_count(&self) -> usize {
        self.nodes.iter().map(|n| n.connections.len()).sum()
    }

    /// Number of channels across all connections.
    pub fn channel_count(&self) -> usize {
        self.nodes.iter().map(|n| n.total_channels()).sum()
    }

    /// Number of queues across all virtual hosts.
    pub fn queue_count(&self) -> usize {
        self.virtual_hosts.iter().map(|v| v.queues.len()).sum()
    }

    /// Look up a node by identifier.
    pub fn node(&self, identifier: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.identifier == identifier)
    }

    /// Iterate over every queue, virtual host by virtual host.
    pub fn iter_queues(&self) -> impl Iterator<Item = &QueueSnapshot> {
        self.virtual_hosts.iter().flat_map(|v| v.queues.iter())
    }
}

/// Builder for constructing `BrokerSnapshot` instances.
#[derive(Debug, Default)]
pub struct BrokerSnapshotBuilder {
    timestamp_ms: Option<u64>,
    snapshot: BrokerSnapshot,
}

impl BrokerSnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    pub fn cluster(mut self, name: impl Into<String>) -> Self {
        self.snapshot.cluster = name.into();
        self
    }

    /// Add a node built using a closure.
    pub fn node<F>(mut self, identifier: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(NodeSnapshotBuilder) -> NodeSnapshotBuilder,
    {
        let node = f(NodeSnapshotBuilder::new(identifier)).build();
        self.snapshot.nodes.push(node);
        self
    }

    /// Add a pre-built node.
    pub fn node_snapshot(mut self, node: NodeSnapshot) -> Self {
        self.snapshot.nodes.push(node);
        self
    }

    /// Add a queue to a virtual host, creating the virtual host on first use.
    ///
    /// Virtual hosts keep the order in which they were first mentioned.
    pub fn queue<F>(mut self, vhost: &str, identifier: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(QueueSnapshotBuilder) -> QueueSnapshotBuilder,
    {
        let queue = f(QueueSnapshotBuilder::new(identifier).virtual_host(vhost)).build();
        match self.snapshot.virtual_hosts.iter_mut().find(|v| v.name == vhost) {
            Some(existing) => existing.queues.push(queue),
            None => {
                let mut created = VirtualHostSnapshot::new(vhost);
                created.queues.push(queue);
                self.snapshot.virtual_hosts.push(created);
            }
        }
        self
    }

    /// Add an empty virtual host.
    pub fn virtual_host(mut self, name: impl Into<String>) -> Self {
        self.snapshot.virtual_hosts.push(VirtualHostSnapshot::new(name));
        self
    }

    pub fn connectivity(mut self, connectivity: BrokerConnectivitySnapshot) -> Self {
        self.snapshot.connectivity = connectivity;
        self
    }

    /// Set connection creation and closure rates (per second).
    pub fn connection_churn(mut self, created: f64, closed: f64) -> Self {
        self.snapshot.connectivity.connections_created = Rate::new(created);
        self.snapshot.connectivity.connections_closed = Rate::new(closed);
        self
    }

    pub fn queues(mut self, queues: BrokerQueuesSnapshot) -> Self {
        self.snapshot.queues = queues;
        self
    }

    /// Set the cluster-wide count of unroutable messages.
    pub fn not_routed(mut self, total: u64) -> Self {
        self.snapshot.queues.churn.not_routed = MessageStat::total(total);
        self
    }

    pub fn runtime(mut self, runtime: BrokerRuntimeSnapshot) -> Self {
        self.snapshot.runtime = runtime;
        self
    }

    /// Set runtime process usage (limit, used).
    pub fn runtime_processes(mut self, limit: u64, used: u64) -> Self {
        self.snapshot.runtime.processes = RuntimeProcesses::new(limit, used);
        self
    }

    /// Build the snapshot.
    #[cfg(feature = "std")]
    pub fn build(self) -> BrokerSnapshot {
        let mut snapshot = self.snapshot;
        snapshot.version = SchemaVersion::current();
        snapshot.timestamp_ms = self.timestamp_ms.unwrap_or_else(current_timestamp_ms);
        snapshot
    }

    /// Build the snapshot with a specific timestamp (for no_std).
    #[cfg(not(feature = "std"))]
    pub fn build(self) -> BrokerSnapshot {
        let mut snapshot = self.snapshot;
        snapshot.version = SchemaVersion::current();
        snapshot.timestamp_ms = self.timestamp_ms.unwrap_or(0);
        snapshot
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = BrokerSnapshot::builder()
            .timestamp_ms(1703160000000)
            .cluster("rabbit@test")
            .node("rabbit@a", |n| {
                n.connection("c1", |c| c.channel("1", |ch| ch).channel("2", |ch| ch))
            })
            .node("rabbit@b", |n| n.connection("c2", |c| c))
            .queue("/", "q1", |q| q)
            .queue("other", "q2", |q| q)
            .queue("/", "q3", |q| q)
            .connection_churn(5.0, 4.0)
            .not_routed(3)
            .runtime_processes(1_048_576, 400)
            .build();

        assert_eq!(snapshot.timestamp_ms, 1703160000000);
        assert_eq!(snapshot.cluster, "rabbit@test");
        assert_eq!(snapshot.connection_count(), 2);
        assert_eq!(snapshot.channel_count(), 2);
        assert_eq!(snapshot.queue_count(), 3);
        assert_eq!(snapshot.queues.churn.not_routed.total, 3);
        assert_eq!(snapshot.runtime.processes.used, 400);
        assert_eq!(snapshot.connectivity.connections_closed.value, 4.0);
    }

    #[test]
    fn queues_group_by_virtual_host_in_first_seen_order() {
        let snapshot = BrokerSnapshot::builder()
            .queue("b", "q1", |q| q)
            .queue("a", "q2", |q| q)
            .queue("b", "q3", |q| q)
            .build();

        let names: Vec<&str> = snapshot.virtual_hosts.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);

        let queues: Vec<&str> = snapshot.iter_queues().map(|q| q.identifier.as_str()).collect();
        assert_eq!(queues, ["q1", "q3", "q2"]);
        assert_eq!(snapshot.virtual_hosts[0].queues[1].virtual_host, "b");
    }

    #[test]
    fn test_snapshot_version() {
        let snapshot = BrokerSnapshot::builder().build();
        assert!(snapshot.version.is_compatible());
    }

    #[test]
    fn node_lookup() {
        let snapshot = BrokerSnapshot::builder()
            .node("rabbit@a", |n| n.cores(2))
            .build();
        assert_eq!(snapshot.node("rabbit@a").map(|n| n.available_cores_detected), Some(2));
        assert!(snapshot.node("rabbit@z").is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let snapshot = BrokerSnapshot::builder()
            .timestamp_ms(1703160000000)
            .node("rabbit@a", |n| n.memory(10, 20, true))
            .queue("/", "q", |q| q.incoming(10, 1.5))
            .build();

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: BrokerSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, parsed);
    }
}
