//! Flattening and validation of the broker tree.

use std::collections::HashSet;

use brokerprobe_types::{
    BrokerConnectivitySnapshot, BrokerQueuesSnapshot, BrokerRuntimeSnapshot, BrokerSnapshot,
    ChannelSnapshot, ConnectionSnapshot, DiskSnapshot, MemorySnapshot, NodeSnapshot,
    OperatingSystemSnapshot, QueueSnapshot, Rate,
};

use crate::error::ScanError;
use crate::probe::{ComponentType, ProbeRegistry, ProbeResult};
use crate::report::EntityRef;

/// Identifier used for the cluster-wide aggregates when the snapshot carries
/// no cluster name.
const DEFAULT_CLUSTER: &str = "cluster";

/// A borrowed snapshot of one kind.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Connectivity(&'a BrokerConnectivitySnapshot),
    QueueAggregate(&'a BrokerQueuesSnapshot),
    Runtime(&'a BrokerRuntimeSnapshot),
    Node(&'a NodeSnapshot),
    OperatingSystem(&'a OperatingSystemSnapshot),
    Memory(&'a MemorySnapshot),
    Disk(&'a DiskSnapshot),
    Connection(&'a ConnectionSnapshot),
    Channel(&'a ChannelSnapshot),
    Queue(&'a QueueSnapshot),
}

impl Entity<'_> {
    pub fn kind(&self) -> ComponentType {
        match self {
            Entity::Connectivity(_) => ComponentType::Connectivity,
            Entity::QueueAggregate(_) => ComponentType::QueueAggregate,
            Entity::Runtime(_) => ComponentType::Runtime,
            Entity::Node(_) => ComponentType::Node,
            Entity::OperatingSystem(_) => ComponentType::OperatingSystem,
            Entity::Memory(_) => ComponentType::Memory,
            Entity::Disk(_) => ComponentType::Disk,
            Entity::Connection(_) => ComponentType::Connection,
            Entity::Channel(_) => ComponentType::Channel,
            Entity::Queue(_) => ComponentType::Queue,
        }
    }
}

/// One node of the flattened tree: what it is and where it sits.
#[derive(Debug, Clone)]
pub struct FlatEntity<'a> {
    pub reference: EntityRef,
    pub entity: Entity<'a>,
}

impl<'a> FlatEntity<'a> {
    fn new(entity: Entity<'a>, id: &str, parent: Option<&str>) -> Self {
        Self {
            reference: EntityRef::new(entity.kind(), id, parent),
            entity,
        }
    }

    /// Run every probe registered for this entity's kind.
    pub fn evaluate(&self, registry: &ProbeRegistry) -> Vec<ProbeResult> {
        match self.entity {
            Entity::Connectivity(s) => registry.evaluate(s),
            Entity::QueueAggregate(s) => registry.evaluate(s),
            Entity::Runtime(s) => registry.evaluate(s),
            Entity::Node(s) => registry.evaluate(s),
            Entity::OperatingSystem(s) => registry.evaluate(s),
            Entity::Memory(s) => registry.evaluate(s),
            Entity::Disk(s) => registry.evaluate(s),
            Entity::Connection(s) => registry.evaluate(s),
            Entity::Channel(s) => registry.evaluate(s),
            Entity::Queue(s) => registry.evaluate(s),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ScanError {
        ScanError::InvalidSnapshot {
            entity: self.reference.clone(),
            reason: reason.into(),
        }
    }

    /// Check the entity's own values.
    fn validate(&self) -> Result<(), ScanError> {
        if self.reference.id.is_empty() {
            return Err(self.invalid("identifier is empty"));
        }
        if self.reference.parent.as_deref() == Some("") {
            return Err(self.invalid("parent identifier is empty"));
        }

        match self.entity {
            Entity::Connectivity(c) => {
                check_rate(self, "connections_created", &c.connections_created)?;
                check_rate(self, "connections_closed", &c.connections_closed)?;
                check_rate(self, "channels_created", &c.channels_created)?;
                check_rate(self, "channels_closed", &c.channels_closed)?;
            }
            Entity::QueueAggregate(q) => {
                check_rate(self, "incoming", &q.churn.incoming.rate)?;
                check_rate(self, "delivered", &q.churn.delivered.rate)?;
                check_rate(self, "not_routed", &q.churn.not_routed.rate)?;
            }
            Entity::Runtime(r) => {
                check_rate(self, "process usage", &r.processes.usage_rate)?;
            }
            Entity::OperatingSystem(os) => {
                check_rate(self, "file descriptor usage", &os.file_descriptors.usage_rate)?;
                check_rate(self, "socket usage", &os.socket_descriptors.usage_rate)?;
            }
            Entity::Queue(q) => {
                let utilization = q.consumer_utilization;
                if !utilization.is_finite() || !(0.0..=1.0).contains(&utilization) {
                    return Err(self.invalid(format!(
                        "consumer utilization {utilization} is outside 0.0..=1.0"
                    )));
                }
                check_rate(self, "incoming", &q.messages.incoming.rate)?;
                check_rate(self, "acknowledged", &q.messages.acknowledged.rate)?;
                check_rate(self, "delivered", &q.messages.delivered.rate)?;
                check_rate(self, "redelivered", &q.messages.redelivered.rate)?;
            }
            Entity::Node(_)
            | Entity::Memory(_)
            | Entity::Disk(_)
            | Entity::Connection(_)
            | Entity::Channel(_) => {}
        }
        Ok(())
    }
}

fn check_rate(entity: &FlatEntity<'_>, name: &str, rate: &Rate) -> Result<(), ScanError> {
    if rate.is_valid() {
        Ok(())
    } else {
        Err(entity.invalid(format!(
            "{name} rate {} is not a finite non-negative number",
            rate.value
        )))
    }
}

/// Flatten `tree` in traversal order.
///
/// Aggregates come first, then each node followed by its OS, memory and disk
/// snapshots and its connections (each directly followed by its channels),
/// then each virtual host's queues.
pub fn flatten(tree: &BrokerSnapshot) -> Vec<FlatEntity<'_>> {
    let cluster = if tree.cluster.is_empty() {
        DEFAULT_CLUSTER
    } else {
        tree.cluster.as_str()
    };

    let mut entities = Vec::with_capacity(
        3 + tree.nodes.len() * 4
            + tree.connection_count()
            + tree.channel_count()
            + tree.queue_count(),
    );

    entities.push(FlatEntity::new(Entity::Connectivity(&tree.connectivity), cluster, None));
    entities.push(FlatEntity::new(Entity::QueueAggregate(&tree.queues), cluster, None));
    entities.push(FlatEntity::new(Entity::Runtime(&tree.runtime), cluster, None));

    for node in &tree.nodes {
        let node_id = node.identifier.as_str();
        entities.push(FlatEntity::new(Entity::Node(node), node_id, None));
        entities.push(FlatEntity::new(Entity::OperatingSystem(&node.os), node_id, None));
        entities.push(FlatEntity::new(Entity::Memory(&node.memory), node_id, None));
        entities.push(FlatEntity::new(Entity::Disk(&node.disk), node_id, None));

        for connection in &node.connections {
            entities.push(FlatEntity::new(
                Entity::Connection(connection),
                &connection.identifier,
                Some(node_id),
            ));
            // connection ids are only unique per node
            let channel_parent = format!("{node_id}/{}", connection.identifier);
            for channel in &connection.channels {
                entities.push(FlatEntity::new(
                    Entity::Channel(channel),
                    &channel.identifier,
                    Some(&channel_parent),
                ));
            }
        }
    }

    for vhost in &tree.virtual_hosts {
        for queue in &vhost.queues {
            entities.push(FlatEntity::new(
                Entity::Queue(queue),
                &queue.identifier,
                Some(&vhost.name),
            ));
        }
    }

    entities
}

/// Reject the tree if any entity is malformed or two siblings of the same
/// kind share an identifier.
pub fn validate(entities: &[FlatEntity<'_>]) -> Result<(), ScanError> {
    let mut seen: HashSet<&EntityRef> = HashSet::with_capacity(entities.len());
    for entity in entities {
        entity.validate()?;
        if !seen.insert(&entity.reference) {
            return Err(ScanError::DuplicateEntity {
                entity: entity.reference.clone(),
            });
        }
    }
    Ok(())
}
