//! Virtual hosts and the queues declared in them.

use alloc::string::String;
use alloc::vec::Vec;

use crate::MessageStat;

/// A virtual host and its queues.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VirtualHostSnapshot {
    pub name: String,
    pub queues: Vec<QueueSnapshot>,
}

impl VirtualHostSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queues: Vec::new(),
        }
    }
}

/// A point-in-time view of one queue.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueSnapshot {
    /// Queue name; unique within its virtual host.
    pub identifier: String,
    pub virtual_host: String,
    /// Node hosting the queue leader.
    pub node: String,
    pub consumers: u64,

    /// Fraction of time the queue can deliver to consumers immediately,
    /// between 0.0 and 1.0.
    pub consumer_utilization: f64,

    pub messages: QueueChurn,
    pub memory: QueueMemory,
}

impl QueueSnapshot {
    pub fn builder(identifier: impl Into<String>) -> QueueSnapshotBuilder {
        QueueSnapshotBuilder::new(identifier)
    }
}

/// Message movement through a queue.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueChurn {
    /// Messages published into the queue.
    pub incoming: MessageStat,
    /// Deliveries acknowledged by consumers.
    pub acknowledged: MessageStat,
    pub delivered: MessageStat,
    /// Deliveries that had the redelivered flag set.
    pub redelivered: MessageStat,
    /// Messages ready for delivery.
    pub ready: u64,
    pub unacknowledged: u64,
}

/// Memory held by a queue.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueMemory {
    pub total_bytes: u64,
    /// Messages paged out to disk under memory pressure.
    pub paged_out: u64,
}

/// Builder for `QueueSnapshot`.
#[derive(Debug, Default)]
pub struct QueueSnapshotBuilder {
    queue: QueueSnapshot,
}

impl QueueSnapshotBuilder {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            queue: QueueSnapshot {
                identifier: identifier.into(),
                ..Default::default()
            },
        }
    }

    pub fn virtual_host(mut self, vhost: impl Into<String>) -> Self {
        self.queue.virtual_host = vhost.into();
        self
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.queue.node = node.into();
        self
    }

    pub fn consumers(mut self, consumers: u64) -> Self {
        self.queue.consumers = consumers;
        self
    }

    pub fn consumer_utilization(mut self, utilization: f64) -> Self {
        self.queue.consumer_utilization = utilization;
        self
    }

    /// Set incoming messages (total, rate).
    pub fn incoming(mut self, total: u64, rate: f64) -> Self {
        self.queue.messages.incoming = MessageStat::new(total, rate);
        self
    }

    /// Set acknowledged messages (total, rate).
    pub fn acknowledged(mut self, total: u64, rate: f64) -> Self {
        self.queue.messages.acknowledged = MessageStat::new(total, rate);
        self
    }

    pub fn delivered(mut self, total: u64, rate: f64) -> Self {
        self.queue.messages.delivered = MessageStat::new(total, rate);
        self
    }

    pub fn redelivered(mut self, total: u64, rate: f64) -> Self {
        self.queue.messages.redelivered = MessageStat::new(total, rate);
        self
    }

    pub fn ready(mut self, ready: u64) -> Self {
        self.queue.messages.ready = ready;
        self
    }

    pub fn paged_out(mut self, paged_out: u64) -> Self {
        self.queue.memory.paged_out = paged_out;
        self
    }

    pub fn build(self) -> QueueSnapshot {
        self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rate;

    #[test]
    fn queue_builder_sets_churn() {
        let q = QueueSnapshot::builder("orders")
            .virtual_host("/")
            .consumers(2)
            .consumer_utilization(0.75)
            .incoming(1000, 12.0)
            .acknowledged(990, 11.5)
            .redelivered(4, 0.0)
            .paged_out(7)
            .build();

        assert_eq!(q.identifier, "orders");
        assert_eq!(q.messages.incoming.total, 1000);
        assert_eq!(q.messages.incoming.rate, Rate::new(12.0));
        assert_eq!(q.messages.acknowledged.rate.value, 11.5);
        assert_eq!(q.messages.redelivered.total, 4);
        assert_eq!(q.memory.paged_out, 7);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn queue_deserializes_with_missing_fields() {
        let q: QueueSnapshot =
            serde_json::from_str(r#"{"identifier": "q1", "consumers": 3}"#).unwrap();
        assert_eq!(q.identifier, "q1");
        assert_eq!(q.consumers, 3);
        assert_eq!(q.messages, QueueChurn::default());
    }
}
