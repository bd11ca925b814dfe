//! Client connections and the channels multiplexed over them.

use alloc::string::String;
use alloc::vec::Vec;

/// Lifecycle state of an AMQP connection as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConnectionState {
    Starting,
    Tuning,
    Opening,
    #[default]
    Running,
    /// Publisher is being rate-limited by credit flow.
    Flow,
    /// A resource alarm is in effect; the connection will block on its next
    /// publish.
    Blocking,
    /// The connection published during a resource alarm and is blocked.
    Blocked,
    Closing,
    Closed,
}

/// A point-in-time view of one client connection.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionSnapshot {
    pub identifier: String,
    pub node_identifier: String,
    pub virtual_host: String,
    pub state: ConnectionState,

    /// Negotiated `channel_max`. Zero means the connection has no limit.
    pub open_channels_limit: u64,

    pub channels: Vec<ChannelSnapshot>,
}

impl ConnectionSnapshot {
    pub fn builder(identifier: impl Into<String>) -> ConnectionSnapshotBuilder {
        ConnectionSnapshotBuilder::new(identifier)
    }
}

/// A point-in-time view of one channel on a connection.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelSnapshot {
    pub identifier: String,
    pub connection_identifier: String,

    /// Consumer prefetch window. Zero means unlimited.
    pub prefetch_count: u64,

    /// Deliveries awaiting acknowledgement.
    pub unacknowledged_messages: u64,

    /// Publishes awaiting a publisher confirm.
    pub unconfirmed_messages: u64,

    pub consumers: u64,
}

/// Builder for `ConnectionSnapshot`.
#[derive(Debug, Default)]
pub struct ConnectionSnapshotBuilder {
    connection: ConnectionSnapshot,
}

impl ConnectionSnapshotBuilder {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            connection: ConnectionSnapshot {
                identifier: identifier.into(),
                ..Default::default()
            },
        }
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.connection.node_identifier = node.into();
        self
    }

    pub fn virtual_host(mut self, vhost: impl Into<String>) -> Self {
        self.connection.virtual_host = vhost.into();
        self
    }

    pub fn state(mut self, state: ConnectionState) -> Self {
        self.connection.state = state;
        self
    }

    pub fn open_channels_limit(mut self, limit: u64) -> Self {
        self.connection.open_channels_limit = limit;
        self
    }

    /// Add a channel built using a closure.
    pub fn channel<F>(mut self, identifier: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ChannelSnapshotBuilder) -> ChannelSnapshotBuilder,
    {
        let builder = ChannelSnapshotBuilder::new(identifier, self.connection.identifier.clone());
        self.connection.channels.push(f(builder).build());
        self
    }

    pub fn build(self) -> ConnectionSnapshot {
        self.connection
    }
}

/// Builder for `ChannelSnapshot`.
#[derive(Debug, Default)]
pub struct ChannelSnapshotBuilder {
    channel: ChannelSnapshot,
}

impl ChannelSnapshotBuilder {
    pub fn new(identifier: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            channel: ChannelSnapshot {
                identifier: identifier.into(),
                connection_identifier: connection.into(),
                ..Default::default()
            },
        }
    }

    pub fn prefetch_count(mut self, prefetch: u64) -> Self {
        self.channel.prefetch_count = prefetch;
        self
    }

    pub fn unacknowledged(mut self, count: u64) -> Self {
        self.channel.unacknowledged_messages = count;
        self
    }

    pub fn unconfirmed(mut self, count: u64) -> Self {
        self.channel.unconfirmed_messages = count;
        self
    }

    pub fn consumers(mut self, count: u64) -> Self {
        self.channel.consumers = count;
        self
    }

    pub fn build(self) -> ChannelSnapshot {
        self.channel
    }
}
