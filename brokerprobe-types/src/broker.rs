//! Cluster-wide aggregate snapshots.

use alloc::string::String;

use crate::{MessageStat, Rate};

/// Connection and channel churn across the whole cluster.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrokerConnectivitySnapshot {
    pub connections_created: Rate,
    pub connections_closed: Rate,
    pub channels_created: Rate,
    pub channels_closed: Rate,
    pub total_connections: u64,
    pub total_channels: u64,
}

/// Message churn across every queue in the cluster.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrokerQueuesSnapshot {
    pub total_queues: u64,
    pub churn: MessageChurn,
}

/// Cluster-wide message counters.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MessageChurn {
    pub incoming: MessageStat,
    pub delivered: MessageStat,
    /// Messages published to an exchange that had no matching binding.
    pub not_routed: MessageStat,
}

/// State of the broker's runtime (the VM hosting the broker).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrokerRuntimeSnapshot {
    pub identifier: String,
    pub version: String,
    pub processes: RuntimeProcesses,
}

/// Runtime process table usage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuntimeProcesses {
    /// Maximum number of processes the runtime allows.
    pub limit: u64,
    pub used: u64,
    pub usage_rate: Rate,
}

impl RuntimeProcesses {
    pub const fn new(limit: u64, used: u64) -> Self {
        Self {
            limit,
            used,
            usage_rate: Rate::new(0.0),
        }
    }
}
