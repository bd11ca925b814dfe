//! Diagnostic probes.
//!
//! A probe is a small, pure evaluator bound to one snapshot type. It holds
//! at most one configured threshold plus the knowledge base article for its
//! own identifier, and maps a snapshot to a [`ProbeResult`].
//!
//! Probes are grouped by the snapshot kind they inspect:
//!
//! - [`node`]: node, operating system, memory and disk snapshots
//! - [`connection`]: connections and channels
//! - [`queue`]: queues
//! - [`broker`]: cluster-wide aggregates
//!
//! [`registry::ProbeRegistry`] holds the full catalog.

pub mod broker;
pub mod connection;
pub mod node;
pub mod queue;
pub mod registry;
mod threshold;

use std::fmt;

use serde::Serialize;

use crate::knowledge::{KnowledgeBase, KnowledgeBaseArticle};

pub use registry::{ProbeRegistry, Subject};
pub use threshold::{flag_status, high_watermark, watermark_status};

/// Stable identifier of a probe; the join key into the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProbeId(&'static str);

impl ProbeId {
    pub const AVAILABLE_CPUS: ProbeId = ProbeId("available_cpus");
    pub const NETWORK_PARTITION: ProbeId = ProbeId("network_partition");
    pub const FILE_DESCRIPTOR_THROTTLING: ProbeId = ProbeId("file_descriptor_throttling");
    pub const SOCKET_DESCRIPTOR_THROTTLING: ProbeId = ProbeId("socket_descriptor_throttling");
    pub const MEMORY_ALARM: ProbeId = ProbeId("memory_alarm");
    pub const DISK_ALARM: ProbeId = ProbeId("disk_alarm");
    pub const BLOCKED_CONNECTION: ProbeId = ProbeId("blocked_connection");
    pub const CHANNEL_LIMIT_REACHED: ProbeId = ProbeId("channel_limit_reached");
    pub const CHANNEL_THROTTLING: ProbeId = ProbeId("channel_throttling");
    pub const UNLIMITED_PREFETCH_COUNT: ProbeId = ProbeId("unlimited_prefetch_count");
    pub const CONSUMER_UTILIZATION: ProbeId = ProbeId("consumer_utilization");
    pub const QUEUE_GROWTH: ProbeId = ProbeId("queue_growth");
    pub const QUEUE_HIGH_FLOW: ProbeId = ProbeId("queue_high_flow");
    pub const QUEUE_LOW_FLOW: ProbeId = ProbeId("queue_low_flow");
    pub const QUEUE_NO_FLOW: ProbeId = ProbeId("queue_no_flow");
    pub const REDELIVERED_MESSAGES: ProbeId = ProbeId("redelivered_messages");
    pub const MESSAGE_PAGING: ProbeId = ProbeId("message_paging");
    pub const HIGH_CONNECTION_CREATION_RATE: ProbeId = ProbeId("high_connection_creation_rate");
    pub const HIGH_CONNECTION_CLOSURE_RATE: ProbeId = ProbeId("high_connection_closure_rate");
    pub const UNROUTABLE_MESSAGE: ProbeId = ProbeId("unroutable_message");
    pub const RUNTIME_PROCESS_LIMIT: ProbeId = ProbeId("runtime_process_limit");

    /// Every built-in probe identifier, in registration order.
    pub const ALL: &'static [ProbeId] = &[
        Self::AVAILABLE_CPUS,
        Self::NETWORK_PARTITION,
        Self::FILE_DESCRIPTOR_THROTTLING,
        Self::SOCKET_DESCRIPTOR_THROTTLING,
        Self::MEMORY_ALARM,
        Self::DISK_ALARM,
        Self::BLOCKED_CONNECTION,
        Self::CHANNEL_LIMIT_REACHED,
        Self::CHANNEL_THROTTLING,
        Self::UNLIMITED_PREFETCH_COUNT,
        Self::CONSUMER_UTILIZATION,
        Self::QUEUE_GROWTH,
        Self::QUEUE_HIGH_FLOW,
        Self::QUEUE_LOW_FLOW,
        Self::QUEUE_NO_FLOW,
        Self::REDELIVERED_MESSAGES,
        Self::MESSAGE_PAGING,
        Self::HIGH_CONNECTION_CREATION_RATE,
        Self::HIGH_CONNECTION_CLOSURE_RATE,
        Self::UNROUTABLE_MESSAGE,
        Self::RUNTIME_PROCESS_LIMIT,
    ];

    /// Declare an identifier for a probe defined outside this crate.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Outcome of one probe evaluation.
///
/// Variants are declared in ascending precedence, so `max()` over a set of
/// statuses yields the one that should represent the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProbeStatus {
    /// The probe's threshold is not configured.
    #[serde(rename = "NA")]
    NotApplicable,
    Healthy,
    /// The input is valid but is not, by itself, evidence either way.
    Inconclusive,
    Warning,
    Unhealthy,
}

impl ProbeStatus {
    /// Every status, lowest precedence first.
    pub const ALL: [ProbeStatus; 5] = [
        ProbeStatus::NotApplicable,
        ProbeStatus::Healthy,
        ProbeStatus::Inconclusive,
        ProbeStatus::Warning,
        ProbeStatus::Unhealthy,
    ];

    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeStatus::NotApplicable => "NA",
            ProbeStatus::Healthy => "Healthy",
            ProbeStatus::Inconclusive => "Inconclusive",
            ProbeStatus::Warning => "Warning",
            ProbeStatus::Unhealthy => "Unhealthy",
        }
    }

    /// Whether this status calls for operator attention.
    pub fn is_problem(&self) -> bool {
        matches!(self, ProbeStatus::Warning | ProbeStatus::Unhealthy)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The kind of snapshot a probe inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Connectivity,
    QueueAggregate,
    Runtime,
    Node,
    OperatingSystem,
    Memory,
    Disk,
    Connection,
    Channel,
    Queue,
}

impl ComponentType {
    pub fn label(&self) -> &'static str {
        match self {
            ComponentType::Connectivity => "connectivity",
            ComponentType::QueueAggregate => "queue aggregate",
            ComponentType::Runtime => "runtime",
            ComponentType::Node => "node",
            ComponentType::OperatingSystem => "operating system",
            ComponentType::Memory => "memory",
            ComponentType::Disk => "disk",
            ComponentType::Connection => "connection",
            ComponentType::Channel => "channel",
            ComponentType::Queue => "queue",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Broad area of concern a probe belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeCategory {
    Connectivity,
    Throughput,
    FaultTolerance,
    Efficiency,
    ResourceConsumption,
    Memory,
}

/// Static description of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeMetadata {
    pub id: ProbeId,
    pub name: &'static str,
    pub component: ComponentType,
    pub category: ProbeCategory,
}

/// One observed value or threshold recorded alongside a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeData {
    pub property: &'static str,
    pub value: String,
}

impl ProbeData {
    pub fn new(property: &'static str, value: impl fmt::Display) -> Self {
        Self {
            property,
            value: value.to_string(),
        }
    }
}

/// The output of one probe invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub probe: ProbeId,
    pub name: &'static str,
    pub component: ComponentType,
    pub category: ProbeCategory,
    pub status: ProbeStatus,
    pub kb: KnowledgeBaseArticle,
    pub data: Vec<ProbeData>,
}

/// A health evaluator for one snapshot type.
///
/// Implementations must be pure: `evaluate` reads only its input, its own
/// threshold and its knowledge base article, and never fails.
pub trait Probe: Send + Sync {
    /// The snapshot type this probe inspects.
    type Input;

    fn metadata(&self) -> &ProbeMetadata;

    fn evaluate(&self, input: &Self::Input) -> ProbeResult;

    fn id(&self) -> ProbeId {
        self.metadata().id
    }
}

/// Metadata plus the knowledge base article, resolved once when a probe is
/// built. Every concrete probe embeds one.
#[derive(Debug, Clone, Copy)]
pub struct ProbeInfo {
    metadata: ProbeMetadata,
    article: KnowledgeBaseArticle,
}

impl ProbeInfo {
    pub fn new(metadata: ProbeMetadata, kb: &KnowledgeBase) -> Self {
        Self {
            metadata,
            article: kb.article(metadata.id),
        }
    }

    pub fn metadata(&self) -> &ProbeMetadata {
        &self.metadata
    }

    pub fn article(&self) -> &KnowledgeBaseArticle {
        &self.article
    }

    /// Build a result carrying this probe's identity and article.
    pub fn result(&self, status: ProbeStatus, data: Vec<ProbeData>) -> ProbeResult {
        ProbeResult {
            probe: self.metadata.id,
            name: self.metadata.name,
            component: self.metadata.component,
            category: self.metadata.category,
            status,
            kb: self.article,
            data,
        }
    }

    /// The result for a probe whose threshold is not configured.
    pub fn not_applicable(&self) -> ProbeResult {
        self.result(ProbeStatus::NotApplicable, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_precedence() {
        use ProbeStatus::*;
        assert!(Unhealthy > Warning);
        assert!(Warning > Inconclusive);
        assert!(Inconclusive > Healthy);
        assert!(Healthy > NotApplicable);
        assert_eq!([Healthy, Unhealthy, Warning].into_iter().max(), Some(Unhealthy));
    }

    #[test]
    fn status_serializes_with_short_names() {
        assert_eq!(
            serde_json::to_string(&ProbeStatus::NotApplicable).unwrap(),
            r#""NA""#
        );
        assert_eq!(
            serde_json::to_string(&ProbeStatus::Unhealthy).unwrap(),
            r#""Unhealthy""#
        );
        assert_eq!(ProbeStatus::NotApplicable.to_string(), "NA");
    }

    #[test]
    fn probe_ids_are_unique() {
        let mut ids: Vec<&str> = ProbeId::ALL.iter().map(|id| id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ProbeId::ALL.len());
    }

    #[test]
    fn info_attaches_own_article() {
        let kb = KnowledgeBase::builtin();
        let info = ProbeInfo::new(
            ProbeMetadata {
                id: ProbeId::MEMORY_ALARM,
                name: "Memory Alarm Probe",
                component: ComponentType::Memory,
                category: ProbeCategory::Memory,
            },
            &kb,
        );

        let result = info.not_applicable();
        assert_eq!(result.status, ProbeStatus::NotApplicable);
        assert_eq!(result.kb.id, ProbeId::MEMORY_ALARM);
        assert_eq!(result.probe, result.kb.id);
        assert!(result.data.is_empty());
    }
}
