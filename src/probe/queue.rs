//! Probes over queue snapshots.

use brokerprobe_types::QueueSnapshot;

use super::{
    flag_status, high_watermark, ComponentType, Probe, ProbeCategory, ProbeData, ProbeId,
    ProbeInfo, ProbeMetadata, ProbeResult, ProbeStatus,
};
use crate::knowledge::KnowledgeBase;

/// Compares consumer utilization against a configured threshold.
///
/// Below the threshold the queue's consumers are starved (Unhealthy); from
/// the threshold up to, but excluding, full utilization is Warning; 1.0 is
/// Healthy.
#[derive(Debug, Clone)]
pub struct ConsumerUtilizationProbe {
    info: ProbeInfo,
    threshold: Option<f64>,
}

impl ConsumerUtilizationProbe {
    pub const ID: ProbeId = ProbeId::CONSUMER_UTILIZATION;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Consumer Utilization Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::Throughput,
    };

    pub fn new(threshold: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            threshold,
        }
    }
}

impl Probe for ConsumerUtilizationProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let Some(threshold) = self.threshold else {
            return self.info.not_applicable();
        };

        let utilization = queue.consumer_utilization;
        let status = if utilization < threshold {
            ProbeStatus::Unhealthy
        } else if utilization < 1.0 {
            ProbeStatus::Warning
        } else {
            ProbeStatus::Healthy
        };

        let data = vec![
            ProbeData::new("ConsumerUtilization", utilization),
            ProbeData::new("ConsumerUtilizationThreshold", threshold),
        ];
        self.info.result(status, data)
    }
}

/// Warns when messages arrive faster than consumers acknowledge them.
#[derive(Debug, Clone)]
pub struct QueueGrowthProbe {
    info: ProbeInfo,
}

impl QueueGrowthProbe {
    pub const ID: ProbeId = ProbeId::QUEUE_GROWTH;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Queue Growth Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::Throughput,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for QueueGrowthProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let incoming = queue.messages.incoming.rate.value;
        let acknowledged = queue.messages.acknowledged.rate.value;

        let status = if incoming > acknowledged {
            ProbeStatus::Warning
        } else {
            ProbeStatus::Healthy
        };

        let data = vec![
            ProbeData::new("MessagesIncomingRate", incoming),
            ProbeData::new("MessagesAcknowledgedRate", acknowledged),
        ];
        self.info.result(status, data)
    }
}

/// Unhealthy once total incoming messages reach the high-flow threshold.
#[derive(Debug, Clone)]
pub struct QueueHighFlowProbe {
    info: ProbeInfo,
    threshold: Option<u64>,
}

impl QueueHighFlowProbe {
    pub const ID: ProbeId = ProbeId::QUEUE_HIGH_FLOW;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Queue High Flow Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::Efficiency,
    };

    pub fn new(threshold: Option<u64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            threshold,
        }
    }
}

impl Probe for QueueHighFlowProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let Some(threshold) = self.threshold else {
            return self.info.not_applicable();
        };

        let incoming = queue.messages.incoming.total;
        let data = vec![
            ProbeData::new("MessagesIncomingTotal", incoming),
            ProbeData::new("QueueHighFlowThreshold", threshold),
        ];
        self.info.result(flag_status(incoming >= threshold), data)
    }
}

/// Unhealthy while total incoming messages stay at or below the low-flow
/// threshold.
#[derive(Debug, Clone)]
pub struct QueueLowFlowProbe {
    info: ProbeInfo,
    threshold: Option<u64>,
}

impl QueueLowFlowProbe {
    pub const ID: ProbeId = ProbeId::QUEUE_LOW_FLOW;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Queue Low Flow Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::Efficiency,
    };

    pub fn new(threshold: Option<u64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            threshold,
        }
    }
}

impl Probe for QueueLowFlowProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let Some(threshold) = self.threshold else {
            return self.info.not_applicable();
        };

        let incoming = queue.messages.incoming.total;
        let data = vec![
            ProbeData::new("MessagesIncomingTotal", incoming),
            ProbeData::new("QueueLowFlowThreshold", threshold),
        ];
        self.info.result(flag_status(incoming <= threshold), data)
    }
}

/// Unhealthy when a queue has never received a message.
#[derive(Debug, Clone)]
pub struct QueueNoFlowProbe {
    info: ProbeInfo,
}

impl QueueNoFlowProbe {
    pub const ID: ProbeId = ProbeId::QUEUE_NO_FLOW;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Queue No Flow Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::Efficiency,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for QueueNoFlowProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let incoming = queue.messages.incoming.total;
        let data = vec![ProbeData::new("MessagesIncomingTotal", incoming)];
        self.info.result(flag_status(incoming == 0), data)
    }
}

/// Compares redeliveries with incoming messages.
///
/// With `w = ceil(incoming × coefficient)`: no redeliveries is Healthy,
/// `redelivered >= incoming` is Unhealthy, `redelivered >= w` is Warning.
#[derive(Debug, Clone)]
pub struct RedeliveredMessagesProbe {
    info: ProbeInfo,
    coefficient: Option<f64>,
}

impl RedeliveredMessagesProbe {
    pub const ID: ProbeId = ProbeId::REDELIVERED_MESSAGES;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Redelivered Messages Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::FaultTolerance,
    };

    pub fn new(coefficient: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            coefficient,
        }
    }
}

impl Probe for RedeliveredMessagesProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let Some(coefficient) = self.coefficient else {
            return self.info.not_applicable();
        };

        let incoming = queue.messages.incoming.total;
        let redelivered = queue.messages.redelivered.total;
        let watermark = high_watermark(incoming, coefficient);

        let status = if redelivered == 0 {
            ProbeStatus::Healthy
        } else if redelivered >= incoming {
            ProbeStatus::Unhealthy
        } else if redelivered >= watermark {
            ProbeStatus::Warning
        } else {
            ProbeStatus::Healthy
        };

        let data = vec![
            ProbeData::new("MessagesIncomingTotal", incoming),
            ProbeData::new("MessagesRedeliveredTotal", redelivered),
            ProbeData::new("MessageRedeliveryThresholdCoefficient", coefficient),
            ProbeData::new("CalculatedThreshold", watermark),
        ];
        self.info.result(status, data)
    }
}

/// Unhealthy when the queue has paged messages out to disk.
#[derive(Debug, Clone)]
pub struct MessagePagingProbe {
    info: ProbeInfo,
}

impl MessagePagingProbe {
    pub const ID: ProbeId = ProbeId::MESSAGE_PAGING;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Message Paging Probe",
        component: ComponentType::Queue,
        category: ProbeCategory::Memory,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for MessagePagingProbe {
    type Input = QueueSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queue: &QueueSnapshot) -> ProbeResult {
        let paged_out = queue.memory.paged_out;
        let data = vec![ProbeData::new("MessagesPagedOut", paged_out)];
        self.info.result(flag_status(paged_out > 0), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin()
    }

    fn utilization(value: f64) -> QueueSnapshot {
        QueueSnapshot::builder("q").consumer_utilization(value).build()
    }

    fn incoming(total: u64) -> QueueSnapshot {
        QueueSnapshot::builder("q").incoming(total, 0.0).build()
    }

    fn redelivery(incoming: u64, redelivered: u64) -> QueueSnapshot {
        QueueSnapshot::builder("q")
            .incoming(incoming, 0.0)
            .redelivered(redelivered, 0.0)
            .build()
    }

    #[test]
    fn consumer_utilization_boundaries() {
        let probe = ConsumerUtilizationProbe::new(Some(0.50), &kb());

        assert_eq!(probe.evaluate(&utilization(0.50)).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&utilization(0.40)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&utilization(1.00)).status, ProbeStatus::Healthy);
        assert_eq!(probe.evaluate(&utilization(0.99)).status, ProbeStatus::Warning);
    }

    #[test]
    fn consumer_utilization_without_threshold() {
        let probe = ConsumerUtilizationProbe::new(None, &kb());
        let result = probe.evaluate(&utilization(0.0));
        assert_eq!(result.status, ProbeStatus::NotApplicable);
        assert_eq!(result.kb.id, ConsumerUtilizationProbe::ID);
    }

    #[test]
    fn queue_growth_compares_rates() {
        let probe = QueueGrowthProbe::new(&kb());
        let growing = QueueSnapshot::builder("q")
            .incoming(100, 10.0)
            .acknowledged(90, 9.0)
            .build();
        let steady = QueueSnapshot::builder("q")
            .incoming(100, 10.0)
            .acknowledged(100, 10.0)
            .build();

        assert_eq!(probe.evaluate(&growing).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&steady).status, ProbeStatus::Healthy);
    }

    #[test]
    fn queue_high_flow_is_inclusive() {
        let probe = QueueHighFlowProbe::new(Some(100), &kb());

        assert_eq!(probe.evaluate(&incoming(101)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&incoming(100)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&incoming(99)).status, ProbeStatus::Healthy);
    }

    #[test]
    fn queue_low_flow_is_inclusive() {
        let probe = QueueLowFlowProbe::new(Some(20), &kb());

        assert_eq!(probe.evaluate(&incoming(19)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&incoming(20)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&incoming(21)).status, ProbeStatus::Healthy);
    }

    #[test]
    fn flow_probes_degrade_without_threshold() {
        let high = QueueHighFlowProbe::new(None, &kb());
        let low = QueueLowFlowProbe::new(None, &kb());

        assert_eq!(high.evaluate(&incoming(0)).status, ProbeStatus::NotApplicable);
        assert_eq!(low.evaluate(&incoming(0)).status, ProbeStatus::NotApplicable);
        assert_eq!(high.evaluate(&incoming(0)).kb.id, QueueHighFlowProbe::ID);
        assert_eq!(low.evaluate(&incoming(0)).kb.id, QueueLowFlowProbe::ID);
    }

    #[test]
    fn queue_no_flow() {
        let probe = QueueNoFlowProbe::new(&kb());
        assert_eq!(probe.evaluate(&incoming(0)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&incoming(1)).status, ProbeStatus::Healthy);
    }

    #[test]
    fn redelivered_messages_bands() {
        // incoming 10, coefficient 0.5 => watermark 5
        let probe = RedeliveredMessagesProbe::new(Some(0.5), &kb());

        assert_eq!(probe.evaluate(&redelivery(10, 0)).status, ProbeStatus::Healthy);
        assert_eq!(probe.evaluate(&redelivery(10, 4)).status, ProbeStatus::Healthy);
        assert_eq!(probe.evaluate(&redelivery(10, 5)).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&redelivery(10, 9)).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&redelivery(10, 10)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&redelivery(10, 12)).status, ProbeStatus::Unhealthy);
    }

    #[test]
    fn redelivered_messages_exact_watermark_warns() {
        // incoming 100, coefficient 0.55 => watermark 55
        let probe = RedeliveredMessagesProbe::new(Some(0.55), &kb());
        let result = probe.evaluate(&redelivery(100, 55));
        assert_eq!(result.status, ProbeStatus::Warning);
        assert_eq!(result.data[3].value, "55");
        assert_eq!(probe.evaluate(&redelivery(100, 54)).status, ProbeStatus::Healthy);
    }

    #[test]
    fn redelivered_messages_idle_queue_is_healthy() {
        let probe = RedeliveredMessagesProbe::new(Some(0.5), &kb());
        assert_eq!(probe.evaluate(&redelivery(0, 0)).status, ProbeStatus::Healthy);
        assert_eq!(probe.evaluate(&redelivery(0, 1)).status, ProbeStatus::Unhealthy);
    }

    #[test]
    fn redelivered_messages_without_coefficient() {
        let probe = RedeliveredMessagesProbe::new(None, &kb());
        let result = probe.evaluate(&redelivery(10, 10));
        assert_eq!(result.status, ProbeStatus::NotApplicable);
        assert_eq!(result.kb.id, RedeliveredMessagesProbe::ID);
    }

    #[test]
    fn message_paging() {
        let probe = MessagePagingProbe::new(&kb());
        let paged = QueueSnapshot::builder("q").paged_out(3).build();
        let resident = QueueSnapshot::builder("q").build();

        assert_eq!(probe.evaluate(&paged).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&resident).status, ProbeStatus::Healthy);
    }
}
