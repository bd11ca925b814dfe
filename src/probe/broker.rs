//! Probes over cluster-wide aggregates.

use brokerprobe_types::{BrokerConnectivitySnapshot, BrokerQueuesSnapshot, BrokerRuntimeSnapshot};

use super::{
    flag_status, high_watermark, watermark_status, ComponentType, Probe, ProbeCategory, ProbeData,
    ProbeId, ProbeInfo, ProbeMetadata, ProbeResult, ProbeStatus,
};
use crate::knowledge::KnowledgeBase;

fn rate_status(rate: f64, threshold: f64) -> ProbeStatus {
    if rate >= threshold {
        ProbeStatus::Warning
    } else {
        ProbeStatus::Healthy
    }
}

/// Warns when connections are opened faster than the configured rate.
#[derive(Debug, Clone)]
pub struct HighConnectionCreationRateProbe {
    info: ProbeInfo,
    threshold: Option<f64>,
}

impl HighConnectionCreationRateProbe {
    pub const ID: ProbeId = ProbeId::HIGH_CONNECTION_CREATION_RATE;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "High Connection Creation Rate Probe",
        component: ComponentType::Connectivity,
        category: ProbeCategory::Connectivity,
    };

    pub fn new(threshold: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            threshold,
        }
    }
}

impl Probe for HighConnectionCreationRateProbe {
    type Input = BrokerConnectivitySnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, connectivity: &BrokerConnectivitySnapshot) -> ProbeResult {
        let Some(threshold) = self.threshold else {
            return self.info.not_applicable();
        };

        let rate = connectivity.connections_created.value;
        let data = vec![
            ProbeData::new("ConnectionsCreatedRate", rate),
            ProbeData::new("HighConnectionCreationRateThreshold", threshold),
        ];
        self.info.result(rate_status(rate, threshold), data)
    }
}

/// Warns when connections are closed faster than the configured rate.
#[derive(Debug, Clone)]
pub struct HighConnectionClosureRateProbe {
    info: ProbeInfo,
    threshold: Option<f64>,
}

impl HighConnectionClosureRateProbe {
    pub const ID: ProbeId = ProbeId::HIGH_CONNECTION_CLOSURE_RATE;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "High Connection Closure Rate Probe",
        component: ComponentType::Connectivity,
        category: ProbeCategory::Connectivity,
    };

    pub fn new(threshold: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            threshold,
        }
    }
}

impl Probe for HighConnectionClosureRateProbe {
    type Input = BrokerConnectivitySnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, connectivity: &BrokerConnectivitySnapshot) -> ProbeResult {
        let Some(threshold) = self.threshold else {
            return self.info.not_applicable();
        };

        let rate = connectivity.connections_closed.value;
        let data = vec![
            ProbeData::new("ConnectionsClosedRate", rate),
            ProbeData::new("HighConnectionClosureRateThreshold", threshold),
        ];
        self.info.result(rate_status(rate, threshold), data)
    }
}

/// Unhealthy when any message was published without a matching binding.
#[derive(Debug, Clone)]
pub struct UnroutableMessageProbe {
    info: ProbeInfo,
}

impl UnroutableMessageProbe {
    pub const ID: ProbeId = ProbeId::UNROUTABLE_MESSAGE;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Unroutable Message Probe",
        component: ComponentType::QueueAggregate,
        category: ProbeCategory::Efficiency,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for UnroutableMessageProbe {
    type Input = BrokerQueuesSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, queues: &BrokerQueuesSnapshot) -> ProbeResult {
        let not_routed = queues.churn.not_routed;
        let data = vec![
            ProbeData::new("MessagesNotRoutedTotal", not_routed.total),
            ProbeData::new("MessagesNotRoutedRate", not_routed.rate.value),
        ];
        self.info.result(flag_status(not_routed.total > 0), data)
    }
}

/// Compares the runtime's process count with its process limit.
#[derive(Debug, Clone)]
pub struct RuntimeProcessLimitProbe {
    info: ProbeInfo,
    coefficient: Option<f64>,
}

impl RuntimeProcessLimitProbe {
    pub const ID: ProbeId = ProbeId::RUNTIME_PROCESS_LIMIT;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Runtime Process Limit Probe",
        component: ComponentType::Runtime,
        category: ProbeCategory::ResourceConsumption,
    };

    pub fn new(coefficient: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            coefficient,
        }
    }
}

impl Probe for RuntimeProcessLimitProbe {
    type Input = BrokerRuntimeSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, runtime: &BrokerRuntimeSnapshot) -> ProbeResult {
        let Some(coefficient) = self.coefficient else {
            return self.info.not_applicable();
        };

        let processes = runtime.processes;
        let watermark = high_watermark(processes.limit, coefficient);
        let data = vec![
            ProbeData::new("ProcessLimit", processes.limit),
            ProbeData::new("ProcessesUsed", processes.used),
            ProbeData::new("ProcessUsageThresholdCoefficient", coefficient),
            ProbeData::new("CalculatedThreshold", watermark),
        ];
        self.info.result(
            watermark_status(processes.used, processes.limit, watermark),
            data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerprobe_types::{MessageStat, Rate, RuntimeProcesses};

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin()
    }

    fn churn(created: f64, closed: f64) -> BrokerConnectivitySnapshot {
        BrokerConnectivitySnapshot {
            connections_created: Rate::new(created),
            connections_closed: Rate::new(closed),
            ..Default::default()
        }
    }

    fn runtime(limit: u64, used: u64) -> BrokerRuntimeSnapshot {
        BrokerRuntimeSnapshot {
            processes: RuntimeProcesses::new(limit, used),
            ..Default::default()
        }
    }

    #[test]
    fn connection_creation_rate_boundaries() {
        let probe = HighConnectionCreationRateProbe::new(Some(100.0), &kb());

        assert_eq!(probe.evaluate(&churn(102.0, 0.0)).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&churn(100.0, 0.0)).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&churn(99.0, 0.0)).status, ProbeStatus::Healthy);
    }

    #[test]
    fn connection_closure_rate_reads_closed_rate() {
        let probe = HighConnectionClosureRateProbe::new(Some(100.0), &kb());

        assert_eq!(probe.evaluate(&churn(500.0, 99.0)).status, ProbeStatus::Healthy);
        assert_eq!(probe.evaluate(&churn(0.0, 100.0)).status, ProbeStatus::Warning);
    }

    #[test]
    fn rate_probes_without_threshold() {
        let creation = HighConnectionCreationRateProbe::new(None, &kb());
        let closure = HighConnectionClosureRateProbe::new(None, &kb());

        let result = creation.evaluate(&churn(1e6, 1e6));
        assert_eq!(result.status, ProbeStatus::NotApplicable);
        assert_eq!(result.kb.id, HighConnectionCreationRateProbe::ID);

        let result = closure.evaluate(&churn(1e6, 1e6));
        assert_eq!(result.status, ProbeStatus::NotApplicable);
        assert_eq!(result.kb.id, HighConnectionClosureRateProbe::ID);
    }

    #[test]
    fn unroutable_messages() {
        let probe = UnroutableMessageProbe::new(&kb());
        let mut queues = BrokerQueuesSnapshot::default();
        assert_eq!(probe.evaluate(&queues).status, ProbeStatus::Healthy);

        queues.churn.not_routed = MessageStat::total(1);
        let result = probe.evaluate(&queues);
        assert_eq!(result.status, ProbeStatus::Unhealthy);
        assert_eq!(result.data[0].value, "1");
    }

    #[test]
    fn runtime_process_limit_bands() {
        // limit 1000, coefficient 0.7 => watermark 700
        let probe = RuntimeProcessLimitProbe::new(Some(0.7), &kb());

        assert_eq!(probe.evaluate(&runtime(1000, 699)).status, ProbeStatus::Healthy);
        assert_eq!(probe.evaluate(&runtime(1000, 700)).status, ProbeStatus::Warning);
        assert_eq!(probe.evaluate(&runtime(1000, 1000)).status, ProbeStatus::Unhealthy);
        assert_eq!(probe.evaluate(&runtime(0, 0)).status, ProbeStatus::Unhealthy);
    }

    #[test]
    fn runtime_process_limit_without_coefficient() {
        let probe = RuntimeProcessLimitProbe::new(None, &kb());
        assert_eq!(
            probe.evaluate(&runtime(10, 10)).status,
            ProbeStatus::NotApplicable
        );
    }
}
