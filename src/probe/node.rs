//! Probes over node, operating system, memory and disk snapshots.

use brokerprobe_types::{
    DiskSnapshot, MemorySnapshot, NodeSnapshot, OperatingSystemSnapshot, ResourceUsage,
};

use super::{
    flag_status, high_watermark, watermark_status, ComponentType, Probe, ProbeCategory, ProbeData,
    ProbeId, ProbeInfo, ProbeMetadata, ProbeResult,
};
use crate::knowledge::KnowledgeBase;

/// Unhealthy when the runtime detected no CPU cores.
#[derive(Debug, Clone)]
pub struct AvailableCpusProbe {
    info: ProbeInfo,
}

impl AvailableCpusProbe {
    pub const ID: ProbeId = ProbeId::AVAILABLE_CPUS;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Available CPUs Probe",
        component: ComponentType::Node,
        category: ProbeCategory::ResourceConsumption,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for AvailableCpusProbe {
    type Input = NodeSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, node: &NodeSnapshot) -> ProbeResult {
        let data = vec![ProbeData::new(
            "AvailableCoresDetected",
            node.available_cores_detected,
        )];
        self.info
            .result(flag_status(node.available_cores_detected == 0), data)
    }
}

/// Unhealthy when the node reports any network partition.
#[derive(Debug, Clone)]
pub struct NetworkPartitionProbe {
    info: ProbeInfo,
}

impl NetworkPartitionProbe {
    pub const ID: ProbeId = ProbeId::NETWORK_PARTITION;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Network Partition Probe",
        component: ComponentType::Node,
        category: ProbeCategory::FaultTolerance,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for NetworkPartitionProbe {
    type Input = NodeSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, node: &NodeSnapshot) -> ProbeResult {
        let data = vec![ProbeData::new(
            "NetworkPartitions",
            node.network_partitions.join(","),
        )];
        self.info
            .result(flag_status(!node.network_partitions.is_empty()), data)
    }
}

fn descriptor_data(usage: &ResourceUsage, coefficient: f64, watermark: u64) -> Vec<ProbeData> {
    vec![
        ProbeData::new("Available", usage.available),
        ProbeData::new("Used", usage.used),
        ProbeData::new("UsageThresholdCoefficient", coefficient),
        ProbeData::new("CalculatedThreshold", watermark),
    ]
}

/// Watches file descriptor usage against `ceil(available × coefficient)`.
#[derive(Debug, Clone)]
pub struct FileDescriptorThrottlingProbe {
    info: ProbeInfo,
    coefficient: Option<f64>,
}

impl FileDescriptorThrottlingProbe {
    pub const ID: ProbeId = ProbeId::FILE_DESCRIPTOR_THROTTLING;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "File Descriptor Throttling Probe",
        component: ComponentType::OperatingSystem,
        category: ProbeCategory::Throughput,
    };

    pub fn new(coefficient: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            coefficient,
        }
    }
}

impl Probe for FileDescriptorThrottlingProbe {
    type Input = OperatingSystemSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, os: &OperatingSystemSnapshot) -> ProbeResult {
        let Some(coefficient) = self.coefficient else {
            return self.info.not_applicable();
        };

        let usage = &os.file_descriptors;
        let watermark = high_watermark(usage.available, coefficient);
        self.info.result(
            watermark_status(usage.used, usage.available, watermark),
            descriptor_data(usage, coefficient, watermark),
        )
    }
}

/// Watches socket descriptor usage against `ceil(available × coefficient)`.
#[derive(Debug, Clone)]
pub struct SocketDescriptorThrottlingProbe {
    info: ProbeInfo,
    coefficient: Option<f64>,
}

impl SocketDescriptorThrottlingProbe {
    pub const ID: ProbeId = ProbeId::SOCKET_DESCRIPTOR_THROTTLING;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Socket Descriptor Throttling Probe",
        component: ComponentType::OperatingSystem,
        category: ProbeCategory::Connectivity,
    };

    pub fn new(coefficient: Option<f64>, kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
            coefficient,
        }
    }
}

impl Probe for SocketDescriptorThrottlingProbe {
    type Input = OperatingSystemSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, os: &OperatingSystemSnapshot) -> ProbeResult {
        let Some(coefficient) = self.coefficient else {
            return self.info.not_applicable();
        };

        let usage = &os.socket_descriptors;
        let watermark = high_watermark(usage.available, coefficient);
        self.info.result(
            watermark_status(usage.used, usage.available, watermark),
            descriptor_data(usage, coefficient, watermark),
        )
    }
}

/// Unhealthy while the memory alarm is in effect. Used/limit are recorded
/// but do not affect the status.
#[derive(Debug, Clone)]
pub struct MemoryAlarmProbe {
    info: ProbeInfo,
}

impl MemoryAlarmProbe {
    pub const ID: ProbeId = ProbeId::MEMORY_ALARM;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Memory Alarm Probe",
        component: ComponentType::Memory,
        category: ProbeCategory::ResourceConsumption,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for MemoryAlarmProbe {
    type Input = MemorySnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, memory: &MemorySnapshot) -> ProbeResult {
        let data = vec![
            ProbeData::new("Used", memory.used),
            ProbeData::new("Limit", memory.limit),
            ProbeData::new("AlarmInEffect", memory.alarm_in_effect),
        ];
        self.info.result(flag_status(memory.alarm_in_effect), data)
    }
}

/// Unhealthy while the disk alarm is in effect.
#[derive(Debug, Clone)]
pub struct DiskAlarmProbe {
    info: ProbeInfo,
}

impl DiskAlarmProbe {
    pub const ID: ProbeId = ProbeId::DISK_ALARM;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Disk Alarm Probe",
        component: ComponentType::Disk,
        category: ProbeCategory::ResourceConsumption,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for DiskAlarmProbe {
    type Input = DiskSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, disk: &DiskSnapshot) -> ProbeResult {
        let data = vec![
            ProbeData::new("Available", disk.available),
            ProbeData::new("Limit", disk.limit),
            ProbeData::new("AlarmInEffect", disk.alarm_in_effect),
        ];
        self.info.result(flag_status(disk.alarm_in_effect), data)
    }
}
