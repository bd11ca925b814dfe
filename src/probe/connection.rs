//! Probes over connections and channels.

use brokerprobe_types::{ChannelSnapshot, ConnectionSnapshot, ConnectionState};

use super::{
    flag_status, ComponentType, Probe, ProbeCategory, ProbeData, ProbeId, ProbeInfo,
    ProbeMetadata, ProbeResult, ProbeStatus,
};
use crate::knowledge::KnowledgeBase;

/// Unhealthy when the broker has blocked the connection.
#[derive(Debug, Clone)]
pub struct BlockedConnectionProbe {
    info: ProbeInfo,
}

impl BlockedConnectionProbe {
    pub const ID: ProbeId = ProbeId::BLOCKED_CONNECTION;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Blocked Connection Probe",
        component: ComponentType::Connection,
        category: ProbeCategory::Connectivity,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for BlockedConnectionProbe {
    type Input = ConnectionSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, connection: &ConnectionSnapshot) -> ProbeResult {
        let data = vec![ProbeData::new("State", format!("{:?}", connection.state))];
        self.info
            .result(flag_status(connection.state == ConnectionState::Blocked), data)
    }
}

/// Unhealthy once the connection's channel count reaches its channel limit.
#[derive(Debug, Clone)]
pub struct ChannelLimitReachedProbe {
    info: ProbeInfo,
}

impl ChannelLimitReachedProbe {
    pub const ID: ProbeId = ProbeId::CHANNEL_LIMIT_REACHED;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Channel Limit Reached Probe",
        component: ComponentType::Connection,
        category: ProbeCategory::Throughput,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for ChannelLimitReachedProbe {
    type Input = ConnectionSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, connection: &ConnectionSnapshot) -> ProbeResult {
        let open = connection.channels.len() as u64;
        let limit = connection.open_channels_limit;
        let data = vec![
            ProbeData::new("Channels", open),
            ProbeData::new("OpenChannelsLimit", limit),
        ];

        self.info.result(flag_status(open >= limit), data)
    }
}

/// Unhealthy when unacknowledged deliveries fill the channel's prefetch
/// window, which stops the broker from delivering more.
#[derive(Debug, Clone)]
pub struct ChannelThrottlingProbe {
    info: ProbeInfo,
}

impl ChannelThrottlingProbe {
    pub const ID: ProbeId = ProbeId::CHANNEL_THROTTLING;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Channel Throttling Probe",
        component: ComponentType::Channel,
        category: ProbeCategory::Throughput,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for ChannelThrottlingProbe {
    type Input = ChannelSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, channel: &ChannelSnapshot) -> ProbeResult {
        let data = vec![
            ProbeData::new("UnacknowledgedMessages", channel.unacknowledged_messages),
            ProbeData::new("PrefetchCount", channel.prefetch_count),
        ];
        let throttled = channel.prefetch_count > 0
            && channel.unacknowledged_messages >= channel.prefetch_count;
        self.info.result(flag_status(throttled), data)
    }
}

/// Warns about channels with an unlimited prefetch window. A bounded
/// prefetch count says nothing about health on its own, so it yields
/// Inconclusive rather than Healthy.
#[derive(Debug, Clone)]
pub struct UnlimitedPrefetchCountProbe {
    info: ProbeInfo,
}

impl UnlimitedPrefetchCountProbe {
    pub const ID: ProbeId = ProbeId::UNLIMITED_PREFETCH_COUNT;

    const METADATA: ProbeMetadata = ProbeMetadata {
        id: Self::ID,
        name: "Unlimited Prefetch Count Probe",
        component: ComponentType::Channel,
        category: ProbeCategory::ResourceConsumption,
    };

    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            info: ProbeInfo::new(Self::METADATA, kb),
        }
    }
}

impl Probe for UnlimitedPrefetchCountProbe {
    type Input = ChannelSnapshot;

    fn metadata(&self) -> &ProbeMetadata {
        self.info.metadata()
    }

    fn evaluate(&self, channel: &ChannelSnapshot) -> ProbeResult {
        let data = vec![ProbeData::new("PrefetchCount", channel.prefetch_count)];
        let status = if channel.prefetch_count == 0 {
            ProbeStatus::Warning
        } else {
            ProbeStatus::Inconclusive
        };
        self.info.result(status, data)
    }
}
