//! The probe catalog, one typed probe set per snapshot kind.

use std::fmt;

use brokerprobe_types::{
    BrokerConnectivitySnapshot, BrokerQueuesSnapshot, BrokerRuntimeSnapshot, ChannelSnapshot,
    ConnectionSnapshot, DiskSnapshot, MemorySnapshot, NodeSnapshot, OperatingSystemSnapshot,
    QueueSnapshot,
};

use super::broker::{
    HighConnectionClosureRateProbe, HighConnectionCreationRateProbe, RuntimeProcessLimitProbe,
    UnroutableMessageProbe,
};
use super::connection::{
    BlockedConnectionProbe, ChannelLimitReachedProbe, ChannelThrottlingProbe,
    UnlimitedPrefetchCountProbe,
};
use super::node::{
    AvailableCpusProbe, DiskAlarmProbe, FileDescriptorThrottlingProbe, MemoryAlarmProbe,
    NetworkPartitionProbe, SocketDescriptorThrottlingProbe,
};
use super::queue::{
    ConsumerUtilizationProbe, MessagePagingProbe, QueueGrowthProbe, QueueHighFlowProbe,
    QueueLowFlowProbe, QueueNoFlowProbe, RedeliveredMessagesProbe,
};
use super::{ComponentType, Probe, ProbeId, ProbeResult};
use crate::config::ProbeConfig;
use crate::knowledge::KnowledgeBase;

/// A type-erased probe over snapshots of type `S`.
pub type BoxedProbe<S> = Box<dyn Probe<Input = S>>;

/// A snapshot type probes can be registered against.
///
/// Implemented for every snapshot kind in the broker tree; the registry keeps
/// one probe list per implementor.
pub trait Subject: Sized + 'static {
    const COMPONENT: ComponentType;

    #[doc(hidden)]
    fn probes(registry: &ProbeRegistry) -> &[BoxedProbe<Self>];

    #[doc(hidden)]
    fn probes_mut(registry: &mut ProbeRegistry) -> &mut Vec<BoxedProbe<Self>>;
}

macro_rules! subject {
    ($snapshot:ty, $component:ident, $field:ident) => {
        impl Subject for $snapshot {
            const COMPONENT: ComponentType = ComponentType::$component;

            fn probes(registry: &ProbeRegistry) -> &[BoxedProbe<Self>] {
                &registry.$field
            }

            fn probes_mut(registry: &mut ProbeRegistry) -> &mut Vec<BoxedProbe<Self>> {
                &mut registry.$field
            }
        }
    };
}

subject!(BrokerConnectivitySnapshot, Connectivity, connectivity);
subject!(BrokerQueuesSnapshot, QueueAggregate, queue_aggregate);
subject!(BrokerRuntimeSnapshot, Runtime, runtime);
subject!(NodeSnapshot, Node, node);
subject!(OperatingSystemSnapshot, OperatingSystem, os);
subject!(MemorySnapshot, Memory, memory);
subject!(DiskSnapshot, Disk, disk);
subject!(ConnectionSnapshot, Connection, connection);
subject!(ChannelSnapshot, Channel, channel);
subject!(QueueSnapshot, Queue, queue);

/// Every probe the scanner runs, grouped by the snapshot kind it inspects.
///
/// Probes are evaluated in registration order within each kind. Identifiers
/// are unique across the whole registry.
#[derive(Default)]
pub struct ProbeRegistry {
    order: Vec<ProbeId>,
    connectivity: Vec<BoxedProbe<BrokerConnectivitySnapshot>>,
    queue_aggregate: Vec<BoxedProbe<BrokerQueuesSnapshot>>,
    runtime: Vec<BoxedProbe<BrokerRuntimeSnapshot>>,
    node: Vec<BoxedProbe<NodeSnapshot>>,
    os: Vec<BoxedProbe<OperatingSystemSnapshot>>,
    memory: Vec<BoxedProbe<MemorySnapshot>>,
    disk: Vec<BoxedProbe<DiskSnapshot>>,
    connection: Vec<BoxedProbe<ConnectionSnapshot>>,
    channel: Vec<BoxedProbe<ChannelSnapshot>>,
    queue: Vec<BoxedProbe<QueueSnapshot>>,
}

impl ProbeRegistry {
    /// A registry with no probes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalog, each probe given its own slice of `config`.
    pub fn new(config: &ProbeConfig, kb: &KnowledgeBase) -> Self {
        let mut registry = Self::empty();

        registry.register(AvailableCpusProbe::new(kb));
        registry.register(NetworkPartitionProbe::new(kb));
        registry.register(FileDescriptorThrottlingProbe::new(
            config.file_descriptor_usage_threshold_coefficient,
            kb,
        ));
        registry.register(SocketDescriptorThrottlingProbe::new(
            config.socket_usage_threshold_coefficient,
            kb,
        ));
        registry.register(MemoryAlarmProbe::new(kb));
        registry.register(DiskAlarmProbe::new(kb));

        registry.register(BlockedConnectionProbe::new(kb));
        registry.register(ChannelLimitReachedProbe::new(kb));
        registry.register(ChannelThrottlingProbe::new(kb));
        registry.register(UnlimitedPrefetchCountProbe::new(kb));

        registry.register(ConsumerUtilizationProbe::new(
            config.consumer_utilization_threshold,
            kb,
        ));
        registry.register(QueueGrowthProbe::new(kb));
        registry.register(QueueHighFlowProbe::new(config.queue_high_flow_threshold, kb));
        registry.register(QueueLowFlowProbe::new(config.queue_low_flow_threshold, kb));
        registry.register(QueueNoFlowProbe::new(kb));
        registry.register(RedeliveredMessagesProbe::new(
            config.message_redelivery_threshold_coefficient,
            kb,
        ));
        registry.register(MessagePagingProbe::new(kb));

        registry.register(HighConnectionCreationRateProbe::new(
            config.high_connection_creation_rate_threshold,
            kb,
        ));
        registry.register(HighConnectionClosureRateProbe::new(
            config.high_connection_closure_rate_threshold,
            kb,
        ));
        registry.register(UnroutableMessageProbe::new(kb));
        registry.register(RuntimeProcessLimitProbe::new(
            config.runtime_process_usage_threshold_coefficient,
            kb,
        ));

        registry
    }

    /// Add a probe. Returns `false`, leaving the registry unchanged, when a
    /// probe with the same identifier is already registered.
    pub fn register<P>(&mut self, probe: P) -> bool
    where
        P: Probe + 'static,
        P::Input: Subject,
    {
        let id = probe.id();
        if self.contains(id) {
            return false;
        }
        self.order.push(id);
        <P::Input as Subject>::probes_mut(self).push(Box::new(probe));
        true
    }

    /// Run every probe registered for `S` against `input`, in registration
    /// order.
    pub fn evaluate<S: Subject>(&self, input: &S) -> Vec<ProbeResult> {
        S::probes(self)
            .iter()
            .map(|probe| probe.evaluate(input))
            .collect()
    }

    /// The probes registered for snapshot kind `S`.
    pub fn probes_for<S: Subject>(&self) -> &[BoxedProbe<S>] {
        S::probes(self)
    }

    /// Identifiers of every registered probe, in registration order.
    pub fn ids(&self) -> &[ProbeId] {
        &self.order
    }

    pub fn contains(&self, id: ProbeId) -> bool {
        self.order.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeStatus;

    #[test]
    fn builtin_catalog_registers_every_probe_in_order() {
        let registry = ProbeRegistry::new(&ProbeConfig::default(), &KnowledgeBase::builtin());
        assert_eq!(registry.ids(), ProbeId::ALL);
        assert_eq!(registry.len(), 21);
    }

    #[test]
    fn probes_are_grouped_by_subject() {
        let registry = ProbeRegistry::new(&ProbeConfig::default(), &KnowledgeBase::builtin());

        assert_eq!(registry.probes_for::<NodeSnapshot>().len(), 2);
        assert_eq!(registry.probes_for::<OperatingSystemSnapshot>().len(), 2);
        assert_eq!(registry.probes_for::<ConnectionSnapshot>().len(), 2);
        assert_eq!(registry.probes_for::<ChannelSnapshot>().len(), 2);
        assert_eq!(registry.probes_for::<QueueSnapshot>().len(), 7);
        assert_eq!(registry.probes_for::<BrokerConnectivitySnapshot>().len(), 2);
        assert_eq!(registry.probes_for::<BrokerRuntimeSnapshot>().len(), 1);

        for probe in registry.probes_for::<QueueSnapshot>() {
            assert_eq!(probe.metadata().component, QueueSnapshot::COMPONENT);
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let kb = KnowledgeBase::builtin();
        let mut registry = ProbeRegistry::empty();

        assert!(registry.register(MemoryAlarmProbe::new(&kb)));
        assert!(!registry.register(MemoryAlarmProbe::new(&kb)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.probes_for::<MemorySnapshot>().len(), 1);
    }

    #[test]
    fn evaluate_runs_in_registration_order() {
        let registry = ProbeRegistry::new(&ProbeConfig::default(), &KnowledgeBase::builtin());
        let queue = QueueSnapshot::builder("q").incoming(5, 1.0).build();

        let ids: Vec<ProbeId> = registry
            .evaluate(&queue)
            .iter()
            .map(|result| result.probe)
            .collect();
        assert_eq!(ids, &ProbeId::ALL[10..17]);
    }

    #[test]
    fn unconfigured_registry_degrades_to_na() {
        let registry = ProbeRegistry::new(&ProbeConfig::default(), &KnowledgeBase::builtin());
        let queue = QueueSnapshot::builder("q").incoming(5, 1.0).build();
        let results = registry.evaluate(&queue);

        let consumer = results
            .iter()
            .find(|r| r.probe == ProbeId::CONSUMER_UTILIZATION)
            .unwrap();
        assert_eq!(consumer.status, ProbeStatus::NotApplicable);
        assert_eq!(consumer.kb.id, ProbeId::CONSUMER_UTILIZATION);

        let no_flow = results
            .iter()
            .find(|r| r.probe == ProbeId::QUEUE_NO_FLOW)
            .unwrap();
        assert_eq!(no_flow.status, ProbeStatus::Healthy);
    }

    #[test]
    fn empty_registry_evaluates_nothing() {
        let registry = ProbeRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.evaluate(&NodeSnapshot::default()).is_empty());
    }
}
