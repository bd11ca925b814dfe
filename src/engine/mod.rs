//! The diagnostics engine.
//!
//! A [`Scanner`] flattens a [`BrokerSnapshot`] into entities, validates the
//! whole tree, then runs every registered probe against every entity of the
//! matching kind. A scan either returns a complete [`DiagnosticReport`] or a
//! [`ScanError`]; it never returns part of a report.
//!
//! ```
//! use brokerprobe::{BrokerSnapshot, KnowledgeBase, ProbeConfig, Scanner};
//!
//! let kb = KnowledgeBase::builtin();
//! let scanner = Scanner::from_config(&ProbeConfig::recommended(), &kb);
//!
//! let snapshot = BrokerSnapshot::builder()
//!     .cluster("prod")
//!     .node("rabbit@a", |n| n.cores(4))
//!     .queue("/", "orders", |q| q.consumer_utilization(1.0).incoming(500, 2.0))
//!     .build();
//!
//! let report = scanner.scan(&snapshot).unwrap();
//! assert!(!report.is_empty());
//! ```

mod control;
mod entity;

pub use control::ScanControl;
pub use entity::{flatten, Entity, FlatEntity};

use std::sync::atomic::{AtomicUsize, Ordering};

use brokerprobe_types::BrokerSnapshot;
use rayon::prelude::*;
use tracing::{debug, debug_span, trace, warn};

use crate::config::ProbeConfig;
use crate::error::ScanError;
use crate::knowledge::KnowledgeBase;
use crate::probe::ProbeRegistry;
use crate::report::{DiagnosticReport, ReportEntry};

/// Runs a probe registry over broker snapshots.
///
/// The scanner holds no per-scan state, so one instance can serve any number
/// of scans, sequentially or from several threads.
#[derive(Debug)]
pub struct Scanner {
    registry: ProbeRegistry,
}

impl Scanner {
    pub fn new(registry: ProbeRegistry) -> Self {
        Self { registry }
    }

    /// A scanner over the built-in catalog.
    pub fn from_config(config: &ProbeConfig, kb: &KnowledgeBase) -> Self {
        Self::new(ProbeRegistry::new(config, kb))
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Scan `tree` to completion.
    pub fn scan(&self, tree: &BrokerSnapshot) -> Result<DiagnosticReport, ScanError> {
        self.scan_with(tree, &ScanControl::new())
    }

    /// Scan `tree`, checking `control` before each entity.
    pub fn scan_with(
        &self,
        tree: &BrokerSnapshot,
        control: &ScanControl,
    ) -> Result<DiagnosticReport, ScanError> {
        let span = debug_span!("scan", cluster = %tree.cluster, parallel = false);
        let _enter = span.enter();

        let entities = self.prepare(tree)?;
        let total = entities.len();

        let mut entries = Vec::with_capacity(total * 2);
        for (evaluated, entity) in entities.iter().enumerate() {
            if control.should_stop() {
                debug!(evaluated, total, "scan cancelled");
                return Err(ScanError::Cancelled { evaluated, total });
            }
            entries.extend(self.evaluate(entity));
        }

        Ok(self.finish(tree, total, entries))
    }

    /// Scan `tree` with entities spread across the rayon thread pool.
    ///
    /// The report is identical to the one [`Scanner::scan_with`] produces.
    pub fn scan_parallel(
        &self,
        tree: &BrokerSnapshot,
        control: &ScanControl,
    ) -> Result<DiagnosticReport, ScanError> {
        let span = debug_span!("scan", cluster = %tree.cluster, parallel = true);
        let _enter = span.enter();

        let entities = self.prepare(tree)?;
        let total = entities.len();
        let evaluated = AtomicUsize::new(0);

        let per_entity: Option<Vec<Vec<ReportEntry>>> = entities
            .par_iter()
            .map(|entity| {
                if control.should_stop() {
                    return None;
                }
                let entries = self.evaluate(entity);
                evaluated.fetch_add(1, Ordering::Relaxed);
                Some(entries)
            })
            .collect();

        let Some(per_entity) = per_entity else {
            let evaluated = evaluated.load(Ordering::Relaxed);
            debug!(evaluated, total, "scan cancelled");
            return Err(ScanError::Cancelled { evaluated, total });
        };

        let entries = per_entity.into_iter().flatten().collect();
        Ok(self.finish(tree, total, entries))
    }

    fn prepare<'a>(&self, tree: &'a BrokerSnapshot) -> Result<Vec<FlatEntity<'a>>, ScanError> {
        let entities = entity::flatten(tree);
        if let Err(err) = entity::validate(&entities) {
            warn!(error = %err, "snapshot rejected");
            return Err(err);
        }
        Ok(entities)
    }

    fn evaluate(&self, entity: &FlatEntity<'_>) -> Vec<ReportEntry> {
        trace!(entity = %entity.reference, "evaluating");
        entity
            .evaluate(&self.registry)
            .into_iter()
            .map(|result| ReportEntry {
                entity: entity.reference.clone(),
                result,
            })
            .collect()
    }

    fn finish(
        &self,
        tree: &BrokerSnapshot,
        entities: usize,
        entries: Vec<ReportEntry>,
    ) -> DiagnosticReport {
        let report =
            DiagnosticReport::new(tree.cluster.clone(), tree.timestamp_ms, entities, entries);
        debug!(
            entities,
            results = report.len(),
            overall = %report.overall_status(),
            "scan complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ComponentType, ProbeId, ProbeStatus};
    use brokerprobe_types::ConnectionState;
    use std::collections::HashSet;
    use std::time::Instant;

    fn scanner() -> Scanner {
        Scanner::from_config(&ProbeConfig::recommended(), &KnowledgeBase::builtin())
    }

    fn cluster() -> BrokerSnapshot {
        BrokerSnapshot::builder()
            .cluster("prod")
            .timestamp_ms(1_700_000_000_000)
            .connection_churn(102.0, 3.0)
            .runtime_processes(1_048_576, 400)
            .node("rabbit@a", |n| {
                n.cores(4)
                    .file_descriptors(1024, 100)
                    .sockets(900, 10)
                    .memory(100, 1000, false)
                    .disk(5000, 50, false)
                    .connection("conn-1", |c| {
                        c.open_channels_limit(2)
                            .channel("ch-1", |ch| ch.prefetch_count(0))
                            .channel("ch-2", |ch| ch.prefetch_count(10).unacknowledged(3))
                    })
            })
            .node("rabbit@b", |n| {
                n.cores(4)
                    .file_descriptors(1024, 10)
                    .sockets(900, 10)
                    .memory(900, 1000, true)
                    .connection("conn-2", |c| c.state(ConnectionState::Blocked))
            })
            .queue("/", "orders", |q| {
                q.consumer_utilization(1.0)
                    .incoming(500, 5.0)
                    .acknowledged(500, 5.0)
            })
            .queue("/", "audit", |q| q.consumer_utilization(0.4).incoming(0, 0.0))
            .build()
    }

    fn status_of(
        report: &DiagnosticReport,
        kind: ComponentType,
        id: &str,
        probe: ProbeId,
    ) -> ProbeStatus {
        report
            .for_entity(kind, id)
            .find(|entry| entry.result.probe == probe)
            .map(|entry| entry.result.status)
            .unwrap()
    }

    #[test]
    fn scan_covers_every_entity_and_probe() {
        let scanner = scanner();
        let report = scanner.scan(&cluster()).unwrap();

        // 3 aggregates, 2 nodes x 4, 2 connections, 2 channels, 2 queues
        assert_eq!(report.entities, 17);
        // 4 aggregate probes, 2 x 6 node-level, 2 x 2 connection,
        // 2 x 2 channel, 2 x 7 queue
        assert_eq!(report.len(), 4 + 12 + 4 + 4 + 14);
        assert_eq!(report.cluster, "prod");
        assert_eq!(report.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn scan_reports_expected_statuses() {
        let report = scanner().scan(&cluster()).unwrap();

        use ComponentType::*;
        assert_eq!(
            status_of(&report, Connectivity, "prod", ProbeId::HIGH_CONNECTION_CREATION_RATE),
            ProbeStatus::Warning
        );
        assert_eq!(
            status_of(&report, Memory, "rabbit@b", ProbeId::MEMORY_ALARM),
            ProbeStatus::Unhealthy
        );
        assert_eq!(
            status_of(&report, Memory, "rabbit@a", ProbeId::MEMORY_ALARM),
            ProbeStatus::Healthy
        );
        assert_eq!(
            status_of(&report, Connection, "conn-1", ProbeId::CHANNEL_LIMIT_REACHED),
            ProbeStatus::Unhealthy
        );
        assert_eq!(
            status_of(&report, Connection, "conn-2", ProbeId::BLOCKED_CONNECTION),
            ProbeStatus::Unhealthy
        );
        assert_eq!(
            status_of(&report, Channel, "ch-1", ProbeId::UNLIMITED_PREFETCH_COUNT),
            ProbeStatus::Warning
        );
        assert_eq!(
            status_of(&report, Queue, "audit", ProbeId::CONSUMER_UTILIZATION),
            ProbeStatus::Unhealthy
        );
        assert_eq!(
            status_of(&report, Queue, "orders", ProbeId::CONSUMER_UTILIZATION),
            ProbeStatus::Healthy
        );
        assert_eq!(report.overall_status(), ProbeStatus::Unhealthy);
    }

    #[test]
    fn every_entry_links_its_own_article() {
        let report = scanner().scan(&cluster()).unwrap();
        for entry in &report {
            assert_eq!(entry.result.kb.id, entry.result.probe);
            assert!(!entry.result.kb.is_unknown());
            assert_eq!(entry.result.component, entry.entity.kind);
        }
    }

    #[test]
    fn one_result_per_entity_and_probe() {
        let report = scanner().scan(&cluster()).unwrap();
        let unique: HashSet<_> = report
            .iter()
            .map(|entry| (&entry.entity, entry.result.probe))
            .collect();
        assert_eq!(unique.len(), report.len());
    }

    #[test]
    fn scans_are_deterministic() {
        let scanner = scanner();
        let tree = cluster();
        let first = scanner.scan(&tree).unwrap().to_json_pretty().unwrap();
        let second = scanner.scan(&tree).unwrap().to_json_pretty().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parallel_scan_matches_sequential() {
        let scanner = scanner();
        let tree = cluster();
        let sequential = scanner.scan(&tree).unwrap();
        let parallel = scanner.scan_parallel(&tree, &ScanControl::new()).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn unconfigured_scan_degrades_to_na() {
        let scanner = Scanner::from_config(&ProbeConfig::default(), &KnowledgeBase::builtin());
        let report = scanner.scan(&cluster()).unwrap();

        for entry in report.for_probe(ProbeId::RUNTIME_PROCESS_LIMIT) {
            assert_eq!(entry.result.status, ProbeStatus::NotApplicable);
            assert_eq!(entry.result.kb.id, ProbeId::RUNTIME_PROCESS_LIMIT);
        }
        for entry in report.for_probe(ProbeId::MEMORY_ALARM) {
            assert_ne!(entry.result.status, ProbeStatus::NotApplicable);
        }
    }

    #[test]
    fn invalid_tree_yields_no_report() {
        let tree = BrokerSnapshot::builder()
            .node("rabbit@a", |n| n)
            .queue("/", "orders", |q| q.consumer_utilization(2.0))
            .build();

        let scanner = scanner();
        assert!(matches!(
            scanner.scan(&tree),
            Err(ScanError::InvalidSnapshot { .. })
        ));
        assert!(matches!(
            scanner.scan_parallel(&tree, &ScanControl::new()),
            Err(ScanError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn cancelled_scan_returns_error() {
        let scanner = scanner();
        let control = ScanControl::new();
        control.cancel();

        match scanner.scan_with(&cluster(), &control) {
            Err(ScanError::Cancelled { evaluated, total }) => {
                assert_eq!(evaluated, 0);
                assert_eq!(total, 17);
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert!(matches!(
            scanner.scan_parallel(&cluster(), &control),
            Err(ScanError::Cancelled { .. })
        ));
    }

    #[test]
    fn expired_deadline_cancels() {
        let control = ScanControl::new().with_deadline(Instant::now());
        assert!(matches!(
            scanner().scan_with(&cluster(), &control),
            Err(ScanError::Cancelled { .. })
        ));
    }

    #[test]
    fn empty_registry_yields_empty_report() {
        let scanner = Scanner::new(ProbeRegistry::empty());
        let report = scanner.scan(&cluster()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.entities, 17);
        assert_eq!(report.overall_status(), ProbeStatus::NotApplicable);
    }
}
