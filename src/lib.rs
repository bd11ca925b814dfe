//! # brokerprobe
//!
//! A diagnostics probe engine for message broker snapshots.
//!
//! Given a point-in-time [`BrokerSnapshot`] of a RabbitMQ-style cluster
//! (nodes, their OS process, memory and disk, connections, channels, virtual
//! hosts and queues, plus cluster-wide aggregates), the engine runs a catalog
//! of small health probes over every entity and collects the results into a
//! [`DiagnosticReport`]. Each result carries a status and the knowledge base
//! article that explains the finding and how to fix it.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────────────────────────────────────┐
//! │   source   │──▶│                   engine                    │
//! │ File/Chan  │   │  flatten ─▶ validate ─▶ evaluate per entity │
//! └────────────┘   └──────────────┬──────────────────────────────┘
//!                                 │ ProbeRegistry (probe + config)
//!                                 │ KnowledgeBase (articles)
//!                                 ▼
//!                          DiagnosticReport
//! ```
//!
//! - **[`probe`]**: the [`Probe`] trait, statuses, and the 21 built-in probes
//! - **[`knowledge`]**: the read-only [`KnowledgeBase`] of articles
//! - **[`engine`]**: the [`Scanner`], traversal order and validation
//! - **[`report`]**: [`DiagnosticReport`] and its queries
//! - **[`config`]**: [`ProbeConfig`] thresholds, loaded from file and env
//! - **[`source`]**: [`DataSource`] implementations that supply snapshots
//!
//! ## Usage
//!
//! ```
//! use brokerprobe::{BrokerSnapshot, KnowledgeBase, ProbeConfig, ProbeStatus, Scanner};
//!
//! let kb = KnowledgeBase::builtin();
//! let scanner = Scanner::from_config(&ProbeConfig::recommended(), &kb);
//!
//! let snapshot = BrokerSnapshot::builder()
//!     .cluster("prod")
//!     .node("rabbit@a", |n| n.cores(4).memory(900, 1000, true))
//!     .build();
//!
//! let report = scanner.scan(&snapshot).unwrap();
//! assert_eq!(report.overall_status(), ProbeStatus::Unhealthy);
//!
//! for entry in report.problems() {
//!     println!("{}: {} ({})", entry.entity, entry.result.name, entry.result.kb.remediation);
//! }
//! ```
//!
//! Thresholds that are not configured turn the matching probes off: they
//! report `NA` instead of guessing.

pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod probe;
pub mod report;
pub mod source;

pub use brokerprobe_types::{self as types, BrokerSnapshot};
pub use config::ProbeConfig;
pub use engine::{ScanControl, Scanner};
pub use error::{ConfigError, ScanError, SourceError};
pub use knowledge::{KnowledgeBase, KnowledgeBaseArticle};
pub use probe::{
    ComponentType, Probe, ProbeCategory, ProbeData, ProbeId, ProbeRegistry, ProbeResult,
    ProbeStatus,
};
pub use report::{DiagnosticReport, EntityRef, ReportEntry, ReportSummary};
pub use source::{read_snapshot, ChannelSource, DataSource, FileSource};
