//! Diagnostic reports: every probe result of one scan, tagged with the entity
//! it was produced for.

use std::fmt;

use serde::Serialize;

use crate::probe::{ComponentType, ProbeId, ProbeResult, ProbeStatus};

/// Identifies one entity of the broker tree.
///
/// `parent` disambiguates entities whose identifiers are only unique within
/// their container: connections within a node, channels within a connection
/// (`node/connection`), queues within a virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub kind: ComponentType,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl EntityRef {
    pub fn new(kind: ComponentType, id: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            kind,
            id: id.into(),
            parent: parent.map(str::to_string),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)?;
        if let Some(parent) = &self.parent {
            write!(f, " in '{}'", parent)?;
        }
        Ok(())
    }
}

/// One probe result and the entity it describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub entity: EntityRef,
    pub result: ProbeResult,
}

/// Result counts for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReportSummary {
    pub entities: usize,
    pub results: usize,
    pub not_applicable: usize,
    pub healthy: usize,
    pub inconclusive: usize,
    pub warning: usize,
    pub unhealthy: usize,
}

impl ReportSummary {
    /// Count for one status.
    pub fn count(&self, status: ProbeStatus) -> usize {
        match status {
            ProbeStatus::NotApplicable => self.not_applicable,
            ProbeStatus::Healthy => self.healthy,
            ProbeStatus::Inconclusive => self.inconclusive,
            ProbeStatus::Warning => self.warning,
            ProbeStatus::Unhealthy => self.unhealthy,
        }
    }

    fn record(&mut self, status: ProbeStatus) {
        let slot = match status {
            ProbeStatus::NotApplicable => &mut self.not_applicable,
            ProbeStatus::Healthy => &mut self.healthy,
            ProbeStatus::Inconclusive => &mut self.inconclusive,
            ProbeStatus::Warning => &mut self.warning,
            ProbeStatus::Unhealthy => &mut self.unhealthy,
        };
        *slot += 1;
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} results over {} entities: {} unhealthy, {} warning, {} inconclusive, {} healthy, {} NA",
            self.results,
            self.entities,
            self.unhealthy,
            self.warning,
            self.inconclusive,
            self.healthy,
            self.not_applicable
        )
    }
}

/// The outcome of a scan.
///
/// Entries appear in traversal order, and within one entity in probe
/// registration order, so equal inputs serialize to identical JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiagnosticReport {
    pub cluster: String,
    /// Timestamp of the snapshot the report was produced from.
    pub timestamp_ms: u64,
    /// Number of entities that were scanned.
    pub entities: usize,
    pub entries: Vec<ReportEntry>,
}

impl DiagnosticReport {
    pub fn new(
        cluster: impl Into<String>,
        timestamp_ms: u64,
        entities: usize,
        entries: Vec<ReportEntry>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            timestamp_ms,
            entities,
            entries,
        }
    }

    /// The worst status in the report; `NA` for an empty report.
    pub fn overall_status(&self) -> ProbeStatus {
        self.entries
            .iter()
            .map(|entry| entry.result.status)
            .max()
            .unwrap_or(ProbeStatus::NotApplicable)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            entities: self.entities,
            results: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            summary.record(entry.result.status);
        }
        summary
    }

    pub fn by_status(&self, status: ProbeStatus) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.result.status == status)
    }

    /// Entries with a Warning or Unhealthy status.
    pub fn problems(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.result.status.is_problem())
    }

    /// Every result for entities of `kind` named `id`, whatever their parent.
    pub fn for_entity<'a>(
        &'a self,
        kind: ComponentType,
        id: &'a str,
    ) -> impl Iterator<Item = &'a ReportEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.entity.kind == kind && entry.entity.id == id)
    }

    pub fn for_probe(&self, probe: ProbeId) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.result.probe == probe)
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a DiagnosticReport {
    type Item = &'a ReportEntry;
    type IntoIter = std::slice::Iter<'a, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
