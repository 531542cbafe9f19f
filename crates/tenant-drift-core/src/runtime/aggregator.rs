// crates/tenant-drift-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Report Aggregator
// Description: Section reports and the comparison report value.
// Purpose: Collect per-section entries into one identifiable report.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Sections are aggregated purely additively: the report is the ordered
//! concatenation of every section's entries with per-priority totals. The
//! report is a plain value handed to exporters; nothing is cached between
//! runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::entries::DiffEntry;
use crate::core::entries::MatchEntry;
use crate::core::entries::Notice;
use crate::core::identifiers::SectionInfo;
use crate::core::signature::SignatureError;
use crate::core::signature::canonical_json_bytes;
use crate::core::signature::hash_canonical_json;
use crate::core::summary::PriorityCounts;
use crate::core::summary::SectionStatus;
use crate::core::summary::SectionSummary;
use crate::runtime::engine::Reconciliation;

// ============================================================================
// SECTION: Unavailable Mode
// ============================================================================

/// Treatment of a collection that could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableMode {
    /// Record a Data Unavailable notice and skip reconciliation.
    #[default]
    Report,
    /// Substitute an empty collection and reconcile anyway.
    TreatAsEmpty,
}

// ============================================================================
// SECTION: Section Report
// ============================================================================

/// Entries and summary for one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    /// Section identifier.
    pub id: String,
    /// Section title.
    pub title: String,
    /// Difference entries in discovery order.
    pub diffs: Vec<DiffEntry>,
    /// Match entries in discovery order.
    pub matches: Vec<MatchEntry>,
    /// Notices raised while building the section.
    pub notices: Vec<Notice>,
    /// Derived summary.
    pub summary: SectionSummary,
}

impl SectionReport {
    /// Builds a section report from a reconciliation and extra notices.
    #[must_use]
    pub fn new(info: SectionInfo, reconciliation: Reconciliation, mut notices: Vec<Notice>) -> Self {
        notices.extend(reconciliation.notices(info.id));
        let summary =
            SectionSummary::compute(&reconciliation.diffs, reconciliation.matches.len(), &notices);
        Self {
            id: info.id.to_string(),
            title: info.title.to_string(),
            diffs: reconciliation.diffs,
            matches: reconciliation.matches,
            notices,
            summary,
        }
    }
}

// ============================================================================
// SECTION: Fetch Tally
// ============================================================================

/// Fetch outcome counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTally {
    /// Successful fetches.
    pub completed: usize,
    /// Failed fetches, timeouts included.
    pub failed: usize,
    /// Failed fetches that timed out.
    pub timed_out: usize,
}

impl FetchTally {
    /// Returns true when at least one fetch ran and every fetch timed out.
    #[must_use]
    pub const fn all_timed_out(&self) -> bool {
        self.completed == 0 && self.timed_out > 0 && self.timed_out == self.failed
    }
}

// ============================================================================
// SECTION: Comparison Report
// ============================================================================

/// Identity fields hashed into the report id.
#[derive(Serialize)]
struct ReportIdentity<'a> {
    /// Env A label.
    env_a: &'a str,
    /// Env B label.
    env_b: &'a str,
    /// Generation time.
    generated_at_ms: u64,
    /// Section ids with their summaries.
    sections: Vec<(&'a str, &'a SectionSummary)>,
}

/// Complete result of one comparison run.
///
/// # Invariants
/// - `report_id` is the SHA-256 of the canonical JSON of the environment
///   labels, generation time, and per-section summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Content-derived report identifier.
    pub report_id: String,
    /// Generation time (milliseconds since epoch).
    pub generated_at_ms: u64,
    /// Env A label.
    pub env_a: String,
    /// Env B label.
    pub env_b: String,
    /// Sections in run order.
    pub sections: Vec<SectionReport>,
    /// Fetch outcome counters.
    #[serde(default)]
    pub fetches: FetchTally,
}

impl ComparisonReport {
    /// Assembles a report stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the identity cannot be canonicalized.
    pub fn assemble(
        env_a: impl Into<String>,
        env_b: impl Into<String>,
        sections: Vec<SectionReport>,
        fetches: FetchTally,
    ) -> Result<Self, SignatureError> {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let generated_at_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        Self::assemble_at(env_a, env_b, sections, fetches, generated_at_ms)
    }

    /// Assembles a report with an explicit generation time.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the identity cannot be canonicalized.
    pub fn assemble_at(
        env_a: impl Into<String>,
        env_b: impl Into<String>,
        sections: Vec<SectionReport>,
        fetches: FetchTally,
        generated_at_ms: u64,
    ) -> Result<Self, SignatureError> {
        let env_a = env_a.into();
        let env_b = env_b.into();
        let identity = ReportIdentity {
            env_a: &env_a,
            env_b: &env_b,
            generated_at_ms,
            sections: sections.iter().map(|section| (section.id.as_str(), &section.summary)).collect(),
        };
        let report_id = hash_canonical_json(&identity)?.as_str().to_string();
        Ok(Self {
            report_id,
            generated_at_ms,
            env_a,
            env_b,
            sections,
            fetches,
        })
    }

    /// Returns per-priority totals across all sections.
    #[must_use]
    pub fn totals(&self) -> PriorityCounts {
        let mut totals = PriorityCounts::default();
        for section in &self.sections {
            totals.merge(&section.summary.priority_counts);
        }
        totals
    }

    /// Returns the total number of differences.
    #[must_use]
    pub fn total_diffs(&self) -> usize {
        self.sections.iter().map(|section| section.diffs.len()).sum()
    }

    /// Returns the total number of matches.
    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.sections.iter().map(|section| section.matches.len()).sum()
    }

    /// Returns true when any section has a difference.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.sections.iter().any(|section| !section.diffs.is_empty())
    }

    /// Iterates all differences in section order.
    pub fn diffs(&self) -> impl Iterator<Item = &DiffEntry> {
        self.sections.iter().flat_map(|section| section.diffs.iter())
    }

    /// Iterates all matches in section order.
    pub fn matches(&self) -> impl Iterator<Item = &MatchEntry> {
        self.sections.iter().flat_map(|section| section.matches.iter())
    }

    /// Counts sections with a given status.
    #[must_use]
    pub fn sections_with_status(&self, status: SectionStatus) -> usize {
        self.sections.iter().filter(|section| section.summary.status == status).count()
    }

    /// Returns true when the run produced no data because every fetch timed out.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        self.fetches.all_timed_out()
    }

    /// Formats the generation time as RFC 3339.
    #[must_use]
    pub fn generated_at_rfc3339(&self) -> String {
        let nanos = i128::from(self.generated_at_ms) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|moment| moment.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.generated_at_ms.to_string())
    }

    /// Serializes the report as RFC 8785 canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when serialization fails.
    pub fn to_canonical_json(&self) -> Result<String, SignatureError> {
        let bytes = canonical_json_bytes(self)?;
        String::from_utf8(bytes).map_err(|err| SignatureError::Canonicalization(err.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;
    use crate::core::entries::NoticeKind;
    use crate::core::identifiers::Environment;
    use crate::core::severity::DifferenceType;
    use crate::core::severity::Priority;

    fn diff(priority_type: DifferenceType) -> DiffEntry {
        DiffEntry {
            category: "Groups".to_string(),
            object: "Finance".to_string(),
            attribute: "-".to_string(),
            value_a: json!("Exists"),
            value_b: json!("Missing"),
            difference_type: priority_type,
            impact: "Access".to_string(),
            recommended_action: "Create group".to_string(),
            priority: priority_type.priority(),
        }
    }

    #[test]
    fn unavailable_section_without_diffs_is_not_a_pass() {
        let notice = Notice::unavailable(Environment::B, "/api/v1/groups", "status 500");
        let section = SectionReport::new(
            SectionInfo::new("groups", "Groups"),
            Reconciliation::default(),
            vec![notice],
        );
        assert_eq!(section.summary.status, SectionStatus::Unavailable);
        assert_eq!(section.notices[0].kind, NoticeKind::DataUnavailable);
    }

    #[test]
    fn totals_are_additive_across_sections() {
        let mut first = Reconciliation::default();
        first.diffs.push(diff(DifferenceType::MissingInB));
        first.diffs.push(diff(DifferenceType::ExtraInB));
        let mut second = Reconciliation::default();
        second.diffs.push(diff(DifferenceType::Mismatch));
        let sections = vec![
            SectionReport::new(SectionInfo::new("groups", "Groups"), first, Vec::new()),
            SectionReport::new(SectionInfo::new("realms", "Realms"), second, Vec::new()),
        ];
        let report =
            ComparisonReport::assemble_at("a", "b", sections, FetchTally::default(), 0).unwrap();
        let totals = report.totals();
        assert_eq!(totals.get(Priority::Critical), 1);
        assert_eq!(totals.get(Priority::Medium), 1);
        assert_eq!(totals.get(Priority::Low), 1);
        assert_eq!(report.total_diffs(), 3);
        assert!(report.has_drift());
        assert_eq!(report.sections_with_status(SectionStatus::Fail), 2);
    }

    #[test]
    fn report_id_is_deterministic_and_json_round_trips() {
        let build = || {
            ComparisonReport::assemble_at("a.okta.com", "b.okta.com", Vec::new(), FetchTally::default(), 42)
                .unwrap()
        };
        let report = build();
        assert_eq!(report.report_id, build().report_id);
        assert_eq!(report.report_id.len(), 64);
        let text = report.to_canonical_json().unwrap();
        let parsed: ComparisonReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
        assert!(report.generated_at_rfc3339().starts_with("1970-01-01T00:00:00"));
    }

    #[test]
    fn timeout_requires_every_fetch_to_time_out() {
        let all = FetchTally {
            completed: 0,
            failed: 4,
            timed_out: 4,
        };
        let partial = FetchTally {
            completed: 1,
            failed: 4,
            timed_out: 4,
        };
        assert!(all.all_timed_out());
        assert!(!partial.all_timed_out());
        assert!(!FetchTally::default().all_timed_out());
    }
}
