// crates/tenant-drift-core/src/core/summary.rs
// ============================================================================
// Module: Section Summaries
// Description: Per-section pass/fail status and priority counts.
// Purpose: Provide the numeric roll-up shown beside every report section.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A section summary is derived from its entries and is never edited
//! independently. Notices that mark data as unavailable turn a section
//! without differences into [`SectionStatus::Unavailable`] rather than a pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::entries::DiffEntry;
use crate::core::entries::Notice;
use crate::core::entries::NoticeKind;
use crate::core::severity::Priority;

// ============================================================================
// SECTION: Priority Counts
// ============================================================================

/// Number of differences per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    /// Critical differences.
    pub critical: usize,
    /// Medium differences.
    pub medium: usize,
    /// Low differences.
    pub low: usize,
}

impl PriorityCounts {
    /// Counts priorities across diff entries.
    #[must_use]
    pub fn from_diffs(diffs: &[DiffEntry]) -> Self {
        let mut counts = Self::default();
        for diff in diffs {
            counts.add(diff.priority, 1);
        }
        counts
    }

    /// Adds `amount` to the bucket for `priority`.
    pub const fn add(&mut self, priority: Priority, amount: usize) {
        match priority {
            Priority::Critical => self.critical += amount,
            Priority::Medium => self.medium += amount,
            Priority::Low => self.low += amount,
        }
    }

    /// Returns the count for one priority.
    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.critical,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// Returns the sum over all priorities.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.critical + self.medium + self.low
    }

    /// Merges another set of counts into this one.
    pub const fn merge(&mut self, other: &Self) {
        self.critical += other.critical;
        self.medium += other.medium;
        self.low += other.low;
    }
}

// ============================================================================
// SECTION: Section Summary
// ============================================================================

/// Overall outcome of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// No differences and all data was available.
    Pass,
    /// At least one difference.
    Fail,
    /// No differences, but some data could not be fetched.
    Unavailable,
}

impl SectionStatus {
    /// Returns the display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

/// Numeric roll-up for one report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// Section status.
    pub status: SectionStatus,
    /// Differences per priority.
    pub priority_counts: PriorityCounts,
    /// Total number of differences.
    pub total_diffs: usize,
    /// Total number of matches.
    pub total_matches: usize,
}

impl SectionSummary {
    /// Computes the summary for a section's entries.
    #[must_use]
    pub fn compute(diffs: &[DiffEntry], match_count: usize, notices: &[Notice]) -> Self {
        let unavailable = notices.iter().any(|notice| notice.kind == NoticeKind::DataUnavailable);
        let status = if !diffs.is_empty() {
            SectionStatus::Fail
        } else if unavailable {
            SectionStatus::Unavailable
        } else {
            SectionStatus::Pass
        };
        Self {
            status,
            priority_counts: PriorityCounts::from_diffs(diffs),
            total_diffs: diffs.len(),
            total_matches: match_count,
        }
    }
}
