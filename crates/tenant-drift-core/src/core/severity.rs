// crates/tenant-drift-core/src/core/severity.rs
// ============================================================================
// Module: Severity Taxonomy
// Description: Priority levels and difference classifications.
// Purpose: Replace free-text severity tags with ordered enums.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Severity is a fixed three-tier mapping: existence gaps are critical,
//! attribute drift is medium, and unexpected extras are low. Display glyphs
//! are produced only at the presentation boundary via [`Priority::glyph`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Priority
// ============================================================================

/// Severity of a difference.
///
/// # Invariants
/// - Total order: `Low < Medium < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Review-only drift (extra objects in Env B).
    Low,
    /// Attribute drift between matched objects.
    Medium,
    /// Access or availability gap (missing objects).
    Critical,
}

impl Priority {
    /// All priorities from most to least severe.
    pub const DESCENDING: [Self; 3] = [Self::Critical, Self::Medium, Self::Low];

    /// Returns the plain-text label used in exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::Critical => "Critical",
        }
    }

    /// Returns the colored marker used in rendered reports.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Low => "\u{1f7e1}",
            Self::Medium => "\u{1f7e0}",
            Self::Critical => "\u{1f534}",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Marker shown next to match rows in rendered reports.
pub const MATCH_GLYPH: &str = "\u{1f7e2}";

// ============================================================================
// SECTION: Difference Type
// ============================================================================

/// Classification of a difference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceType {
    /// Present in Env A, absent from Env B.
    MissingInB,
    /// Present in Env B, absent from Env A, where absence in A is the gap.
    MissingInA,
    /// Present in Env B only, flagged for review.
    ExtraInB,
    /// Present in both with differing attribute values.
    Mismatch,
}

impl DifferenceType {
    /// Returns the display label used in reports and exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingInB => "Missing in Env B",
            Self::MissingInA => "Missing in Env A",
            Self::ExtraInB => "Extra in Env B",
            Self::Mismatch => "Mismatch",
        }
    }

    /// Returns the fixed priority for this classification.
    #[must_use]
    pub const fn priority(self) -> Priority {
        match self {
            Self::MissingInB | Self::MissingInA => Priority::Critical,
            Self::Mismatch => Priority::Medium,
            Self::ExtraInB => Priority::Low,
        }
    }
}

impl fmt::Display for DifferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_total() {
        assert!(Priority::Critical > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        let mut levels = vec![Priority::Low, Priority::Critical, Priority::Medium];
        levels.sort_by(|a, b| b.cmp(a));
        assert_eq!(levels, Priority::DESCENDING.to_vec());
    }

    #[test]
    fn difference_types_map_to_fixed_priorities() {
        assert_eq!(DifferenceType::MissingInB.priority(), Priority::Critical);
        assert_eq!(DifferenceType::MissingInA.priority(), Priority::Critical);
        assert_eq!(DifferenceType::Mismatch.priority(), Priority::Medium);
        assert_eq!(DifferenceType::ExtraInB.priority(), Priority::Low);
    }
}
