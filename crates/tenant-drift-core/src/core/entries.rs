// crates/tenant-drift-core/src/core/entries.rs
// ============================================================================
// Module: Reconciliation Entries
// Description: Diff, match, and notice records produced by reconciliation.
// Purpose: Define the flat, serializable rows shared by reports and exports.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every reconciliation run produces three row kinds. [`DiffEntry`] rows carry
//! a classification and priority, [`MatchEntry`] rows carry the single value
//! both environments agree on, and [`Notice`] rows describe data the run
//! could not inspect (unavailable fetches, key collisions).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::Environment;
use crate::core::severity::DifferenceType;
use crate::core::severity::Priority;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attribute label used by existence (missing/extra) rows.
pub const EXISTENCE_ATTRIBUTE: &str = "-";

/// Value shown for the side where an object exists.
pub const EXISTS: &str = "Exists";

/// Value shown for the side where an object is absent.
pub const MISSING: &str = "Missing";

// ============================================================================
// SECTION: Diff Entry
// ============================================================================

/// One difference between the two environments.
///
/// # Invariants
/// - `priority == difference_type.priority()` for engine-produced entries.
/// - Values are raw JSON and are rendered to text only for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Entity category (section title).
    pub category: String,
    /// Display name of the object, optionally parent-qualified.
    pub object: String,
    /// Compared attribute, or `-` for existence rows.
    pub attribute: String,
    /// Value observed in Env A.
    pub value_a: Value,
    /// Value observed in Env B.
    pub value_b: Value,
    /// Classification of the difference.
    pub difference_type: DifferenceType,
    /// Free-text impact tag.
    pub impact: String,
    /// Free-text recommended remediation.
    pub recommended_action: String,
    /// Severity of the difference.
    pub priority: Priority,
}

// ============================================================================
// SECTION: Match Entry
// ============================================================================

/// One attribute on which both environments agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    /// Entity category (section title).
    pub category: String,
    /// Display name of the object, optionally parent-qualified.
    pub object: String,
    /// Compared attribute.
    pub attribute: String,
    /// The agreed value.
    pub value: Value,
}

// ============================================================================
// SECTION: Notices
// ============================================================================

/// Kinds of non-diff observations recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A collection or detail could not be fetched.
    DataUnavailable,
    /// Two records in one environment produced the same key.
    KeyCollision,
    /// Records produced no key and were skipped.
    UnkeyedRecords,
}

impl NoticeKind {
    /// Returns the display label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DataUnavailable => "Data Unavailable",
            Self::KeyCollision => "Key Collision",
            Self::UnkeyedRecords => "Unkeyed Records",
        }
    }
}

/// Observation attached to a section that is not a configuration difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Notice classification.
    pub kind: NoticeKind,
    /// Environment the notice concerns, when specific to one side.
    pub environment: Option<Environment>,
    /// Resource or object the notice concerns.
    pub resource: String,
    /// Human-readable detail.
    pub message: String,
}

impl Notice {
    /// Creates a data-unavailable notice for one environment.
    #[must_use]
    pub fn unavailable(
        environment: Environment,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: NoticeKind::DataUnavailable,
            environment: Some(environment),
            resource: resource.into(),
            message: message.into(),
        }
    }
}
