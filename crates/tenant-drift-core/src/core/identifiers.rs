// crates/tenant-drift-core/src/core/identifiers.rs
// ============================================================================
// Module: Tenant Drift Identifiers
// Description: Record keys, environment labels, and section descriptors.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque and serialize as plain strings. Record keys are
//! derived by adapters and are the only thing the engine uses to pair records
//! across environments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Record Key
// ============================================================================

/// Natural key used to match records across environments.
///
/// # Invariants
/// - Opaque UTF-8 string; tuple keys are pre-joined by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Creates a new record key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Environment
// ============================================================================

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Reference environment.
    A,
    /// Environment compared against the reference.
    B,
}

impl Environment {
    /// Returns the display label used in entries and actions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Env A",
            Self::B => "Env B",
        }
    }

    /// Returns the opposite environment.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Section Descriptor
// ============================================================================

/// Stable identity of a report section (one entity type).
///
/// # Invariants
/// - `id` is kebab-case and unique across the adapter registry.
/// - `title` doubles as the category written into every entry of the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionInfo {
    /// Kebab-case section identifier used for selection and snapshots.
    pub id: &'static str,
    /// Human-readable title and entry category.
    pub title: &'static str,
}

impl SectionInfo {
    /// Creates a section descriptor.
    #[must_use]
    pub const fn new(id: &'static str, title: &'static str) -> Self {
        Self {
            id,
            title,
        }
    }
}
