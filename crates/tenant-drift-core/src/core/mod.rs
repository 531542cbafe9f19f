// crates/tenant-drift-core/src/core/mod.rs
// ============================================================================
// Module: Tenant Drift Core Types
// Description: Record, identifier, severity, entry, and signature types.
// Purpose: Group the data model shared by the engine, adapters, and exporters.
// Dependencies: serde, serde_json, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! The core types describe what a reconciliation consumes (records and keys)
//! and what it produces (diff, match, and notice entries).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod entries;
pub mod identifiers;
pub mod record;
pub mod severity;
pub mod signature;
pub mod summary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entries::DiffEntry;
pub use entries::EXISTENCE_ATTRIBUTE;
pub use entries::MatchEntry;
pub use entries::Notice;
pub use entries::NoticeKind;
pub use identifiers::Environment;
pub use identifiers::RecordKey;
pub use identifiers::SectionInfo;
pub use record::Record;
pub use severity::DifferenceType;
pub use severity::Priority;
pub use signature::HashDigest;
pub use signature::Signature;
pub use signature::SignatureError;
pub use summary::PriorityCounts;
pub use summary::SectionStatus;
pub use summary::SectionSummary;
