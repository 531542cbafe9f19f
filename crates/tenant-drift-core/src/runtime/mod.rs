// crates/tenant-drift-core/src/runtime/mod.rs
// ============================================================================
// Module: Tenant Drift Runtime
// Description: Reconciliation engine, aggregation, and exporters.
// Purpose: Turn fetched collections into reports and export documents.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The runtime is deterministic: the same inputs always produce the same
//! entries in the same order.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregator;
pub mod engine;
pub mod export;
pub mod snapshot;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregator::ComparisonReport;
pub use aggregator::FetchTally;
pub use aggregator::SectionReport;
pub use aggregator::UnavailableMode;
pub use engine::AttributeSpec;
pub use engine::CompareSpec;
pub use engine::ComparePolicy;
pub use engine::Comparison;
pub use engine::Extract;
pub use engine::Outcome;
pub use engine::Placement;
pub use engine::Reconciliation;
pub use engine::SignatureSpec;
pub use engine::Templates;
pub use engine::UnmatchedB;
pub use engine::reconcile;
pub use engine::reconcile_nested;
pub use export::ExportError;
pub use export::ExportKind;
pub use snapshot::SnapshotReport;
pub use snapshot::SnapshotSection;
