// crates/tenant-drift-core/src/lib.rs
// ============================================================================
// Module: Tenant Drift Core Library
// Description: Public API surface for the Tenant Drift core.
// Purpose: Expose record types, interfaces, and the reconciliation runtime.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Tenant Drift core reconciles two environments' configuration records into
//! a deterministic stream of differences and matches. It is backend-agnostic:
//! upstream data arrives through the [`CollectionSource`] interface and
//! results leave as a [`ComparisonReport`] value that exporters consume.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::DriftAuditEvent;
pub use audit::DriftAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use interfaces::ApiHost;
pub use interfaces::CollectionSource;
pub use interfaces::FetchError;
pub use interfaces::ResourcePath;
pub use runtime::AttributeSpec;
pub use runtime::CompareSpec;
pub use runtime::ComparePolicy;
pub use runtime::Comparison;
pub use runtime::ComparisonReport;
pub use runtime::ExportError;
pub use runtime::ExportKind;
pub use runtime::Extract;
pub use runtime::FetchTally;
pub use runtime::Outcome;
pub use runtime::Placement;
pub use runtime::Reconciliation;
pub use runtime::SectionReport;
pub use runtime::SignatureSpec;
pub use runtime::SnapshotReport;
pub use runtime::SnapshotSection;
pub use runtime::Templates;
pub use runtime::UnavailableMode;
pub use runtime::UnmatchedB;
pub use runtime::reconcile;
pub use runtime::reconcile_nested;
