// crates/tenant-drift-entities/src/lib.rs
// ============================================================================
// Module: Tenant Drift Entities
// Description: Built-in Okta entity adapters and the run registry.
// Purpose: Map each Okta configuration area onto the reconciliation engine.
// Dependencies: tenant-drift-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate ships one adapter per report section. Most sections are plain
//! [`CollectionAdapter`] values: an endpoint, a natural key, and a compare
//! spec. Sections with dependent requests (policy rules, brand themes, mapping
//! details) implement [`EntityAdapter`] directly on the same engine.
//! Invariants:
//! - Sections run in [`AdapterRegistry::builtin`] order.
//! - Adapters never fail a run; fetch failures surface as notices or
//!   `Unavailable` entries.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapter;
pub mod admin;
pub mod apps;
pub mod authorization;
pub mod branding;
pub mod directory;
pub mod identity;
pub mod network;
pub mod policies;
pub mod profiles;
pub mod registry;
pub mod security;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adapter::CollectionAdapter;
pub use adapter::CompareContext;
pub use adapter::CompareOptions;
pub use adapter::EntityAdapter;
pub use adapter::SnapshotContext;
pub use registry::AdapterRegistry;
pub use registry::RunError;
