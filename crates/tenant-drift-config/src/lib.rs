// crates/tenant-drift-config/src/lib.rs
// ============================================================================
// Module: Tenant Drift Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for tenant-drift.toml semantics.
// Dependencies: tenant-drift-core, tenant-drift-entities, tenant-drift-okta, serde, toml
// ============================================================================

//! ## Overview
//! `tenant-drift-config` defines the configuration model for comparison and
//! snapshot runs: the two tenants, HTTP client limits, section selection, and
//! the audit sink. Loading is strict and fails closed; credentials are never
//! defaulted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
