// crates/tenant-drift-okta/src/lib.rs
// ============================================================================
// Module: Tenant Drift Okta Library
// Description: Blocking Okta REST client for tenant configuration reads.
// Purpose: Implement the collection source used by entity adapters.
// Dependencies: tenant-drift-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`OktaHttpSource`] implements [`tenant_drift_core::CollectionSource`] over
//! the Okta management API. It issues read-only GET requests, follows
//! `Link: rel="next"` pagination, bounds every response and page count, and
//! classifies failures into [`tenant_drift_core::FetchError`] variants.
//! Security posture: API tokens are never logged or echoed, and pagination
//! links that leave the tenant origin are rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod domain;
pub mod pagination;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::OktaClientConfig;
pub use client::OktaEnvironment;
pub use client::OktaHttpSource;
pub use domain::admin_base;
pub use domain::org_base;
pub use pagination::next_link;
