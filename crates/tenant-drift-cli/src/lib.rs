// crates/tenant-drift-cli/src/lib.rs
// ============================================================================
// Module: Tenant Drift CLI Library
// Description: Shared CLI helpers for the tenant-drift binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: Standard library only.
// ============================================================================

//! ## Overview
//! Library half of the `tenant-drift` CLI. User-facing strings live in the
//! [`i18n`] catalog and are formatted through the [`t!`] macro.

pub mod i18n;
