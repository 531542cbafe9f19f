// crates/tenant-drift-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalog and placeholder substitution.
// Purpose: Ensure user-facing CLI strings resolve through the catalog.
// Dependencies: tenant-drift-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates the tenant-drift CLI i18n catalog behavior:
//! - Translation falls back to keys on misses.
//! - The [`t!`](tenant_drift_cli::t) macro formats placeholders.
//! - The failure and timeout messages read exactly as users see them.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use tenant_drift_cli::i18n::MessageArg;
use tenant_drift_cli::i18n::translate;
use tenant_drift_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms catalog entries resolve and replace placeholders.
#[test]
fn translate_substitutes_placeholders() {
    let args = vec![MessageArg::new("path", "/tmp/report.json")];
    assert_eq!(translate("compare.saved", args), "Report saved to /tmp/report.json");
}

/// Confirms missing keys fall back to the key string.
#[test]
fn translate_falls_back_to_key() {
    assert_eq!(translate("missing.key", Vec::new()), "missing.key");
}

/// Confirms the t! macro formats named arguments.
#[test]
fn t_macro_formats_message() {
    let rendered = t!("main.version", version = "0.1.0");
    assert_eq!(rendered, "tenant-drift 0.1.0");
}

/// Confirms the generic failure and timeout wording.
#[test]
fn failure_messages_match_user_wording() {
    assert_eq!(
        t!("compare.failed"),
        "Something Went Wrong: We hit an unexpected error while building the report. Please retry."
    );
    assert_eq!(
        t!("compare.timed_out"),
        "Request Timed Out: Okta took too long to respond. Please try again in a moment."
    );
}
