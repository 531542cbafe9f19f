// crates/tenant-drift-entities/tests/runner.rs
// ============================================================================
// Module: Comparison Run Tests
// Description: Registry runs over the HTTP source against local servers.
// Purpose: Verify upstream failures under both unavailable modes end to end.
// ============================================================================

//! ## Overview
//! Two `tiny_http` servers stand in for Env A and Env B. Env B answers every
//! request with status 500.

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

mod common;

use std::thread;
use std::time::Duration;

use tenant_drift_core::DifferenceType;
use tenant_drift_core::NoticeKind;
use tenant_drift_core::SectionStatus;
use tenant_drift_core::UnavailableMode;
use tenant_drift_entities::AdapterRegistry;
use tenant_drift_entities::CompareOptions;
use tenant_drift_okta::OktaClientConfig;
use tenant_drift_okta::OktaEnvironment;
use tenant_drift_okta::OktaHttpSource;
use tiny_http::Response;
use tiny_http::Server;

use crate::common::RecordingSink;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Env A groups payload.
const GROUPS: &str = r#"[
    {"id": "g1", "profile": {"name": "Finance", "description": "Finance team"}},
    {"id": "g2", "profile": {"name": "Engineering", "description": "Builders"}}
]"#;

/// Starts a server answering every request with `status` and `body`.
fn serve(status: u16, body: &'static str) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
            let _ = request.respond(Response::from_string(body).with_status_code(status));
        }
    });
    format!("http://{addr}")
}

fn source(base: &str) -> OktaHttpSource {
    OktaHttpSource::new(
        &OktaEnvironment {
            domain: base.to_string(),
            token: "secret-token".to_string(),
        },
        OktaClientConfig {
            allow_http: true,
            timeout_ms: 5_000,
            ..OktaClientConfig::default()
        },
    )
    .unwrap()
}

fn run_groups(unavailable: UnavailableMode) -> (tenant_drift_core::ComparisonReport, RecordingSink) {
    let env_a = source(&serve(200, GROUPS));
    let env_b = source(&serve(500, r#"{"errorCode": "E0000009"}"#));
    let sink = RecordingSink::default();
    let options = CompareOptions {
        unavailable,
        ..CompareOptions::default()
    };
    let report = AdapterRegistry::builtin()
        .run_comparison(&env_a, &env_b, options, &["groups".to_string()], &sink)
        .unwrap();
    (report, sink)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn upstream_500_reports_data_unavailable() {
    let (report, sink) = run_groups(UnavailableMode::Report);
    let section = &report.sections[0];

    assert!(section.diffs.is_empty());
    assert_eq!(section.summary.status, SectionStatus::Unavailable);
    assert!(section.notices.iter().any(|notice| notice.kind == NoticeKind::DataUnavailable));
    assert!(!report.has_drift());
    assert!(!report.timed_out());
    let failed = sink.named("fetch_failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].http_status, Some(500));
}

#[test]
fn upstream_500_becomes_missing_under_treat_as_empty() {
    let (report, _sink) = run_groups(UnavailableMode::TreatAsEmpty);
    let section = &report.sections[0];

    assert_eq!(section.diffs.len(), 2);
    assert!(section.diffs.iter().all(|diff| diff.difference_type == DifferenceType::MissingInB));
    let objects: Vec<_> = section.diffs.iter().map(|diff| diff.object.as_str()).collect();
    assert_eq!(objects, vec!["Finance", "Engineering"]);
    assert!(report.has_drift());
}
