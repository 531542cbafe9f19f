// crates/tenant-drift-core/tests/export.rs
// ============================================================================
// Module: Export Tests
// Description: Verifies CSV exports, text rendering, and report persistence.
// ============================================================================
//! ## Overview
//! Exercises the three CSV documents over a small report, the plain-text
//! renderer, and the save/load cycle used by the `export` command.

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

use serde_json::json;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::ComparisonReport;
use tenant_drift_core::ExportKind;
use tenant_drift_core::FetchTally;
use tenant_drift_core::Outcome;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SectionReport;
use tenant_drift_core::Templates;
use tenant_drift_core::reconcile;
use tenant_drift_core::record::text_at;
use tenant_drift_core::runtime::export::load_report;
use tenant_drift_core::runtime::export::render_text;
use tenant_drift_core::runtime::export::save_report;

fn sample_report() -> ComparisonReport {
    let policy = ComparePolicy::new(
        "Groups",
        CompareSpec::Attributes(vec![AttributeSpec::text("Description", &["profile", "description"])]),
        Templates {
            missing: Outcome::new("Access", "Create group '{name}' in {env}"),
            extra: Outcome::new("Configuration Drift", "Review/remove group '{name}' in {env}"),
            mismatch: Outcome::new("Configuration Drift", "Align description for group '{name}'"),
        },
    );
    let a = vec![
        json!({"profile": {"name": "Finance", "description": "Finance, Accounting"}}),
        json!({"profile": {"name": "Ops", "description": "Ops"}}),
    ];
    let b = vec![json!({"profile": {"name": "Ops", "description": "Ops"}})];
    let reconciliation = reconcile(&a, &b, |record| text_at(record, &["profile", "name"]), &policy);
    let section = SectionReport::new(SectionInfo::new("groups", "Groups"), reconciliation, Vec::new());
    ComparisonReport::assemble_at("a.okta.com", "b.okta.com", vec![section], FetchTally::default(), 1_700_000_000_000)
        .unwrap()
}

#[test]
fn differences_csv_uses_plain_priority_labels() {
    let csv = ExportKind::Differences.render(&sample_report());
    let lines: Vec<&str> = csv.split("\r\n").collect();
    assert_eq!(
        lines[0],
        "Entity,Object,Attribute,Env A Value,Env B Value,Difference Type,Impact,Recommended Action,Priority"
    );
    assert_eq!(
        lines[1],
        "Groups,Finance,-,Exists,Missing,Missing in Env B,Access,Create group 'Finance' in Env B,Critical"
    );
    assert_eq!(lines.len(), 3);
    assert!(!csv.contains('\u{1f534}'));
}

#[test]
fn matches_csv_repeats_the_agreed_value() {
    let csv = ExportKind::Matches.render(&sample_report());
    let lines: Vec<&str> = csv.split("\r\n").collect();
    assert_eq!(lines[1], "Groups,Ops,Description,Ops,Ops,Match,,,Match");
}

#[test]
fn combined_report_lists_diffs_before_matches() {
    let csv = ExportKind::Report.render(&sample_report());
    let lines: Vec<&str> = csv.split("\r\n").collect();
    assert!(lines[0].starts_with("Category,Object"));
    assert!(lines[1].contains("Missing in Env B"));
    assert!(lines[2].ends_with("Match,,,Match"));
}

#[test]
fn text_report_shows_glyphs_and_optional_matches() {
    let report = sample_report();
    let without = render_text(&report, false);
    assert!(without.contains("== Groups [FAIL]"));
    assert!(without.contains("\u{1f534} Missing in Env B | Finance"));
    assert!(!without.contains("\u{1f7e2} Match"));
    let with = render_text(&report, true);
    assert!(with.contains("\u{1f7e2} Match | Ops | Description | Ops"));
}

#[test]
fn saved_report_loads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let report = sample_report();
    save_report(&path, &report).unwrap();
    let loaded = load_report(&path).unwrap();
    assert_eq!(loaded, report);
    assert_eq!(ExportKind::Differences.render(&loaded), ExportKind::Differences.render(&report));
}

#[test]
fn loading_garbage_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    std::fs::write(&path, "not json").unwrap();
    let err = load_report(&path).unwrap_err();
    assert!(err.to_string().starts_with("report parse error"));
}
