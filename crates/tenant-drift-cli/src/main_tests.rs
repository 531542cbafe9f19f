// crates/tenant-drift-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and the compare/export flow.
// Purpose: Ensure CLI runs produce reports, files, and errors as documented.
// Dependencies: tenant-drift-cli main helpers, tempfile, tiny_http
// ============================================================================

//! ## Overview
//! Exercises the CLI helpers against local `tiny_http` tenants:
//! - compare runs honor `--section` overrides and write saved reports and CSV;
//! - all-timeout runs are flagged for the timeout message;
//! - config failures surface through the localized catalog.

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

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tempfile::TempDir;
use tenant_drift_core::ComparisonReport;
use tenant_drift_core::FetchTally;
use tenant_drift_core::runtime::export::save_report;
use tiny_http::Response;
use tiny_http::Server;

use super::Cli;
use super::Commands;
use super::CompareCommand;
use super::ExportCommand;
use super::ExportKindArg;
use super::LangArg;
use super::Locale;
use super::OutputFormat;
use super::command_export;
use super::open_audit_sink;
use super::render_report;
use super::resolve_locale;
use super::run_compare;
use super::write_compare_outputs;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Env A groups payload.
const GROUPS: &str = r#"[
    {"id": "g1", "profile": {"name": "Finance", "description": "Finance team"}},
    {"id": "g2", "profile": {"name": "Engineering", "description": "Builders"}}
]"#;

/// Starts a server answering every request with `body` after `delay`.
fn serve(body: &'static str, delay: Duration) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
            thread::sleep(delay);
            let _ = request.respond(Response::from_string(body));
        }
    });
    format!("http://{addr}")
}

/// Writes a config pointing both environments at local servers.
fn write_config(dir: &TempDir, env_a: &str, env_b: &str, timeout_ms: u64) -> PathBuf {
    let path = dir.path().join("tenant-drift.toml");
    let content = format!(
        r#"
[env_a]
domain = "{env_a}"
token = "token-a"

[env_b]
domain = "{env_b}"
token = "token-b"

[http]
allow_http = true
timeout_ms = {timeout_ms}

[audit]
sink = "none"
"#
    );
    fs::write(&path, content).unwrap();
    path
}

fn compare_command(dir: &Path) -> CompareCommand {
    CompareCommand {
        config: None,
        format: OutputFormat::Text,
        show_matches: false,
        sections: Vec::new(),
        save: Some(dir.join("report.json")),
        differences_csv: Some(dir.join("differences.csv")),
        matches_csv: None,
        report_csv: Some(dir.join("report.csv")),
        fail_on_drift: false,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn compare_flags_parse() {
    let cli = Cli::try_parse_from([
        "tenant-drift",
        "compare",
        "--format",
        "json",
        "--section",
        "groups",
        "--section",
        "realms",
        "--fail-on-drift",
    ])
    .unwrap();
    let Some(Commands::Compare(command)) = cli.command else {
        panic!("expected compare command");
    };
    assert_eq!(command.format, OutputFormat::Json);
    assert_eq!(command.sections, vec!["groups".to_string(), "realms".to_string()]);
    assert!(command.fail_on_drift);
    assert!(!command.show_matches);
}

#[test]
fn snapshot_requires_env() {
    assert!(Cli::try_parse_from(["tenant-drift", "snapshot"]).is_err());
    assert!(Cli::try_parse_from(["tenant-drift", "snapshot", "--env", "b"]).is_ok());
}

#[test]
fn locale_flag_wins_over_environment() {
    assert_eq!(resolve_locale(Some(LangArg::En), Some("ca")).unwrap(), Locale::En);
    assert_eq!(resolve_locale(None, Some("ca_ES.UTF-8")).unwrap(), Locale::Ca);
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
    let err = resolve_locale(None, Some("xx")).unwrap_err();
    assert!(err.to_string().contains("TENANT_DRIFT_LANG"));
}

#[test]
fn compare_against_local_tenants_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let env_a = serve(GROUPS, Duration::ZERO);
    let env_b = serve("[]", Duration::ZERO);
    let config = write_config(&dir, &env_a, &env_b, 5_000);

    let report = run_compare(Some(&config), &["groups".to_string()]).unwrap();
    assert_eq!(report.sections.len(), 1);
    assert_eq!(report.total_diffs(), 2);
    assert!(report.has_drift());
    assert!(!report.timed_out());

    let text = render_report(&report, OutputFormat::Text, false).unwrap();
    assert!(text.contains("Finance"));
    let json = render_report(&report, OutputFormat::Json, false).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["report_id"], report.report_id.as_str());

    let command = compare_command(dir.path());
    write_compare_outputs(&command, &report).unwrap();
    let differences = fs::read_to_string(dir.path().join("differences.csv")).unwrap();
    assert!(differences.starts_with("Entity,Object,Attribute"));
    assert!(differences.contains("Finance"));
    assert!(fs::read_to_string(dir.path().join("report.csv")).unwrap().starts_with("Category"));
    assert!(dir.path().join("report.json").exists());
}

#[test]
fn export_reads_saved_report() {
    let dir = TempDir::new().unwrap();
    let report = ComparisonReport::assemble("a.okta.com", "b.okta.com", Vec::new(), FetchTally::default())
        .unwrap();
    let saved = dir.path().join("saved.json");
    save_report(&saved, &report).unwrap();
    let out = dir.path().join("matches.csv");

    command_export(&ExportCommand {
        report: saved,
        kind: ExportKindArg::Matches,
        out: Some(out.clone()),
    })
    .unwrap();
    let contents = fs::read_to_string(out).unwrap();
    assert_eq!(contents.lines().count(), 1);
}

#[test]
fn export_missing_report_fails() {
    let dir = TempDir::new().unwrap();
    let err = command_export(&ExportCommand {
        report: dir.path().join("absent.json"),
        kind: ExportKindArg::Differences,
        out: Some(dir.path().join("out.csv")),
    })
    .unwrap_err();
    assert!(err.to_string().starts_with("Failed to read saved report"));
}

#[test]
fn all_timeouts_flag_the_report() {
    let dir = TempDir::new().unwrap();
    let env_a = serve(GROUPS, Duration::from_millis(1_500));
    let env_b = serve(GROUPS, Duration::from_millis(1_500));
    let config = write_config(&dir, &env_a, &env_b, 200);

    let report = run_compare(Some(&config), &["groups".to_string()]).unwrap();
    assert!(report.timed_out());
    assert!(!report.has_drift());
}

#[test]
fn missing_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = run_compare(Some(&dir.path().join("absent.toml")), &[]).unwrap_err();
    assert!(err.to_string().starts_with("Failed to load config"));
}

#[test]
fn unknown_section_override_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "https://a.okta.com", "https://b.okta.com", 5_000);
    let err = run_compare(Some(&config), &["nope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("unknown section: nope"));
}

#[test]
fn file_audit_sink_opens_configured_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.jsonl");
    let config = tenant_drift_config::AuditConfig {
        sink: tenant_drift_config::AuditSinkKind::File,
        path: Some(path.to_string_lossy().into_owned()),
    };
    assert!(open_audit_sink(&config).is_ok());
    assert!(path.exists());
}
