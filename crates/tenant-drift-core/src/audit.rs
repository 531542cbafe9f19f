// crates/tenant-drift-core/src/audit.rs
// ============================================================================
// Module: Drift Audit Logging
// Description: Structured audit events for comparison runs.
// Purpose: Emit JSON-line run telemetry without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every comparison run reports what it fetched, what failed, and what each
//! section concluded through a [`DriftAuditSink`]. Events are flat JSON
//! objects with an `event` label and a millisecond timestamp so they can be
//! piped into any log pipeline. Tokens and record payloads are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::identifiers::Environment;
use crate::core::summary::SectionStatus;
use crate::core::summary::SectionSummary;
use crate::interfaces::FetchError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Drift audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Environment the event concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    /// Section identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Resource path or object name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Section status label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SectionStatus>,
    /// Normalized error kind label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Upstream HTTP status for status failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Record or entry count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Free-text detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Optional context attached to an audit event.
#[derive(Debug, Clone, Default)]
pub struct DriftAuditEventParams {
    /// Environment the event concerns.
    pub environment: Option<Environment>,
    /// Section identifier.
    pub section: Option<String>,
    /// Resource path or object name.
    pub resource: Option<String>,
    /// Section status.
    pub status: Option<SectionStatus>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Upstream HTTP status.
    pub http_status: Option<u16>,
    /// Record or entry count.
    pub count: Option<usize>,
    /// Free-text detail.
    pub message: Option<String>,
}

impl DriftAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(event: &'static str, params: DriftAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            environment: params.environment,
            section: params.section,
            resource: params.resource,
            status: params.status,
            error_kind: params.error_kind,
            http_status: params.http_status,
            count: params.count,
            message: params.message,
        }
    }

    /// Start of a comparison run between two environment labels.
    #[must_use]
    pub fn run_started(env_a: &str, env_b: &str, sections: usize) -> Self {
        Self::new(
            "run_started",
            DriftAuditEventParams {
                count: Some(sections),
                message: Some(format!("{env_a} -> {env_b}")),
                ..DriftAuditEventParams::default()
            },
        )
    }

    /// End of a comparison run with its total difference count.
    #[must_use]
    pub fn run_completed(report_id: &str, total_diffs: usize) -> Self {
        Self::new(
            "run_completed",
            DriftAuditEventParams {
                resource: Some(report_id.to_string()),
                count: Some(total_diffs),
                ..DriftAuditEventParams::default()
            },
        )
    }

    /// Successful fetch of a collection or detail resource.
    #[must_use]
    pub fn fetch_completed(
        environment: Environment,
        section: &str,
        resource: &str,
        count: usize,
    ) -> Self {
        Self::new(
            "fetch_completed",
            DriftAuditEventParams {
                environment: Some(environment),
                section: Some(section.to_string()),
                resource: Some(resource.to_string()),
                count: Some(count),
                ..DriftAuditEventParams::default()
            },
        )
    }

    /// Failed fetch of a collection or detail resource.
    #[must_use]
    pub fn fetch_failed(
        environment: Environment,
        section: &str,
        resource: &str,
        error: &FetchError,
    ) -> Self {
        Self::new(
            "fetch_failed",
            DriftAuditEventParams {
                environment: Some(environment),
                section: Some(section.to_string()),
                resource: Some(resource.to_string()),
                error_kind: Some(error.kind()),
                http_status: error.status(),
                message: Some(error.to_string()),
                ..DriftAuditEventParams::default()
            },
        )
    }

    /// Section finished with the given summary.
    #[must_use]
    pub fn section_completed(section: &str, summary: &SectionSummary) -> Self {
        Self::new(
            "section_completed",
            DriftAuditEventParams {
                section: Some(section.to_string()),
                status: Some(summary.status),
                count: Some(summary.total_diffs),
                ..DriftAuditEventParams::default()
            },
        )
    }

    /// Two records in one environment produced the same key.
    #[must_use]
    pub fn key_collision(environment: Environment, section: &str, key: &str) -> Self {
        Self::new(
            "key_collision",
            DriftAuditEventParams {
                environment: Some(environment),
                section: Some(section.to_string()),
                resource: Some(key.to_string()),
                ..DriftAuditEventParams::default()
            },
        )
    }

    /// Sign-in widget customization differs while the page HTML matches.
    #[must_use]
    pub fn widget_drift(section: &str, brand: &str) -> Self {
        Self::new(
            "widget_drift",
            DriftAuditEventParams {
                section: Some(section.to_string()),
                resource: Some(brand.to_string()),
                message: Some("sign-in widget customization differs".to_string()),
                ..DriftAuditEventParams::default()
            },
        )
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for comparison run events.
pub trait DriftAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &DriftAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl DriftAuditSink for StderrAuditSink {
    fn record(&self, event: &DriftAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DriftAuditSink for FileAuditSink {
    fn record(&self, event: &DriftAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl DriftAuditSink for NoopAuditSink {
    fn record(&self, _event: &DriftAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn fetch_failed_carries_error_classification() {
        let error = FetchError::Status {
            status: 500,
            resource: "/api/v1/groups".to_string(),
        };
        let event = DriftAuditEvent::fetch_failed(Environment::B, "groups", "/api/v1/groups", &error);
        let payload: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["event"], "fetch_failed");
        assert_eq!(payload["environment"], "b");
        assert_eq!(payload["error_kind"], "status");
        assert_eq!(payload["http_status"], 500);
        assert!(payload.get("count").is_none());
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileAuditSink::new(&path).unwrap();
        sink.record(&DriftAuditEvent::key_collision(Environment::A, "groups", "Finance"));
        sink.record(&DriftAuditEvent::widget_drift("brand-pages", "Acme"));
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"key_collision\""));
        assert!(lines[1].contains("\"widget_drift\""));
    }
}
