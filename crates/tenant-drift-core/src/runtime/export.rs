// crates/tenant-drift-core/src/runtime/export.rs
// ============================================================================
// Module: Report Exporters
// Description: CSV exports and the plain-text report renderer.
// Purpose: Present a comparison report to people and spreadsheets.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Exporters consume a [`ComparisonReport`] value and never reach back into a
//! run. CSV output follows RFC 4180 (CRLF line endings, fields quoted only
//! when they contain a comma, quote, or line break). Priority columns are
//! always plain text; colored glyphs appear only in [`render_text`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::core::entries::DiffEntry;
use crate::core::entries::MatchEntry;
use crate::core::record::display_value;
use crate::core::severity::MATCH_GLYPH;
use crate::core::severity::Priority;
use crate::runtime::aggregator::ComparisonReport;
use crate::runtime::aggregator::SectionReport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Columns shared by the differences and matches exports.
pub const ENTRY_COLUMNS: [&str; 9] = [
    "Entity",
    "Object",
    "Attribute",
    "Env A Value",
    "Env B Value",
    "Difference Type",
    "Impact",
    "Recommended Action",
    "Priority",
];

/// Columns of the combined report export.
pub const REPORT_COLUMNS: [&str; 9] = [
    "Category",
    "Object",
    "Attribute",
    "Env A Value",
    "Env B Value",
    "Difference Type",
    "Impact",
    "Recommended Action",
    "Priority",
];

/// Difference Type and Priority value written for match rows.
pub const MATCH_LABEL: &str = "Match";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when reading or writing exports.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem failure.
    #[error("export io error: {0}")]
    Io(String),
    /// Report serialization failure.
    #[error("export serialization error: {0}")]
    Serialize(String),
    /// Saved report could not be parsed.
    #[error("report parse error: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: CSV Writer
// ============================================================================

/// Minimal RFC 4180 CSV builder.
pub struct CsvWriter {
    /// Accumulated output.
    out: String,
}

impl CsvWriter {
    /// Starts a document with a header row.
    #[must_use]
    pub fn new(header: &[&str]) -> Self {
        let mut writer = Self {
            out: String::new(),
        };
        writer.row(header.iter().copied());
        writer
    }

    /// Appends one row.
    pub fn row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (index, field) in fields.into_iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            self.out.push_str(&escape_field(field.as_ref()));
        }
        self.out.push_str("\r\n");
    }

    /// Returns the finished document.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }
}

/// Quotes a field when it contains a delimiter, quote, or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

// ============================================================================
// SECTION: CSV Exports
// ============================================================================

/// Which CSV export to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Differences only.
    Differences,
    /// Matches only.
    Matches,
    /// Differences followed by matches with a `Category` column.
    Report,
}

impl ExportKind {
    /// Renders the export for a report.
    #[must_use]
    pub fn render(self, report: &ComparisonReport) -> String {
        match self {
            Self::Differences => differences_csv(report),
            Self::Matches => matches_csv(report),
            Self::Report => report_csv(report),
        }
    }

    /// Returns the conventional file name.
    #[must_use]
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::Differences => "tenant_drift_differences.csv",
            Self::Matches => "tenant_drift_matches.csv",
            Self::Report => "tenant_drift_report.csv",
        }
    }
}

/// Renders every difference as a CSV document.
#[must_use]
pub fn differences_csv(report: &ComparisonReport) -> String {
    let mut writer = CsvWriter::new(&ENTRY_COLUMNS);
    for diff in report.diffs() {
        writer.row(diff_fields(diff));
    }
    writer.finish()
}

/// Renders every match as a CSV document.
#[must_use]
pub fn matches_csv(report: &ComparisonReport) -> String {
    let mut writer = CsvWriter::new(&ENTRY_COLUMNS);
    for entry in report.matches() {
        writer.row(match_fields(entry));
    }
    writer.finish()
}

/// Renders differences then matches as one CSV document.
#[must_use]
pub fn report_csv(report: &ComparisonReport) -> String {
    let mut writer = CsvWriter::new(&REPORT_COLUMNS);
    for diff in report.diffs() {
        writer.row(diff_fields(diff));
    }
    for entry in report.matches() {
        writer.row(match_fields(entry));
    }
    writer.finish()
}

/// Returns the CSV fields of a difference row.
fn diff_fields(diff: &DiffEntry) -> [String; 9] {
    [
        diff.category.clone(),
        diff.object.clone(),
        diff.attribute.clone(),
        display_value(&diff.value_a),
        display_value(&diff.value_b),
        diff.difference_type.label().to_string(),
        diff.impact.clone(),
        diff.recommended_action.clone(),
        diff.priority.label().to_string(),
    ]
}

/// Returns the CSV fields of a match row.
fn match_fields(entry: &MatchEntry) -> [String; 9] {
    let value = display_value(&entry.value);
    [
        entry.category.clone(),
        entry.object.clone(),
        entry.attribute.clone(),
        value.clone(),
        value,
        MATCH_LABEL.to_string(),
        String::new(),
        String::new(),
        MATCH_LABEL.to_string(),
    ]
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Writes text to a file.
///
/// # Errors
///
/// Returns [`ExportError::Io`] when the file cannot be written.
pub fn write_text(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|err| ExportError::Io(format!("{}: {err}", path.display())))
}

/// Saves a report as canonical JSON.
///
/// # Errors
///
/// Returns [`ExportError`] when serialization or the write fails.
pub fn save_report(path: &Path, report: &ComparisonReport) -> Result<(), ExportError> {
    let json = report.to_canonical_json().map_err(|err| ExportError::Serialize(err.to_string()))?;
    write_text(path, &json)
}

/// Loads a report saved by [`save_report`].
///
/// # Errors
///
/// Returns [`ExportError`] when the file cannot be read or parsed.
pub fn load_report(path: &Path) -> Result<ComparisonReport, ExportError> {
    let bytes =
        fs::read(path).map_err(|err| ExportError::Io(format!("{}: {err}", path.display())))?;
    serde_json::from_slice(&bytes).map_err(|err| ExportError::Parse(err.to_string()))
}

// ============================================================================
// SECTION: Text Report
// ============================================================================

/// Renders a human-readable report.
#[must_use]
pub fn render_text(report: &ComparisonReport, show_matches: bool) -> String {
    let mut out = String::new();
    let totals = report.totals();
    let _ = writeln!(out, "Tenant drift report {}", report.report_id);
    let _ = writeln!(out, "Env A: {}", report.env_a);
    let _ = writeln!(out, "Env B: {}", report.env_b);
    let _ = writeln!(out, "Generated: {}", report.generated_at_rfc3339());
    let _ = write!(out, "Totals:");
    for priority in Priority::DESCENDING {
        let _ = write!(out, " {} {} {}", priority.glyph(), priority.label(), totals.get(priority));
    }
    let _ = writeln!(out, " | {} differences, {} matches", report.total_diffs(), report.total_matches());
    for section in &report.sections {
        out.push('\n');
        render_section(&mut out, section, show_matches);
    }
    out
}

/// Renders one section block.
fn render_section(out: &mut String, section: &SectionReport, show_matches: bool) {
    let summary = &section.summary;
    let _ = writeln!(out, "== {} [{}]", section.title, summary.status.label());
    let _ = writeln!(
        out,
        "   Critical {} | Medium {} | Low {} | {} differences | {} matches",
        summary.priority_counts.critical,
        summary.priority_counts.medium,
        summary.priority_counts.low,
        summary.total_diffs,
        summary.total_matches,
    );
    for notice in &section.notices {
        let scope = notice.environment.map(|env| format!("{env}: ")).unwrap_or_default();
        let _ = writeln!(out, "   ! {} {scope}{} ({})", notice.kind.label(), notice.resource, notice.message);
    }
    for diff in &section.diffs {
        let _ = writeln!(
            out,
            "   {} {} | {} | {} | A: {} | B: {} | {} | {}",
            diff.priority.glyph(),
            diff.difference_type.label(),
            diff.object,
            diff.attribute,
            display_value(&diff.value_a),
            display_value(&diff.value_b),
            diff.impact,
            diff.recommended_action,
        );
    }
    if show_matches {
        for entry in &section.matches {
            let _ = writeln!(
                out,
                "   {MATCH_GLYPH} {MATCH_LABEL} | {} | {} | {}",
                entry.object,
                entry.attribute,
                display_value(&entry.value),
            );
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
