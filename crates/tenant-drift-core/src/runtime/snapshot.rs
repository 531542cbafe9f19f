// crates/tenant-drift-core/src/runtime/snapshot.rs
// ============================================================================
// Module: Environment Snapshots
// Description: Single-environment inventory sections and their exports.
// Purpose: Document one tenant's configuration as tables, CSV, and Markdown.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A snapshot is a list of tabular sections built from one environment's
//! records. It can be flattened into `Section, Item, Field, Value` rows for
//! spreadsheets or rendered as a Markdown document with one table per
//! section.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::record::display_value;
use crate::runtime::export::CsvWriter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Columns checked, in order, to name the item a row describes.
pub const ITEM_COLUMNS: [&str; 8] = [
    "Application Name",
    "Rule Name",
    "Policy Name",
    "Name",
    "ID",
    "Rule ID",
    "Policy ID",
    "Setting",
];

/// Item label used when no identifying column has a value.
pub const DEFAULT_ITEM: &str = "Item";

/// Columns of the flattened export.
pub const FLAT_COLUMNS: [&str; 4] = ["Section", "Item", "Field", "Value"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// One tabular inventory section.
///
/// # Invariants
/// - Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSection {
    /// Section identifier.
    pub id: String,
    /// Section title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Column names.
    pub columns: Vec<String>,
    /// Row cells aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl SnapshotSection {
    /// Builds a section from field/value rows.
    ///
    /// Columns are taken from the first row; later rows are aligned to them
    /// and missing cells become null.
    #[must_use]
    pub fn from_rows(id: &str, title: &str, rows: Vec<Vec<(String, Value)>>) -> Self {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.iter().map(|(field, _)| field.clone()).collect())
            .unwrap_or_default();
        let rows = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        row.iter()
                            .find(|(field, _)| field == column)
                            .map_or(Value::Null, |(_, value)| value.clone())
                    })
                    .collect()
            })
            .collect();
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            columns,
            rows,
        }
    }

    /// Builds a `Setting, Value` section from key/value pairs.
    #[must_use]
    pub fn key_values(id: &str, title: &str, values: Vec<(String, Value)>) -> Self {
        let rows = values
            .into_iter()
            .map(|(setting, value)| {
                vec![("Setting".to_string(), Value::String(setting)), ("Value".to_string(), value)]
            })
            .collect();
        Self::from_rows(id, title, rows)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the item label for a row.
    #[must_use]
    pub fn item_for(&self, row: &[Value]) -> String {
        ITEM_COLUMNS
            .iter()
            .find_map(|candidate| {
                let position = self.columns.iter().position(|column| column == candidate)?;
                let text = display_value(row.get(position)?);
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| DEFAULT_ITEM.to_string())
    }
}

/// Single-environment inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// Environment label (domain).
    pub environment: String,
    /// Generation time (milliseconds since epoch).
    pub generated_at_ms: u64,
    /// Sections in build order.
    pub sections: Vec<SnapshotSection>,
}

/// One flattened snapshot cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    /// Section title.
    pub section: String,
    /// Item label.
    pub item: String,
    /// Column name.
    pub field: String,
    /// Rendered value.
    pub value: String,
}

impl SnapshotReport {
    /// Flattens every section into one row per cell.
    ///
    /// A `Setting` cell equal to the row's item label is omitted.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatRow> {
        let mut flat = Vec::new();
        for section in &self.sections {
            for row in &section.rows {
                let item = section.item_for(row);
                for (field, value) in section.columns.iter().zip(row) {
                    let value = display_value(value);
                    if field == "Setting" && value == item {
                        continue;
                    }
                    flat.push(FlatRow {
                        section: section.title.clone(),
                        item: item.clone(),
                        field: field.clone(),
                        value,
                    });
                }
            }
        }
        flat
    }

    /// Renders the flattened rows as CSV.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut writer = CsvWriter::new(&FLAT_COLUMNS);
        for row in self.flatten() {
            writer.row([row.section, row.item, row.field, row.value]);
        }
        writer.finish()
    }

    /// Renders the snapshot as a Markdown document.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Tenant snapshot: {}", self.environment);
        for section in &self.sections {
            let _ = writeln!(out, "\n## {}\n", section.title);
            if !section.description.is_empty() {
                let _ = writeln!(out, "{}\n", section.description);
            }
            if section.rows.is_empty() {
                let _ = writeln!(out, "_No records._");
                continue;
            }
            let header: Vec<String> = section.columns.iter().map(|column| markdown_cell(column)).collect();
            let _ = writeln!(out, "| {} |", header.join(" | "));
            let _ = writeln!(out, "|{}", " --- |".repeat(section.columns.len()));
            for row in &section.rows {
                let cells: Vec<String> =
                    row.iter().map(|value| markdown_cell(&display_value(value))).collect();
                let _ = writeln!(out, "| {} |", cells.join(" | "));
            }
        }
        out
    }
}

/// Escapes pipes and flattens line breaks inside a table cell.
fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
