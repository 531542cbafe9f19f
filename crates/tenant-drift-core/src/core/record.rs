// crates/tenant-drift-core/src/core/record.rs
// ============================================================================
// Module: Record Accessors
// Description: Defensive accessors over untyped upstream JSON records.
// Purpose: Let adapters read nested attributes without failing on shape surprises.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Upstream records are kept as [`serde_json::Value`]. Adapters extract the
//! handful of attributes they compare through these helpers, which treat a
//! missing path, a null, or a type mismatch as "absent" rather than an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One fetched entity instance.
pub type Record = Value;

/// Shared empty value returned by lookups that find nothing.
static NULL: Value = Value::Null;

// ============================================================================
// SECTION: Accessors
// ============================================================================

/// Returns the value at a nested object path, if every segment exists.
#[must_use]
pub fn value_at<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = record;
    for segment in path {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

/// Returns the value at a path or JSON null when absent.
#[must_use]
pub fn value_or_null<'a>(record: &'a Value, path: &[&str]) -> &'a Value {
    value_at(record, path).unwrap_or(&NULL)
}

/// Returns a cloned value at a path, defaulting to null.
#[must_use]
pub fn cloned_at(record: &Value, path: &[&str]) -> Value {
    value_or_null(record, path).clone()
}

/// Returns a non-empty scalar at a path rendered as text.
///
/// Strings are returned as-is; numbers and booleans use their JSON form.
#[must_use]
pub fn text_at(record: &Value, path: &[&str]) -> Option<String> {
    match value_at(record, path)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Returns the first non-empty top-level field among `candidates`.
#[must_use]
pub fn first_text(record: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|field| text_at(record, &[field]))
}

/// Returns a string at a path, defaulting to an empty string.
#[must_use]
pub fn text_or_empty(record: &Value, path: &[&str]) -> Value {
    Value::String(text_at(record, path).unwrap_or_default())
}

/// Returns the elements of an array record, or an empty slice.
#[must_use]
pub fn items(value: &Value) -> &[Value] {
    value.as_array().map_or(&[], Vec::as_slice)
}

/// Renders a value for display at the presentation boundary.
///
/// Null renders as an empty string, strings render unquoted, and every other
/// value renders as compact JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Joins a set of names as sorted, deduplicated text or `<none>` when empty.
#[must_use]
pub fn joined_names<I>(names: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut sorted: Vec<String> = names.into_iter().filter(|name| !name.is_empty()).collect();
    sorted.sort();
    sorted.dedup();
    if sorted.is_empty() { "<none>".to_string() } else { sorted.join(", ") }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
