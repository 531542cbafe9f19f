// crates/tenant-drift-okta/src/pagination.rs
// ============================================================================
// Module: Okta Pagination
// Description: RFC 8288 Link header parsing and list payload extraction.
// Purpose: Walk cursor-paginated collections safely.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Okta paginates with `Link: <url>; rel="next"` headers. List endpoints
//! return either a bare array or an object wrapping the array under a list
//! key (`roles`, `resource-sets`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tenant_drift_core::FetchError;

// ============================================================================
// SECTION: Link Header
// ============================================================================

/// Returns the `rel="next"` target from one or more Link header values.
#[must_use]
pub fn next_link<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().flat_map(|value| value.split(',')).find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let Some((name, value)) = param.split_once('=') else {
                return false;
            };
            name.trim().eq_ignore_ascii_case("rel")
                && value.trim().trim_matches('"').split_whitespace().any(|rel| rel == "next")
        });
        is_next.then(|| target.to_string())
    })
}

// ============================================================================
// SECTION: List Payloads
// ============================================================================

/// Extracts list items from a page payload.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] when the payload is neither an array nor
/// an object holding an array under `list_key`.
pub fn list_items(payload: Value, list_key: Option<&str>, resource: &str) -> Result<Vec<Value>, FetchError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            let Some(key) = list_key else {
                return Err(FetchError::Malformed(format!("{resource}: expected a json array")));
            };
            match map.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(_) => Err(FetchError::Malformed(format!("{resource}: `{key}` is not an array"))),
            }
        }
        _ => Err(FetchError::Malformed(format!("{resource}: expected a json array"))),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn next_link_is_found_among_siblings() {
        let header = r#"<https://acme.okta.com/api/v1/groups?limit=2>; rel="self", <https://acme.okta.com/api/v1/groups?after=00g2&limit=2>; rel="next""#;
        assert_eq!(
            next_link([header]).as_deref(),
            Some("https://acme.okta.com/api/v1/groups?after=00g2&limit=2")
        );
    }

    #[test]
    fn separate_header_values_are_scanned() {
        let values = ["<https://a/self>; rel=\"self\"", "<https://a/next>; rel=next"];
        assert_eq!(next_link(values).as_deref(), Some("https://a/next"));
        assert_eq!(next_link(["<https://a/self>; rel=\"self\""]), None);
        assert_eq!(next_link(["garbage"]), None);
    }

    #[test]
    fn list_key_unwraps_object_payloads() {
        let payload = json!({"roles": [{"label": "Helpdesk"}], "_links": {}});
        assert_eq!(list_items(payload, Some("roles"), "/api/v1/iam/roles").unwrap().len(), 1);
        assert!(list_items(json!([]), Some("roles"), "r").unwrap().is_empty());
        assert!(list_items(json!({"roles": 3}), Some("roles"), "r").is_err());
        assert!(list_items(json!({"x": 1}), None, "r").is_err());
        assert!(list_items(json!({"x": 1}), Some("roles"), "r").unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn next_link_never_panics(header in ".{0,80}") {
            let _ = next_link([header.as_str()]);
        }
    }
}
