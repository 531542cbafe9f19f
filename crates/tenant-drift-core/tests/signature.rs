// crates/tenant-drift-core/tests/signature.rs
// ============================================================================
// Module: Canonical Signature Tests
// Description: Verifies noise stripping and canonical signature equivalence.
// ============================================================================
//! ## Overview
//! Signatures ignore map key order and skipped keys at every depth, react to
//! any other change, and depend on sequence order unless the caller
//! normalizes rule lists first.

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

use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tenant_drift_core::signature::ENVIRONMENT_NOISE;
use tenant_drift_core::signature::equivalent;
use tenant_drift_core::signature::hash_canonical_json;
use tenant_drift_core::signature::normalize_named;
use tenant_drift_core::signature::normalize_rules;
use tenant_drift_core::signature::signature;
use tenant_drift_core::signature::strip_keys;

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        "[a-z ]{0,6}".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0 .. 4).prop_map(|map| {
                let mut object = Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

/// Inserts skipped keys at every object depth.
fn with_noise(value: &Value, marker: i64) -> Value {
    match value {
        Value::Object(map) => {
            let mut noisy = Map::new();
            for (key, inner) in map.iter().rev() {
                noisy.insert(key.clone(), with_noise(inner, marker));
            }
            noisy.insert("id".to_string(), json!(format!("id-{marker}")));
            noisy.insert("lastUpdated".to_string(), json!(marker));
            Value::Object(noisy)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| with_noise(item, marker)).collect()),
        scalar => scalar.clone(),
    }
}

proptest! {
    #[test]
    fn skipped_keys_never_change_the_signature(value in json_value_strategy(3), marker in any::<i64>()) {
        let clean = strip_keys(&value, ENVIRONMENT_NOISE);
        prop_assert!(equivalent(&clean, &with_noise(&clean, marker), ENVIRONMENT_NOISE).unwrap());
    }

    #[test]
    fn changed_payload_changes_the_signature(value in json_value_strategy(2), extra in "[a-z]{1,6}") {
        let record = json!({"settings": value.clone()});
        let changed = json!({"settings": value, "extra": extra});
        prop_assert!(!equivalent(&record, &changed, ENVIRONMENT_NOISE).unwrap());
    }

    #[test]
    fn signature_is_deterministic(value in json_value_strategy(3)) {
        prop_assert_eq!(
            signature(&value, ENVIRONMENT_NOISE).unwrap(),
            signature(&value.clone(), ENVIRONMENT_NOISE).unwrap()
        );
    }
}

#[test]
fn map_key_order_does_not_matter() {
    let a: Value = serde_json::from_str(r#"{"b": 2, "a": {"y": 1, "x": [1, 2]}}"#).unwrap();
    let b: Value = serde_json::from_str(r#"{"a": {"x": [1, 2], "y": 1}, "b": 2}"#).unwrap();
    assert_eq!(signature(&a, &[]).unwrap(), signature(&b, &[]).unwrap());
    assert_eq!(signature(&a, &[]).unwrap().as_str(), r#"{"a":{"x":[1,2],"y":1},"b":2}"#);
}

#[test]
fn sequence_order_matters_without_normalization() {
    let first = json!({"name": "A", "priority": 1, "status": "ACTIVE"});
    let second = json!({"name": "B", "priority": 2, "status": "ACTIVE"});
    let forward = json!([first.clone(), second.clone()]);
    let reversed = json!([second.clone(), first.clone()]);
    assert!(!equivalent(&forward, &reversed, &[]).unwrap());

    let normalized_forward = normalize_rules(&[first.clone(), second.clone()]);
    let normalized_reversed = normalize_rules(&[second, first]);
    assert!(equivalent(&normalized_forward, &normalized_reversed, &[]).unwrap());
}

#[test]
fn normalized_rules_drop_noise_and_break_ties_by_name() {
    let rules = vec![
        json!({"id": "r2", "name": "Zeta", "status": "ACTIVE", "_links": {}}),
        json!({"id": "r1", "name": "Alpha", "priority": 0, "system": true}),
    ];
    let normalized = normalize_rules(&rules);
    assert_eq!(normalized[0]["name"], "Alpha");
    assert_eq!(normalized[1]["name"], "Zeta");
    assert!(normalized[0].get("id").is_none());
    assert!(normalized[0].get("system").is_none());
    assert_eq!(normalized[1]["priority"], Value::Null);
}

#[test]
fn normalized_named_items_sort_by_name() {
    let items = vec![json!({"id": 1, "name": "sub"}), json!({"id": 2, "name": "email"})];
    let normalized = normalize_named(&items, ENVIRONMENT_NOISE);
    assert_eq!(normalized, json!([{"name": "email"}, {"name": "sub"}]));
}

#[test]
fn canonical_hash_ignores_key_order() {
    let first = hash_canonical_json(&json!({"a": 1, "b": [true, null]})).unwrap();
    let second = hash_canonical_json(&json!({"b": [true, null], "a": 1})).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_str().len(), 64);
    assert!(first.as_str().chars().all(|ch| ch.is_ascii_hexdigit()));
}
