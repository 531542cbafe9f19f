// crates/tenant-drift-core/tests/proptest_reconcile.rs
// ============================================================================
// Module: Reconciliation Property-Based Tests
// Description: Property tests for key partitioning and comparison stability.
// Purpose: Check engine invariants across arbitrary key sets.
// ============================================================================

//! Property-based tests for reconciliation invariants.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::DifferenceType;
use tenant_drift_core::Outcome;
use tenant_drift_core::Record;
use tenant_drift_core::Templates;
use tenant_drift_core::reconcile;
use tenant_drift_core::record::text_at;

const TEMPLATES: Templates = Templates {
    missing: Outcome::new("Access", "Create '{name}' in {env}"),
    extra: Outcome::new("Unexpected", "Review '{name}' in {env}"),
    mismatch: Outcome::new("Drift", "Align {attribute_lower} for '{name}'"),
};

fn policy() -> ComparePolicy {
    ComparePolicy::new(
        "Zones",
        CompareSpec::Attributes(vec![
            AttributeSpec::text("Type", &["type"]),
            AttributeSpec::text("Status", &["status"]),
        ]),
        TEMPLATES,
    )
}

fn name_key(record: &Record) -> Option<String> {
    text_at(record, &["name"])
}

fn records(entries: &BTreeMap<String, (u8, bool)>) -> Vec<Record> {
    entries
        .iter()
        .map(|(name, (kind, active))| {
            json!({
                "id": format!("id-{name}"),
                "name": name,
                "type": format!("T{kind}"),
                "status": if *active { "ACTIVE" } else { "INACTIVE" },
            })
        })
        .collect()
}

fn collection_strategy() -> impl Strategy<Value = BTreeMap<String, (u8, bool)>> {
    prop::collection::btree_map("[a-f]{1,2}", (0u8 .. 3, any::<bool>()), 0 .. 12)
}

fn existence_keys(diffs: &[tenant_drift_core::DiffEntry], kind: DifferenceType) -> BTreeSet<String> {
    diffs
        .iter()
        .filter(|diff| diff.difference_type == kind)
        .map(|diff| diff.object.clone())
        .collect()
}

proptest! {
    #[test]
    fn keys_partition_into_missing_matched_and_extra(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let result = reconcile(&records(&a), &records(&b), name_key, &policy());
        let keys_a: BTreeSet<&String> = a.keys().collect();
        let keys_b: BTreeSet<&String> = b.keys().collect();
        let missing = existence_keys(&result.diffs, DifferenceType::MissingInB);
        let extra = existence_keys(&result.diffs, DifferenceType::ExtraInB);

        prop_assert_eq!(result.matched, keys_a.intersection(&keys_b).count());
        prop_assert_eq!(missing.len() + extra.len() + result.matched, keys_a.union(&keys_b).count());
        for key in &missing {
            prop_assert!(a.contains_key(key) && !b.contains_key(key));
        }
        for key in &extra {
            prop_assert!(b.contains_key(key) && !a.contains_key(key));
        }
        let per_attribute = result.diffs.iter().filter(|diff| diff.difference_type == DifferenceType::Mismatch).count()
            + result.matches.len();
        prop_assert_eq!(per_attribute, result.matched * 2);
    }

    #[test]
    fn reconciling_a_collection_with_itself_has_no_diffs(a in collection_strategy()) {
        let collection = records(&a);
        let result = reconcile(&collection, &collection, name_key, &policy());
        prop_assert!(result.diffs.is_empty());
        prop_assert_eq!(result.matches.len(), a.len() * 2);
    }

    #[test]
    fn swapping_environments_swaps_existence_rows(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let forward = reconcile(&records(&a), &records(&b), name_key, &policy());
        let backward = reconcile(&records(&b), &records(&a), name_key, &policy());
        prop_assert_eq!(
            existence_keys(&forward.diffs, DifferenceType::MissingInB),
            existence_keys(&backward.diffs, DifferenceType::ExtraInB)
        );
        prop_assert_eq!(
            existence_keys(&forward.diffs, DifferenceType::ExtraInB),
            existence_keys(&backward.diffs, DifferenceType::MissingInB)
        );
        prop_assert_eq!(forward.matched, backward.matched);
    }

    #[test]
    fn mismatches_carry_both_values(a in collection_strategy()) {
        let flipped: BTreeMap<String, (u8, bool)> =
            a.iter().map(|(name, (kind, active))| (name.clone(), (*kind, !active))).collect();
        let result = reconcile(&records(&a), &records(&flipped), name_key, &policy());
        prop_assert_eq!(result.diffs.len(), a.len());
        for diff in &result.diffs {
            prop_assert_eq!(&diff.attribute, "Status");
            prop_assert_ne!(&diff.value_a, &diff.value_b);
            prop_assert!(matches!(diff.value_a, Value::String(_)));
        }
    }
}
