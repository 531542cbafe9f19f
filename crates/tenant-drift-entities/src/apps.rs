// crates/tenant-drift-entities/src/apps.rs
// ============================================================================
// Module: Application Adapters
// Description: Applications and authenticators.
// Purpose: Compare app inventories, app group assignment, and authenticators.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! Applications are compared on existence by default. With
//! `app_group_assignments` enabled, each matched pair's assigned groups are
//! fetched and compared as a sorted name list instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::DifferenceType;
use tenant_drift_core::Extract;
use tenant_drift_core::Outcome;
use tenant_drift_core::Reconciliation;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::UnmatchedB;
use tenant_drift_core::core::record::first_text;
use tenant_drift_core::core::record::joined_names;
use tenant_drift_core::core::record::text_at;
use tenant_drift_core::reconcile;
use tenant_drift_core::reconcile_nested;

use crate::adapter::CollectionAdapter;
use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::collection_snapshot;
use crate::adapter::key_label_name_id;

// ============================================================================
// SECTION: Applications
// ============================================================================

/// Applications section.
pub const APPLICATIONS: SectionInfo = SectionInfo::new("applications", "Applications");

/// Assigned groups attribute label.
const ASSIGNED_GROUPS: &str = "Assigned Groups";

/// Application outcome templates.
const APP_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Access & Provisioning", "Create application '{name}' in {env}"),
    extra: Outcome::new("Unexpected Access", "Review extra application '{name}' in {env}"),
    mismatch: Outcome::new(
        "Access Assignment Drift",
        "Align group assignments for application '{name}' between environments",
    ),
};

/// Snapshot columns for applications.
const APP_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Application Name", Extract::Path(&["label"])),
    SnapshotField::new("Name", Extract::Path(&["name"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Sign-On Mode", Extract::Path(&["signOnMode"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Applications compared on existence and, optionally, group assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationsAdapter;

impl EntityAdapter for ApplicationsAdapter {
    fn section(&self) -> SectionInfo {
        APPLICATIONS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let resource = ResourcePath::org("/api/v1/apps");
        let Some((a, b)) = ctx.fetch_pair(APPLICATIONS, &resource, &mut notices) else {
            return SectionReport::new(APPLICATIONS, Reconciliation::default(), notices);
        };
        if !ctx.options().app_group_assignments {
            let policy = ComparePolicy::new(
                APPLICATIONS.title,
                CompareSpec::ExistenceOnly {
                    attribute: "Name",
                },
                APP_TEMPLATES,
            );
            return SectionReport::new(
                APPLICATIONS,
                reconcile(&a, &b, key_label_name_id, &policy),
                notices,
            );
        }
        let groups = ResourcePath::org("/api/v1/apps/{parent}/groups");
        let policy = ComparePolicy::new(APPLICATIONS.title, CompareSpec::Deferred, APP_TEMPLATES);
        let recon = reconcile_nested(&a, &b, key_label_name_id, &policy, |key, app_a, app_b, out| {
            let key = key.as_str();
            match ctx.fetch_sub_pair(APPLICATIONS, &groups, (app_a, app_b)) {
                Ok((groups_a, groups_b)) => {
                    let names_a = joined_names(groups_a.iter().filter_map(group_name));
                    let names_b = joined_names(groups_b.iter().filter_map(group_name));
                    if names_a == names_b {
                        out.matches.push(policy.matched(key, ASSIGNED_GROUPS, Value::from(names_a)));
                    } else {
                        out.diffs.push(policy.diff(
                            key,
                            ASSIGNED_GROUPS,
                            DifferenceType::Mismatch,
                            (Value::from(names_a), Value::from(names_b)),
                            None,
                        ));
                    }
                }
                Err(_) => out.diffs.push(policy.unavailable(key, ASSIGNED_GROUPS, None)),
            }
        });
        SectionReport::new(APPLICATIONS, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        vec![collection_snapshot(ctx, APPLICATIONS, &ResourcePath::org("/api/v1/apps"), APP_FIELDS)]
    }
}

/// Reads a group name from an app group assignment.
fn group_name(group: &Record) -> Option<String> {
    if let Some(name) = group.as_str() {
        return Some(name.to_string());
    }
    text_at(group, &["profile", "name"])
        .or_else(|| text_at(group, &["name"]))
        .or_else(|| text_at(group, &["_embedded", "group", "profile", "name"]))
        .or_else(|| text_at(group, &["id"]))
}

// ============================================================================
// SECTION: Authenticators
// ============================================================================

/// Authenticators section.
pub const AUTHENTICATORS: SectionInfo = SectionInfo::new("authenticators", "Authenticators");

/// Snapshot columns for authenticators.
const AUTHENTICATOR_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Name", Extract::Path(&["name"])),
    SnapshotField::new("Key", Extract::Path(&["key"])),
    SnapshotField::new("Type", Extract::Path(&["type"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
];

/// Keys authenticators by `key`, then `name`, then `id`.
fn authenticator_key(record: &Record) -> Option<String> {
    first_text(record, &["key", "name", "id"])
}

/// Reads the display name, falling back to `label`.
fn authenticator_name(record: &Record) -> Value {
    Value::from(first_text(record, &["name", "label"]).unwrap_or_default())
}

/// Builds the authenticators adapter.
#[must_use]
pub fn authenticators() -> CollectionAdapter {
    CollectionAdapter {
        info: AUTHENTICATORS,
        resource: ResourcePath::org("/api/v1/authenticators"),
        key: authenticator_key,
        spec: CompareSpec::Attributes(vec![
            AttributeSpec::value("Name", Extract::With(authenticator_name)),
            AttributeSpec::text("Type", &["type"]),
            AttributeSpec::text("Status", &["status"]),
        ]),
        templates: Templates {
            missing: Outcome::new("Authentication Coverage", "Enable authenticator '{name}' in {env}"),
            extra: Outcome::new("Unexpected Authenticator", "Review extra authenticator '{name}' in {env}"),
            mismatch: Outcome::new(
                "Authentication Drift",
                "Align authenticator {attribute_lower} for '{name}'",
            ),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: AUTHENTICATOR_FIELDS,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;

    #[test]
    fn group_names_accept_every_assignment_shape() {
        assert_eq!(group_name(&json!("Finance")).unwrap(), "Finance");
        assert_eq!(group_name(&json!({"profile": {"name": "Ops"}})).unwrap(), "Ops");
        assert_eq!(
            group_name(&json!({"id": "00g1", "_embedded": {"group": {"profile": {"name": "HR"}}}}))
                .unwrap(),
            "HR"
        );
        assert_eq!(group_name(&json!({"id": "00g1"})).unwrap(), "00g1");
    }
}
