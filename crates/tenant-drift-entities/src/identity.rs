// crates/tenant-drift-entities/src/identity.rs
// ============================================================================
// Module: Identity Adapters
// Description: Identity providers, realms, and realm assignments.
// Purpose: Compare federation and user partitioning configuration.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! All three sections are declarative collections. Identity providers carry
//! a distinct impact per attribute; realms and realm assignments compare one
//! settings signature each.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::Extract;
use tenant_drift_core::Outcome;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SignatureSpec;
use tenant_drift_core::Templates;
use tenant_drift_core::UnmatchedB;
use tenant_drift_core::core::record::cloned_at;
use tenant_drift_core::core::record::first_text;
use tenant_drift_core::core::record::value_at;
use tenant_drift_core::core::signature::IDENTITY_NOISE;

use crate::adapter::CollectionAdapter;
use crate::adapter::SnapshotField;
use crate::adapter::key_name_or_id;

// ============================================================================
// SECTION: Identity Providers
// ============================================================================

/// Identity providers section.
pub const IDENTITY_PROVIDERS: SectionInfo =
    SectionInfo::new("identity-providers", "Identity Providers");

/// Snapshot columns for identity providers.
const IDP_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Name", Extract::Path(&["name"])),
    SnapshotField::new("Type", Extract::Path(&["type"])),
    SnapshotField::new("Protocol Type", Extract::Path(&["protocol", "type"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Reads an identity provider's policy, empty when absent.
fn idp_policy(record: &Record) -> Value {
    value_at(record, &["policy"]).cloned().unwrap_or_else(|| Value::Object(Map::new()))
}

/// Builds the identity providers adapter.
#[must_use]
pub fn identity_providers() -> CollectionAdapter {
    CollectionAdapter {
        info: IDENTITY_PROVIDERS,
        resource: ResourcePath::org("/api/v1/idps"),
        key: key_name_or_id,
        spec: CompareSpec::Attributes(vec![
            AttributeSpec::value("Status", Extract::Path(&["status"])).with_mismatch(Outcome::new(
                "Federation Availability",
                "Align identity provider status for '{name}'",
            )),
            AttributeSpec::value("Protocol Type", Extract::Path(&["protocol", "type"])).with_mismatch(
                Outcome::new(
                    "Federation Protocol",
                    "Align identity provider protocol type for '{name}'",
                ),
            ),
            AttributeSpec::signed("Policy", Extract::With(idp_policy), IDENTITY_NOISE).with_mismatch(
                Outcome::new("Federation Drift", "Align identity provider policy for '{name}'"),
            ),
        ]),
        templates: Templates {
            missing: Outcome::new("Federation Access", "Create identity provider '{name}' in {env}"),
            extra: Outcome::new("Unexpected IdP", "Review extra identity provider '{name}' in {env}"),
            mismatch: Outcome::new("Federation Drift", "Align identity provider settings for '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: IDP_FIELDS,
    }
}

// ============================================================================
// SECTION: Realms
// ============================================================================

/// Realms section.
pub const REALMS: SectionInfo = SectionInfo::new("realms", "Realms");

/// Realm name candidates, most specific first.
const REALM_NAME_FIELDS: &[&str] = &["name", "label", "displayName", "realmName"];

/// Snapshot columns for realms.
const REALM_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Realm Name", Extract::With(realm_display_name)),
    SnapshotField::new("Default", Extract::Path(&["isDefault"])),
    SnapshotField::new("Realm Type", Extract::Path(&["profile", "realmType"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Keys realms by their first name field, top level then under `profile`,
/// falling back to `id`.
fn realm_key(record: &Record) -> Option<String> {
    first_text(record, REALM_NAME_FIELDS)
        .or_else(|| value_at(record, &["profile"]).and_then(|profile| first_text(profile, REALM_NAME_FIELDS)))
        .or_else(|| first_text(record, &["id"]))
}

/// Renders the realm key as a snapshot cell.
fn realm_display_name(record: &Record) -> Value {
    Value::from(realm_key(record).unwrap_or_default())
}

/// Builds the realms adapter.
#[must_use]
pub fn realms() -> CollectionAdapter {
    CollectionAdapter {
        info: REALMS,
        resource: ResourcePath::org("/api/v1/realms"),
        key: realm_key,
        spec: CompareSpec::Signature(SignatureSpec::new("Settings", IDENTITY_NOISE)),
        templates: Templates {
            missing: Outcome::new("Realm Access", "Create realm '{name}' in {env}"),
            extra: Outcome::new("Unexpected Realm", "Review extra realm '{name}' in {env}"),
            mismatch: Outcome::new("Realm Drift", "Align realm settings for '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: REALM_FIELDS,
    }
}

// ============================================================================
// SECTION: Realm Assignments
// ============================================================================

/// Realm assignments section.
pub const REALM_ASSIGNMENTS: SectionInfo =
    SectionInfo::new("realm-assignments", "Realm Assignments");

/// Fields that define an assignment's behavior.
const ASSIGNMENT_FIELDS: &[&str] = &["status", "conditions", "actions", "domains", "isDefault", "priority"];

/// Snapshot columns for realm assignments.
const REALM_ASSIGNMENT_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Assignment Name", Extract::Path(&["name"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Priority", Extract::Path(&["priority"])),
    SnapshotField::new("Default", Extract::Path(&["isDefault"])),
    SnapshotField::new("Conditions", Extract::Path(&["conditions"])),
    SnapshotField::new("Actions", Extract::Path(&["actions"])),
];

/// Keys assignments by name, then label, then display name, then id.
fn assignment_key(record: &Record) -> Option<String> {
    first_text(record, &["name", "label", "displayName", "id"])
}

/// Projects an assignment to its behavioral fields.
fn assignment_behavior(record: &Record) -> Value {
    Value::Object(
        ASSIGNMENT_FIELDS
            .iter()
            .map(|field| ((*field).to_string(), cloned_at(record, &[field])))
            .collect(),
    )
}

/// Builds the realm assignments adapter.
#[must_use]
pub fn realm_assignments() -> CollectionAdapter {
    CollectionAdapter {
        info: REALM_ASSIGNMENTS,
        resource: ResourcePath::org("/api/v1/realm-assignments"),
        key: assignment_key,
        spec: CompareSpec::Signature(
            SignatureSpec::new("Settings", IDENTITY_NOISE).with_project(Extract::With(assignment_behavior)),
        ),
        templates: Templates {
            missing: Outcome::new("Realm Assignment Drift", "Create realm assignment '{name}' in {env}"),
            extra: Outcome::new(
                "Realm Assignment Drift",
                "Review extra realm assignment '{name}' in {env}",
            ),
            mismatch: Outcome::new(
                "Realm Assignment Drift",
                "Align realm assignment '{name}' between environments",
            ),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: REALM_ASSIGNMENT_FIELDS,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
