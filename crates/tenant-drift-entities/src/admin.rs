// crates/tenant-drift-entities/src/admin.rs
// ============================================================================
// Module: Administration Adapters
// Description: Custom admin roles, resource sets, admin assignments, tokens.
// Purpose: Compare who can administer each tenant and with what scope.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! Roles and resource sets are signature-compared collections. Admin
//! assignments come from the admin host and are compared as whole sets of
//! display names rather than record by record.

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
use tenant_drift_core::SignatureSpec;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::UnmatchedB;
use tenant_drift_core::core::record::first_text;
use tenant_drift_core::core::record::joined_names;
use tenant_drift_core::core::signature::ENVIRONMENT_NOISE;

use crate::adapter::CollectionAdapter;
use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::child_rows;
use crate::adapter::key_label_name_id;
use crate::adapter::snapshot_rows;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Custom Admin Roles
// ============================================================================

/// Custom admin roles section.
pub const CUSTOM_ADMIN_ROLES: SectionInfo =
    SectionInfo::new("custom-admin-roles", "Custom Admin Roles");

/// Snapshot columns for roles.
const ROLE_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Role Name", Extract::Path(&["label"])),
    SnapshotField::new("Description", Extract::Path(&["description"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Builds the custom admin roles adapter.
#[must_use]
pub fn custom_admin_roles() -> CollectionAdapter {
    CollectionAdapter {
        info: CUSTOM_ADMIN_ROLES,
        resource: ResourcePath::org("/api/v1/iam/roles").with_list_key("roles"),
        key: key_label_name_id,
        spec: CompareSpec::Signature(SignatureSpec::new("Settings", ENVIRONMENT_NOISE)),
        templates: Templates {
            missing: Outcome::new("Admin Access", "Create custom role '{name}' in {env}"),
            extra: Outcome::new("Unexpected Admin Role", "Review extra custom role '{name}' in {env}"),
            mismatch: Outcome::new("Admin Role Drift", "Align custom role settings for '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: ROLE_FIELDS,
    }
}

// ============================================================================
// SECTION: Resource Sets
// ============================================================================

/// Resource sets section.
pub const RESOURCE_SETS: SectionInfo = SectionInfo::new("resource-sets", "Resource Sets");

/// Snapshot section for resource set members.
const RESOURCE_SET_RESOURCES: SectionInfo =
    SectionInfo::new("resource-set-resources", "Resource Set Resources");

/// Snapshot section for resource set bindings.
const RESOURCE_SET_BINDINGS: SectionInfo =
    SectionInfo::new("resource-set-bindings", "Resource Set Bindings");

/// Snapshot columns for resource sets.
const RESOURCE_SET_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Resource Set Name", Extract::Path(&["label"])),
    SnapshotField::new("Description", Extract::Path(&["description"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Snapshot columns for resources.
const RESOURCE_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Resource", Extract::Path(&["orn"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Snapshot columns for bindings.
const BINDING_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Role", Extract::Path(&["id"])),
    SnapshotField::new("Links", Extract::Path(&["_links"])),
];

/// Resource sets, with resources and bindings in snapshots.
#[derive(Debug, Clone)]
pub struct ResourceSetsAdapter {
    /// Collection comparison.
    inner: CollectionAdapter,
}

impl Default for ResourceSetsAdapter {
    fn default() -> Self {
        Self {
            inner: CollectionAdapter {
                info: RESOURCE_SETS,
                resource: ResourcePath::org("/api/v1/iam/resource-sets").with_list_key("resource-sets"),
                key: key_label_name_id,
                spec: CompareSpec::Signature(SignatureSpec::new("Settings", ENVIRONMENT_NOISE)),
                templates: Templates {
                    missing: Outcome::new("Admin Scope", "Create resource set '{name}' in {env}"),
                    extra: Outcome::new(
                        "Unexpected Resource Set",
                        "Review extra resource set '{name}' in {env}",
                    ),
                    mismatch: Outcome::new(
                        "Resource Set Drift",
                        "Align resource set settings for '{name}'",
                    ),
                },
                unmatched_b: UnmatchedB::ExtraInB,
                fields: RESOURCE_SET_FIELDS,
            },
        }
    }
}

impl EntityAdapter for ResourceSetsAdapter {
    fn section(&self) -> SectionInfo {
        RESOURCE_SETS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        self.inner.compare(ctx)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let sets = match ctx.fetch(RESOURCE_SETS.id, &self.inner.resource) {
            Ok(sets) => sets,
            Err(err) => {
                return [RESOURCE_SETS, RESOURCE_SET_RESOURCES, RESOURCE_SET_BINDINGS]
                    .iter()
                    .map(|info| unavailable_section(info.id, info.title, &err))
                    .collect();
            }
        };
        let resources_path =
            ResourcePath::org("/api/v1/iam/resource-sets/{parent}/resources").with_list_key("resources");
        let bindings_path =
            ResourcePath::org("/api/v1/iam/resource-sets/{parent}/bindings").with_list_key("roles");
        let mut resources = Vec::new();
        let mut bindings = Vec::new();
        for set in &sets {
            if let Ok(items) = ctx.fetch_sub(RESOURCE_SET_RESOURCES.id, &resources_path, set) {
                resources.extend(child_rows("Resource Set Name", set, &items, RESOURCE_FIELDS));
            }
            if let Ok(items) = ctx.fetch_sub(RESOURCE_SET_BINDINGS.id, &bindings_path, set) {
                bindings.extend(child_rows("Resource Set Name", set, &items, BINDING_FIELDS));
            }
        }
        vec![
            SnapshotSection::from_rows(
                RESOURCE_SETS.id,
                RESOURCE_SETS.title,
                snapshot_rows(&sets, RESOURCE_SET_FIELDS),
            ),
            SnapshotSection::from_rows(RESOURCE_SET_RESOURCES.id, RESOURCE_SET_RESOURCES.title, resources),
            SnapshotSection::from_rows(RESOURCE_SET_BINDINGS.id, RESOURCE_SET_BINDINGS.title, bindings),
        ]
    }
}

// ============================================================================
// SECTION: Admin Assignments
// ============================================================================

/// Admin assignments section.
pub const ADMIN_ASSIGNMENTS: SectionInfo =
    SectionInfo::new("admin-assignments", "Admin Assignments");

/// One set-compared assignment kind.
struct AssignmentKind {
    /// Admin-host endpoint.
    path: &'static str,
    /// Display name of an assignment.
    identity: fn(&Record) -> Option<String>,
    /// Report object.
    object: &'static str,
    /// Report attribute.
    attribute: &'static str,
    /// Mismatch outcome.
    mismatch: Outcome,
}

/// Assignment kinds in report order.
const ASSIGNMENT_KINDS: [AssignmentKind; 3] = [
    AssignmentKind {
        path: "/api/internal/privileges/admins",
        identity: admin_user_identity,
        object: "Admin Users",
        attribute: "Users",
        mismatch: Outcome::new("Admin Assignment Drift", "Align admin users between environments"),
    },
    AssignmentKind {
        path: "/api/internal/privileges/adminGroups",
        identity: admin_group_identity,
        object: "Admin Groups",
        attribute: "Groups",
        mismatch: Outcome::new(
            "Admin Group Assignment Drift",
            "Align admin groups between environments",
        ),
    },
    AssignmentKind {
        path: "/admin/api/v1/privileges/adminPublicClientApps",
        identity: admin_app_identity,
        object: "Admin Apps",
        attribute: "Apps",
        mismatch: Outcome::new(
            "Admin App Assignment Drift",
            "Align admin app assignments between environments",
        ),
    },
];

/// Names an admin user by login, email, display name, then user id.
fn admin_user_identity(record: &Record) -> Option<String> {
    if let Some(text) = record.as_str() {
        return Some(text.to_string());
    }
    first_text(record, &["login", "email", "displayName", "userId"])
}

/// Names an admin group by name, then group id.
fn admin_group_identity(record: &Record) -> Option<String> {
    first_text(record, &["name", "groupId"])
}

/// Names an admin app by display name, then app instance id.
fn admin_app_identity(record: &Record) -> Option<String> {
    first_text(record, &["displayName", "appInstanceId"])
}

/// Admin users, groups, and apps compared as name sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminAssignmentsAdapter;

impl EntityAdapter for AdminAssignmentsAdapter {
    fn section(&self) -> SectionInfo {
        ADMIN_ASSIGNMENTS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let mut recon = Reconciliation::default();
        for kind in &ASSIGNMENT_KINDS {
            let resource = ResourcePath::admin(kind.path);
            let Some((a, b)) = ctx.fetch_pair(ADMIN_ASSIGNMENTS, &resource, &mut notices) else {
                continue;
            };
            let policy = ComparePolicy::new(
                ADMIN_ASSIGNMENTS.title,
                CompareSpec::Deferred,
                Templates {
                    missing: kind.mismatch,
                    extra: kind.mismatch,
                    mismatch: kind.mismatch,
                },
            );
            let names_a = joined_names(a.iter().filter_map(kind.identity));
            let names_b = joined_names(b.iter().filter_map(kind.identity));
            recon.matched += 1;
            if names_a == names_b {
                recon.matches.push(policy.matched(kind.object, kind.attribute, Value::from(names_a)));
            } else {
                recon.diffs.push(policy.diff(
                    kind.object,
                    kind.attribute,
                    DifferenceType::Mismatch,
                    (Value::from(names_a), Value::from(names_b)),
                    None,
                ));
            }
        }
        SectionReport::new(ADMIN_ASSIGNMENTS, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let mut rows = Vec::new();
        let mut unavailable = Vec::new();
        for kind in &ASSIGNMENT_KINDS {
            match ctx.fetch(ADMIN_ASSIGNMENTS.id, &ResourcePath::admin(kind.path)) {
                Ok(records) => rows.extend(records.iter().filter_map(kind.identity).map(|name| {
                    vec![
                        ("Assignment Type".to_string(), Value::from(kind.attribute)),
                        ("Name".to_string(), Value::from(name)),
                    ]
                })),
                Err(_) => unavailable.push(kind.object),
            }
        }
        let section = SnapshotSection::from_rows(ADMIN_ASSIGNMENTS.id, ADMIN_ASSIGNMENTS.title, rows);
        if unavailable.is_empty() {
            vec![section]
        } else {
            vec![section.with_description(format!("Data unavailable: {}", unavailable.join(", ")))]
        }
    }
}

// ============================================================================
// SECTION: API Tokens
// ============================================================================

/// API tokens section.
pub const API_TOKENS: SectionInfo = SectionInfo::new("api-tokens", "API Tokens");

/// Snapshot columns for tokens.
const TOKEN_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Token Name", Extract::Path(&["name"])),
    SnapshotField::new("Client Name", Extract::Path(&["clientName"])),
    SnapshotField::new("Network", Extract::Path(&["network"])),
    SnapshotField::new("Expires At", Extract::Path(&["expiresAt"])),
];

/// Keys tokens by name, then label, then id.
fn token_key(record: &Record) -> Option<String> {
    first_text(record, &["name", "label", "id"])
}

/// Reads a token's display name.
fn token_name(record: &Record) -> Value {
    Value::from(token_key(record).unwrap_or_default())
}

/// Builds the API tokens adapter.
#[must_use]
pub fn api_tokens() -> CollectionAdapter {
    CollectionAdapter {
        info: API_TOKENS,
        resource: ResourcePath::org("/api/v1/api-tokens"),
        key: token_key,
        spec: CompareSpec::Attributes(vec![
            AttributeSpec::value("Name", Extract::With(token_name)),
            AttributeSpec::value("Network", Extract::OrEmpty(&["network"])),
        ]),
        templates: Templates {
            missing: Outcome::new("API Access", "Create API token '{name}' in {env}"),
            extra: Outcome::new("Unexpected Token", "Review extra API token '{name}' in {env}"),
            mismatch: Outcome::new("API Access", "Align network settings for API token '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: TOKEN_FIELDS,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
