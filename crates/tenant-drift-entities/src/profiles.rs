// crates/tenant-drift-entities/src/profiles.rs
// ============================================================================
// Module: Profile Adapters
// Description: User profile schema and IdP profile mappings.
// Purpose: Compare attribute definitions and directory attribute flows.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! The user schema is reached in two steps: the default user type is looked
//! up first, then its schema document is read and flattened into one record
//! per attribute. Profile mappings are limited to those touching an identity
//! provider user type; each matched mapping's detail is fetched and compared
//! as an order-insensitive list of field expressions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::Environment;
use tenant_drift_core::Extract;
use tenant_drift_core::FetchError;
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
use tenant_drift_core::core::record::cloned_at;
use tenant_drift_core::core::record::items;
use tenant_drift_core::core::record::text_at;
use tenant_drift_core::core::record::value_at;
use tenant_drift_core::core::signature::SCHEMA_NOISE;
use tenant_drift_core::reconcile;
use tenant_drift_core::reconcile_nested;

use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::key_name;
use crate::adapter::snapshot_rows;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Profile Schema
// ============================================================================

/// User profile schema section.
pub const PROFILE_SCHEMA_USER: SectionInfo =
    SectionInfo::new("profile-schema-user", "Profile Schema - User");

/// User type collection.
const USER_TYPES_PATH: &str = "/api/v1/user/types";

/// Schema document of one user type.
const USER_SCHEMA_PATH: &str = "/api/v1/meta/schemas/user/{parent}";

/// Locations of attribute definitions inside a schema document, merged in
/// order so later locations override earlier ones.
const PROPERTY_SOURCES: &[&[&str]] = &[
    &["definitions", "base", "properties"],
    &["definitions", "custom", "properties"],
    &["properties"],
    &["schema", "properties"],
];

/// Snapshot columns for schema attributes.
const ATTRIBUTE_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Attribute", Extract::Path(&["name"])),
    SnapshotField::new("Title", Extract::Path(&["settings", "title"])),
    SnapshotField::new("Type", Extract::Path(&["settings", "type"])),
    SnapshotField::new("Mutability", Extract::Path(&["settings", "mutability"])),
    SnapshotField::new("Scope", Extract::Path(&["settings", "scope"])),
    SnapshotField::new("Required", Extract::Path(&["settings", "required"])),
];

/// Returns true for the default user type.
fn is_default_user_type(record: &Record) -> bool {
    text_at(record, &["name"]).as_deref() == Some("user")
        || text_at(record, &["displayName"]).as_deref() == Some("User")
}

/// Finds the default user type's id.
fn default_user_type_id(types: &[Record]) -> Result<String, FetchError> {
    types
        .iter()
        .find(|record| is_default_user_type(record))
        .and_then(|record| text_at(record, &["id"]))
        .ok_or_else(|| FetchError::Malformed("no default user type found".to_string()))
}

/// Flattens a schema document into `{name, settings}` records.
fn schema_attributes(schema: &Record) -> Vec<Record> {
    let mut merged = Map::new();
    for path in PROPERTY_SOURCES {
        if let Some(Value::Object(properties)) = value_at(schema, path) {
            for (name, settings) in properties {
                merged.insert(name.clone(), settings.clone());
            }
        }
    }
    merged
        .into_iter()
        .map(|(name, settings)| {
            json!({
                "name": name,
                "settings": settings,
            })
        })
        .collect()
}

/// Resolves the default user type and loads its attribute records.
fn load_user_schema(
    fetch_types: impl FnOnce(&ResourcePath) -> Result<Vec<Record>, FetchError>,
    fetch_schema: impl FnOnce(&ResourcePath) -> Result<Record, FetchError>,
) -> Result<Vec<Record>, FetchError> {
    let types = fetch_types(&ResourcePath::org(USER_TYPES_PATH))?;
    let type_id = default_user_type_id(&types)?;
    let schema = fetch_schema(&ResourcePath::org(USER_SCHEMA_PATH).with_parent(&type_id)?)?;
    Ok(schema_attributes(&schema))
}

/// Compares the default user type's attribute definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSchemaAdapter;

impl ProfileSchemaAdapter {
    /// Returns the compare policy for schema attributes.
    fn policy() -> ComparePolicy {
        ComparePolicy::new(
            PROFILE_SCHEMA_USER.title,
            CompareSpec::Signature(
                SignatureSpec::new("Settings", SCHEMA_NOISE).with_project(Extract::Path(&["settings"])),
            ),
            Templates {
                missing: Outcome::new("Profile Schema", "Create attribute '{name}' in {env} user schema"),
                extra: Outcome::new(
                    "Profile Schema",
                    "Review extra attribute '{name}' in {env} user schema",
                ),
                mismatch: Outcome::new(
                    "Profile Schema Drift",
                    "Align attribute settings for '{name}' in user schema",
                ),
            },
        )
        .with_unmatched_b(UnmatchedB::ExtraInB)
    }

    /// Loads one environment's attribute records.
    fn load(ctx: &CompareContext<'_>, environment: Environment) -> Result<Vec<Record>, FetchError> {
        load_user_schema(
            |resource| ctx.fetch(environment, PROFILE_SCHEMA_USER, resource),
            |resource| ctx.fetch_detail(environment, PROFILE_SCHEMA_USER, resource),
        )
    }
}

impl EntityAdapter for ProfileSchemaAdapter {
    fn section(&self) -> SectionInfo {
        PROFILE_SCHEMA_USER
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let a = Self::load(ctx, Environment::A);
        let b = Self::load(ctx, Environment::B);
        let resource = ResourcePath::org(USER_SCHEMA_PATH);
        let Some((a, b)) = ctx.settle_pair(&resource, a, b, &mut notices) else {
            return SectionReport::new(PROFILE_SCHEMA_USER, Reconciliation::default(), notices);
        };
        SectionReport::new(PROFILE_SCHEMA_USER, reconcile(&a, &b, key_name, &Self::policy()), notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let section = PROFILE_SCHEMA_USER;
        let loaded = load_user_schema(
            |resource| ctx.fetch(section.id, resource),
            |resource| ctx.fetch_detail(section.id, resource),
        );
        match loaded {
            Ok(attributes) => vec![SnapshotSection::from_rows(
                section.id,
                section.title,
                snapshot_rows(&attributes, ATTRIBUTE_FIELDS),
            )],
            Err(err) => vec![unavailable_section(section.id, section.title, &err)],
        }
    }
}

// ============================================================================
// SECTION: Profile Mappings
// ============================================================================

/// Profile mappings section.
pub const PROFILE_MAPPINGS: SectionInfo = SectionInfo::new("profile-mappings", "Profile Mappings");

/// Identity provider user types.
const IDP_TYPES_PATH: &str = "/api/v1/user/types?category=idp";

/// Mapping collection.
const MAPPINGS_PATH: &str = "/api/v1/mappings";

/// One mapping's detail.
const MAPPING_PATH: &str = "/api/v1/mappings/{parent}";

/// Matched-mapping attribute label.
const SETTINGS: &str = "Settings";

/// Outcome when a mapping's detail cannot be read.
const DETAIL_UNAVAILABLE: Outcome =
    Outcome::new("Profile Mapping Drift", "Verify mapping details for '{name}'");

/// Snapshot columns for mappings.
const MAPPING_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Mapping", Extract::With(mapping_label)),
    SnapshotField::new("Source", Extract::Path(&["source", "name"])),
    SnapshotField::new("Source Type", Extract::Path(&["source", "type"])),
    SnapshotField::new("Target", Extract::Path(&["target", "name"])),
    SnapshotField::new("Target Type", Extract::Path(&["target", "type"])),
    SnapshotField::new("Mapping ID", Extract::Path(&["id"])),
];

/// Keys a mapping as `"{source} -> {target}"`.
fn mapping_key(record: &Record) -> Option<String> {
    let source = text_at(record, &["source", "name"])?;
    let target = text_at(record, &["target", "name"])?;
    Some(format!("{source} -> {target}"))
}

/// Renders the mapping key as a snapshot cell.
fn mapping_label(record: &Record) -> Value {
    Value::from(mapping_key(record).unwrap_or_default())
}

/// Collects identity provider user type names.
fn idp_type_names(types: &[Record]) -> BTreeSet<String> {
    types.iter().filter_map(|record| text_at(record, &["name"])).collect()
}

/// Keeps mappings whose source or target is an identity provider type.
fn idp_mappings(mappings: Vec<Record>, idp_names: &BTreeSet<String>) -> Vec<Record> {
    mappings
        .into_iter()
        .filter(|mapping| {
            [["source", "name"], ["target", "name"]]
                .iter()
                .filter_map(|path| text_at(mapping, path))
                .any(|name| idp_names.contains(&name))
        })
        .collect()
}

/// Projects a mapping detail to sorted `{targetField, sourceExpression,
/// pushStatus}` entries.
///
/// Both the `properties` object form and the `propertyMappings` array form
/// are read.
fn mapping_expressions(detail: &Record) -> Value {
    let mut entries: Vec<(String, String, Value)> = Vec::new();
    if let Some(Value::Object(properties)) = value_at(detail, &["properties"]) {
        for (target, rule) in properties {
            if rule.is_object() {
                entries.push(expression_entry(
                    Value::from(target.as_str()),
                    rule,
                    &["expression", "sourceExpression"],
                ));
            }
        }
    }
    for entry in items(&cloned_at(detail, &["propertyMappings"])) {
        if entry.is_object() {
            entries.push(expression_entry(
                cloned_at(entry, &["targetField"]),
                entry,
                &["sourceExpression", "expression"],
            ));
        }
    }
    entries.sort_by(|left, right| (&left.0, &left.1).cmp(&(&right.0, &right.1)));
    Value::Array(entries.into_iter().map(|(_, _, value)| value).collect())
}

/// Builds one expression entry with its sort keys.
fn expression_entry(target: Value, rule: &Value, expression_fields: &[&str]) -> (String, String, Value) {
    let expression = expression_fields
        .iter()
        .map(|field| cloned_at(rule, &[field]))
        .find(|value| !value.is_null() && value.as_str() != Some(""))
        .unwrap_or(Value::Null);
    let sort_target = target.as_str().unwrap_or_default().to_string();
    let sort_expression = expression.as_str().unwrap_or_default().to_string();
    (
        sort_target,
        sort_expression,
        json!({
            "targetField": target,
            "sourceExpression": expression,
            "pushStatus": cloned_at(rule, &["pushStatus"]),
        }),
    )
}

/// Compares profile mappings that involve identity providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileMappingsAdapter;

impl ProfileMappingsAdapter {
    /// Returns the compare policy for mappings.
    fn policy() -> ComparePolicy {
        ComparePolicy::new(
            PROFILE_MAPPINGS.title,
            CompareSpec::Deferred,
            Templates {
                missing: Outcome::new("Profile Mapping", "Create mapping '{name}' in {env}"),
                extra: Outcome::new("Profile Mapping", "Review extra mapping '{name}' in {env}"),
                mismatch: Outcome::new("Profile Mapping Drift", "Align mapping '{name}' between environments"),
            },
        )
        .with_unmatched_b(UnmatchedB::ExtraInB)
    }
}

impl EntityAdapter for ProfileMappingsAdapter {
    fn section(&self) -> SectionInfo {
        PROFILE_MAPPINGS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let types = ctx.fetch_pair(PROFILE_MAPPINGS, &ResourcePath::org(IDP_TYPES_PATH), &mut notices);
        let mappings = ctx.fetch_pair(PROFILE_MAPPINGS, &ResourcePath::org(MAPPINGS_PATH), &mut notices);
        let (Some((types_a, types_b)), Some((mappings_a, mappings_b))) = (types, mappings) else {
            return SectionReport::new(PROFILE_MAPPINGS, Reconciliation::default(), notices);
        };
        let a = idp_mappings(mappings_a, &idp_type_names(&types_a));
        let b = idp_mappings(mappings_b, &idp_type_names(&types_b));
        let policy = Self::policy();
        let detail = ResourcePath::org(MAPPING_PATH);
        let spec = AttributeSpec::signed(SETTINGS, Extract::Whole, &[]);
        let recon = reconcile_nested(&a, &b, mapping_key, &policy, |key, mapping_a, mapping_b, out| {
            match ctx.fetch_detail_sub_pair(PROFILE_MAPPINGS, &detail, (mapping_a, mapping_b)) {
                Ok((detail_a, detail_b)) => policy.compare_values(
                    key.as_str(),
                    &spec,
                    mapping_expressions(&detail_a),
                    mapping_expressions(&detail_b),
                    out,
                ),
                Err(_) => {
                    out.diffs.push(policy.unavailable(key.as_str(), SETTINGS, Some(&DETAIL_UNAVAILABLE)));
                }
            }
        });
        SectionReport::new(PROFILE_MAPPINGS, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let section = PROFILE_MAPPINGS;
        let loaded = ctx
            .fetch(section.id, &ResourcePath::org(IDP_TYPES_PATH))
            .and_then(|types| {
                let mappings = ctx.fetch(section.id, &ResourcePath::org(MAPPINGS_PATH))?;
                Ok(idp_mappings(mappings, &idp_type_names(&types)))
            });
        match loaded {
            Ok(mappings) => vec![SnapshotSection::from_rows(
                section.id,
                section.title,
                snapshot_rows(&mappings, MAPPING_FIELDS),
            )],
            Err(err) => vec![unavailable_section(section.id, section.title, &err)],
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
