// crates/tenant-drift-entities/src/directory.rs
// ============================================================================
// Module: Directory Adapters
// Description: Groups and group rules.
// Purpose: Compare group inventories and rule-driven group assignment.
// Dependencies: tenant-drift-core
// ============================================================================

//! ## Overview
//! Groups are keyed by `profile.name`. Group rule conditions reference groups
//! by id, which differs between tenants, so each side's ids are rewritten to
//! that side's group names before the conditions are compared.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use serde_json::Value;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::Environment;
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
use tenant_drift_core::core::record::text_at;
use tenant_drift_core::reconcile;

use crate::adapter::CollectionAdapter;
use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::key_name;
use crate::adapter::snapshot_rows;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Groups
// ============================================================================

/// Groups section.
pub const GROUPS: SectionInfo = SectionInfo::new("groups", "Groups");

/// Group collection endpoint.
const GROUPS_PATH: &str = "/api/v1/groups";

/// Snapshot columns for groups.
const GROUP_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Name", Extract::Path(&["profile", "name"])),
    SnapshotField::new("Description", Extract::Path(&["profile", "description"])),
    SnapshotField::new("Type", Extract::Path(&["type"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Keys groups by profile name.
fn group_key(record: &Record) -> Option<String> {
    text_at(record, &["profile", "name"])
}

/// Builds the groups adapter.
#[must_use]
pub fn groups() -> CollectionAdapter {
    CollectionAdapter {
        info: GROUPS,
        resource: ResourcePath::org(GROUPS_PATH),
        key: group_key,
        spec: CompareSpec::Attributes(vec![AttributeSpec::text(
            "Description",
            &["profile", "description"],
        )]),
        templates: Templates {
            missing: Outcome::new("Access", "Create group '{name}' in {env}"),
            extra: Outcome::new("Configuration Drift", "Review/remove group '{name}' in {env}"),
            mismatch: Outcome::new("Configuration Drift", "Align description for group '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: GROUP_FIELDS,
    }
}

// ============================================================================
// SECTION: Group Rules
// ============================================================================

/// Group rules section.
pub const GROUP_RULES: SectionInfo = SectionInfo::new("group-rules", "Group Rules");

/// Path of a rule's condition expression.
const CONDITION_PATH: &[&str] = &["conditions", "expression", "value"];

/// Group rule outcome templates.
const RULE_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Group Assignment", "Create rule '{name}' in {env}"),
    extra: Outcome::new("Unexpected Assignment", "Review extra rule '{name}' in {env}"),
    mismatch: Outcome::new("Assignment Drift", "Align condition for rule '{name}'"),
};

/// Group rules compared on their condition with group ids resolved to names.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupRulesAdapter;

impl EntityAdapter for GroupRulesAdapter {
    fn section(&self) -> SectionInfo {
        GROUP_RULES
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let resource = ResourcePath::org("/api/v1/groups/rules");
        let Some((rules_a, rules_b)) = ctx.fetch_pair(GROUP_RULES, &resource, &mut notices) else {
            return SectionReport::new(GROUP_RULES, Reconciliation::default(), notices);
        };
        let groups = ResourcePath::org(GROUPS_PATH);
        let groups_a = ctx.fetch(Environment::A, GROUP_RULES, &groups);
        let groups_b = ctx.fetch(Environment::B, GROUP_RULES, &groups);
        let resolvable = groups_a.is_ok() && groups_b.is_ok();
        let Some((groups_a, groups_b)) = ctx.settle_pair(&groups, groups_a, groups_b, &mut notices)
        else {
            return SectionReport::new(GROUP_RULES, Reconciliation::default(), notices);
        };
        // Ids are rewritten on both sides or on neither.
        let (rules_a, rules_b) = if resolvable {
            (
                resolve_conditions(rules_a, &group_name_map(&groups_a)),
                resolve_conditions(rules_b, &group_name_map(&groups_b)),
            )
        } else {
            (rules_a, rules_b)
        };
        let policy = ComparePolicy::new(
            GROUP_RULES.title,
            CompareSpec::Attributes(vec![AttributeSpec::text("Condition", CONDITION_PATH)]),
            RULE_TEMPLATES,
        );
        SectionReport::new(GROUP_RULES, reconcile(&rules_a, &rules_b, key_name, &policy), notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let resource = ResourcePath::org("/api/v1/groups/rules");
        let rules = match ctx.fetch(GROUP_RULES.id, &resource) {
            Ok(rules) => rules,
            Err(err) => return vec![unavailable_section(GROUP_RULES.id, GROUP_RULES.title, &err)],
        };
        let groups = match ctx.fetch(GROUP_RULES.id, &ResourcePath::org(GROUPS_PATH)) {
            Ok(groups) => groups,
            Err(err) => return vec![unavailable_section(GROUP_RULES.id, GROUP_RULES.title, &err)],
        };
        let rules = resolve_conditions(rules, &group_name_map(&groups));
        let fields = [
            SnapshotField::new("Rule Name", Extract::Path(&["name"])),
            SnapshotField::new("Status", Extract::Path(&["status"])),
            SnapshotField::new("Condition", Extract::Path(CONDITION_PATH)),
            SnapshotField::new("Assigned Groups", Extract::With(assigned_groups)),
        ];
        vec![SnapshotSection::from_rows(GROUP_RULES.id, GROUP_RULES.title, snapshot_rows(&rules, &fields))]
    }
}

/// Maps group ids to profile names.
fn group_name_map(groups: &[Record]) -> HashMap<String, String> {
    groups
        .iter()
        .filter_map(|group| Some((text_at(group, &["id"])?, group_key(group)?)))
        .collect()
}

/// Rewrites group ids inside each rule's condition and assignment list.
fn resolve_conditions(mut rules: Vec<Record>, names: &HashMap<String, String>) -> Vec<Record> {
    if names.is_empty() {
        return rules;
    }
    for rule in &mut rules {
        if let Some(Value::String(expression)) = rule.pointer_mut("/conditions/expression/value") {
            *expression = replace_group_ids(expression, names);
        }
        if let Some(Value::Array(ids)) = rule.pointer_mut("/actions/assignUserToGroups/groupIds") {
            for id in ids.iter_mut() {
                if let Some(name) = id.as_str().and_then(|id| names.get(id)) {
                    *id = Value::from(name.clone());
                }
            }
        }
    }
    rules
}

/// Replaces every known group id in an expression with its group name.
fn replace_group_ids(expression: &str, names: &HashMap<String, String>) -> String {
    let mut ids: Vec<(&String, &String)> = names.iter().collect();
    // Longest ids first; one id may prefix another.
    ids.sort_by(|left, right| right.0.len().cmp(&left.0.len()).then_with(|| left.0.cmp(right.0)));
    ids.into_iter().fold(expression.to_string(), |text, (id, name)| text.replace(id.as_str(), name))
}

/// Lists the groups a rule assigns to.
fn assigned_groups(rule: &Record) -> Value {
    rule.pointer("/actions/assignUserToGroups/groupIds").cloned().unwrap_or(Value::Null)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
