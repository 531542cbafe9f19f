// crates/tenant-drift-entities/tests/adapters.rs
// ============================================================================
// Module: Adapter Scenario Tests
// Description: Section-level comparisons against in-memory environments.
// Purpose: Verify keys, placements, outcomes, and degraded fetch handling.
// ============================================================================

//! ## Overview
//! Each test builds two [`FakeSource`] environments and runs one adapter, or
//! a filtered registry run, over them.

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

mod common;

use serde_json::Value;
use serde_json::json;
use tenant_drift_core::DifferenceType;
use tenant_drift_core::Environment;
use tenant_drift_core::NoticeKind;
use tenant_drift_core::Priority;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SectionStatus;
use tenant_drift_core::UnavailableMode;
use tenant_drift_entities::AdapterRegistry;
use tenant_drift_entities::CompareContext;
use tenant_drift_entities::CompareOptions;
use tenant_drift_entities::EntityAdapter;
use tenant_drift_entities::SnapshotContext;
use tenant_drift_entities::branding::BrandEmailTemplatesAdapter;
use tenant_drift_entities::directory::GroupRulesAdapter;
use tenant_drift_entities::directory::groups;
use tenant_drift_entities::policies::GlobalSessionPolicies;
use tenant_drift_entities::policies::password_policies;
use tenant_drift_entities::profiles::PROFILE_MAPPINGS;
use tenant_drift_entities::profiles::ProfileMappingsAdapter;
use tenant_drift_entities::security::OrgSettingsAdapter;
use tenant_drift_entities::security::SecuritySettingsAdapter;

use crate::common::FakeSource;
use crate::common::RecordingSink;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs one adapter over two environments with default options.
fn compare(adapter: &dyn EntityAdapter, a: &FakeSource, b: &FakeSource) -> SectionReport {
    compare_with(adapter, a, b, CompareOptions::default())
}

/// Runs one adapter over two environments.
fn compare_with(
    adapter: &dyn EntityAdapter,
    a: &FakeSource,
    b: &FakeSource,
    options: CompareOptions,
) -> SectionReport {
    let sink = RecordingSink::default();
    let ctx = CompareContext::new(a, b, options, &sink);
    adapter.compare(&ctx)
}

fn group(name: &str, description: &str) -> Value {
    json!({"id": format!("g-{name}"), "profile": {"name": name, "description": description}})
}

// ============================================================================
// SECTION: Groups
// ============================================================================

#[test]
fn group_missing_in_env_b_is_critical() {
    let a = FakeSource::new("a.okta.com")
        .with("/api/v1/groups", json!([group("Finance", "Finance team")]));
    let b = FakeSource::new("b.okta.com").with("/api/v1/groups", json!([]));
    let report = compare(&groups(), &a, &b);

    assert_eq!(report.diffs.len(), 1);
    let diff = &report.diffs[0];
    assert_eq!(diff.category, "Groups");
    assert_eq!(diff.object, "Finance");
    assert_eq!(diff.attribute, "-");
    assert_eq!(diff.value_a, json!("Exists"));
    assert_eq!(diff.value_b, json!("Missing"));
    assert_eq!(diff.difference_type, DifferenceType::MissingInB);
    assert_eq!(diff.priority, Priority::Critical);
    assert_eq!(diff.recommended_action, "Create group 'Finance' in Env B");
    assert_eq!(report.summary.status, SectionStatus::Fail);
}

#[test]
fn group_description_match_is_recorded() {
    let a = FakeSource::new("a").with("/api/v1/groups", json!([group("Finance", "Finance team")]));
    let b = FakeSource::new("b").with("/api/v1/groups", json!([group("Finance", "Finance team")]));
    let report = compare(&groups(), &a, &b);

    assert!(report.diffs.is_empty());
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].object, "Finance");
    assert_eq!(report.matches[0].attribute, "Description");
    assert_eq!(report.matches[0].value, json!("Finance team"));
    assert_eq!(report.summary.status, SectionStatus::Pass);
}

#[test]
fn extra_group_in_env_b_is_flagged_for_review() {
    let a = FakeSource::new("a").with("/api/v1/groups", json!([]));
    let b = FakeSource::new("b").with("/api/v1/groups", json!([group("Contractors", "")]));
    let report = compare(&groups(), &a, &b);

    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].difference_type, DifferenceType::ExtraInB);
    assert_eq!(report.diffs[0].value_a, json!("Missing"));
    assert_eq!(report.diffs[0].value_b, json!("Exists"));
    assert_eq!(report.diffs[0].recommended_action, "Review/remove group 'Contractors' in Env B");
}

// ============================================================================
// SECTION: Group Rules
// ============================================================================

fn rule(group_id: &str) -> Value {
    json!([{
        "id": "r1",
        "name": "Eng rule",
        "conditions": {"expression": {"value": format!("isMemberOfAnyGroup(\"{group_id}\")")}}
    }])
}

#[test]
fn group_rule_ids_resolve_to_names_on_both_sides() {
    let a = FakeSource::new("a")
        .with("/api/v1/groups/rules", rule("ga1"))
        .with("/api/v1/groups", json!([{"id": "ga1", "profile": {"name": "Engineering"}}]));
    let b = FakeSource::new("b")
        .with("/api/v1/groups/rules", rule("gb9"))
        .with("/api/v1/groups", json!([{"id": "gb9", "profile": {"name": "Engineering"}}]));
    let report = compare(&GroupRulesAdapter, &a, &b);

    assert!(report.diffs.is_empty());
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.summary.status, SectionStatus::Pass);
}

#[test]
fn group_lookup_failure_marks_rules_unavailable() {
    let a = FakeSource::new("a")
        .with("/api/v1/groups/rules", rule("ga1"))
        .with("/api/v1/groups", json!([{"id": "ga1", "profile": {"name": "Engineering"}}]));
    let b = FakeSource::new("b")
        .with("/api/v1/groups/rules", rule("gb9"))
        .with_status("/api/v1/groups", 500);
    let report = compare(&GroupRulesAdapter, &a, &b);

    assert!(report.diffs.is_empty());
    assert_eq!(report.summary.status, SectionStatus::Unavailable);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].kind, NoticeKind::DataUnavailable);
}

#[test]
fn group_lookup_failure_leaves_both_sides_unresolved_under_legacy_mode() {
    let a = FakeSource::new("a")
        .with("/api/v1/groups/rules", rule("g1"))
        .with("/api/v1/groups", json!([{"id": "g1", "profile": {"name": "Engineering"}}]));
    let b = FakeSource::new("b")
        .with("/api/v1/groups/rules", rule("g1"))
        .with_status("/api/v1/groups", 500);
    let options = CompareOptions {
        unavailable: UnavailableMode::TreatAsEmpty,
        ..CompareOptions::default()
    };
    let report = compare_with(&GroupRulesAdapter, &a, &b, options);

    assert!(report.diffs.is_empty());
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].value, json!("isMemberOfAnyGroup(\"g1\")"));
}

#[test]
fn group_rules_snapshot_is_unavailable_without_groups() {
    let source = FakeSource::new("a")
        .with("/api/v1/groups/rules", rule("ga1"))
        .with_status("/api/v1/groups", 500);
    let sink = RecordingSink::default();
    let ctx = SnapshotContext::new(Environment::A, &source, &sink);
    let sections = GroupRulesAdapter.snapshot(&ctx);

    assert_eq!(sections.len(), 1);
    assert!(sections[0].rows.is_empty());
    assert!(sections[0].description.starts_with("Data unavailable"));
    assert_eq!(sink.named("fetch_failed").len(), 1);
}

// ============================================================================
// SECTION: Policies
// ============================================================================

#[test]
fn session_rule_priority_mismatch_is_parent_qualified() {
    let policy = json!([{"id": "p1", "name": "Default", "status": "ACTIVE", "priority": 1}]);
    let a = FakeSource::new("a")
        .with("/api/v1/policies?type=OKTA_SIGN_ON", policy.clone())
        .with(
            "/api/v1/policies/p1/rules",
            json!([{"id": "r1", "name": "MFA Required", "priority": 1, "status": "ACTIVE"}]),
        );
    let b = FakeSource::new("b")
        .with("/api/v1/policies?type=OKTA_SIGN_ON", policy)
        .with(
            "/api/v1/policies/p1/rules",
            json!([{"id": "r9", "name": "MFA Required", "priority": 2, "status": "ACTIVE"}]),
        );
    let report = compare(&GlobalSessionPolicies, &a, &b);

    assert_eq!(report.diffs.len(), 1);
    let diff = &report.diffs[0];
    assert_eq!(diff.object, "Default / Rule: MFA Required");
    assert_eq!(diff.attribute, "priority");
    assert_eq!(diff.value_a, json!(1));
    assert_eq!(diff.value_b, json!(2));
    assert_eq!(diff.difference_type, DifferenceType::Mismatch);
    assert_eq!(diff.priority, Priority::Medium);
}

#[test]
fn policy_rules_compare_regardless_of_order() {
    let policies = json!([{"id": "p1", "name": "Default Password"}]);
    let first = json!({"id": "r1", "name": "Allow", "priority": 1, "status": "ACTIVE"});
    let second = json!({"id": "r2", "name": "Legacy", "priority": 2, "status": "ACTIVE"});
    let a = FakeSource::new("a")
        .with("/api/v1/policies?type=PASSWORD", policies.clone())
        .with("/api/v1/policies/p1/rules", json!([first.clone(), second.clone()]));
    let b = FakeSource::new("b")
        .with("/api/v1/policies?type=PASSWORD", policies)
        .with("/api/v1/policies/p1/rules", json!([second, first]));
    let report = compare(&password_policies(), &a, &b);

    assert!(report.diffs.is_empty());
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].attribute, "Rules");
}

#[test]
fn rules_fetch_failure_marks_policy_unavailable() {
    let policies = json!([{"id": "p1", "name": "Default Password"}]);
    let a = FakeSource::new("a")
        .with("/api/v1/policies?type=PASSWORD", policies.clone())
        .with("/api/v1/policies/p1/rules", json!([]));
    let b = FakeSource::new("b")
        .with("/api/v1/policies?type=PASSWORD", policies)
        .with_status("/api/v1/policies/p1/rules", 500);
    let report = compare(&password_policies(), &a, &b);

    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].attribute, "Rules");
    assert_eq!(report.diffs[0].value_a, json!("Unavailable"));
    assert_eq!(report.diffs[0].value_b, json!("Unavailable"));
}

// ============================================================================
// SECTION: Settings Documents
// ============================================================================

#[test]
fn unreadable_security_documents_match_as_not_available() {
    let a = FakeSource::new("a").with("/api/v1/org/captcha", json!({"captchaId": "c1"}));
    let b = FakeSource::new("b");
    let report = compare(&SecuritySettingsAdapter, &a, &b);

    let captcha = report.diffs.iter().find(|diff| diff.object == "Captcha").unwrap();
    assert_eq!(captcha.value_a, json!("Available"));
    assert_eq!(captcha.value_b, json!("Not Available"));
    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.matches.len(), 6);
    assert!(report.matches.iter().all(|entry| entry.value == json!("Not Available")));
}

#[test]
fn org_settings_compare_key_by_key() {
    let a = FakeSource::new("a").with(
        "/api/v1/org",
        json!({"id": "o1", "companyName": "Acme", "website": "https://acme.example", "phoneNumber": null}),
    );
    let b = FakeSource::new("b").with(
        "/api/v1/org",
        json!({"id": "o2", "companyName": "Acme Preview", "website": "https://acme.example"}),
    );
    let report = compare(&OrgSettingsAdapter, &a, &b);

    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].object, "Org Settings");
    assert_eq!(report.diffs[0].attribute, "companyName");
    assert!(report.matches.iter().any(|entry| entry.attribute == "website"));
    assert!(report.matches.iter().all(|entry| entry.attribute != "id"));
}

// ============================================================================
// SECTION: Profile Mappings
// ============================================================================

#[test]
fn mapping_detail_failure_is_reported_as_unavailable() {
    let types = json!([{"id": "t1", "name": "saml_idp"}]);
    let mappings =
        json!([{"id": "m1", "source": {"name": "saml_idp"}, "target": {"name": "user"}}]);
    let a = FakeSource::new("a")
        .with("/api/v1/user/types?category=idp", types.clone())
        .with("/api/v1/mappings", mappings.clone())
        .with("/api/v1/mappings/m1", json!({"properties": {}}));
    let b = FakeSource::new("b")
        .with("/api/v1/user/types?category=idp", types)
        .with("/api/v1/mappings", mappings);
    let report = compare(&ProfileMappingsAdapter, &a, &b);

    assert_eq!(report.diffs.len(), 1);
    let diff = &report.diffs[0];
    assert_eq!(diff.object, "saml_idp -> user");
    assert_eq!(diff.value_a, json!("Unavailable"));
    assert_eq!(diff.impact, "Profile Mapping Drift");
    assert_eq!(diff.recommended_action, "Verify mapping details for 'saml_idp -> user'");
}

#[test]
fn unusable_mapping_id_is_counted_as_failed_fetch() {
    let a = FakeSource::new("a");
    let b = FakeSource::new("b").with("/api/v1/mappings/m1", json!({"properties": {}}));
    let sink = RecordingSink::default();
    let ctx = CompareContext::new(&a, &b, CompareOptions::default(), &sink);
    let result = ctx.fetch_detail_sub_pair(
        PROFILE_MAPPINGS,
        &ResourcePath::org("/api/v1/mappings/{parent}"),
        (&json!({}), &json!({"id": "m1"})),
    );

    assert!(result.is_err());
    assert_eq!(ctx.tally().failed, 1);
    assert_eq!(ctx.tally().completed, 1);
    assert_eq!(sink.named("fetch_failed").len(), 1);
}

// ============================================================================
// SECTION: Brand Email Templates
// ============================================================================

#[test]
fn email_customization_mismatch_reads_didnt_match() {
    let brands = json!([{"id": "b1", "name": "Main"}]);
    let templates = json!([{"name": "UserActivation"}]);
    let customizations = "/api/v1/brands/b1/templates/email/UserActivation/customizations";
    let a = FakeSource::new("a")
        .with("/api/v1/brands", brands.clone())
        .with("/api/v1/brands/b1/templates/email", templates.clone())
        .with(customizations, json!([{"subject": "Welcome", "body": "<p>Hi</p>"}]));
    let b = FakeSource::new("b")
        .with("/api/v1/brands", brands)
        .with("/api/v1/brands/b1/templates/email", templates)
        .with(customizations, json!([{"subject": "Welcome aboard", "body": "<p>Hi</p>"}]));
    let report = compare(&BrandEmailTemplatesAdapter, &a, &b);

    assert_eq!(report.diffs.len(), 1);
    let diff = &report.diffs[0];
    assert_eq!(diff.difference_type, DifferenceType::Mismatch);
    assert_eq!(diff.value_a, json!("Didn't match"));
    assert_eq!(diff.value_b, json!("Didn't match"));
}

// ============================================================================
// SECTION: Unavailable Collections
// ============================================================================

#[test]
fn failed_collection_is_reported_not_diffed_by_default() {
    let a = FakeSource::new("a").with("/api/v1/groups", json!([group("Finance", "")]));
    let b = FakeSource::new("b").with_status("/api/v1/groups", 500);
    let report = compare(&groups(), &a, &b);

    assert!(report.diffs.is_empty());
    assert_eq!(report.summary.status, SectionStatus::Unavailable);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].kind, NoticeKind::DataUnavailable);
}

#[test]
fn failed_collection_is_empty_under_legacy_mode() {
    let a = FakeSource::new("a").with("/api/v1/groups", json!([group("Finance", "")]));
    let b = FakeSource::new("b").with_status("/api/v1/groups", 500);
    let options = CompareOptions {
        unavailable: UnavailableMode::TreatAsEmpty,
        ..CompareOptions::default()
    };
    let report = compare_with(&groups(), &a, &b, options);

    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].difference_type, DifferenceType::MissingInB);
    assert!(report.notices.is_empty());
}

// ============================================================================
// SECTION: Registry Runs
// ============================================================================

#[test]
fn duplicate_keys_raise_notice_and_audit_event() {
    let a = FakeSource::new("a")
        .with("/api/v1/groups", json!([group("Finance", "old"), group("Finance", "new")]));
    let b = FakeSource::new("b").with("/api/v1/groups", json!([group("Finance", "new")]));
    let sink = RecordingSink::default();
    let report = AdapterRegistry::builtin()
        .run_comparison(&a, &b, CompareOptions::default(), &["groups".to_string()], &sink)
        .unwrap();

    assert_eq!(report.sections.len(), 1);
    let section = &report.sections[0];
    assert!(section.diffs.is_empty());
    assert!(section.notices.iter().any(|notice| notice.kind == NoticeKind::KeyCollision));
    assert_eq!(sink.named("key_collision").len(), 1);
    let names = sink.names();
    assert_eq!(names.first().copied(), Some("run_started"));
    assert_eq!(names.last().copied(), Some("run_completed"));
    assert!(names.contains(&"section_completed"));
}

#[test]
fn all_timeouts_mark_the_report_timed_out() {
    let a = FakeSource::new("a").with_timeout("/api/v1/groups");
    let b = FakeSource::new("b").with_timeout("/api/v1/groups");
    let sink = RecordingSink::default();
    let report = AdapterRegistry::builtin()
        .run_comparison(&a, &b, CompareOptions::default(), &["groups".to_string()], &sink)
        .unwrap();

    assert!(report.timed_out());
    assert_eq!(sink.named("fetch_failed").len(), 2);
}
