// crates/tenant-drift-entities/src/policies.rs
// ============================================================================
// Module: Policy Adapters
// Description: Org policies and their rules.
// Purpose: Compare authentication, enrollment, password, and session policy.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! Five policy types share one shape: policies keyed by name, and each matched
//! pair's rules fetched and compared as one order-insensitive signature under
//! the `Rules` attribute. Global session policies go further and reconcile
//! their rules one by one, placing them under `"{policy} / Rule: {rule}"`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::Extract;
use tenant_drift_core::Outcome;
use tenant_drift_core::Placement;
use tenant_drift_core::Reconciliation;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::core::signature::normalize_rules;
use tenant_drift_core::reconcile;
use tenant_drift_core::reconcile_nested;

use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::key_name;
use crate::adapter::key_name_or_id;
use crate::adapter::snapshot_rows;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Shared
// ============================================================================

/// Rule collection of a policy.
const RULES_PATH: &str = "/api/v1/policies/{parent}/rules";

/// Rules attribute label.
const RULES: &str = "Rules";

/// Snapshot columns for policies.
const POLICY_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Policy Name", Extract::Path(&["name"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Priority", Extract::Path(&["priority"])),
    SnapshotField::new("Description", Extract::Path(&["description"])),
    SnapshotField::new("System", Extract::Path(&["system"])),
    SnapshotField::new("Policy ID", Extract::Path(&["id"])),
];

/// Returns the collection path for a policy type.
fn policies_path(policy_type: &str) -> ResourcePath {
    ResourcePath::org(format!("/api/v1/policies?type={policy_type}"))
}

/// Inventories policies and the rules of each policy.
fn policy_snapshot(
    ctx: &SnapshotContext<'_>,
    policies: SectionInfo,
    rules: SectionInfo,
    policy_type: &str,
) -> Vec<SnapshotSection> {
    let records = match ctx.fetch(policies.id, &policies_path(policy_type)) {
        Ok(records) => records,
        Err(err) => {
            return vec![
                unavailable_section(policies.id, policies.title, &err),
                unavailable_section(rules.id, rules.title, &err),
            ];
        }
    };
    let mut rule_rows = Vec::new();
    let mut failed = 0usize;
    for policy in &records {
        let policy_name = Value::from(key_name_or_id(policy).unwrap_or_default());
        match ctx.fetch_sub(rules.id, &ResourcePath::org(RULES_PATH), policy) {
            Ok(policy_rules) => {
                for rule in &policy_rules {
                    rule_rows.push(vec![
                        ("Policy Name".to_string(), policy_name.clone()),
                        ("Rule Name".to_string(), Extract::Path(&["name"]).apply(rule)),
                        ("Status".to_string(), Extract::Path(&["status"]).apply(rule)),
                        ("Priority".to_string(), Extract::Path(&["priority"]).apply(rule)),
                        ("Conditions".to_string(), Extract::Path(&["conditions"]).apply(rule)),
                        ("Actions".to_string(), Extract::Path(&["actions"]).apply(rule)),
                        ("Rule ID".to_string(), Extract::Path(&["id"]).apply(rule)),
                    ]);
                }
            }
            Err(_) => failed += 1,
        }
    }
    let mut rules_section = SnapshotSection::from_rows(rules.id, rules.title, rule_rows);
    if failed > 0 {
        rules_section =
            rules_section.with_description(format!("Rules unavailable for {failed} policies"));
    }
    vec![
        SnapshotSection::from_rows(policies.id, policies.title, snapshot_rows(&records, POLICY_FIELDS)),
        rules_section,
    ]
}

// ============================================================================
// SECTION: Rule Signature Policies
// ============================================================================

/// Policies whose rules are compared as one signature.
#[derive(Debug, Clone, Copy)]
pub struct RuleSignaturePolicies {
    /// Comparison section.
    pub info: SectionInfo,
    /// Okta policy type filter.
    pub policy_type: &'static str,
    /// Outcome templates.
    pub templates: Templates,
    /// Snapshot section for policies.
    pub snapshot_policies: SectionInfo,
    /// Snapshot section for rules.
    pub snapshot_rules: SectionInfo,
}

impl EntityAdapter for RuleSignaturePolicies {
    fn section(&self) -> SectionInfo {
        self.info
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(self.info, &policies_path(self.policy_type), &mut notices)
        else {
            return SectionReport::new(self.info, Reconciliation::default(), notices);
        };
        let rules = ResourcePath::org(RULES_PATH);
        let spec = AttributeSpec::signed(RULES, Extract::Whole, &[]);
        let policy = ComparePolicy::new(self.info.title, CompareSpec::Deferred, self.templates);
        let recon = reconcile_nested(&a, &b, key_name_or_id, &policy, |key, policy_a, policy_b, out| {
            match ctx.fetch_sub_pair(self.info, &rules, (policy_a, policy_b)) {
                Ok((rules_a, rules_b)) => policy.compare_values(
                    key.as_str(),
                    &spec,
                    normalize_rules(&rules_a),
                    normalize_rules(&rules_b),
                    out,
                ),
                Err(_) => out.diffs.push(policy.unavailable(key.as_str(), RULES, None)),
            }
        });
        SectionReport::new(self.info, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        policy_snapshot(ctx, self.snapshot_policies, self.snapshot_rules, self.policy_type)
    }
}

/// Authenticator enrollment policies (`MFA_ENROLL`).
#[must_use]
pub const fn mfa_enrollment_policies() -> RuleSignaturePolicies {
    RuleSignaturePolicies {
        info: SectionInfo::new("mfa-enrollment-policies", "Authenticator Enrollment Policies"),
        policy_type: "MFA_ENROLL",
        templates: Templates {
            missing: Outcome::new("MFA Enrollment", "Create policy '{name}' in {env}"),
            extra: Outcome::new("Unexpected Policy", "Review extra policy '{name}' in {env}"),
            mismatch: Outcome::new("Enrollment Drift", "Align MFA enrollment rules for policy '{name}'"),
        },
        snapshot_policies: SectionInfo::new("mfa-enrollment-policies", "MFA Enrollment Policies"),
        snapshot_rules: SectionInfo::new("mfa-enrollment-policy-rules", "MFA Enrollment Policy Rules"),
    }
}

/// Password policies (`PASSWORD`).
#[must_use]
pub const fn password_policies() -> RuleSignaturePolicies {
    RuleSignaturePolicies {
        info: SectionInfo::new("password-policies", "Password Policies"),
        policy_type: "PASSWORD",
        templates: Templates {
            missing: Outcome::new("Password Security", "Create password policy '{name}' in {env}"),
            extra: Outcome::new("Unexpected Policy", "Review extra password policy '{name}' in {env}"),
            mismatch: Outcome::new("Password Policy Drift", "Align password policy rules for '{name}'"),
        },
        snapshot_policies: SectionInfo::new("password-policies", "Password Policies"),
        snapshot_rules: SectionInfo::new("password-policy-rules", "Password Policy Rules"),
    }
}

/// App sign-on policies (`ACCESS_POLICY`).
#[must_use]
pub const fn app_sign_on_policies() -> RuleSignaturePolicies {
    RuleSignaturePolicies {
        info: SectionInfo::new("app-sign-on-policies", "App Sign-On Policies"),
        policy_type: "ACCESS_POLICY",
        templates: Templates {
            missing: Outcome::new("App Access", "Create app sign-on policy '{name}' in {env}"),
            extra: Outcome::new("Unexpected Policy", "Review extra app sign-on policy '{name}' in {env}"),
            mismatch: Outcome::new("Access Policy Drift", "Align access policy rules for '{name}'"),
        },
        snapshot_policies: SectionInfo::new("authentication-policies", "Authentication Policies"),
        snapshot_rules: SectionInfo::new("authentication-policy-rules", "Authentication Policy Rules"),
    }
}

/// IdP discovery policies (`IDP_DISCOVERY`).
#[must_use]
pub const fn idp_discovery_policies() -> RuleSignaturePolicies {
    RuleSignaturePolicies {
        info: SectionInfo::new("idp-discovery-policies", "IDP Discovery Policies"),
        policy_type: "IDP_DISCOVERY",
        templates: Templates {
            missing: Outcome::new("IdP Routing", "Create IDP discovery policy '{name}' in {env}"),
            extra: Outcome::new("Unexpected Policy", "Review extra IDP discovery policy '{name}' in {env}"),
            mismatch: Outcome::new("IdP Routing Drift", "Align IDP discovery rules for '{name}'"),
        },
        snapshot_policies: SectionInfo::new("idp-discovery-policies", "IDP Discovery Policies"),
        snapshot_rules: SectionInfo::new("idp-discovery-policy-rules", "IDP Discovery Policy Rules"),
    }
}

/// Profile enrollment policies (`PROFILE_ENROLLMENT`).
#[must_use]
pub const fn profile_enrollment_policies() -> RuleSignaturePolicies {
    RuleSignaturePolicies {
        info: SectionInfo::new("profile-enrollment-policies", "Profile Enrollment Policies"),
        policy_type: "PROFILE_ENROLLMENT",
        templates: Templates {
            missing: Outcome::new(
                "Self-Service Registration",
                "Create profile enrollment policy '{name}' in {env}",
            ),
            extra: Outcome::new(
                "Unexpected Policy",
                "Review extra profile enrollment policy '{name}' in {env}",
            ),
            mismatch: Outcome::new("Enrollment Drift", "Align profile enrollment rules for '{name}'"),
        },
        snapshot_policies: SectionInfo::new(
            "profile-enrollment-policies",
            "Profile Enrollment Policies",
        ),
        snapshot_rules: SectionInfo::new(
            "profile-enrollment-policy-rules",
            "Profile Enrollment Policy Rules",
        ),
    }
}

// ============================================================================
// SECTION: Global Session Policies
// ============================================================================

/// Global session policies section.
pub const GLOBAL_SESSION_POLICIES: SectionInfo =
    SectionInfo::new("global-session-policies", "Global Session Policies");

/// Snapshot section for global session rules.
const GLOBAL_SESSION_RULES: SectionInfo =
    SectionInfo::new("global-session-policy-rules", "Global Session Policy Rules");

/// Session policy templates.
const SESSION_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Authentication & Security Controls", "Create policy '{name}' in {env}"),
    extra: Outcome::new("Unexpected Authentication Behavior", "Review extra policy '{name}' in {env}"),
    mismatch: Outcome::new("Authentication Policy Drift", "Align policy '{name}' attribute '{attribute}'"),
};

/// Session rule templates.
const SESSION_RULE_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Authentication Flow", "Create rule '{name}' in policy '{parent}'"),
    extra: Outcome::new(
        "Unexpected Authentication Logic",
        "Review extra rule '{name}' in policy '{parent}'",
    ),
    mismatch: Outcome::new("Rule Behavior", "Align rule '{name}' in policy '{parent}'"),
};

/// Global session policies with per-rule reconciliation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSessionPolicies;

impl EntityAdapter for GlobalSessionPolicies {
    fn section(&self) -> SectionInfo {
        GLOBAL_SESSION_POLICIES
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let info = GLOBAL_SESSION_POLICIES;
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(info, &policies_path("OKTA_SIGN_ON"), &mut notices) else {
            return SectionReport::new(info, Reconciliation::default(), notices);
        };
        let rules = ResourcePath::org(RULES_PATH);
        let policy = ComparePolicy::new(
            info.title,
            CompareSpec::Attributes(vec![
                AttributeSpec::value("status", Extract::OrEmpty(&["status"])),
                AttributeSpec::value("priority", Extract::OrEmpty(&["priority"])),
                AttributeSpec::value("description", Extract::OrEmpty(&["description"])),
            ]),
            SESSION_TEMPLATES,
        );
        let recon = reconcile_nested(&a, &b, key_name, &policy, |key, policy_a, policy_b, out| {
            match ctx.fetch_sub_pair(info, &rules, (policy_a, policy_b)) {
                Ok((rules_a, rules_b)) => {
                    let rule_policy = ComparePolicy::new(
                        info.title,
                        CompareSpec::Attributes(vec![
                            AttributeSpec::value("priority", Extract::OrEmpty(&["priority"])),
                            AttributeSpec::value("status", Extract::OrEmpty(&["status"])),
                        ]),
                        SESSION_RULE_TEMPLATES,
                    )
                    .with_placement(Placement::Qualified {
                        parent: key.to_string(),
                        kind: "Rule",
                    });
                    out.absorb(reconcile(&rules_a, &rules_b, key_name, &rule_policy));
                }
                Err(_) => out.diffs.push(policy.unavailable(key.as_str(), RULES, None)),
            }
        });
        SectionReport::new(info, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        policy_snapshot(ctx, GLOBAL_SESSION_POLICIES, GLOBAL_SESSION_RULES, "OKTA_SIGN_ON")
    }
}
