// crates/tenant-drift-entities/src/authorization.rs
// ============================================================================
// Module: Authorization Server Adapters
// Description: Custom authorization servers, claims, scopes, access policies.
// Purpose: Compare token issuance configuration between tenants.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! Two sections share the server collection. Settings compares each server's
//! own configuration and its claim and scope sets. Access policies reconciles
//! each matched server's policies, placed under the server, and compares the
//! rules of matched policies as one signature.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::Environment;
use tenant_drift_core::Extract;
use tenant_drift_core::FetchError;
use tenant_drift_core::Outcome;
use tenant_drift_core::Placement;
use tenant_drift_core::Reconciliation;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::core::signature::ENVIRONMENT_NOISE;
use tenant_drift_core::core::signature::normalize_named;
use tenant_drift_core::core::signature::normalize_rules;
use tenant_drift_core::reconcile_nested;

use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::child_rows;
use crate::adapter::key_name_or_id;
use crate::adapter::matched_pairs;
use crate::adapter::record_id;
use crate::adapter::snapshot_rows;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Shared
// ============================================================================

/// Authorization server collection endpoint.
const SERVERS_PATH: &str = "/api/v1/authorizationServers";

/// Claims of a server.
const CLAIMS_PATH: &str = "/api/v1/authorizationServers/{parent}/claims";

/// Scopes of a server.
const SCOPES_PATH: &str = "/api/v1/authorizationServers/{parent}/scopes";

/// Access policies of a server.
const POLICIES_PATH: &str = "/api/v1/authorizationServers/{parent}/policies";

/// Returns the server collection path.
fn servers() -> ResourcePath {
    ResourcePath::org(SERVERS_PATH)
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Authorization server settings section.
pub const AUTHZ_SERVERS: SectionInfo =
    SectionInfo::new("authz-servers", "Authorization Servers - Settings");

/// Snapshot section for claims.
const AUTHZ_CLAIMS: SectionInfo = SectionInfo::new("authz-claims", "Authorization Server Claims");

/// Snapshot section for scopes.
const AUTHZ_SCOPES: SectionInfo = SectionInfo::new("authz-scopes", "Authorization Server Scopes");

/// Server settings comparison.
const SETTINGS: AttributeSpec = AttributeSpec::signed("Settings", Extract::Whole, ENVIRONMENT_NOISE);

/// Claim set comparison.
const CLAIMS: AttributeSpec = AttributeSpec::signed("Claims", Extract::Whole, ENVIRONMENT_NOISE)
    .with_mismatch(Outcome::new(
        "Token Claims Drift",
        "Align claims for authorization server '{name}'",
    ));

/// Scope set comparison.
const SCOPES: AttributeSpec = AttributeSpec::signed("Scopes", Extract::Whole, ENVIRONMENT_NOISE)
    .with_mismatch(Outcome::new("Scope Drift", "Align scopes for authorization server '{name}'"));

/// Server outcome templates.
const SERVER_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Authorization", "Create authorization server '{name}' in {env}"),
    extra: Outcome::new(
        "Unexpected Authorization Server",
        "Review extra authorization server '{name}' in {env}",
    ),
    mismatch: Outcome::new("Authorization Drift", "Align authorization server settings for '{name}'"),
};

/// Snapshot columns for servers.
const SERVER_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Server Name", Extract::Path(&["name"])),
    SnapshotField::new("Description", Extract::Path(&["description"])),
    SnapshotField::new("Audiences", Extract::Path(&["audiences"])),
    SnapshotField::new("Issuer Mode", Extract::Path(&["issuerMode"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Snapshot columns for claims.
const CLAIM_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Claim Name", Extract::Path(&["name"])),
    SnapshotField::new("Claim Type", Extract::Path(&["claimType"])),
    SnapshotField::new("Value Type", Extract::Path(&["valueType"])),
    SnapshotField::new("Value", Extract::Path(&["value"])),
    SnapshotField::new("Always Include", Extract::Path(&["alwaysIncludeInToken"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
];

/// Snapshot columns for scopes.
const SCOPE_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Scope Name", Extract::Path(&["name"])),
    SnapshotField::new("Description", Extract::Path(&["description"])),
    SnapshotField::new("Consent", Extract::Path(&["consent"])),
    SnapshotField::new("Default", Extract::Path(&["default"])),
    SnapshotField::new("System", Extract::Path(&["system"])),
];

/// Server settings, claims, and scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationServersAdapter;

impl AuthorizationServersAdapter {
    /// Compares one named child set of a matched server pair.
    fn compare_children(
        ctx: &CompareContext<'_>,
        policy: &ComparePolicy,
        key: &str,
        servers: (&Record, &Record),
        children: (&str, &AttributeSpec),
        out: &mut Reconciliation,
    ) {
        let (path, spec) = children;
        match ctx.fetch_sub_pair(AUTHZ_SERVERS, &ResourcePath::org(path), servers) {
            Ok((a, b)) => policy.compare_values(
                key,
                spec,
                normalize_named(&a, ENVIRONMENT_NOISE),
                normalize_named(&b, ENVIRONMENT_NOISE),
                out,
            ),
            Err(_) => out.diffs.push(policy.unavailable(key, spec.name, spec.mismatch.as_ref())),
        }
    }
}

impl EntityAdapter for AuthorizationServersAdapter {
    fn section(&self) -> SectionInfo {
        AUTHZ_SERVERS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(AUTHZ_SERVERS, &servers(), &mut notices) else {
            return SectionReport::new(AUTHZ_SERVERS, Reconciliation::default(), notices);
        };
        let policy = ComparePolicy::new(
            AUTHZ_SERVERS.title,
            CompareSpec::Attributes(vec![SETTINGS]),
            SERVER_TEMPLATES,
        );
        let recon = reconcile_nested(&a, &b, key_name_or_id, &policy, |key, server_a, server_b, out| {
            let key = key.as_str();
            let pair = (server_a, server_b);
            Self::compare_children(ctx, &policy, key, pair, (CLAIMS_PATH, &CLAIMS), out);
            Self::compare_children(ctx, &policy, key, pair, (SCOPES_PATH, &SCOPES), out);
        });
        SectionReport::new(AUTHZ_SERVERS, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let records = match ctx.fetch(AUTHZ_SERVERS.id, &servers()) {
            Ok(records) => records,
            Err(err) => {
                return [AUTHZ_SERVERS, AUTHZ_CLAIMS, AUTHZ_SCOPES]
                    .iter()
                    .map(|info| unavailable_section(info.id, info.title, &err))
                    .collect();
            }
        };
        let mut claims = Vec::new();
        let mut scopes = Vec::new();
        for server in &records {
            if let Ok(items) = ctx.fetch_sub(AUTHZ_CLAIMS.id, &ResourcePath::org(CLAIMS_PATH), server) {
                claims.extend(child_rows("Server Name", server, &items, CLAIM_FIELDS));
            }
            if let Ok(items) = ctx.fetch_sub(AUTHZ_SCOPES.id, &ResourcePath::org(SCOPES_PATH), server) {
                scopes.extend(child_rows("Server Name", server, &items, SCOPE_FIELDS));
            }
        }
        vec![
            SnapshotSection::from_rows(
                AUTHZ_SERVERS.id,
                AUTHZ_SERVERS.title,
                snapshot_rows(&records, SERVER_FIELDS),
            ),
            SnapshotSection::from_rows(AUTHZ_CLAIMS.id, AUTHZ_CLAIMS.title, claims),
            SnapshotSection::from_rows(AUTHZ_SCOPES.id, AUTHZ_SCOPES.title, scopes),
        ]
    }
}

// ============================================================================
// SECTION: Access Policies
// ============================================================================

/// Authorization server access policies section.
pub const AUTHZ_ACCESS_POLICIES: SectionInfo =
    SectionInfo::new("authz-access-policies", "Authorization Servers - Access Policies");

/// Snapshot section for access policy rules.
const AUTHZ_ACCESS_RULES: SectionInfo =
    SectionInfo::new("authz-access-policy-rules", "Authorization Server Access Policy Rules");

/// Rules comparison of one access policy.
const RULES: AttributeSpec = AttributeSpec::signed("Rules", Extract::Whole, ENVIRONMENT_NOISE);

/// Access policy outcome templates.
const ACCESS_TEMPLATES: Templates = Templates {
    missing: Outcome::new(
        "Access Policy Coverage",
        "Create access policy '{name}' for authorization server '{parent}' in {env}",
    ),
    extra: Outcome::new(
        "Unexpected Access Policy",
        "Review extra access policy '{name}' for authorization server '{parent}' in {env}",
    ),
    mismatch: Outcome::new(
        "Access Policy Drift",
        "Align access policy '{name}' for authorization server '{parent}'",
    ),
};

/// Snapshot columns for access policies.
const ACCESS_POLICY_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Policy Name", Extract::Path(&["name"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Priority", Extract::Path(&["priority"])),
    SnapshotField::new("Clients", Extract::Path(&["conditions", "clients", "include"])),
];

/// Snapshot columns for access policy rules.
const ACCESS_RULE_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Rule Name", Extract::Path(&["name"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Priority", Extract::Path(&["priority"])),
    SnapshotField::new("Conditions", Extract::Path(&["conditions"])),
    SnapshotField::new("Actions", Extract::Path(&["actions"])),
];

/// Access policies of servers present in both environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPoliciesAdapter;

impl AccessPoliciesAdapter {
    /// Returns the rules path of one server's policies.
    fn rules_path(server: &Record) -> Result<ResourcePath, FetchError> {
        let policies = ResourcePath::org(POLICIES_PATH).with_parent(&record_id(server))?;
        Ok(ResourcePath {
            path: format!("{}/{{parent}}/rules", policies.path),
            ..policies
        })
    }

    /// Fetches one policy's rules from one environment.
    fn rules(
        ctx: &CompareContext<'_>,
        environment: Environment,
        server: &Record,
        policy: &Record,
    ) -> Result<Vec<Record>, FetchError> {
        let resource = Self::rules_path(server)?;
        ctx.fetch_sub(environment, AUTHZ_ACCESS_POLICIES, &resource, &record_id(policy))
    }
}

impl EntityAdapter for AccessPoliciesAdapter {
    fn section(&self) -> SectionInfo {
        AUTHZ_ACCESS_POLICIES
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let info = AUTHZ_ACCESS_POLICIES;
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(info, &servers(), &mut notices) else {
            return SectionReport::new(info, Reconciliation::default(), notices);
        };
        let policies_path = ResourcePath::org(POLICIES_PATH);
        let server_policy = ComparePolicy::new(info.title, CompareSpec::Deferred, ACCESS_TEMPLATES);
        let mut recon = Reconciliation::default();
        for (server, server_a, server_b) in matched_pairs(&a, &b, key_name_or_id) {
            let Ok((policies_a, policies_b)) =
                ctx.fetch_sub_pair(info, &policies_path, (server_a, server_b))
            else {
                recon.diffs.push(server_policy.unavailable(&server, "Access Policies", None));
                continue;
            };
            let policy = ComparePolicy::new(info.title, CompareSpec::Deferred, ACCESS_TEMPLATES)
                .with_placement(Placement::Attribute {
                    object: server.clone(),
                });
            let nested =
                reconcile_nested(&policies_a, &policies_b, key_name_or_id, &policy, |key, pol_a, pol_b, out| {
                    let key = key.as_str();
                    match (
                        Self::rules(ctx, Environment::A, server_a, pol_a),
                        Self::rules(ctx, Environment::B, server_b, pol_b),
                    ) {
                        (Ok(rules_a), Ok(rules_b)) => policy.compare_values(
                            key,
                            &RULES,
                            normalize_rules(&rules_a),
                            normalize_rules(&rules_b),
                            out,
                        ),
                        _ => out.diffs.push(policy.unavailable(key, RULES.name, None)),
                    }
                });
            recon.absorb(nested);
        }
        SectionReport::new(info, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let info = AUTHZ_ACCESS_POLICIES;
        let records = match ctx.fetch(info.id, &servers()) {
            Ok(records) => records,
            Err(err) => {
                return vec![
                    unavailable_section(info.id, info.title, &err),
                    unavailable_section(AUTHZ_ACCESS_RULES.id, AUTHZ_ACCESS_RULES.title, &err),
                ];
            }
        };
        let mut policy_rows = Vec::new();
        let mut rule_rows = Vec::new();
        for server in &records {
            let Ok(policies) = ctx.fetch_sub(info.id, &ResourcePath::org(POLICIES_PATH), server) else {
                continue;
            };
            policy_rows.extend(child_rows("Server Name", server, &policies, ACCESS_POLICY_FIELDS));
            let Ok(rules_path) = Self::rules_path(server) else {
                continue;
            };
            for policy in &policies {
                if let Ok(rules) = ctx.fetch_sub(AUTHZ_ACCESS_RULES.id, &rules_path, policy) {
                    rule_rows.extend(child_rows("Policy Name", policy, &rules, ACCESS_RULE_FIELDS));
                }
            }
        }
        vec![
            SnapshotSection::from_rows(info.id, info.title, policy_rows),
            SnapshotSection::from_rows(AUTHZ_ACCESS_RULES.id, AUTHZ_ACCESS_RULES.title, rule_rows),
        ]
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
