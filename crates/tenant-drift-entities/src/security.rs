// crates/tenant-drift-entities/src/security.rs
// ============================================================================
// Module: Security and Org Adapters
// Description: Security general settings and org profile settings.
// Purpose: Compare singleton tenant-wide settings documents.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! Both sections compare single documents rather than collections. Security
//! settings are read from seven endpoints, some on the admin host, and a
//! document that cannot be read is reported as "Not Available" instead of
//! failing the section. Org settings are compared key by key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Map;
use serde_json::Value;
use tenant_drift_core::ApiHost;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::DifferenceType;
use tenant_drift_core::EXISTENCE_ATTRIBUTE;
use tenant_drift_core::Environment;
use tenant_drift_core::Outcome;
use tenant_drift_core::Placement;
use tenant_drift_core::Reconciliation;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SignatureSpec;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::core::entries::EXISTS;
use tenant_drift_core::core::entries::MISSING;
use tenant_drift_core::core::signature::ORG_NOISE;
use tenant_drift_core::core::signature::SECURITY_NOISE;
use tenant_drift_core::core::signature::strip_keys;

use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Security General Settings
// ============================================================================

/// Security general settings section.
pub const SECURITY_SETTINGS: SectionInfo =
    SectionInfo::new("security-settings", "Security General Settings");

/// Value written for a settings document that could not be read.
const NOT_AVAILABLE: &str = "Not Available";

/// Value written for a settings document that was read.
const AVAILABLE: &str = "Available";

/// One security settings document.
struct SecurityCheck {
    /// Report object.
    label: &'static str,
    /// Serving host.
    host: ApiHost,
    /// Endpoint path.
    path: &'static str,
    /// Action when only one side could be read.
    inaccessible: &'static str,
    /// Action when the documents differ.
    align: &'static str,
}

impl SecurityCheck {
    /// Returns the document's resource path.
    fn resource(&self) -> ResourcePath {
        match self.host {
            ApiHost::Org => ResourcePath::org(self.path),
            ApiHost::Admin => ResourcePath::admin(self.path),
        }
    }
}

/// Security documents in report order.
const SECURITY_CHECKS: [SecurityCheck; 7] = [
    SecurityCheck {
        label: "Threats Configuration",
        host: ApiHost::Org,
        path: "/api/v1/threats/configuration",
        inaccessible: "Ensure threats configuration settings are accessible in both environments",
        align: "Align threats configuration settings between environments",
    },
    SecurityCheck {
        label: "ThreatInsight Settings",
        host: ApiHost::Org,
        path: "/api/v1/internal/threatInsightDataCollection",
        inaccessible: "Ensure threatinsight settings settings are accessible in both environments",
        align: "Align threatinsight settings settings between environments",
    },
    SecurityCheck {
        label: "Security Notifications",
        host: ApiHost::Admin,
        path: "/api/internal/org/settings/security-notification-settings",
        inaccessible: "Ensure security notifications settings are accessible in both environments",
        align: "Align security notifications settings between environments",
    },
    SecurityCheck {
        label: "Captcha",
        host: ApiHost::Org,
        path: "/api/v1/org/captcha",
        inaccessible: "Ensure captcha settings are accessible in both environments",
        align: "Align captcha settings between environments",
    },
    SecurityCheck {
        label: "User Enumeration",
        host: ApiHost::Admin,
        path: "/api/internal/org/settings/user-enumeration-settings",
        inaccessible: "Ensure user enumeration settings are accessible in both environments",
        align: "Align user enumeration settings between environments",
    },
    SecurityCheck {
        label: "User Lockout",
        host: ApiHost::Org,
        path: "/attack-protection/api/v1/user-lockout-settings",
        inaccessible: "Ensure user lockout settings are accessible in both environments",
        align: "Align user lockout settings between environments",
    },
    SecurityCheck {
        label: "Authenticator Settings",
        host: ApiHost::Org,
        path: "/attack-protection/api/v1/authenticator-settings",
        inaccessible: "Ensure authenticator settings settings are accessible in both environments",
        align: "Align authenticator settings settings between environments",
    },
];

/// Attribute written for every security document.
const SETTINGS: &str = "Settings";

/// Impact of every security difference.
const SECURITY_DRIFT: &str = "Security Drift";

/// Security documents compared by signature with availability handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecuritySettingsAdapter;

impl SecuritySettingsAdapter {
    /// Reads one document from one environment, `None` when unreadable.
    fn read(ctx: &CompareContext<'_>, environment: Environment, check: &SecurityCheck) -> Option<Record> {
        ctx.fetch_detail(environment, SECURITY_SETTINGS, &check.resource()).ok()
    }
}

impl EntityAdapter for SecuritySettingsAdapter {
    fn section(&self) -> SectionInfo {
        SECURITY_SETTINGS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let neutral = Outcome::new(SECURITY_DRIFT, "Align {name} settings between environments");
        let policy = ComparePolicy::new(
            SECURITY_SETTINGS.title,
            CompareSpec::Deferred,
            Templates {
                missing: neutral,
                extra: neutral,
                mismatch: neutral,
            },
        );
        let mut recon = Reconciliation::default();
        for check in &SECURITY_CHECKS {
            let a = Self::read(ctx, Environment::A, check);
            let b = Self::read(ctx, Environment::B, check);
            match (a, b) {
                (None, None) => {
                    recon.matches.push(policy.matched(check.label, SETTINGS, Value::from(NOT_AVAILABLE)));
                }
                (Some(a), Some(b)) => {
                    recon.matched += 1;
                    let spec = SignatureSpec::new(SETTINGS, SECURITY_NOISE)
                        .with_mismatch_value("Did not match")
                        .as_attribute()
                        .with_mismatch(Outcome::new(SECURITY_DRIFT, check.align));
                    policy.compare_values(check.label, &spec, a, b, &mut recon);
                }
                (a, b) => {
                    let availability =
                        |side: &Option<Record>| Value::from(if side.is_some() { AVAILABLE } else { NOT_AVAILABLE });
                    recon.diffs.push(policy.diff(
                        check.label,
                        SETTINGS,
                        DifferenceType::Mismatch,
                        (availability(&a), availability(&b)),
                        Some(&Outcome::new(SECURITY_DRIFT, check.inaccessible)),
                    ));
                }
            }
        }
        SectionReport::new(SECURITY_SETTINGS, recon, Vec::new())
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let values = SECURITY_CHECKS
            .iter()
            .map(|check| {
                let value = ctx
                    .fetch_detail(SECURITY_SETTINGS.id, &check.resource())
                    .map_or_else(|_| Value::from(NOT_AVAILABLE), |doc| strip_keys(&doc, SECURITY_NOISE));
                (check.label.to_string(), value)
            })
            .collect();
        vec![SnapshotSection::key_values(SECURITY_SETTINGS.id, SECURITY_SETTINGS.title, values)]
    }
}

// ============================================================================
// SECTION: Org General Settings
// ============================================================================

/// Org general settings section.
pub const ORG_SETTINGS: SectionInfo = SectionInfo::new("org-settings", "Org General Settings");

/// Report object for org settings.
const ORG_OBJECT: &str = "Org Settings";

/// Org settings outcome templates.
const ORG_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Org Profile", "Review org general settings in {env}"),
    extra: Outcome::new("Org Profile", "Review org general settings in {env}"),
    mismatch: Outcome::new("Org Profile", "Align org setting '{name}' across environments"),
};

/// Org profile compared key by key.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrgSettingsAdapter;

impl EntityAdapter for OrgSettingsAdapter {
    fn section(&self) -> SectionInfo {
        ORG_SETTINGS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let resource = ResourcePath::org("/api/v1/org");
        let Some((a, b)) = ctx.fetch_detail_pair(ORG_SETTINGS, &resource, &mut notices) else {
            return SectionReport::new(ORG_SETTINGS, Reconciliation::default(), notices);
        };
        SectionReport::new(ORG_SETTINGS, compare_org_documents(&a, &b), notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        match ctx.fetch_detail(ORG_SETTINGS.id, &ResourcePath::org("/api/v1/org")) {
            Ok(doc) => {
                let values = org_fields(&doc).into_iter().collect();
                vec![SnapshotSection::key_values(ORG_SETTINGS.id, "Organization Settings", values)]
            }
            Err(err) => vec![unavailable_section(ORG_SETTINGS.id, "Organization Settings", &err)],
        }
    }
}

/// Returns the noise-stripped top-level fields of an org document.
fn org_fields(doc: &Record) -> Map<String, Value> {
    match strip_keys(doc, ORG_NOISE) {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

/// Compares two org documents over the sorted union of their keys.
fn compare_org_documents(a: &Record, b: &Record) -> Reconciliation {
    let mut out = Reconciliation::default();
    let empty = |doc: &Record| doc.as_object().is_none_or(Map::is_empty);
    let existence = ComparePolicy::new(ORG_SETTINGS.title, CompareSpec::Deferred, ORG_TEMPLATES);
    match (empty(a), empty(b)) {
        (true, true) => return out,
        (true, false) => {
            out.diffs.push(existence.diff(
                ORG_OBJECT,
                EXISTENCE_ATTRIBUTE,
                DifferenceType::MissingInA,
                (Value::from(MISSING), Value::from(EXISTS)),
                None,
            ));
            return out;
        }
        (false, true) => {
            out.diffs.push(existence.diff(
                ORG_OBJECT,
                EXISTENCE_ATTRIBUTE,
                DifferenceType::MissingInB,
                (Value::from(EXISTS), Value::from(MISSING)),
                None,
            ));
            return out;
        }
        (false, false) => {}
    }
    let policy = existence.with_placement(Placement::Attribute {
        object: ORG_OBJECT.to_string(),
    });
    let fields_a = org_fields(a);
    let fields_b = org_fields(b);
    let keys: BTreeSet<&String> = fields_a.keys().chain(fields_b.keys()).collect();
    out.matched = 1;
    for key in keys {
        let value_a = fields_a.get(key).filter(|value| !value.is_null());
        let value_b = fields_b.get(key).filter(|value| !value.is_null());
        if value_a == value_b {
            out.matches.push(policy.matched(key, key, value_a.cloned().unwrap_or(Value::Null)));
        } else {
            let shown = |value: Option<&Value>| value.cloned().unwrap_or_else(|| Value::from(MISSING));
            out.diffs.push(policy.diff(
                key,
                key,
                DifferenceType::Mismatch,
                (shown(value_a), shown(value_b)),
                None,
            ));
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
