// crates/tenant-drift-entities/src/network.rs
// ============================================================================
// Module: Network Adapters
// Description: Network zones and trusted origins.
// Purpose: Compare network access boundaries between tenants.
// Dependencies: tenant-drift-core
// ============================================================================

//! ## Overview
//! Both sections are declarative: zones compare five attributes by value and
//! trusted origins compare one noise-stripped signature.

// ============================================================================
// SECTION: Imports
// ============================================================================

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
use tenant_drift_core::core::record::first_text;
use tenant_drift_core::core::signature::ORIGIN_NOISE;

use crate::adapter::CollectionAdapter;
use crate::adapter::SnapshotField;
use crate::adapter::key_name;

// ============================================================================
// SECTION: Network Zones
// ============================================================================

/// Network zones section.
pub const NETWORK_ZONES: SectionInfo = SectionInfo::new("network-zones", "Network Zones");

/// Snapshot columns for zones.
const ZONE_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Name", Extract::Path(&["name"])),
    SnapshotField::new("Type", Extract::Path(&["type"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Usage", Extract::Path(&["usage"])),
    SnapshotField::new("Gateways", Extract::Path(&["gateways"])),
    SnapshotField::new("Proxies", Extract::Path(&["proxies"])),
    SnapshotField::new("Locations", Extract::Path(&["locations"])),
];

/// Builds the network zones adapter.
#[must_use]
pub fn network_zones() -> CollectionAdapter {
    CollectionAdapter {
        info: NETWORK_ZONES,
        resource: ResourcePath::org("/api/v1/zones"),
        key: key_name,
        spec: CompareSpec::Attributes(vec![
            AttributeSpec::value("Type", Extract::OrEmpty(&["type"])),
            AttributeSpec::value("Gateways", Extract::OrEmpty(&["gateways"])),
            AttributeSpec::value("Proxies", Extract::OrEmpty(&["proxies"])),
            AttributeSpec::value("Locations", Extract::OrEmpty(&["locations"])),
            AttributeSpec::value("Status", Extract::OrEmpty(&["status"])),
        ]),
        templates: Templates {
            missing: Outcome::new("Access Control", "Create zone '{name}' in {env}"),
            extra: Outcome::new("Unexpected Zone", "Review extra zone '{name}' in {env}"),
            mismatch: Outcome::new("Zone Configuration Drift", "Align '{attribute}' in '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: ZONE_FIELDS,
    }
}

// ============================================================================
// SECTION: Trusted Origins
// ============================================================================

/// Trusted origins section.
pub const TRUSTED_ORIGINS: SectionInfo = SectionInfo::new("trusted-origins", "Trusted Origins");

/// Snapshot columns for trusted origins.
const ORIGIN_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Name", Extract::Path(&["name"])),
    SnapshotField::new("Origin", Extract::Path(&["origin"])),
    SnapshotField::new("Status", Extract::Path(&["status"])),
    SnapshotField::new("Scopes", Extract::Path(&["scopes"])),
];

/// Keys origins by name, then origin URL, then id.
fn origin_key(record: &Record) -> Option<String> {
    first_text(record, &["name", "origin", "id"])
}

/// Builds the trusted origins adapter.
#[must_use]
pub fn trusted_origins() -> CollectionAdapter {
    CollectionAdapter {
        info: TRUSTED_ORIGINS,
        resource: ResourcePath::org("/api/v1/trustedOrigins"),
        key: origin_key,
        spec: CompareSpec::Signature(SignatureSpec::new("Settings", ORIGIN_NOISE)),
        templates: Templates {
            missing: Outcome::new("CORS/Redirect", "Create trusted origin '{name}' in {env}"),
            extra: Outcome::new("Unexpected Origin", "Review extra trusted origin '{name}' in {env}"),
            mismatch: Outcome::new("CORS/Redirect Drift", "Align trusted origin settings for '{name}'"),
        },
        unmatched_b: UnmatchedB::ExtraInB,
        fields: ORIGIN_FIELDS,
    }
}
