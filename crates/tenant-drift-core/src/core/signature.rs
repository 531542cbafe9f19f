// crates/tenant-drift-core/src/core/signature.rs
// ============================================================================
// Module: Canonical Signatures
// Description: Noise stripping, RFC 8785 canonicalization, and digests.
// Purpose: Decide deep equivalence of two records across environments.
// Dependencies: serde, serde_json, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Two records are equivalent iff their signatures are byte-equal. A
//! signature is the RFC 8785 (JCS) serialization of the record after every
//! map key named in a skip set has been removed at every depth. Map key order
//! never matters; sequence order always does, so adapters that compare
//! logically unordered lists pre-sort them (see [`normalize_rules`]).
//!
//! Skip sets trade noise for blindness: too small and identifiers or
//! timestamps produce drift on every run, too large and real drift hides.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::record::text_at;
use crate::core::record::value_at;

// ============================================================================
// SECTION: Skip Sets
// ============================================================================

/// Identifiers, links, audit timestamps, and embedded metadata.
pub const ENVIRONMENT_NOISE: &[&str] = &[
    "id",
    "_links",
    "links",
    "created",
    "createdBy",
    "lastUpdated",
    "lastUpdatedBy",
    "_embedded",
];

/// Trusted origin noise; identical to [`ENVIRONMENT_NOISE`].
pub const ORIGIN_NOISE: &[&str] = ENVIRONMENT_NOISE;

/// Environment noise without `createdBy` (identity providers, realms, mappings).
pub const IDENTITY_NOISE: &[&str] =
    &["id", "_links", "links", "created", "lastUpdated", "lastUpdatedBy", "_embedded"];

/// Org profile fields that differ by construction between tenants.
pub const ORG_NOISE: &[&str] =
    &["id", "_links", "links", "created", "lastUpdated", "expiresAt", "subdomain"];

/// Security settings churn fields (identifiers are kept).
pub const SECURITY_NOISE: &[&str] = &["_links", "created", "lastUpdated"];

/// Profile schema churn fields.
pub const SCHEMA_NOISE: &[&str] = &["id", "_links", "links"];

/// Fields kept when normalizing policy rules before signing.
const RULE_FIELDS: &[&str] = &["name", "status", "priority", "conditions", "actions"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Canonical string form of a record.
///
/// # Invariants
/// - Holds RFC 8785 canonical JSON of the noise-stripped record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Returns the canonical JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lowercase hex SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashDigest(String);

impl HashDigest {
    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing signatures.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Signature Helpers
// ============================================================================

/// Removes every map key in `skip_keys` at every depth.
#[must_use]
pub fn strip_keys(value: &Value, skip_keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut stripped = Map::new();
            for (key, inner) in map {
                if !skip_keys.contains(&key.as_str()) {
                    stripped.insert(key.clone(), strip_keys(inner, skip_keys));
                }
            }
            Value::Object(stripped)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| strip_keys(item, skip_keys)).collect())
        }
        scalar => scalar.clone(),
    }
}

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`SignatureError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SignatureError> {
    serde_jcs::to_vec(value).map_err(|err| SignatureError::Canonicalization(err.to_string()))
}

/// Computes the signature of a record after stripping `skip_keys`.
///
/// # Errors
///
/// Returns [`SignatureError::Canonicalization`] when serialization fails.
pub fn signature(value: &Value, skip_keys: &[&str]) -> Result<Signature, SignatureError> {
    let stripped = strip_keys(value, skip_keys);
    let bytes = canonical_json_bytes(&stripped)?;
    String::from_utf8(bytes)
        .map(Signature)
        .map_err(|err| SignatureError::Canonicalization(err.to_string()))
}

/// Returns true when both values have equal signatures under `skip_keys`.
///
/// # Errors
///
/// Returns [`SignatureError`] when either side cannot be canonicalized.
pub fn equivalent(a: &Value, b: &Value, skip_keys: &[&str]) -> Result<bool, SignatureError> {
    Ok(signature(a, skip_keys)? == signature(b, skip_keys)?)
}

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    HashDigest(hex_encode(&hasher.finalize()))
}

/// Hashes the canonical JSON form of a serializable value.
///
/// # Errors
///
/// Returns [`SignatureError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<HashDigest, SignatureError> {
    Ok(hash_bytes(&canonical_json_bytes(value)?))
}

// ============================================================================
// SECTION: Ordering Normalization
// ============================================================================

/// Projects policy rules to their behavioral fields and sorts them.
///
/// Rules are ordered by `(priority or 0, name)` so that two environments
/// returning the same rules in a different order sign identically.
#[must_use]
pub fn normalize_rules(rules: &[Value]) -> Value {
    let mut normalized: Vec<Value> = rules
        .iter()
        .map(|rule| {
            let mut projected = Map::new();
            for field in RULE_FIELDS {
                projected.insert(
                    (*field).to_string(),
                    value_at(rule, &[field]).cloned().unwrap_or(Value::Null),
                );
            }
            Value::Object(projected)
        })
        .collect();
    normalized.sort_by(compare_rule_order);
    Value::Array(normalized)
}

/// Strips noise from named items and sorts them by `name`.
#[must_use]
pub fn normalize_named(items: &[Value], skip_keys: &[&str]) -> Value {
    let mut normalized: Vec<Value> = items.iter().map(|item| strip_keys(item, skip_keys)).collect();
    normalized.sort_by_key(|item| text_at(item, &["name"]).unwrap_or_default());
    Value::Array(normalized)
}

/// Orders rules by numeric priority, then by name.
fn compare_rule_order(left: &Value, right: &Value) -> Ordering {
    let priority = |rule: &Value| value_at(rule, &["priority"]).and_then(Value::as_i64).unwrap_or(0);
    let name = |rule: &Value| text_at(rule, &["name"]).unwrap_or_default();
    priority(left).cmp(&priority(right)).then_with(|| name(left).cmp(&name(right)))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
