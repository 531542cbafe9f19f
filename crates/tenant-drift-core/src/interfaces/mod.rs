// crates/tenant-drift-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tenant Drift Interfaces
// Description: Upstream collaborator contract for fetching tenant records.
// Purpose: Keep the engine and adapters independent of any HTTP client.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Adapters read tenant state exclusively through [`CollectionSource`].
//! Failures are returned as [`FetchError`] so callers can distinguish "empty"
//! from "could not fetch" and decide how to render each.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::record::Record;

// ============================================================================
// SECTION: Resource Paths
// ============================================================================

/// Host a resource is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiHost {
    /// The tenant's org domain.
    Org,
    /// The tenant's admin domain (`{sub}-admin.okta.com`).
    Admin,
}

/// Location of a collection or detail resource.
///
/// # Invariants
/// - `path` starts with `/` and may contain a `{parent}` placeholder.
/// - `list_key` names the array inside object-shaped list responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    /// Serving host.
    pub host: ApiHost,
    /// Path and query relative to the host.
    pub path: String,
    /// Array field used when the response is an object.
    pub list_key: Option<&'static str>,
}

impl ResourcePath {
    /// Creates an org-host resource path.
    #[must_use]
    pub fn org(path: impl Into<String>) -> Self {
        Self {
            host: ApiHost::Org,
            path: path.into(),
            list_key: None,
        }
    }

    /// Creates an admin-host resource path.
    #[must_use]
    pub fn admin(path: impl Into<String>) -> Self {
        Self {
            host: ApiHost::Admin,
            path: path.into(),
            list_key: None,
        }
    }

    /// Sets the array field used for object-shaped list responses.
    #[must_use]
    pub fn with_list_key(mut self, key: &'static str) -> Self {
        self.list_key = Some(key);
        self
    }

    /// Substitutes `{parent}` with a validated parent identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] when the identifier is empty or
    /// contains characters that would alter the path structure.
    pub fn with_parent(&self, parent_id: &str) -> Result<Self, FetchError> {
        if parent_id.is_empty()
            || parent_id.chars().any(|ch| matches!(ch, '/' | '?' | '#' | '%') || ch.is_whitespace())
        {
            return Err(FetchError::InvalidRequest(format!("invalid parent id: {parent_id:?}")));
        }
        Ok(Self {
            host: self.host,
            path: self.path.replace("{parent}", parent_id),
            list_key: self.list_key,
        })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            ApiHost::Org => f.write_str(&self.path),
            ApiHost::Admin => write!(f, "admin:{}", self.path),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when fetching upstream records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The upstream returned a non-success status.
    #[error("upstream returned status {status} for {resource}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested resource.
        resource: String,
    },
    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// A response or pagination limit was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    /// The request could not be constructed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Returns true when the failure was a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Status {
                ..
            } => "status",
            Self::Transport(_) => "transport",
            Self::Malformed(_) => "malformed",
            Self::LimitExceeded(_) => "limit_exceeded",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Returns the HTTP status for status failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status {
                status,
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Collection Source
// ============================================================================

/// Read-only access to one environment's records.
pub trait CollectionSource {
    /// Returns a label identifying the environment (typically its domain).
    fn label(&self) -> &str;

    /// Fetches every record of a collection, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when any page cannot be fetched or parsed.
    fn fetch_collection(&self, resource: &ResourcePath) -> Result<Vec<Record>, FetchError>;

    /// Fetches a single detail record.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the record cannot be fetched or parsed.
    fn fetch_detail(&self, resource: &ResourcePath) -> Result<Record, FetchError>;

    /// Fetches a collection nested under a parent record.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the parent id is invalid or the fetch fails.
    fn fetch_sub_collection(
        &self,
        resource: &ResourcePath,
        parent_id: &str,
    ) -> Result<Vec<Record>, FetchError> {
        self.fetch_collection(&resource.with_parent(parent_id)?)
    }
}
