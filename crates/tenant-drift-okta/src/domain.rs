// crates/tenant-drift-okta/src/domain.rs
// ============================================================================
// Module: Okta Domains
// Description: Org and admin base URL derivation.
// Purpose: Turn operator-supplied domains into validated request origins.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Operators configure a bare domain (`acme.okta.com`) or a full origin.
//! Domains without a scheme get `https://`. Internal admin endpoints live on
//! a sibling host: `acme.okta.com` maps to `acme-admin.okta.com` and
//! `acme.oktapreview.com` to `acme-admin.oktapreview.com`. Other hosts
//! (custom domains, local test servers) serve admin endpoints themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tenant_drift_core::FetchError;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Okta production cell suffix.
const OKTA_SUFFIX: &str = ".okta.com";

/// Okta preview cell suffix.
const PREVIEW_SUFFIX: &str = ".oktapreview.com";

// ============================================================================
// SECTION: Derivation
// ============================================================================

/// Parses and validates the org origin for a configured domain.
///
/// # Errors
///
/// Returns [`FetchError::InvalidRequest`] when the domain is empty, uses an
/// unsupported scheme, embeds credentials, or carries a path or query.
pub fn org_base(domain: &str, allow_http: bool) -> Result<Url, FetchError> {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(FetchError::InvalidRequest("domain is empty".to_string()));
    }
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate)
        .map_err(|err| FetchError::InvalidRequest(format!("invalid domain {trimmed}: {err}")))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        _ => return Err(FetchError::InvalidRequest("unsupported url scheme".to_string())),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(FetchError::InvalidRequest("url credentials are not allowed".to_string()));
    }
    if url.host_str().is_none() {
        return Err(FetchError::InvalidRequest("url host required".to_string()));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(FetchError::InvalidRequest(format!(
            "domain must not include a path or query: {trimmed}"
        )));
    }
    Ok(url)
}

/// Derives the admin origin from an org origin.
#[must_use]
pub fn admin_base(org: &Url) -> Url {
    let Some(host) = org.host_str() else {
        return org.clone();
    };
    let admin_host = admin_host(host);
    if admin_host == host {
        return org.clone();
    }
    let mut admin = org.clone();
    if admin.set_host(Some(&admin_host)).is_err() {
        return org.clone();
    }
    admin
}

/// Maps an org host to its admin host.
fn admin_host(host: &str) -> String {
    let lowered = host.to_ascii_lowercase();
    for suffix in [PREVIEW_SUFFIX, OKTA_SUFFIX] {
        let Some(prefix) = lowered.strip_suffix(suffix) else {
            continue;
        };
        if prefix.ends_with("-admin") {
            return lowered;
        }
        let sub = prefix.split('.').next().unwrap_or(prefix);
        return format!("{sub}-admin{suffix}");
    }
    lowered
}

// ============================================================================
// SECTION: Tests
// ============================================================================
