// crates/tenant-drift-okta/src/client.rs
// ============================================================================
// Module: Okta HTTP Source
// Description: Bounded, paginated GET client for the Okta management API.
// Purpose: Provide fetch-collection and fetch-detail for one environment.
// Dependencies: tenant-drift-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! Each source is bound to one tenant (org origin, derived admin origin, and
//! API token). Requests are sequential and blocking; the per-request timeout
//! is the only bound on latency. Redirects are not followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::LINK;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tenant_drift_core::ApiHost;
use tenant_drift_core::CollectionSource;
use tenant_drift_core::FetchError;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;
use url::Url;

use crate::domain::admin_base;
use crate::domain::org_base;
use crate::pagination::list_items;
use crate::pagination::next_link;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// HTTP limits and client settings.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` origins.
/// - `max_response_bytes` is a hard upper bound on each response body.
/// - `max_pages` bounds the number of pages read per collection.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OktaClientConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Page size requested from list endpoints.
    pub page_limit: u32,
    /// Maximum pages read per collection.
    pub max_pages: usize,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for OktaClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_response_bytes: 8 * 1024 * 1024,
            page_limit: 200,
            max_pages: 500,
            allow_http: false,
            user_agent: "tenant-drift/0.1".to_string(),
        }
    }
}

/// Tenant domain and API token.
#[derive(Clone)]
pub struct OktaEnvironment {
    /// Org domain or origin.
    pub domain: String,
    /// SSWS API token.
    pub token: String,
}

impl fmt::Debug for OktaEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OktaEnvironment")
            .field("domain", &self.domain)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Collection source backed by the Okta REST API.
pub struct OktaHttpSource {
    /// Environment label (org host).
    label: String,
    /// Org origin.
    org: Url,
    /// Admin origin.
    admin: Url,
    /// Authorization header value.
    authorization: String,
    /// Client limits.
    config: OktaClientConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl OktaHttpSource {
    /// Creates a source for one tenant.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] when the domain or token is
    /// invalid, or [`FetchError::Transport`] when the client cannot be built.
    pub fn new(environment: &OktaEnvironment, config: OktaClientConfig) -> Result<Self, FetchError> {
        let org = org_base(&environment.domain, config.allow_http)?;
        if environment.token.trim().is_empty() {
            return Err(FetchError::InvalidRequest("api token is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| FetchError::Transport(format!("http client build failed: {err}")))?;
        let label = org.host_str().unwrap_or(environment.domain.as_str()).to_string();
        Ok(Self {
            label,
            admin: admin_base(&org),
            org,
            authorization: format!("SSWS {}", environment.token.trim()),
            config,
            client,
        })
    }

    /// Resolves a resource path against the host it is served from.
    fn resolve(&self, resource: &ResourcePath) -> Result<Url, FetchError> {
        let base = match resource.host {
            ApiHost::Org => &self.org,
            ApiHost::Admin => &self.admin,
        };
        if !resource.path.starts_with('/') {
            return Err(FetchError::InvalidRequest(format!("relative resource path: {}", resource.path)));
        }
        base.join(&resource.path)
            .map_err(|err| FetchError::InvalidRequest(format!("{resource}: {err}")))
    }

    /// Adds the page size parameter unless the path already sets one.
    fn with_page_limit(&self, mut url: Url) -> Url {
        if !url.query_pairs().any(|(name, _)| name == "limit") {
            url.query_pairs_mut().append_pair("limit", &self.config.page_limit.to_string());
        }
        url
    }

    /// Issues one GET and returns the response when the status is 2xx.
    fn get(&self, url: &Url, resource: &ResourcePath) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| classify_error(&err, resource))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                resource: resource.to_string(),
            });
        }
        Ok(response)
    }

    /// Reads and parses a JSON response body.
    fn read_json(&self, response: &mut Response, resource: &ResourcePath) -> Result<Value, FetchError> {
        let body = read_response_limited(response, self.config.max_response_bytes, resource)?;
        serde_json::from_slice(&body)
            .map_err(|err| FetchError::Malformed(format!("{resource}: invalid json: {err}")))
    }

    /// Validates that a pagination link stays on the same origin.
    fn follow(&self, current: &Url, link: &str, resource: &ResourcePath) -> Result<Url, FetchError> {
        let next = current
            .join(link)
            .map_err(|err| FetchError::Malformed(format!("{resource}: invalid next link: {err}")))?;
        if next.origin() != current.origin() {
            return Err(FetchError::Malformed(format!(
                "{resource}: pagination link leaves the tenant origin"
            )));
        }
        Ok(next)
    }
}

impl CollectionSource for OktaHttpSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch_collection(&self, resource: &ResourcePath) -> Result<Vec<Record>, FetchError> {
        let mut url = self.with_page_limit(self.resolve(resource)?);
        let mut records = Vec::new();
        let mut pages = 0usize;
        loop {
            pages += 1;
            if pages > self.config.max_pages {
                return Err(FetchError::LimitExceeded(format!(
                    "{resource}: more than {} pages",
                    self.config.max_pages
                )));
            }
            let mut response = self.get(&url, resource)?;
            let next = next_link(
                response.headers().get_all(LINK).iter().filter_map(|value| value.to_str().ok()),
            );
            let payload = self.read_json(&mut response, resource)?;
            records.extend(list_items(payload, resource.list_key, &resource.to_string())?);
            match next {
                Some(link) => url = self.follow(&url, &link, resource)?,
                None => return Ok(records),
            }
        }
    }

    fn fetch_detail(&self, resource: &ResourcePath) -> Result<Record, FetchError> {
        let url = self.resolve(resource)?;
        let mut response = self.get(&url, resource)?;
        self.read_json(&mut response, resource)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a transport failure to a fetch error.
fn classify_error(err: &reqwest::Error, resource: &ResourcePath) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(resource.to_string())
    } else {
        FetchError::Transport(format!("{resource}: request failed"))
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
    resource: &ResourcePath,
) -> Result<Vec<u8>, FetchError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| FetchError::LimitExceeded("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(FetchError::LimitExceeded(format!("{resource}: response exceeds size limit")));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle.read_to_end(&mut buf).map_err(|err| {
        if err.to_string().contains("timed out") {
            FetchError::Timeout(resource.to_string())
        } else {
            FetchError::Transport(format!("{resource}: failed to read response"))
        }
    })?;
    if buf.len() > max_bytes {
        return Err(FetchError::LimitExceeded(format!("{resource}: response exceeds size limit")));
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| FetchError::Malformed(format!("{resource}: invalid response length")))?;
        if buf.len() < expected {
            return Err(FetchError::Malformed(format!("{resource}: response truncated")));
        }
    }
    Ok(buf)
}
