// crates/tenant-drift-config/src/config.rs
// ============================================================================
// Module: Tenant Drift Configuration
// Description: Configuration loading and validation for Tenant Drift.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: tenant-drift-core, tenant-drift-entities, tenant-drift-okta, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Tokens come either inline or from a named environment variable, never
//! both, and are only read when a run builds its sources.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tenant_drift_core::UnavailableMode;
use tenant_drift_entities::AdapterRegistry;
use tenant_drift_entities::CompareOptions;
use tenant_drift_okta::OktaClientConfig;
use tenant_drift_okta::OktaEnvironment;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "tenant-drift.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TENANT_DRIFT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum domain length.
const MAX_DOMAIN_LENGTH: usize = 253;
/// Upper bound for the request timeout.
const MAX_TIMEOUT_MS: u64 = 300_000;
/// Upper bound for a single response body.
const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Largest page size Okta list endpoints accept.
const MAX_PAGE_LIMIT: u32 = 200;
/// Upper bound for pages read per collection.
const MAX_PAGES: usize = 10_000;
/// Maximum user agent length.
const MAX_USER_AGENT_LENGTH: usize = 256;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Tenant Drift configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantDriftConfig {
    /// Baseline tenant.
    pub env_a: EnvironmentConfig,
    /// Tenant compared against the baseline.
    pub env_b: EnvironmentConfig,
    /// HTTP client limits.
    #[serde(default)]
    pub http: HttpConfig,
    /// Section selection and degraded-data handling.
    #[serde(default)]
    pub comparison: ComparisonConfig,
    /// Audit event sink.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl TenantDriftConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.env_a.validate("env_a")?;
        self.env_b.validate("env_b")?;
        self.http.validate()?;
        self.comparison.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: Environments
// ============================================================================

/// One tenant's domain and token source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Org domain, optionally with scheme.
    pub domain: String,
    /// Inline API token.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the API token.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("domain", &self.domain)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .finish()
    }
}

impl EnvironmentConfig {
    /// Validates the domain and token source.
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        validate_domain(field, &self.domain)?;
        match (&self.token, &self.token_env) {
            (Some(_), Some(_)) => Err(ConfigError::Invalid(format!(
                "{field}: set exactly one of token or token_env"
            ))),
            (None, None) => Err(ConfigError::Invalid(format!("{field}: token or token_env is required"))),
            (Some(token), None) if token.trim().is_empty() => {
                Err(ConfigError::Invalid(format!("{field}.token must be non-empty")))
            }
            (None, Some(name)) if name.trim().is_empty() => {
                Err(ConfigError::Invalid(format!("{field}.token_env must be non-empty")))
            }
            _ => Ok(()),
        }
    }

    /// Resolves the token and returns client credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when the named variable is unset
    /// or empty.
    pub fn credentials(&self) -> Result<OktaEnvironment, ConfigError> {
        let token = match (&self.token, &self.token_env) {
            (Some(token), _) => token.clone(),
            (None, Some(name)) => env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingToken(name.clone()))?,
            (None, None) => return Err(ConfigError::MissingToken(self.domain.clone())),
        };
        Ok(OktaEnvironment {
            domain: self.domain.trim().to_string(),
            token,
        })
    }
}

/// Validates a tenant domain: non-empty, no path, query, or fragment.
fn validate_domain(field: &str, domain: &str) -> Result<(), ConfigError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field}.domain must be non-empty")));
    }
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    if host.is_empty() || host.len() > MAX_DOMAIN_LENGTH {
        return Err(ConfigError::Invalid(format!("{field}.domain has an invalid length")));
    }
    if host.chars().any(|ch| matches!(ch, '/' | '?' | '#' | '@') || ch.is_whitespace()) {
        return Err(ConfigError::Invalid(format!(
            "{field}.domain must not contain a path, query, or credentials"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: HTTP
// ============================================================================

/// HTTP client limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    pub max_response_bytes: usize,
    /// Page size requested from list endpoints.
    pub page_limit: u32,
    /// Maximum pages read per collection.
    pub max_pages: usize,
    /// Allow cleartext HTTP.
    pub allow_http: bool,
    /// User agent for outbound requests.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let client = OktaClientConfig::default();
        Self {
            timeout_ms: client.timeout_ms,
            max_response_bytes: client.max_response_bytes,
            page_limit: client.page_limit,
            max_pages: client.max_pages,
            allow_http: client.allow_http,
            user_agent: client.user_agent,
        }
    }
}

impl HttpConfig {
    /// Validates limits against hard bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "http.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES}"
            )));
        }
        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "http.page_limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        if self.max_pages == 0 || self.max_pages > MAX_PAGES {
            return Err(ConfigError::Invalid(format!("http.max_pages must be between 1 and {MAX_PAGES}")));
        }
        if self.user_agent.trim().is_empty() || self.user_agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid("http.user_agent has an invalid length".to_string()));
        }
        Ok(())
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn client_config(&self) -> OktaClientConfig {
        OktaClientConfig {
            timeout_ms: self.timeout_ms,
            max_response_bytes: self.max_response_bytes,
            page_limit: self.page_limit,
            max_pages: self.max_pages,
            allow_http: self.allow_http,
            user_agent: self.user_agent.clone(),
        }
    }
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Section selection and degraded-data handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    /// Section ids to run; empty runs every section.
    pub sections: Vec<String>,
    /// Treatment of collections that could not be fetched.
    pub unavailable: UnavailableMode,
    /// Compare group assignments of matched applications.
    pub app_group_assignments: bool,
}

impl ComparisonConfig {
    /// Rejects unknown or repeated section ids.
    fn validate(&self) -> Result<(), ConfigError> {
        let known = AdapterRegistry::builtin().section_ids();
        let mut seen: Vec<&str> = Vec::with_capacity(self.sections.len());
        for id in &self.sections {
            if !known.contains(&id.as_str()) {
                return Err(ConfigError::Invalid(format!("comparison.sections: unknown section {id}")));
            }
            if seen.contains(&id.as_str()) {
                return Err(ConfigError::Invalid(format!("comparison.sections: duplicate section {id}")));
            }
            seen.push(id.as_str());
        }
        Ok(())
    }

    /// Returns the run options.
    #[must_use]
    pub const fn options(&self) -> CompareOptions {
        CompareOptions {
            unavailable: self.unavailable,
            app_group_assignments: self.app_group_assignments,
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    None,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    pub sink: AuditSinkKind,
    /// File path for the file sink.
    pub path: Option<String>,
}

impl AuditConfig {
    /// Requires a valid path for the file sink.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("audit.path", path),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// A token variable is unset or empty.
    #[error("api token not available from {0}")]
    MissingToken(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::use_debug, reason = "Test-only assertions.")]

    use super::*;

    const MINIMAL: &str = r#"
        [env_a]
        domain = "acme.okta.com"
        token_env = "OKTA_ENV_A_TOKEN"

        [env_b]
        domain = "acme.oktapreview.com"
        token = "inline-token"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = TenantDriftConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.comparison.options(), CompareOptions::default());
        assert_eq!(config.audit.sink, AuditSinkKind::Stderr);
    }

    #[test]
    fn domains_with_paths_are_rejected() {
        assert!(validate_domain("env_a", "acme.okta.com").is_ok());
        assert!(validate_domain("env_a", "https://acme.okta.com").is_ok());
        assert!(validate_domain("env_a", "acme.okta.com/admin").is_err());
        assert!(validate_domain("env_a", "acme.okta.com?x=1").is_err());
        assert!(validate_domain("env_a", "  ").is_err());
    }

    #[test]
    fn both_token_sources_are_rejected() {
        let config = EnvironmentConfig {
            domain: "acme.okta.com".to_string(),
            token: Some("t".to_string()),
            token_env: Some("OKTA_TOKEN".to_string()),
        };
        let err = config.validate("env_a").unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn inline_token_resolves_without_environment() {
        let config = TenantDriftConfig::from_toml(MINIMAL).unwrap();
        let credentials = config.env_b.credentials().unwrap();
        assert_eq!(credentials.domain, "acme.oktapreview.com");
        assert_eq!(credentials.token, "inline-token");
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let config = TenantDriftConfig::from_toml(MINIMAL).unwrap();
        let rendered = format!("{:?}", config.env_b);
        assert!(!rendered.contains("inline-token"));
    }

    #[test]
    fn file_sink_requires_path() {
        let audit = AuditConfig {
            sink: AuditSinkKind::File,
            path: None,
        };
        assert!(audit.validate().is_err());
    }
}
