// crates/tenant-drift-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Keep every user-facing string in one catalog per locale.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The tenant-drift CLI stores user-facing strings in a small translation
//! catalog. All runtime output goes through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The locale is chosen once per process and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions apply in argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Catalan.
    Ca,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
        }
    }

    /// Parses a locale value, ignoring case and region tags (`en_US`, `ca-ES`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let lang = normalized.split(['-', '_', '.']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            _ => None,
        }
    }
}

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces.
    pub key: &'static str,
    /// Preformatted substitution value.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Process-wide locale.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "tenant-drift {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine-translated and may be inaccurate.",
    ),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid: {env_a} vs {env_b}, {sections} sections."),
    ("client.init_failed", "Failed to set up the Okta client for {env}: {error}"),
    ("audit.open_failed", "Failed to open audit log at {path}: {error}"),
    (
        "compare.failed",
        "Something Went Wrong: We hit an unexpected error while building the report. Please \
         retry.",
    ),
    ("compare.failed.detail", "Detail: {error}"),
    (
        "compare.timed_out",
        "Request Timed Out: Okta took too long to respond. Please try again in a moment.",
    ),
    ("compare.saved", "Report saved to {path}"),
    ("compare.drift", "Drift detected: {count} differences."),
    ("export.kind.differences", "Differences CSV"),
    ("export.kind.matches", "Matches CSV"),
    ("export.kind.report", "Full report CSV"),
    ("export.written", "{kind} written to {path}"),
    ("export.load_failed", "Failed to read saved report {path}: {error}"),
    ("export.write_failed", "Failed to write {path}: {error}"),
    ("snapshot.csv", "Snapshot CSV"),
    ("snapshot.markdown", "Snapshot Markdown"),
    ("sections.row", "{id}\t{title}"),
];

/// Catalan catalog.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "tenant-drift {version}"),
    ("output.stream.stdout", "sortida estàndard"),
    ("output.stream.stderr", "sortida d'error"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava 'en' o 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la sortida que no és en anglès està traduïda automàticament i pot ser inexacta.",
    ),
    ("config.load_failed", "No s'ha pogut carregar la configuració: {error}"),
    ("config.validate.ok", "Configuració vàlida: {env_a} contra {env_b}, {sections} seccions."),
    ("client.init_failed", "No s'ha pogut preparar el client d'Okta per a {env}: {error}"),
    ("audit.open_failed", "No s'ha pogut obrir el registre d'auditoria a {path}: {error}"),
    (
        "compare.failed",
        "Alguna cosa ha fallat: hem trobat un error inesperat en generar l'informe. Torneu-ho a \
         provar.",
    ),
    ("compare.failed.detail", "Detall: {error}"),
    (
        "compare.timed_out",
        "Temps d'espera esgotat: Okta ha trigat massa a respondre. Torneu-ho a provar d'aquí a \
         un moment.",
    ),
    ("compare.saved", "Informe desat a {path}"),
    ("compare.drift", "S'ha detectat deriva: {count} diferències."),
    ("export.kind.differences", "CSV de diferències"),
    ("export.kind.matches", "CSV de coincidències"),
    ("export.kind.report", "CSV de l'informe complet"),
    ("export.written", "{kind} escrit a {path}"),
    ("export.load_failed", "No s'ha pogut llegir l'informe desat {path}: {error}"),
    ("export.write_failed", "No s'ha pogut escriure {path}: {error}"),
    ("snapshot.csv", "CSV de la instantània"),
    ("snapshot.markdown", "Markdown de la instantània"),
    ("sections.row", "{id}\t{title}"),
];

/// Returns the message catalog for the requested locale.
fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CATALOG_CA_MAP.get_or_init(|| CATALOG_CA.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` in the current locale, substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translates `key` in an explicit locale, substituting `args`.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// Named arguments are substituted into `{placeholder}` positions of the
/// catalog entry for `$key`.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================
