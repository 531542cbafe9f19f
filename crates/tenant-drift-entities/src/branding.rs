// crates/tenant-drift-entities/src/branding.rs
// ============================================================================
// Module: Branding Adapters
// Description: Brands, default themes, hosted pages, and email templates.
// Purpose: Compare end-user visible branding between tenants.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! Brand settings compare each brand's own fields followed by the fields of
//! its default theme. Pages and email templates are inspected for brands
//! present in both environments only; brand existence drift is reported once,
//! by the settings section.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tenant_drift_core::AttributeSpec;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::DriftAuditEvent;
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
use tenant_drift_core::SignatureSpec;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::core::record::items;
use tenant_drift_core::core::record::text_at;
use tenant_drift_core::core::record::value_at;
use tenant_drift_core::core::signature::ENVIRONMENT_NOISE;
use tenant_drift_core::core::signature::equivalent;
use tenant_drift_core::reconcile_nested;

use crate::adapter::CompareContext;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::adapter::SnapshotField;
use crate::adapter::key_name;
use crate::adapter::key_name_or_id;
use crate::adapter::matched_pairs;
use crate::adapter::record_id;
use crate::adapter::snapshot_rows;
use crate::adapter::unavailable_section;

// ============================================================================
// SECTION: Shared
// ============================================================================

/// Brand collection endpoint.
const BRANDS_PATH: &str = "/api/v1/brands";

/// Theme collection of a brand.
const THEMES_PATH: &str = "/api/v1/brands/{parent}/themes";

/// Email template collection of a brand.
const EMAIL_TEMPLATES_PATH: &str = "/api/v1/brands/{parent}/templates/email";

/// Picks the default theme, falling back to the first listed.
fn default_theme(themes: &[Record]) -> Record {
    themes
        .iter()
        .find(|theme| value_at(theme, &["isDefault"]).and_then(Value::as_bool).unwrap_or(false))
        .or_else(|| themes.first())
        .cloned()
        .unwrap_or(Value::Null)
}

// ============================================================================
// SECTION: Brand Settings
// ============================================================================

/// Brand settings section.
pub const BRAND_SETTINGS: SectionInfo = SectionInfo::new("brand-settings", "Brand Settings");

/// Snapshot section for themes.
const BRAND_THEMES: SectionInfo = SectionInfo::new("brand-themes", "Brand Themes");

/// Brand-level compared fields.
const BRAND_ATTRIBUTES: [AttributeSpec; 5] = [
    AttributeSpec::text("Brand Name", &["name"]),
    AttributeSpec::value("Remove Powered By Okta", Extract::Path(&["removePoweredByOkta"])),
    AttributeSpec::value("Custom Privacy Policy URL", Extract::Path(&["customPrivacyPolicyUrl"])),
    AttributeSpec::value(
        "Agree To Custom Privacy Policy",
        Extract::Path(&["agreeToCustomPrivacyPolicy"]),
    ),
    AttributeSpec::value("Is Default", Extract::Path(&["isDefault"])),
];

/// Default-theme compared fields.
const THEME_ATTRIBUTES: [AttributeSpec; 12] = [
    AttributeSpec::text("Background Image", &["backgroundImage"]),
    AttributeSpec::text("Email Template Variant", &["emailTemplateTouchPointVariant"]),
    AttributeSpec::text("End User Dashboard Variant", &["endUserDashboardTouchPointVariant"]),
    AttributeSpec::text("Error Page Variant", &["errorPageTouchPointVariant"]),
    AttributeSpec::text("Favicon", &["favicon"]),
    AttributeSpec::text("Loading Page Variant", &["loadingPageTouchPointVariant"]),
    AttributeSpec::text("Logo", &["logo"]),
    AttributeSpec::text("Primary Color Contrast Hex", &["primaryColorContrastHex"]),
    AttributeSpec::text("Primary Color Hex", &["primaryColorHex"]),
    AttributeSpec::text("Secondary Color Contrast Hex", &["secondaryColorContrastHex"]),
    AttributeSpec::text("Secondary Color Hex", &["secondaryColorHex"]),
    AttributeSpec::text("Sign-In Page Variant", &["signInPageTouchPointVariant"]),
];

/// Brand outcome templates.
const BRAND_TEMPLATES: Templates = Templates {
    missing: Outcome::new("Branding", "Create brand '{name}' in {env}"),
    extra: Outcome::new("Unexpected Brand", "Review extra brand '{name}' in {env}"),
    mismatch: Outcome::new("Branding Drift", "Align {attribute_lower} for brand '{name}'"),
};

/// Snapshot columns for brands.
const BRAND_FIELDS: &[SnapshotField] = &[
    SnapshotField::new("Brand Name", Extract::Path(&["name"])),
    SnapshotField::new("Is Default", Extract::Path(&["isDefault"])),
    SnapshotField::new("Remove Powered By Okta", Extract::Path(&["removePoweredByOkta"])),
    SnapshotField::new("Custom Privacy Policy URL", Extract::Path(&["customPrivacyPolicyUrl"])),
    SnapshotField::new("ID", Extract::Path(&["id"])),
];

/// Brands and their default themes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandSettingsAdapter;

impl EntityAdapter for BrandSettingsAdapter {
    fn section(&self) -> SectionInfo {
        BRAND_SETTINGS
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(BRAND_SETTINGS, &ResourcePath::org(BRANDS_PATH), &mut notices)
        else {
            return SectionReport::new(BRAND_SETTINGS, Reconciliation::default(), notices);
        };
        let themes = ResourcePath::org(THEMES_PATH);
        let policy = ComparePolicy::new(
            BRAND_SETTINGS.title,
            CompareSpec::Attributes(BRAND_ATTRIBUTES.to_vec()),
            BRAND_TEMPLATES,
        );
        let recon = reconcile_nested(&a, &b, key_name_or_id, &policy, |key, brand_a, brand_b, out| {
            let key = key.as_str();
            match ctx.fetch_sub_pair(BRAND_SETTINGS, &themes, (brand_a, brand_b)) {
                Ok((themes_a, themes_b)) => {
                    let theme_a = default_theme(&themes_a);
                    let theme_b = default_theme(&themes_b);
                    for spec in &THEME_ATTRIBUTES {
                        policy.compare_attribute(key, spec, &theme_a, &theme_b, out);
                    }
                }
                Err(_) => out.diffs.push(policy.unavailable(key, "Theme", None)),
            }
        });
        SectionReport::new(BRAND_SETTINGS, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let brands = match ctx.fetch(BRAND_SETTINGS.id, &ResourcePath::org(BRANDS_PATH)) {
            Ok(brands) => brands,
            Err(err) => {
                return vec![
                    unavailable_section(BRAND_SETTINGS.id, BRAND_SETTINGS.title, &err),
                    unavailable_section(BRAND_THEMES.id, BRAND_THEMES.title, &err),
                ];
            }
        };
        let themes_path = ResourcePath::org(THEMES_PATH);
        let mut theme_rows = Vec::new();
        for brand in &brands {
            let Ok(themes) = ctx.fetch_sub(BRAND_THEMES.id, &themes_path, brand) else {
                continue;
            };
            let theme = default_theme(&themes);
            let mut row = vec![(
                "Brand Name".to_string(),
                Value::from(key_name_or_id(brand).unwrap_or_default()),
            )];
            row.extend(
                THEME_ATTRIBUTES
                    .iter()
                    .map(|spec| (spec.name.to_string(), spec.extract.apply(&theme))),
            );
            theme_rows.push(row);
        }
        vec![
            SnapshotSection::from_rows(
                BRAND_SETTINGS.id,
                BRAND_SETTINGS.title,
                snapshot_rows(&brands, BRAND_FIELDS),
            ),
            SnapshotSection::from_rows(BRAND_THEMES.id, BRAND_THEMES.title, theme_rows),
        ]
    }
}

// ============================================================================
// SECTION: Brand Pages
// ============================================================================

/// Brand pages section.
pub const BRAND_PAGES: SectionInfo = SectionInfo::new("brand-pages", "Brand Pages");

/// Customized sign-in page of a brand.
const SIGN_IN_PAGE_PATH: &str = "/api/v1/brands/{parent}/pages/sign-in/customized";

/// Customized error page of a brand.
const ERROR_PAGE_PATH: &str = "/api/v1/brands/{parent}/pages/error/customized";

/// Sign-in page HTML comparison.
const SIGN_IN_HTML: AttributeSpec =
    AttributeSpec::signed("Sign-In Page HTML", Extract::Path(&["pageContent"]), &[]).with_mismatch(
        Outcome::new("User Experience", "Align sign-in page HTML for brand '{name}'"),
    );

/// Error page comparison.
const ERROR_PAGE: AttributeSpec = AttributeSpec::signed("Error Page", Extract::Whole, ENVIRONMENT_NOISE)
    .with_mismatch(Outcome::new("User Experience", "Align error page settings for brand '{name}'"));

/// Page outcome templates.
const PAGE_TEMPLATES: Templates = Templates {
    missing: Outcome::new("User Experience", "Create brand '{name}' in {env}"),
    extra: Outcome::new("User Experience", "Review extra brand '{name}' in {env}"),
    mismatch: Outcome::new("User Experience", "Align {attribute_lower} for brand '{name}'"),
};

/// Hosted sign-in and error pages of matched brands.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandPagesAdapter;

impl BrandPagesAdapter {
    /// Compares one page of a matched brand pair.
    fn compare_page(
        ctx: &CompareContext<'_>,
        policy: &ComparePolicy,
        key: &str,
        brands: (&Record, &Record),
        page: (&str, &AttributeSpec),
        out: &mut Reconciliation,
    ) -> Option<(Record, Record)> {
        let (path, spec) = page;
        match ctx.fetch_detail_sub_pair(BRAND_PAGES, &ResourcePath::org(path), brands) {
            Ok((page_a, page_b)) => {
                policy.compare_attribute(key, spec, &page_a, &page_b, out);
                Some((page_a, page_b))
            }
            Err(_) => {
                out.diffs.push(policy.unavailable(key, spec.name, spec.mismatch.as_ref()));
                None
            }
        }
    }
}

impl EntityAdapter for BrandPagesAdapter {
    fn section(&self) -> SectionInfo {
        BRAND_PAGES
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(BRAND_PAGES, &ResourcePath::org(BRANDS_PATH), &mut notices)
        else {
            return SectionReport::new(BRAND_PAGES, Reconciliation::default(), notices);
        };
        let policy = ComparePolicy::new(BRAND_PAGES.title, CompareSpec::Deferred, PAGE_TEMPLATES);
        let mut recon = Reconciliation::default();
        for (key, brand_a, brand_b) in matched_pairs(&a, &b, key_name_or_id) {
            recon.matched += 1;
            let sign_in = Self::compare_page(
                ctx,
                &policy,
                &key,
                (brand_a, brand_b),
                (SIGN_IN_PAGE_PATH, &SIGN_IN_HTML),
                &mut recon,
            );
            if let Some((page_a, page_b)) = sign_in
                && widget_drift_only(&page_a, &page_b)
            {
                ctx.audit().record(&DriftAuditEvent::widget_drift(BRAND_PAGES.id, &key));
            }
            Self::compare_page(
                ctx,
                &policy,
                &key,
                (brand_a, brand_b),
                (ERROR_PAGE_PATH, &ERROR_PAGE),
                &mut recon,
            );
        }
        SectionReport::new(BRAND_PAGES, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let brands = match ctx.fetch(BRAND_PAGES.id, &ResourcePath::org(BRANDS_PATH)) {
            Ok(brands) => brands,
            Err(err) => return vec![unavailable_section(BRAND_PAGES.id, BRAND_PAGES.title, &err)],
        };
        let page_state = |brand: &Record, path: &str| -> Value {
            match ResourcePath::org(path)
                .with_parent(&record_id(brand))
                .and_then(|resource| ctx.fetch_detail(BRAND_PAGES.id, &resource))
            {
                Ok(_) => Value::from(true),
                Err(err) if err.status() == Some(404) => Value::from(false),
                Err(_) => Value::from("Unavailable"),
            }
        };
        let rows = brands
            .iter()
            .map(|brand| {
                vec![
                    ("Brand Name".to_string(), Value::from(key_name_or_id(brand).unwrap_or_default())),
                    ("Sign-In Page Customized".to_string(), page_state(brand, SIGN_IN_PAGE_PATH)),
                    ("Error Page Customized".to_string(), page_state(brand, ERROR_PAGE_PATH)),
                ]
            })
            .collect();
        vec![SnapshotSection::from_rows(BRAND_PAGES.id, BRAND_PAGES.title, rows)]
    }
}

/// Returns true when the page HTML matches but widget customizations differ.
fn widget_drift_only(page_a: &Record, page_b: &Record) -> bool {
    let html_equal = value_at(page_a, &["pageContent"]) == value_at(page_b, &["pageContent"]);
    let widget = |page: &Record| value_at(page, &["widgetCustomizations"]).cloned().unwrap_or(Value::Null);
    html_equal && matches!(equivalent(&widget(page_a), &widget(page_b), ENVIRONMENT_NOISE), Ok(false))
}

// ============================================================================
// SECTION: Brand Email Templates
// ============================================================================

/// Brand email templates section.
pub const BRAND_EMAIL_TEMPLATES: SectionInfo =
    SectionInfo::new("brand-email-templates", "Brand Email Templates");

/// Email template outcome templates.
const EMAIL_TEMPLATES: Templates = Templates {
    missing: Outcome::new(
        "Email Branding",
        "Create email template '{name}' for brand '{parent}' in {env}",
    ),
    extra: Outcome::new(
        "Unexpected Template",
        "Review extra email template '{name}' for brand '{parent}' in {env}",
    ),
    mismatch: Outcome::new("Email Branding Drift", "Align email template '{name}' for brand '{parent}'"),
};

/// Customization comparison of one template.
const CUSTOMIZATION: AttributeSpec =
    SignatureSpec::new("Customization", &[]).with_mismatch_value("Didn't match").as_attribute();

/// Email template customizations of matched brands.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandEmailTemplatesAdapter;

impl BrandEmailTemplatesAdapter {
    /// Fetches one template's customizations from one environment.
    fn customizations(
        ctx: &CompareContext<'_>,
        environment: Environment,
        brand: &Record,
        template: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let list = ResourcePath::org(EMAIL_TEMPLATES_PATH).with_parent(&record_id(brand))?;
        let resource = ResourcePath {
            path: format!("{}/{{parent}}/customizations", list.path),
            ..list
        };
        ctx.fetch_sub(environment, BRAND_EMAIL_TEMPLATES, &resource, template)
    }
}

impl EntityAdapter for BrandEmailTemplatesAdapter {
    fn section(&self) -> SectionInfo {
        BRAND_EMAIL_TEMPLATES
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let info = BRAND_EMAIL_TEMPLATES;
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(info, &ResourcePath::org(BRANDS_PATH), &mut notices) else {
            return SectionReport::new(info, Reconciliation::default(), notices);
        };
        let templates_path = ResourcePath::org(EMAIL_TEMPLATES_PATH);
        let brand_policy = ComparePolicy::new(info.title, CompareSpec::Deferred, EMAIL_TEMPLATES);
        let mut recon = Reconciliation::default();
        for (brand, brand_a, brand_b) in matched_pairs(&a, &b, key_name_or_id) {
            let Ok((templates_a, templates_b)) =
                ctx.fetch_sub_pair(info, &templates_path, (brand_a, brand_b))
            else {
                recon.diffs.push(brand_policy.unavailable(&brand, "Email Templates", None));
                continue;
            };
            let policy = ComparePolicy::new(info.title, CompareSpec::Deferred, EMAIL_TEMPLATES)
                .with_placement(Placement::Attribute {
                    object: brand.clone(),
                });
            let nested = reconcile_nested(&templates_a, &templates_b, key_name, &policy, |key, _, _, out| {
                let key = key.as_str();
                let pair = (
                    Self::customizations(ctx, Environment::A, brand_a, key),
                    Self::customizations(ctx, Environment::B, brand_b, key),
                );
                match pair {
                    (Ok(custom_a), Ok(custom_b)) => policy.compare_values(
                        key,
                        &CUSTOMIZATION,
                        customization_signature_input(&custom_a),
                        customization_signature_input(&custom_b),
                        out,
                    ),
                    _ => out.diffs.push(policy.unavailable(key, CUSTOMIZATION.name, None)),
                }
            });
            recon.absorb(nested);
        }
        SectionReport::new(info, recon, notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        let info = BRAND_EMAIL_TEMPLATES;
        let brands = match ctx.fetch(info.id, &ResourcePath::org(BRANDS_PATH)) {
            Ok(brands) => brands,
            Err(err) => return vec![unavailable_section(info.id, info.title, &err)],
        };
        let templates_path = ResourcePath::org(EMAIL_TEMPLATES_PATH);
        let mut rows = Vec::new();
        for brand in &brands {
            let Ok(templates) = ctx.fetch_sub(info.id, &templates_path, brand) else {
                continue;
            };
            let brand_name = Value::from(key_name_or_id(brand).unwrap_or_default());
            for template in &templates {
                rows.push(vec![
                    ("Brand Name".to_string(), brand_name.clone()),
                    ("Template Name".to_string(), Extract::Path(&["name"]).apply(template)),
                ]);
            }
        }
        vec![SnapshotSection::from_rows(info.id, info.title, rows)]
    }
}

/// Projects customizations to sorted `{subject, body}` pairs.
fn customization_signature_input(customizations: &[Record]) -> Value {
    let mut pairs: Vec<(String, String)> = customizations
        .iter()
        .map(|custom| (customization_text(custom, "subject"), customization_body(custom)))
        .collect();
    pairs.sort();
    Value::Array(
        pairs
            .into_iter()
            .map(|(subject, body)| serde_json::json!({"subject": subject, "body": body}))
            .collect(),
    )
}

/// Reads a customization field from the record, its `content`, or its first
/// translation.
fn customization_text(custom: &Record, field: &str) -> String {
    text_at(custom, &[field])
        .or_else(|| text_at(custom, &["content", field]))
        .or_else(|| {
            let translations = value_at(custom, &["translations"])?;
            match translations {
                Value::Object(entries) => entries.values().find_map(|entry| text_at(entry, &[field])),
                _ => items(translations).iter().find_map(|entry| text_at(entry, &[field])),
            }
        })
        .unwrap_or_default()
}

/// Reads a customization body, falling back to `htmlBody`.
fn customization_body(custom: &Record) -> String {
    let body = customization_text(custom, "body");
    if body.is_empty() {
        customization_text(custom, "htmlBody")
    } else {
        body
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;

    #[test]
    fn default_theme_prefers_flagged_theme() {
        let themes = vec![json!({"id": "t1"}), json!({"id": "t2", "isDefault": true})];
        assert_eq!(default_theme(&themes)["id"], "t2");
        assert_eq!(default_theme(&themes[.. 1])["id"], "t1");
        assert!(default_theme(&[]).is_null());
    }

    #[test]
    fn customization_order_does_not_matter() {
        let a = customization_signature_input(&[
            json!({"subject": "Welcome", "body": "<p>Hi</p>", "id": "c1"}),
            json!({"content": {"subject": "Bienvenue", "htmlBody": "<p>Salut</p>"}}),
        ]);
        let b = customization_signature_input(&[
            json!({"subject": "Bienvenue", "htmlBody": "<p>Salut</p>"}),
            json!({"subject": "Welcome", "body": "<p>Hi</p>", "id": "c9"}),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn widget_only_drift_requires_equal_html() {
        let a = json!({"pageContent": "<html/>", "widgetCustomizations": {"widgetGeneration": "G2"}});
        let b = json!({"pageContent": "<html/>", "widgetCustomizations": {"widgetGeneration": "G3"}});
        let c = json!({"pageContent": "<body/>", "widgetCustomizations": {"widgetGeneration": "G3"}});
        assert!(widget_drift_only(&a, &b));
        assert!(!widget_drift_only(&a, &c));
        assert!(!widget_drift_only(&a, &a));
    }
}
