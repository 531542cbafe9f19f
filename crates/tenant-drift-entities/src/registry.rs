// crates/tenant-drift-entities/src/registry.rs
// ============================================================================
// Module: Adapter Registry
// Description: Built-in adapters in run order and the run drivers.
// Purpose: Execute comparison and snapshot runs across selected sections.
// Dependencies: tenant-drift-core, thiserror
// ============================================================================

//! ## Overview
//! The registry owns every built-in adapter in a fixed run order. A
//! comparison run walks the selected sections serially, Env A before Env B
//! within each section, and assembles the results into a
//! [`ComparisonReport`]. A snapshot run walks the same sections against one
//! environment.
//!
//! Invariants:
//! - Section order in reports always follows registry order, regardless of
//!   the order of a requested subset.
//! - Unknown section ids fail the run before any fetch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tenant_drift_core::CollectionSource;
use tenant_drift_core::ComparisonReport;
use tenant_drift_core::DriftAuditEvent;
use tenant_drift_core::DriftAuditSink;
use tenant_drift_core::Environment;
use tenant_drift_core::NoticeKind;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SignatureError;
use tenant_drift_core::SnapshotReport;
use thiserror::Error;

use crate::adapter::CompareContext;
use crate::adapter::CompareOptions;
use crate::adapter::EntityAdapter;
use crate::adapter::SnapshotContext;
use crate::admin::AdminAssignmentsAdapter;
use crate::admin::ResourceSetsAdapter;
use crate::admin::api_tokens;
use crate::admin::custom_admin_roles;
use crate::apps::ApplicationsAdapter;
use crate::apps::authenticators;
use crate::authorization::AccessPoliciesAdapter;
use crate::authorization::AuthorizationServersAdapter;
use crate::branding::BrandEmailTemplatesAdapter;
use crate::branding::BrandPagesAdapter;
use crate::branding::BrandSettingsAdapter;
use crate::directory::GroupRulesAdapter;
use crate::directory::groups;
use crate::identity::identity_providers;
use crate::identity::realm_assignments;
use crate::identity::realms;
use crate::network::network_zones;
use crate::network::trusted_origins;
use crate::policies::GlobalSessionPolicies;
use crate::policies::app_sign_on_policies;
use crate::policies::idp_discovery_policies;
use crate::policies::mfa_enrollment_policies;
use crate::policies::password_policies;
use crate::policies::profile_enrollment_policies;
use crate::profiles::ProfileMappingsAdapter;
use crate::profiles::ProfileSchemaAdapter;
use crate::security::OrgSettingsAdapter;
use crate::security::SecuritySettingsAdapter;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Run driver failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// A requested section id is not registered.
    #[error("unknown section: {0}")]
    UnknownSection(String),
    /// The report identity could not be computed.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Ordered set of entity adapters.
pub struct AdapterRegistry {
    /// Adapters in run order.
    adapters: Vec<Box<dyn EntityAdapter>>,
}

impl AdapterRegistry {
    /// Creates a registry from adapters in run order.
    #[must_use]
    pub fn new(adapters: Vec<Box<dyn EntityAdapter>>) -> Self {
        Self {
            adapters,
        }
    }

    /// Creates the registry of every built-in section.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(groups()),
            Box::new(GroupRulesAdapter),
            Box::new(network_zones()),
            Box::new(ApplicationsAdapter),
            Box::new(authenticators()),
            Box::new(mfa_enrollment_policies()),
            Box::new(password_policies()),
            Box::new(app_sign_on_policies()),
            Box::new(idp_discovery_policies()),
            Box::new(profile_enrollment_policies()),
            Box::new(BrandSettingsAdapter),
            Box::new(BrandPagesAdapter),
            Box::new(BrandEmailTemplatesAdapter),
            Box::new(AuthorizationServersAdapter),
            Box::new(AccessPoliciesAdapter),
            Box::new(custom_admin_roles()),
            Box::new(ResourceSetsAdapter::default()),
            Box::new(AdminAssignmentsAdapter),
            Box::new(api_tokens()),
            Box::new(SecuritySettingsAdapter),
            Box::new(OrgSettingsAdapter),
            Box::new(identity_providers()),
            Box::new(realms()),
            Box::new(realm_assignments()),
            Box::new(ProfileSchemaAdapter),
            Box::new(ProfileMappingsAdapter),
            Box::new(trusted_origins()),
            Box::new(GlobalSessionPolicies),
        ])
    }

    /// Returns section ids in run order.
    #[must_use]
    pub fn section_ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|adapter| adapter.section().id).collect()
    }

    /// Returns `(id, title)` pairs in run order.
    #[must_use]
    pub fn sections(&self) -> Vec<(&'static str, &'static str)> {
        self.adapters
            .iter()
            .map(|adapter| {
                let info = adapter.section();
                (info.id, info.title)
            })
            .collect()
    }

    /// Selects adapters by id, keeping run order; an empty request selects
    /// every adapter.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnknownSection`] for the first unregistered id.
    pub fn select(&self, requested: &[String]) -> Result<Vec<&dyn EntityAdapter>, RunError> {
        if requested.is_empty() {
            return Ok(self.adapters.iter().map(Box::as_ref).collect());
        }
        let known: BTreeSet<&str> = self.section_ids().into_iter().collect();
        if let Some(unknown) = requested.iter().find(|id| !known.contains(id.as_str())) {
            return Err(RunError::UnknownSection(unknown.clone()));
        }
        let wanted: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
        Ok(self
            .adapters
            .iter()
            .map(Box::as_ref)
            .filter(|adapter| wanted.contains(adapter.section().id))
            .collect())
    }

    /// Runs a comparison between two environments.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] for unknown sections or when the report identity
    /// cannot be computed. Fetch failures never fail the run.
    pub fn run_comparison(
        &self,
        source_a: &dyn CollectionSource,
        source_b: &dyn CollectionSource,
        options: CompareOptions,
        requested: &[String],
        audit: &dyn DriftAuditSink,
    ) -> Result<ComparisonReport, RunError> {
        let selected = self.select(requested)?;
        audit.record(&DriftAuditEvent::run_started(
            source_a.label(),
            source_b.label(),
            selected.len(),
        ));
        let ctx = CompareContext::new(source_a, source_b, options, audit);
        let mut sections = Vec::with_capacity(selected.len());
        for adapter in selected {
            let report = adapter.compare(&ctx);
            record_collisions(&report, audit);
            audit.record(&DriftAuditEvent::section_completed(&report.id, &report.summary));
            sections.push(report);
        }
        let report =
            ComparisonReport::assemble(source_a.label(), source_b.label(), sections, ctx.tally())?;
        audit.record(&DriftAuditEvent::run_completed(&report.report_id, report.total_diffs()));
        Ok(report)
    }

    /// Inventories one environment.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnknownSection`] for unknown sections.
    pub fn run_snapshot(
        &self,
        environment: Environment,
        source: &dyn CollectionSource,
        requested: &[String],
        audit: &dyn DriftAuditSink,
    ) -> Result<SnapshotReport, RunError> {
        let selected = self.select(requested)?;
        let ctx = SnapshotContext::new(environment, source, audit);
        let sections = selected.iter().flat_map(|adapter| adapter.snapshot(&ctx)).collect();
        Ok(SnapshotReport {
            environment: ctx.label().to_string(),
            generated_at_ms: now_ms(),
            sections,
        })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Emits one audit event per key collision in a section.
fn record_collisions(report: &SectionReport, audit: &dyn DriftAuditSink) {
    for notice in &report.notices {
        if notice.kind != NoticeKind::KeyCollision {
            continue;
        }
        if let Some(environment) = notice.environment {
            audit.record(&DriftAuditEvent::key_collision(environment, &report.id, &notice.resource));
        }
    }
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
