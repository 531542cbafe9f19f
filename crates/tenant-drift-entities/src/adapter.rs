// crates/tenant-drift-entities/src/adapter.rs
// ============================================================================
// Module: Entity Adapter Interface
// Description: Adapter trait, fetch contexts, and the declarative adapter.
// Purpose: Bind one entity type to its endpoints, key, and compare policy.
// Dependencies: tenant-drift-core, serde, serde_json
// ============================================================================

//! ## Overview
//! An [`EntityAdapter`] owns one report section. Comparison runs through a
//! [`CompareContext`] holding both environments' sources; snapshots run
//! through a [`SnapshotContext`] holding one. Both contexts count fetch
//! outcomes and emit `fetch_completed` / `fetch_failed` audit events, so
//! adapters never log on their own.
//!
//! Top-level collection failures follow [`UnavailableMode`]. Failures of
//! dependent fetches (rules, themes, details) always degrade to an
//! `Unavailable` mismatch on the affected object.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::Cell;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tenant_drift_core::CollectionSource;
use tenant_drift_core::CompareSpec;
use tenant_drift_core::ComparePolicy;
use tenant_drift_core::DriftAuditEvent;
use tenant_drift_core::DriftAuditSink;
use tenant_drift_core::Environment;
use tenant_drift_core::Extract;
use tenant_drift_core::FetchError;
use tenant_drift_core::FetchTally;
use tenant_drift_core::Notice;
use tenant_drift_core::Reconciliation;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;
use tenant_drift_core::SectionInfo;
use tenant_drift_core::SectionReport;
use tenant_drift_core::SnapshotSection;
use tenant_drift_core::Templates;
use tenant_drift_core::UnavailableMode;
use tenant_drift_core::UnmatchedB;
use tenant_drift_core::core::record::first_text;
use tenant_drift_core::core::record::text_at;
use tenant_drift_core::reconcile;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Comparison run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareOptions {
    /// Treatment of top-level collections that could not be fetched.
    pub unavailable: UnavailableMode,
    /// Compare group assignments of matched applications.
    pub app_group_assignments: bool,
}

// ============================================================================
// SECTION: Fetch Observer
// ============================================================================

/// Counts fetch outcomes and emits fetch audit events.
struct FetchObserver<'a> {
    /// Audit sink receiving fetch events.
    audit: &'a dyn DriftAuditSink,
    /// Running outcome counters.
    tally: Cell<FetchTally>,
}

impl<'a> FetchObserver<'a> {
    /// Creates an observer with zeroed counters.
    fn new(audit: &'a dyn DriftAuditSink) -> Self {
        Self {
            audit,
            tally: Cell::new(FetchTally::default()),
        }
    }

    /// Records one fetch outcome and passes it through.
    fn observe<T>(
        &self,
        environment: Environment,
        section: &str,
        resource: &str,
        result: Result<T, FetchError>,
        count: impl Fn(&T) -> usize,
    ) -> Result<T, FetchError> {
        let mut tally = self.tally.get();
        match &result {
            Ok(value) => {
                tally.completed += 1;
                self.audit.record(&DriftAuditEvent::fetch_completed(
                    environment,
                    section,
                    resource,
                    count(value),
                ));
            }
            Err(err) => {
                tally.failed += 1;
                if err.is_timeout() {
                    tally.timed_out += 1;
                }
                self.audit.record(&DriftAuditEvent::fetch_failed(environment, section, resource, err));
            }
        }
        self.tally.set(tally);
        result
    }
}

// ============================================================================
// SECTION: Compare Context
// ============================================================================

/// Both environments' sources plus run-wide settings.
pub struct CompareContext<'a> {
    /// Env A source.
    source_a: &'a dyn CollectionSource,
    /// Env B source.
    source_b: &'a dyn CollectionSource,
    /// Run options.
    options: CompareOptions,
    /// Fetch accounting.
    observer: FetchObserver<'a>,
}

impl<'a> CompareContext<'a> {
    /// Creates a comparison context.
    #[must_use]
    pub fn new(
        source_a: &'a dyn CollectionSource,
        source_b: &'a dyn CollectionSource,
        options: CompareOptions,
        audit: &'a dyn DriftAuditSink,
    ) -> Self {
        Self {
            source_a,
            source_b,
            options,
            observer: FetchObserver::new(audit),
        }
    }

    /// Returns the run options.
    #[must_use]
    pub const fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Returns fetch counters accumulated so far.
    #[must_use]
    pub fn tally(&self) -> FetchTally {
        self.observer.tally.get()
    }

    /// Returns the audit sink.
    #[must_use]
    pub fn audit(&self) -> &'a dyn DriftAuditSink {
        self.observer.audit
    }

    /// Returns the source for one environment.
    #[must_use]
    pub fn source(&self, environment: Environment) -> &'a dyn CollectionSource {
        match environment {
            Environment::A => self.source_a,
            Environment::B => self.source_b,
        }
    }

    /// Fetches a collection from one environment.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`].
    pub fn fetch(
        &self,
        environment: Environment,
        section: SectionInfo,
        resource: &ResourcePath,
    ) -> Result<Vec<Record>, FetchError> {
        let result = self.source(environment).fetch_collection(resource);
        self.observer.observe(environment, section.id, &resource.to_string(), result, Vec::len)
    }

    /// Fetches a collection nested under a parent id from one environment.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`], or
    /// [`FetchError::InvalidRequest`] when the parent id is unusable.
    pub fn fetch_sub(
        &self,
        environment: Environment,
        section: SectionInfo,
        resource: &ResourcePath,
        parent_id: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let result = self.source(environment).fetch_sub_collection(resource, parent_id);
        self.observer.observe(environment, section.id, &resource.to_string(), result, Vec::len)
    }

    /// Fetches a single resource from one environment.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`].
    pub fn fetch_detail(
        &self,
        environment: Environment,
        section: SectionInfo,
        resource: &ResourcePath,
    ) -> Result<Record, FetchError> {
        let result = self.source(environment).fetch_detail(resource);
        self.observer.observe(environment, section.id, &resource.to_string(), result, |_| 1)
    }

    /// Fetches a single resource nested under a parent id from one environment.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`], or
    /// [`FetchError::InvalidRequest`] when the parent id is unusable.
    pub fn fetch_detail_sub(
        &self,
        environment: Environment,
        section: SectionInfo,
        resource: &ResourcePath,
        parent_id: &str,
    ) -> Result<Record, FetchError> {
        let result =
            resource.with_parent(parent_id).and_then(|path| self.source(environment).fetch_detail(&path));
        self.observer.observe(environment, section.id, &resource.to_string(), result, |_| 1)
    }

    /// Fetches a top-level collection from both environments.
    ///
    /// Returns `None` when reconciliation must be skipped; the failures are
    /// then described in `notices`.
    pub fn fetch_pair(
        &self,
        section: SectionInfo,
        resource: &ResourcePath,
        notices: &mut Vec<Notice>,
    ) -> Option<(Vec<Record>, Vec<Record>)> {
        let a = self.fetch(Environment::A, section, resource);
        let b = self.fetch(Environment::B, section, resource);
        self.settle_pair(resource, a, b, notices)
    }

    /// Fetches a top-level detail resource from both environments.
    ///
    /// Under [`UnavailableMode::TreatAsEmpty`] a failed side becomes null.
    pub fn fetch_detail_pair(
        &self,
        section: SectionInfo,
        resource: &ResourcePath,
        notices: &mut Vec<Notice>,
    ) -> Option<(Record, Record)> {
        let a = self.fetch_detail(Environment::A, section, resource);
        let b = self.fetch_detail(Environment::B, section, resource);
        self.settle_pair(resource, a, b, notices)
    }

    /// Fetches a dependent sub-collection for a matched parent pair.
    ///
    /// # Errors
    ///
    /// Returns the first side's [`FetchError`]; callers record the affected
    /// object as unavailable.
    pub fn fetch_sub_pair(
        &self,
        section: SectionInfo,
        resource: &ResourcePath,
        parents: (&Record, &Record),
    ) -> Result<(Vec<Record>, Vec<Record>), FetchError> {
        let a = self.fetch_sub(Environment::A, section, resource, &record_id(parents.0));
        let b = self.fetch_sub(Environment::B, section, resource, &record_id(parents.1));
        Ok((a?, b?))
    }

    /// Fetches a dependent detail resource for a matched parent pair.
    ///
    /// # Errors
    ///
    /// Returns the first side's [`FetchError`].
    pub fn fetch_detail_sub_pair(
        &self,
        section: SectionInfo,
        resource: &ResourcePath,
        parents: (&Record, &Record),
    ) -> Result<(Record, Record), FetchError> {
        let a = self.fetch_detail_sub(Environment::A, section, resource, &record_id(parents.0));
        let b = self.fetch_detail_sub(Environment::B, section, resource, &record_id(parents.1));
        Ok((a?, b?))
    }

    /// Applies the unavailable mode to a pair of top-level fetch results.
    ///
    /// Adapters that derive a collection from several chained requests use
    /// this to settle the combined outcome per environment.
    pub fn settle_pair<T: Default>(
        &self,
        resource: &ResourcePath,
        a: Result<T, FetchError>,
        b: Result<T, FetchError>,
        notices: &mut Vec<Notice>,
    ) -> Option<(T, T)> {
        match self.options.unavailable {
            UnavailableMode::TreatAsEmpty => Some((a.unwrap_or_default(), b.unwrap_or_default())),
            UnavailableMode::Report => {
                let a = note_failure(Environment::A, resource, a, notices);
                let b = note_failure(Environment::B, resource, b, notices);
                Some((a?, b?))
            }
        }
    }
}

/// Converts a failed fetch into a data-unavailable notice.
fn note_failure<T>(
    environment: Environment,
    resource: &ResourcePath,
    result: Result<T, FetchError>,
    notices: &mut Vec<Notice>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            notices.push(Notice::unavailable(environment, resource.to_string(), err.to_string()));
            None
        }
    }
}

// ============================================================================
// SECTION: Snapshot Context
// ============================================================================

/// One environment's source for inventory snapshots.
pub struct SnapshotContext<'a> {
    /// Environment being inventoried.
    environment: Environment,
    /// Source for that environment.
    source: &'a dyn CollectionSource,
    /// Fetch accounting.
    observer: FetchObserver<'a>,
}

impl<'a> SnapshotContext<'a> {
    /// Creates a snapshot context.
    #[must_use]
    pub fn new(
        environment: Environment,
        source: &'a dyn CollectionSource,
        audit: &'a dyn DriftAuditSink,
    ) -> Self {
        Self {
            environment,
            source,
            observer: FetchObserver::new(audit),
        }
    }

    /// Returns the inventoried environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns the source label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.source.label()
    }

    /// Returns fetch counters accumulated so far.
    #[must_use]
    pub fn tally(&self) -> FetchTally {
        self.observer.tally.get()
    }

    /// Fetches a collection.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`].
    pub fn fetch(&self, section: &str, resource: &ResourcePath) -> Result<Vec<Record>, FetchError> {
        let result = self.source.fetch_collection(resource);
        self.observer.observe(self.environment, section, &resource.to_string(), result, Vec::len)
    }

    /// Fetches a collection nested under `parent`.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`].
    pub fn fetch_sub(
        &self,
        section: &str,
        resource: &ResourcePath,
        parent: &Record,
    ) -> Result<Vec<Record>, FetchError> {
        let result = self.source.fetch_sub_collection(resource, &record_id(parent));
        self.observer.observe(self.environment, section, &resource.to_string(), result, Vec::len)
    }

    /// Fetches a single resource.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FetchError`].
    pub fn fetch_detail(&self, section: &str, resource: &ResourcePath) -> Result<Record, FetchError> {
        let result = self.source.fetch_detail(resource);
        self.observer.observe(self.environment, section, &resource.to_string(), result, |_| 1)
    }
}

// ============================================================================
// SECTION: Adapter Trait
// ============================================================================

/// One entity type's comparison and inventory logic.
pub trait EntityAdapter {
    /// Returns the section this adapter produces.
    fn section(&self) -> SectionInfo;

    /// Compares both environments and returns the section report.
    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport;

    /// Inventories one environment.
    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection>;
}

// ============================================================================
// SECTION: Declarative Adapter
// ============================================================================

/// Record key function.
pub type KeyFn = fn(&Record) -> Option<String>;

/// One snapshot column.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotField {
    /// Column name.
    pub column: &'static str,
    /// Cell extraction.
    pub extract: Extract,
}

impl SnapshotField {
    /// Creates a snapshot column.
    #[must_use]
    pub const fn new(column: &'static str, extract: Extract) -> Self {
        Self {
            column,
            extract,
        }
    }
}

/// Adapter fully described by one collection, key, and compare spec.
#[derive(Debug, Clone)]
pub struct CollectionAdapter {
    /// Section descriptor.
    pub info: SectionInfo,
    /// Collection endpoint.
    pub resource: ResourcePath,
    /// Natural key.
    pub key: KeyFn,
    /// Matched-key comparison.
    pub spec: CompareSpec,
    /// Outcome templates.
    pub templates: Templates,
    /// Treatment of keys present only in Env B.
    pub unmatched_b: UnmatchedB,
    /// Snapshot columns.
    pub fields: &'static [SnapshotField],
}

impl CollectionAdapter {
    /// Returns the compare policy for this adapter.
    #[must_use]
    pub fn policy(&self) -> ComparePolicy {
        ComparePolicy::new(self.info.title, self.spec.clone(), self.templates)
            .with_unmatched_b(self.unmatched_b)
    }
}

impl EntityAdapter for CollectionAdapter {
    fn section(&self) -> SectionInfo {
        self.info
    }

    fn compare(&self, ctx: &CompareContext<'_>) -> SectionReport {
        let mut notices = Vec::new();
        let Some((a, b)) = ctx.fetch_pair(self.info, &self.resource, &mut notices) else {
            return SectionReport::new(self.info, Reconciliation::default(), notices);
        };
        SectionReport::new(self.info, reconcile(&a, &b, self.key, &self.policy()), notices)
    }

    fn snapshot(&self, ctx: &SnapshotContext<'_>) -> Vec<SnapshotSection> {
        vec![collection_snapshot(ctx, self.info, &self.resource, self.fields)]
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a record's `id`, empty when absent.
#[must_use]
pub fn record_id(record: &Record) -> String {
    text_at(record, &["id"]).unwrap_or_default()
}

/// Keys by `name`.
#[must_use]
pub fn key_name(record: &Record) -> Option<String> {
    text_at(record, &["name"])
}

/// Keys by `name`, falling back to `id`.
#[must_use]
pub fn key_name_or_id(record: &Record) -> Option<String> {
    first_text(record, &["name", "id"])
}

/// Keys by `label`, then `name`, then `id`.
#[must_use]
pub fn key_label_name_id(record: &Record) -> Option<String> {
    first_text(record, &["label", "name", "id"])
}

/// Pairs records whose keys appear in both collections, in Env A order.
///
/// Duplicate keys resolve to the later record, as in reconciliation. Used by
/// sections that only inspect sub-resources of matched parents.
#[must_use]
pub fn matched_pairs<'r>(
    a: &'r [Record],
    b: &'r [Record],
    key: KeyFn,
) -> Vec<(String, &'r Record, &'r Record)> {
    let index_b: HashMap<String, &Record> =
        b.iter().filter_map(|record| Some((key(record)?, record))).collect();
    let mut order: Vec<(String, &Record)> = Vec::new();
    let mut index_a: HashMap<String, usize> = HashMap::new();
    for record in a {
        let Some(name) = key(record) else {
            continue;
        };
        if let Some(&position) = index_a.get(&name) {
            if let Some(slot) = order.get_mut(position) {
                slot.1 = record;
            }
        } else {
            index_a.insert(name.clone(), order.len());
            order.push((name, record));
        }
    }
    order
        .into_iter()
        .filter_map(|(name, record_a)| {
            let record_b = index_b.get(&name).copied()?;
            Some((name, record_a, record_b))
        })
        .collect()
}

/// Builds snapshot rows from records.
#[must_use]
pub fn snapshot_rows(records: &[Record], fields: &[SnapshotField]) -> Vec<Vec<(String, Value)>> {
    records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| (field.column.to_string(), field.extract.apply(record)))
                .collect()
        })
        .collect()
}

/// Builds snapshot rows for child records, led by their parent's name.
#[must_use]
pub fn child_rows(
    parent_column: &str,
    parent: &Record,
    records: &[Record],
    fields: &[SnapshotField],
) -> Vec<Vec<(String, Value)>> {
    let parent_name = Value::from(key_label_name_id(parent).unwrap_or_default());
    snapshot_rows(records, fields)
        .into_iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(row.len() + 1);
            cells.push((parent_column.to_string(), parent_name.clone()));
            cells.extend(row);
            cells
        })
        .collect()
}

/// Returns an empty section describing why its data is missing.
#[must_use]
pub fn unavailable_section(id: &str, title: &str, err: &FetchError) -> SnapshotSection {
    SnapshotSection::from_rows(id, title, Vec::new()).with_description(format!("Data unavailable: {err}"))
}

/// Fetches one collection and renders it as a snapshot section.
#[must_use]
pub fn collection_snapshot(
    ctx: &SnapshotContext<'_>,
    info: SectionInfo,
    resource: &ResourcePath,
    fields: &[SnapshotField],
) -> SnapshotSection {
    match ctx.fetch(info.id, resource) {
        Ok(records) => {
            SnapshotSection::from_rows(info.id, info.title, snapshot_rows(&records, fields))
        }
        Err(err) => unavailable_section(info.id, info.title, &err),
    }
}
