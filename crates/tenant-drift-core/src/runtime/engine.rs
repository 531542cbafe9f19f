// crates/tenant-drift-core/src/runtime/engine.rs
// ============================================================================
// Module: Reconciliation Engine
// Description: Keyed set reconciliation with per-attribute diffing.
// Purpose: Turn two environments' collections into diff and match entries.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`reconcile`] pairs records from Env A and Env B by an adapter-supplied key
//! and classifies every key into exactly one bucket: missing in Env B,
//! matched, or unmatched in Env B (extra, or missing in Env A when the policy
//! says so). Matched keys are then compared according to the policy's
//! [`CompareSpec`]. [`reconcile_nested`] additionally hands every matched pair
//! to a callback so adapters can reconcile sub-resources in discovery order.
//!
//! Security posture: records are untrusted upstream JSON; the engine never
//! fails on their shape and treats absent attributes as null.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use serde_json::Value;

use crate::core::entries::DiffEntry;
use crate::core::entries::EXISTENCE_ATTRIBUTE;
use crate::core::entries::EXISTS;
use crate::core::entries::MISSING;
use crate::core::entries::MatchEntry;
use crate::core::entries::Notice;
use crate::core::entries::NoticeKind;
use crate::core::identifiers::Environment;
use crate::core::identifiers::RecordKey;
use crate::core::record::Record;
use crate::core::record::cloned_at;
use crate::core::record::text_or_empty;
use crate::core::record::value_at;
use crate::core::severity::DifferenceType;
use crate::core::signature::signature;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Match value for equal signatures.
pub const MATCH_VALUE: &str = "Match";

/// Default mismatch value for unequal signatures.
pub const DIFFERENT_VALUE: &str = "Different";

/// Value written when a comparison input could not be obtained.
pub const UNAVAILABLE_VALUE: &str = "Unavailable";

// ============================================================================
// SECTION: Templates
// ============================================================================

/// Impact tag and remediation template for one outcome.
///
/// Action templates may reference `{name}`, `{parent}`, `{attribute}`,
/// `{attribute_lower}`, and `{env}`. Unknown placeholders are kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Free-text impact tag.
    pub impact: &'static str,
    /// Remediation template.
    pub action: &'static str,
}

impl Outcome {
    /// Creates an outcome template.
    #[must_use]
    pub const fn new(impact: &'static str, action: &'static str) -> Self {
        Self {
            impact,
            action,
        }
    }
}

/// Outcome templates for each difference kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Templates {
    /// Used for missing-in-B and missing-in-A rows.
    pub missing: Outcome,
    /// Used for extra-in-B rows.
    pub extra: Outcome,
    /// Used for attribute mismatches without an override.
    pub mismatch: Outcome,
}

impl Templates {
    /// Returns the template for a difference kind.
    #[must_use]
    pub const fn for_type(&self, difference_type: DifferenceType) -> &Outcome {
        match difference_type {
            DifferenceType::MissingInB | DifferenceType::MissingInA => &self.missing,
            DifferenceType::ExtraInB => &self.extra,
            DifferenceType::Mismatch => &self.mismatch,
        }
    }
}

/// Substitution values for template rendering.
struct TemplateVars<'a> {
    /// Record key.
    name: &'a str,
    /// Parent object name, empty for top-level objects.
    parent: &'a str,
    /// Logical attribute name.
    attribute: &'a str,
    /// Environment label.
    env: &'a str,
}

/// Renders `{placeholder}` references in a single left-to-right pass.
fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[.. start]);
        let tail = &rest[start ..];
        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        match &tail[1 .. end] {
            "name" => out.push_str(vars.name),
            "parent" => out.push_str(vars.parent),
            "attribute" => out.push_str(vars.attribute),
            "attribute_lower" => out.push_str(&vars.attribute.to_lowercase()),
            "env" => out.push_str(vars.env),
            _ => out.push_str(&tail[..= end]),
        }
        rest = &tail[end + 1 ..];
    }
    out.push_str(rest);
    out
}

// ============================================================================
// SECTION: Compare Specs
// ============================================================================

/// How an attribute value is read from a record.
#[derive(Debug, Clone, Copy)]
pub enum Extract {
    /// Raw value at a path, null when absent.
    Path(&'static [&'static str]),
    /// Text at a path, empty string when absent.
    Text(&'static [&'static str]),
    /// Raw value at a path, empty string when absent.
    OrEmpty(&'static [&'static str]),
    /// The whole record.
    Whole,
    /// Custom projection.
    With(fn(&Record) -> Value),
}

impl Extract {
    /// Applies the extraction to a record.
    #[must_use]
    pub fn apply(&self, record: &Record) -> Value {
        match self {
            Self::Path(path) => cloned_at(record, path),
            Self::Text(path) => text_or_empty(record, path),
            Self::OrEmpty(path) => value_at(record, path).cloned().unwrap_or_else(|| Value::from("")),
            Self::Whole => record.clone(),
            Self::With(project) => project(record),
        }
    }
}

/// How two extracted values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// JSON value equality; entries carry the values themselves.
    Equal,
    /// Signature equality; entries carry coarse markers.
    Signature {
        /// Keys stripped at every depth before signing.
        skip_keys: &'static [&'static str],
        /// Value written on both sides of a mismatch.
        mismatch_value: &'static str,
    },
}

/// One compared attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    /// Attribute label written into entries.
    pub name: &'static str,
    /// Value extraction.
    pub extract: Extract,
    /// Comparison mode.
    pub comparison: Comparison,
    /// Mismatch template override.
    pub mismatch: Option<Outcome>,
}

impl AttributeSpec {
    /// Compares the extracted value by JSON equality.
    #[must_use]
    pub const fn value(name: &'static str, extract: Extract) -> Self {
        Self {
            name,
            extract,
            comparison: Comparison::Equal,
            mismatch: None,
        }
    }

    /// Compares the text at `path`, treating absent as empty.
    #[must_use]
    pub const fn text(name: &'static str, path: &'static [&'static str]) -> Self {
        Self::value(name, Extract::Text(path))
    }

    /// Compares the extracted value by signature.
    #[must_use]
    pub const fn signed(
        name: &'static str,
        extract: Extract,
        skip_keys: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            extract,
            comparison: Comparison::Signature {
                skip_keys,
                mismatch_value: DIFFERENT_VALUE,
            },
            mismatch: None,
        }
    }

    /// Overrides the mismatch template for this attribute.
    #[must_use]
    pub const fn with_mismatch(mut self, outcome: Outcome) -> Self {
        self.mismatch = Some(outcome);
        self
    }
}

/// Signature-only comparison of a matched pair.
#[derive(Debug, Clone, Copy)]
pub struct SignatureSpec {
    /// Attribute label written into entries.
    pub attribute: &'static str,
    /// Projection applied before signing.
    pub project: Extract,
    /// Keys stripped at every depth before signing.
    pub skip_keys: &'static [&'static str],
    /// Value written on both sides of a mismatch.
    pub mismatch_value: &'static str,
}

impl SignatureSpec {
    /// Creates a whole-record signature spec with the default mismatch value.
    #[must_use]
    pub const fn new(attribute: &'static str, skip_keys: &'static [&'static str]) -> Self {
        Self {
            attribute,
            project: Extract::Whole,
            skip_keys,
            mismatch_value: DIFFERENT_VALUE,
        }
    }

    /// Sets the projection applied before signing.
    #[must_use]
    pub const fn with_project(mut self, project: Extract) -> Self {
        self.project = project;
        self
    }

    /// Sets the value written on both sides of a mismatch.
    #[must_use]
    pub const fn with_mismatch_value(mut self, value: &'static str) -> Self {
        self.mismatch_value = value;
        self
    }

    /// Returns the equivalent attribute spec.
    #[must_use]
    pub const fn as_attribute(&self) -> AttributeSpec {
        AttributeSpec {
            name: self.attribute,
            extract: self.project,
            comparison: Comparison::Signature {
                skip_keys: self.skip_keys,
                mismatch_value: self.mismatch_value,
            },
            mismatch: None,
        }
    }
}

/// What a matched key is compared on.
#[derive(Debug, Clone)]
pub enum CompareSpec {
    /// A single match entry whose value is the key.
    ExistenceOnly {
        /// Attribute label of the match entry.
        attribute: &'static str,
    },
    /// One entry per listed attribute, in order.
    Attributes(Vec<AttributeSpec>),
    /// One coarse entry from a signature comparison.
    Signature(SignatureSpec),
    /// No entries of its own; the nested callback does the work.
    Deferred,
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Where entries of a reconciliation are placed in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The key is the object.
    Object,
    /// The object is `"{parent} / {kind}: {key}"`.
    Qualified {
        /// Display name of the parent object.
        parent: String,
        /// Kind label of the child, e.g. `Rule`.
        kind: &'static str,
    },
    /// The object is fixed and the key becomes the attribute.
    Attribute {
        /// Display name of the owning object.
        object: String,
    },
}

/// Treatment of keys present only in Env B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedB {
    /// Low-priority "Extra in Env B".
    #[default]
    ExtraInB,
    /// Critical "Missing in Env A".
    MissingInA,
}

/// Comparison policy for one reconciliation.
#[derive(Debug, Clone)]
pub struct ComparePolicy {
    /// Entry category (section title).
    pub category: String,
    /// Entry placement.
    pub placement: Placement,
    /// Matched-key comparison.
    pub spec: CompareSpec,
    /// Outcome templates.
    pub templates: Templates,
    /// Treatment of keys present only in Env B.
    pub unmatched_b: UnmatchedB,
}

impl ComparePolicy {
    /// Creates an object-placed policy with extra-in-B handling.
    #[must_use]
    pub fn new(category: impl Into<String>, spec: CompareSpec, templates: Templates) -> Self {
        Self {
            category: category.into(),
            placement: Placement::Object,
            spec,
            templates,
            unmatched_b: UnmatchedB::ExtraInB,
        }
    }

    /// Sets the placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the treatment of keys present only in Env B.
    #[must_use]
    pub const fn with_unmatched_b(mut self, unmatched_b: UnmatchedB) -> Self {
        self.unmatched_b = unmatched_b;
        self
    }

    /// Returns the object label for a key.
    #[must_use]
    pub fn object_for(&self, key: &str) -> String {
        match &self.placement {
            Placement::Object => key.to_string(),
            Placement::Qualified {
                parent,
                kind,
            } => format!("{parent} / {kind}: {key}"),
            Placement::Attribute {
                object,
            } => object.clone(),
        }
    }

    /// Returns the entry attribute for a key and logical attribute.
    fn attribute_for(&self, key: &str, attribute: &str) -> String {
        let Placement::Attribute {
            ..
        } = &self.placement
        else {
            return attribute.to_string();
        };
        match &self.spec {
            CompareSpec::Attributes(specs) if specs.len() > 1 && attribute != EXISTENCE_ATTRIBUTE => {
                format!("{key} / {attribute}")
            }
            _ => key.to_string(),
        }
    }

    /// Returns the parent name used for `{parent}`.
    fn parent_name(&self) -> &str {
        match &self.placement {
            Placement::Object => "",
            Placement::Qualified {
                parent,
                ..
            } => parent,
            Placement::Attribute {
                object,
            } => object,
        }
    }

    /// Builds a diff entry for a key under this policy.
    ///
    /// `outcome` overrides the policy template for the difference kind.
    #[must_use]
    pub fn diff(
        &self,
        key: &str,
        attribute: &str,
        difference_type: DifferenceType,
        values: (Value, Value),
        outcome: Option<&Outcome>,
    ) -> DiffEntry {
        let outcome = outcome.unwrap_or_else(|| self.templates.for_type(difference_type));
        let env = match difference_type {
            DifferenceType::MissingInA => Environment::A,
            _ => Environment::B,
        };
        let vars = TemplateVars {
            name: key,
            parent: self.parent_name(),
            attribute,
            env: env.label(),
        };
        DiffEntry {
            category: self.category.clone(),
            object: self.object_for(key),
            attribute: self.attribute_for(key, attribute),
            value_a: values.0,
            value_b: values.1,
            difference_type,
            impact: render(outcome.impact, &vars),
            recommended_action: render(outcome.action, &vars),
            priority: difference_type.priority(),
        }
    }

    /// Builds a match entry for a key under this policy.
    #[must_use]
    pub fn matched(&self, key: &str, attribute: &str, value: Value) -> MatchEntry {
        MatchEntry {
            category: self.category.clone(),
            object: self.object_for(key),
            attribute: self.attribute_for(key, attribute),
            value,
        }
    }

    /// Builds the mismatch written when a dependent input could not be fetched.
    #[must_use]
    pub fn unavailable(&self, key: &str, attribute: &str, outcome: Option<&Outcome>) -> DiffEntry {
        self.diff(
            key,
            attribute,
            DifferenceType::Mismatch,
            (Value::from(UNAVAILABLE_VALUE), Value::from(UNAVAILABLE_VALUE)),
            outcome,
        )
    }

    /// Builds an existence entry for a key found on one side only.
    fn existence(&self, key: &str, difference_type: DifferenceType) -> DiffEntry {
        let values = match difference_type {
            DifferenceType::MissingInB => (Value::from(EXISTS), Value::from(MISSING)),
            DifferenceType::MissingInA | DifferenceType::ExtraInB => {
                (Value::from(MISSING), Value::from(EXISTS))
            }
            DifferenceType::Mismatch => (Value::from(EXISTS), Value::from(EXISTS)),
        };
        self.diff(key, EXISTENCE_ATTRIBUTE, difference_type, values, None)
    }

    /// Applies the compare spec to one matched pair.
    pub fn compare_pair(&self, key: &str, a: &Record, b: &Record, out: &mut Reconciliation) {
        match &self.spec {
            CompareSpec::ExistenceOnly {
                attribute,
            } => out.matches.push(self.matched(key, attribute, Value::from(key))),
            CompareSpec::Attributes(specs) => {
                for spec in specs {
                    self.compare_attribute(key, spec, a, b, out);
                }
            }
            CompareSpec::Signature(spec) => {
                self.compare_attribute(key, &spec.as_attribute(), a, b, out);
            }
            CompareSpec::Deferred => {}
        }
    }

    /// Compares one attribute of a matched pair.
    pub fn compare_attribute(
        &self,
        key: &str,
        spec: &AttributeSpec,
        a: &Record,
        b: &Record,
        out: &mut Reconciliation,
    ) {
        let value_a = spec.extract.apply(a);
        let value_b = spec.extract.apply(b);
        self.compare_values(key, spec, value_a, value_b, out);
    }

    /// Compares two already-extracted values under an attribute spec.
    pub fn compare_values(
        &self,
        key: &str,
        spec: &AttributeSpec,
        value_a: Value,
        value_b: Value,
        out: &mut Reconciliation,
    ) {
        let outcome = spec.mismatch.as_ref();
        match spec.comparison {
            Comparison::Equal => {
                if value_a == value_b {
                    out.matches.push(self.matched(key, spec.name, value_a));
                } else {
                    out.diffs.push(self.diff(
                        key,
                        spec.name,
                        DifferenceType::Mismatch,
                        (value_a, value_b),
                        outcome,
                    ));
                }
            }
            Comparison::Signature {
                skip_keys,
                mismatch_value,
            } => match (signature(&value_a, skip_keys), signature(&value_b, skip_keys)) {
                (Ok(sig_a), Ok(sig_b)) if sig_a == sig_b => {
                    out.matches.push(self.matched(key, spec.name, Value::from(MATCH_VALUE)));
                }
                (Ok(_), Ok(_)) => out.diffs.push(self.diff(
                    key,
                    spec.name,
                    DifferenceType::Mismatch,
                    (Value::from(mismatch_value), Value::from(mismatch_value)),
                    outcome,
                )),
                _ => out.diffs.push(self.unavailable(key, spec.name, outcome)),
            },
        }
    }
}

// ============================================================================
// SECTION: Reconciliation
// ============================================================================

/// Result of one reconciliation.
///
/// # Invariants
/// - `diffs` and `matches` are in discovery order: A's key order first, then
///   B-only keys in B's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Difference entries.
    pub diffs: Vec<DiffEntry>,
    /// Match entries.
    pub matches: Vec<MatchEntry>,
    /// Keys that appeared more than once within one environment.
    pub collisions: Vec<(Environment, RecordKey)>,
    /// Records skipped because they produced no key.
    pub unkeyed: usize,
    /// Keys present in both environments.
    pub matched: usize,
}

impl Reconciliation {
    /// Appends another reconciliation's entries and counters.
    pub fn absorb(&mut self, other: Self) {
        self.diffs.extend(other.diffs);
        self.matches.extend(other.matches);
        self.collisions.extend(other.collisions);
        self.unkeyed += other.unkeyed;
        self.matched += other.matched;
    }

    /// Returns notices for collisions and unkeyed records.
    #[must_use]
    pub fn notices(&self, resource: &str) -> Vec<Notice> {
        let mut notices: Vec<Notice> = self
            .collisions
            .iter()
            .map(|(environment, key)| Notice {
                kind: NoticeKind::KeyCollision,
                environment: Some(*environment),
                resource: key.to_string(),
                message: format!(
                    "duplicate key in {environment} {resource}; the later record was compared"
                ),
            })
            .collect();
        if self.unkeyed > 0 {
            notices.push(Notice {
                kind: NoticeKind::UnkeyedRecords,
                environment: None,
                resource: resource.to_string(),
                message: format!("{} record(s) without a usable key were skipped", self.unkeyed),
            });
        }
        notices
    }
}

// ============================================================================
// SECTION: Keyed Collections
// ============================================================================

/// Insertion-ordered key to record map with last-wins collisions.
struct KeyedCollection<'a> {
    /// Keyed records in first-seen order.
    entries: Vec<(RecordKey, &'a Record)>,
    /// Position of each key in `entries`.
    index: HashMap<RecordKey, usize>,
}

impl<'a> KeyedCollection<'a> {
    /// Keys a collection, recording collisions and unkeyed records.
    fn build<K>(
        records: &'a [Record],
        key_fn: &K,
        environment: Environment,
        out: &mut Reconciliation,
    ) -> Self
    where
        K: Fn(&Record) -> Option<String>,
    {
        let mut entries: Vec<(RecordKey, &'a Record)> = Vec::with_capacity(records.len());
        let mut index: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
        for record in records {
            let Some(key) = key_fn(record) else {
                out.unkeyed += 1;
                continue;
            };
            let key = RecordKey::new(key);
            if let Some(&position) = index.get(&key) {
                if let Some(slot) = entries.get_mut(position) {
                    slot.1 = record;
                }
                out.collisions.push((environment, key));
            } else {
                index.insert(key.clone(), entries.len());
                entries.push((key, record));
            }
        }
        Self {
            entries,
            index,
        }
    }

    /// Looks up a record by key.
    fn get(&self, key: &RecordKey) -> Option<&'a Record> {
        self.index.get(key).and_then(|position| self.entries.get(*position)).map(|entry| entry.1)
    }
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Reconciles two collections under a policy.
#[must_use]
pub fn reconcile<K>(a: &[Record], b: &[Record], key_fn: K, policy: &ComparePolicy) -> Reconciliation
where
    K: Fn(&Record) -> Option<String>,
{
    reconcile_nested(a, b, key_fn, policy, |_, _, _, _| {})
}

/// Reconciles two collections and runs `on_match` after each matched key.
///
/// The callback runs immediately after the key's own attribute comparison so
/// nested entries stay adjacent to their parent's entries.
pub fn reconcile_nested<K, M>(
    a: &[Record],
    b: &[Record],
    key_fn: K,
    policy: &ComparePolicy,
    mut on_match: M,
) -> Reconciliation
where
    K: Fn(&Record) -> Option<String>,
    M: FnMut(&RecordKey, &Record, &Record, &mut Reconciliation),
{
    let mut out = Reconciliation::default();
    let keyed_a = KeyedCollection::build(a, &key_fn, Environment::A, &mut out);
    let keyed_b = KeyedCollection::build(b, &key_fn, Environment::B, &mut out);

    for (key, record_a) in keyed_a.entries.iter().map(|(key, record)| (key, *record)) {
        match keyed_b.get(key) {
            None => out.diffs.push(policy.existence(key.as_str(), DifferenceType::MissingInB)),
            Some(record_b) => {
                out.matched += 1;
                policy.compare_pair(key.as_str(), record_a, record_b, &mut out);
                on_match(key, record_a, record_b, &mut out);
            }
        }
    }

    let unmatched_type = match policy.unmatched_b {
        UnmatchedB::ExtraInB => DifferenceType::ExtraInB,
        UnmatchedB::MissingInA => DifferenceType::MissingInA,
    };
    for (key, _) in &keyed_b.entries {
        if keyed_a.get(key).is_none() {
            out.diffs.push(policy.existence(key.as_str(), unmatched_type));
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
