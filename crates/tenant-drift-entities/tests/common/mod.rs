// crates/tenant-drift-entities/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: In-memory collection source and recording audit sink.
// Purpose: Drive adapters without a network.
// Dependencies: tenant-drift-core, serde_json
// ============================================================================

//! ## Overview
//! [`FakeSource`] answers each resource path from a route table; paths with
//! no route fail with status 404. [`RecordingSink`] keeps every audit event
//! for later assertions.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tenant_drift_core::CollectionSource;
use tenant_drift_core::DriftAuditEvent;
use tenant_drift_core::DriftAuditSink;
use tenant_drift_core::FetchError;
use tenant_drift_core::Record;
use tenant_drift_core::ResourcePath;

// ============================================================================
// SECTION: Fake Source
// ============================================================================

/// Canned answer for one resource.
#[derive(Debug, Clone)]
enum Route {
    /// Successful response body.
    Body(Value),
    /// Failure returned instead of a body.
    Fail(FetchError),
}

/// In-memory environment keyed by displayed resource path.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    /// Environment label.
    label: String,
    /// Answers by resource path.
    routes: HashMap<String, Route>,
}

impl FakeSource {
    /// Creates an empty source.
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            routes: HashMap::new(),
        }
    }

    /// Answers `path` with `body`.
    pub fn with(mut self, path: &str, body: Value) -> Self {
        self.routes.insert(path.to_string(), Route::Body(body));
        self
    }

    /// Answers `path` with an upstream status failure.
    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.routes.insert(
            path.to_string(),
            Route::Fail(FetchError::Status {
                status,
                resource: path.to_string(),
            }),
        );
        self
    }

    /// Answers `path` with a timeout.
    pub fn with_timeout(mut self, path: &str) -> Self {
        self.routes.insert(path.to_string(), Route::Fail(FetchError::Timeout(path.to_string())));
        self
    }

    /// Looks up the answer for a resource.
    fn answer(&self, resource: &ResourcePath) -> Result<Value, FetchError> {
        let key = resource.to_string();
        match self.routes.get(&key) {
            Some(Route::Body(body)) => Ok(body.clone()),
            Some(Route::Fail(err)) => Err(err.clone()),
            None => Err(FetchError::Status {
                status: 404,
                resource: key,
            }),
        }
    }
}

impl CollectionSource for FakeSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch_collection(&self, resource: &ResourcePath) -> Result<Vec<Record>, FetchError> {
        let body = self.answer(resource)?;
        let list = match (&body, resource.list_key) {
            (Value::Array(items), _) => items.clone(),
            (Value::Object(map), Some(key)) => {
                map.get(key).and_then(Value::as_array).cloned().unwrap_or_default()
            }
            _ => return Err(FetchError::Malformed(format!("not a list: {resource}"))),
        };
        Ok(list)
    }

    fn fetch_detail(&self, resource: &ResourcePath) -> Result<Record, FetchError> {
        self.answer(resource)
    }
}

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Audit sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Events in emission order.
    events: Mutex<Vec<DriftAuditEvent>>,
}

impl RecordingSink {
    /// Returns the names of recorded events.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }

    /// Returns recorded events with a given name.
    pub fn named(&self, name: &str) -> Vec<DriftAuditEvent> {
        self.events.lock().unwrap().iter().filter(|event| event.event == name).cloned().collect()
    }
}

impl DriftAuditSink for RecordingSink {
    fn record(&self, event: &DriftAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
