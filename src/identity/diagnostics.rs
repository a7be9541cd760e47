//! Fallback diagnostics
//!
//! Falling back to a random identifier is advisory, never an error. The
//! service reports it through a [`DiagnosticSink`] so callers and tests can
//! observe it without capturing process output.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

/// Why generation fell back to a random identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The object type is absent from the registry.
    UnknownObjectType,
    /// The type is registered but the bag carries none of its identity properties.
    NoIdentityProperties,
}

impl FallbackReason {
    /// Advisory text shared by both reasons.
    pub fn message(&self) -> &'static str {
        "no identity properties found"
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::UnknownObjectType => f.write_str("unknown_object_type"),
            FallbackReason::NoIdentityProperties => f.write_str("no_identity_properties"),
        }
    }
}

/// A single fallback occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackEvent {
    pub object_type: String,
    pub reason: FallbackReason,
}

/// Receiver for fallback diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn fallback(&self, event: &FallbackEvent);
}

/// Default sink: a `warn`-level tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn fallback(&self, event: &FallbackEvent) {
        tracing::warn!(
            object_type = %event.object_type,
            reason = %event.reason,
            "{} for {}, falling back to random UUID",
            event.reason.message(),
            event.object_type
        );
    }
}

/// Keeps every event in memory, for assertions and batch reports.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FallbackEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<FallbackEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for RecordingSink {
    fn fallback(&self, event: &FallbackEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
