//! Span record types produced by the lifecycle instrumentation.
//!
//! A finished span is a plain value: name, timing, an attribute map and an
//! ordered event list. Recorder implementations hand these to whatever export
//! path they own (OTLP, NDJSON files, a test buffer); nothing in here knows
//! about transport.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a unique 16-character hex span ID (8 bytes of a v4 UUID).
pub fn generate_span_id() -> String {
    let uuid = Uuid::new_v4();
    uuid.simple().to_string()[..16].to_string()
}

/// Convert SystemTime to nanoseconds since Unix epoch.
pub fn system_time_to_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Attribute values carried on spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Bool(bool),
    I64(i64),
    F64(f64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::I64(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::F64(value)
    }
}

impl AttributeValue {
    /// The string payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// An attribute map with unique keys, last-write-wins.
///
/// Deterministic ordering via BTreeMap so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    entries: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    /// String value for a key, the common case in filters and assertions.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(AttributeValue::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single named event on a span. Insertion order is the semantic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub time_unix_nano: u64,
}

impl SpanEvent {
    pub fn now(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_unix_nano: system_time_to_nanos(SystemTime::now()),
        }
    }
}

/// A span as accumulated by a recorder.
///
/// `end_time_unix_nano == 0` means the span is still open. Events append only
/// while open; once ended the record is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    /// Unique span identifier (16-char hex)
    pub span_id: String,

    pub name: String,

    /// When the span was opened (human-readable, RFC3339 in JSON output)
    pub started_at: DateTime<Utc>,

    pub start_time_unix_nano: u64,

    /// Zero until the span is ended
    pub end_time_unix_nano: u64,

    pub attributes: Attributes,

    pub events: Vec<SpanEvent>,
}

impl SpanData {
    /// Open a new span record starting now.
    pub fn begin(name: impl Into<String>) -> Self {
        Self {
            span_id: generate_span_id(),
            name: name.into(),
            started_at: Utc::now(),
            start_time_unix_nano: system_time_to_nanos(SystemTime::now()),
            end_time_unix_nano: 0,
            attributes: Attributes::new(),
            events: Vec::new(),
        }
    }

    /// Close the span. Idempotent; the first end time wins.
    pub fn end(&mut self) {
        if self.end_time_unix_nano == 0 {
            let now = system_time_to_nanos(SystemTime::now());
            // end must never precede start even if the clock steps
            self.end_time_unix_nano = now.max(self.start_time_unix_nano);
        }
    }

    pub fn is_ended(&self) -> bool {
        self.end_time_unix_nano != 0
    }

    /// Event names in insertion order.
    pub fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name.as_str()).collect()
    }

    /// String attribute lookup, the common case in assertions and filters.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_str)
    }
}
