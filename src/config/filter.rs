//! Span filtering over the export path.
//!
//! Filters are decorators: each wraps an `Arc<dyn SpanRecorder>` and returns a
//! new one. The chain is assembled at configuration time and composed once, in
//! registration order, so there is no per-span dispatch cost beyond the plain
//! wrapper calls.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::telemetry::{AttributeValue, SpanHandle, SpanRecorder};

type Decorator = Box<dyn Fn(Arc<dyn SpanRecorder>) -> Arc<dyn SpanRecorder> + Send + Sync>;

/// Builds the recorder decorator chain applied to every exported span.
///
/// Decorators wrap the recorder in registration order, so the last one
/// registered is outermost. An empty builder decorates to the recorder
/// unchanged.
#[derive(Default)]
pub struct SpanFilterBuilder {
    decorators: Vec<Decorator>,
}

impl SpanFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop whole spans whose name matches `predicate`. Attributes and events
    /// written to a dropped span are swallowed with it.
    pub fn reject_spans_by_name<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.decorators.push(Box::new(move |inner| {
            Arc::new(NameFilter {
                inner,
                predicate: predicate.clone(),
                suppressed: Mutex::new(HashSet::new()),
                next_suppressed: AtomicU64::new(u64::MAX),
            })
        }));
        self
    }

    /// Strip an attribute key from every span.
    pub fn remove_span_attribute(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.decorators.push(Box::new(move |inner| {
            Arc::new(AttributeRewrite {
                inner,
                key: key.clone(),
                rewrite: Rewrite::Remove,
            })
        }));
        self
    }

    /// Rewrite the value of an attribute key on every span.
    pub fn replace_span_attribute<F>(&mut self, key: impl Into<String>, replacement: F) -> &mut Self
    where
        F: Fn(AttributeValue) -> AttributeValue + Send + Sync + 'static,
    {
        let key = key.into();
        let replacement = Arc::new(replacement);
        self.decorators.push(Box::new(move |inner| {
            Arc::new(AttributeRewrite {
                inner,
                key: key.clone(),
                rewrite: Rewrite::Replace(replacement.clone()),
            })
        }));
        self
    }

    /// Wrap `recorder` in the whole chain.
    pub fn decorate(&self, recorder: Arc<dyn SpanRecorder>) -> Arc<dyn SpanRecorder> {
        self.decorators
            .iter()
            .fold(recorder, |wrapped, decorator| decorator(wrapped))
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

struct NameFilter {
    inner: Arc<dyn SpanRecorder>,
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    /// Handles of rejected spans; writes through them are swallowed.
    suppressed: Mutex<HashSet<SpanHandle>>,
    /// Synthetic handles for rejected spans, counting down from u64::MAX so
    /// they stay disjoint from the inner recorder's ascending ids.
    next_suppressed: AtomicU64,
}

impl NameFilter {
    fn is_suppressed(&self, handle: SpanHandle) -> bool {
        self.suppressed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&handle)
    }
}

impl SpanRecorder for NameFilter {
    fn start_span(&self, name: &str) -> SpanHandle {
        if (self.predicate)(name) {
            let handle = SpanHandle::new(self.next_suppressed.fetch_sub(1, Ordering::Relaxed));
            self.suppressed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(handle);
            handle
        } else {
            self.inner.start_span(name)
        }
    }

    fn set_attribute(&self, handle: SpanHandle, key: &str, value: AttributeValue) {
        if !self.is_suppressed(handle) {
            self.inner.set_attribute(handle, key, value);
        }
    }

    fn add_event(&self, handle: SpanHandle, name: &str) {
        if !self.is_suppressed(handle) {
            self.inner.add_event(handle, name);
        }
    }

    fn end_span(&self, handle: SpanHandle) {
        let removed = self
            .suppressed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if !removed {
            self.inner.end_span(handle);
        }
    }
}

enum Rewrite {
    Remove,
    Replace(Arc<dyn Fn(AttributeValue) -> AttributeValue + Send + Sync>),
}

struct AttributeRewrite {
    inner: Arc<dyn SpanRecorder>,
    key: String,
    rewrite: Rewrite,
}

impl SpanRecorder for AttributeRewrite {
    fn start_span(&self, name: &str) -> SpanHandle {
        self.inner.start_span(name)
    }

    fn set_attribute(&self, handle: SpanHandle, key: &str, value: AttributeValue) {
        if key == self.key {
            match &self.rewrite {
                Rewrite::Remove => {}
                Rewrite::Replace(replacement) => {
                    self.inner.set_attribute(handle, key, replacement(value));
                }
            }
        } else {
            self.inner.set_attribute(handle, key, value);
        }
    }

    fn add_event(&self, handle: SpanHandle, name: &str) {
        self.inner.add_event(handle, name);
    }

    fn end_span(&self, handle: SpanHandle) {
        self.inner.end_span(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemoryRecorder;

    #[test]
    fn empty_builder_passes_spans_through() {
        let recorder = Arc::new(InMemoryRecorder::new());
        let builder = SpanFilterBuilder::new();
        assert!(builder.is_empty());

        let decorated = builder.decorate(recorder.clone());
        let handle = decorated.start_span("Resumed");
        decorated.end_span(handle);

        assert_eq!(recorder.finished_spans().len(), 1);
    }

    #[test]
    fn rejected_spans_never_reach_the_recorder() {
        let recorder = Arc::new(InMemoryRecorder::new());
        let mut builder = SpanFilterBuilder::new();
        builder.reject_spans_by_name(|name| name == "Paused");

        let decorated = builder.decorate(recorder.clone());

        let rejected = decorated.start_span("Paused");
        decorated.set_attribute(rejected, "screen", "MainScreen".into());
        decorated.add_event(rejected, "paused");
        decorated.end_span(rejected);

        let kept = decorated.start_span("Resumed");
        decorated.end_span(kept);

        let spans = recorder.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "Resumed");
        assert_eq!(recorder.open_span_count(), 0);
    }

    #[test]
    fn remove_attribute_strips_only_that_key() {
        let recorder = Arc::new(InMemoryRecorder::new());
        let mut builder = SpanFilterBuilder::new();
        builder.remove_span_attribute("user.email");

        let decorated = builder.decorate(recorder.clone());
        let handle = decorated.start_span("Resumed");
        decorated.set_attribute(handle, "user.email", "a@b.example".into());
        decorated.set_attribute(handle, "screen", "MainScreen".into());
        decorated.end_span(handle);

        let spans = recorder.finished_spans();
        assert!(spans[0].attributes.get("user.email").is_none());
        assert_eq!(spans[0].attribute_str("screen"), Some("MainScreen"));
    }

    #[test]
    fn replace_attribute_rewrites_the_value() {
        let recorder = Arc::new(InMemoryRecorder::new());
        let mut builder = SpanFilterBuilder::new();
        builder.replace_span_attribute("screen", |_| "redacted".into());

        let decorated = builder.decorate(recorder.clone());
        let handle = decorated.start_span("Resumed");
        decorated.set_attribute(handle, "screen", "AccountScreen".into());
        decorated.end_span(handle);

        assert_eq!(
            recorder.finished_spans()[0].attribute_str("screen"),
            Some("redacted")
        );
    }

    #[test]
    fn decorators_compose_in_registration_order() {
        let recorder = Arc::new(InMemoryRecorder::new());
        let mut builder = SpanFilterBuilder::new();
        builder
            .reject_spans_by_name(|name| name == "Destroyed")
            .remove_span_attribute("last_screen");

        let decorated = builder.decorate(recorder.clone());

        let dropped = decorated.start_span("Destroyed");
        decorated.end_span(dropped);

        let kept = decorated.start_span("Resumed");
        decorated.set_attribute(kept, "last_screen", "MainScreen".into());
        decorated.end_span(kept);

        let spans = recorder.finished_spans();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].attributes.get("last_screen").is_none());
    }
}
