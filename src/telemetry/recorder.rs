//! The span-recording capability the lifecycle core writes through.
//!
//! The core never touches export machinery. It sees exactly four operations
//! behind an `Arc<dyn SpanRecorder>`: open a span, attach attributes, append
//! events, close the span. Buffering, transport and retry live entirely in the
//! implementation.

use std::fmt;

use super::span::AttributeValue;

/// Opaque handle to a span held open by a recorder.
///
/// Handles are minted by the recorder that owns the span and are only
/// meaningful to it. They are deliberately `Copy` so callers can stash one in
/// per-screen state without ownership gymnastics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanHandle(u64);

impl SpanHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "span#{}", self.0)
    }
}

/// Sink for lifecycle spans.
///
/// Writes are fire-and-forget from the caller's perspective: implementations
/// must swallow their own failures (log, drop) rather than surface them.
/// Operations on an already-ended or unknown handle are ignored.
pub trait SpanRecorder: Send + Sync {
    /// Open a span and return its handle.
    fn start_span(&self, name: &str) -> SpanHandle;

    /// Set an attribute on an open span, last-write-wins per key.
    fn set_attribute(&self, handle: SpanHandle, key: &str, value: AttributeValue);

    /// Append a named event to an open span. Insertion order is preserved.
    fn add_event(&self, handle: SpanHandle, name: &str);

    /// Close the span. Further writes to the handle are ignored.
    fn end_span(&self, handle: SpanHandle);
}
