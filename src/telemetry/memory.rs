//! In-memory span recorder.
//!
//! Buffers spans in process memory instead of shipping them anywhere. This is
//! the recorder used by the test suites, and doubles as a debug capture: the
//! whole buffer can be dumped as NDJSON for offline inspection.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::debug;

use super::recorder::{SpanHandle, SpanRecorder};
use super::span::{AttributeValue, SpanData, SpanEvent};

#[derive(Default)]
struct Buffer {
    /// All spans in start order, open and finished alike.
    spans: Vec<SpanData>,
    /// Handle -> index into `spans`, entries removed when a span ends.
    open: HashMap<SpanHandle, usize>,
    next_handle: u64,
}

/// A [`SpanRecorder`] that keeps every span in memory.
#[derive(Default)]
pub struct InMemoryRecorder {
    buffer: Mutex<Buffer>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished spans, in the order they were started.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        let buffer = self.lock();
        buffer
            .spans
            .iter()
            .filter(|s| s.is_ended())
            .cloned()
            .collect()
    }

    /// Number of spans still open.
    pub fn open_span_count(&self) -> usize {
        self.lock().open.len()
    }

    /// Drop everything, including open spans. Handles minted before the clear
    /// become dead; writes through them are ignored.
    pub fn clear(&self) {
        let mut buffer = self.lock();
        buffer.spans.clear();
        buffer.open.clear();
    }

    /// Dump all finished spans to `path` as NDJSON, one span per line.
    pub fn write_ndjson(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for span in self.finished_spans() {
            let line = serde_json::to_string(&span)
                .with_context(|| format!("failed to serialize span {}", span.span_id))?;
            out.push_str(&line);
            out.push('\n');
        }
        fs::write(path, out)
            .with_context(|| format!("failed to write span dump to {}", path.display()))?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buffer> {
        // A poisoned buffer still holds valid span data; telemetry must never
        // take the host down over a panicked sibling thread.
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpanRecorder for InMemoryRecorder {
    fn start_span(&self, name: &str) -> SpanHandle {
        let mut buffer = self.lock();
        buffer.next_handle += 1;
        let handle = SpanHandle::new(buffer.next_handle);
        buffer.spans.push(SpanData::begin(name));
        let index = buffer.spans.len() - 1;
        buffer.open.insert(handle, index);
        handle
    }

    fn set_attribute(&self, handle: SpanHandle, key: &str, value: AttributeValue) {
        let mut buffer = self.lock();
        match buffer.open.get(&handle).copied() {
            Some(index) => buffer.spans[index].attributes.set(key, value),
            None => debug!(%handle, key, "attribute write on closed or unknown span ignored"),
        }
    }

    fn add_event(&self, handle: SpanHandle, name: &str) {
        let mut buffer = self.lock();
        match buffer.open.get(&handle).copied() {
            Some(index) => buffer.spans[index].events.push(SpanEvent::now(name)),
            None => debug!(%handle, name, "event on closed or unknown span ignored"),
        }
    }

    fn end_span(&self, handle: SpanHandle) {
        let mut buffer = self.lock();
        match buffer.open.remove(&handle) {
            Some(index) => buffer.spans[index].end(),
            None => debug!(%handle, "end of closed or unknown span ignored"),
        }
    }
}
