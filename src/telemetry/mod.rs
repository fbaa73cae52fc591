//! Span records and the recorder capability.
//!
//! The lifecycle core produces spans through the [`SpanRecorder`] trait and
//! never sees what happens to them afterwards. [`InMemoryRecorder`] is the
//! in-tree implementation used by tests and debug capture; production installs
//! plug in whatever exporter-backed recorder they own.

pub mod memory;
pub mod recorder;
pub mod span;

pub use memory::InMemoryRecorder;
pub use recorder::{SpanHandle, SpanRecorder};
pub use span::{AttributeValue, Attributes, SpanData, SpanEvent};
