//! Process-wide cold-start timer.
//!
//! Owns the process-level "AppStart" span. `start()` opens it at process init;
//! `end()` closes it when the first paint completes. Both are one-shot: repeat
//! calls are warned no-ops, so there is at most one pending window per process
//! lifetime. `is_pending()` is read concurrently by every screen's transition
//! handling while a single bootstrap thread drives start/end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::telemetry::{Attributes, SpanHandle, SpanRecorder};

use super::{APP_START_SPAN_NAME, COMPONENT_APPSTART, COMPONENT_KEY, START_TYPE_KEY};

enum TimerState {
    NotStarted,
    Pending {
        recorder: Arc<dyn SpanRecorder>,
        handle: SpanHandle,
    },
    Completed,
}

/// Tracks the cold-start window of the process.
pub struct StartupTimer {
    state: Mutex<TimerState>,
    // mirrors the state for lock-free is_pending reads
    pending: AtomicBool,
}

impl Default for StartupTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupTimer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TimerState::NotStarted),
            pending: AtomicBool::new(false),
        }
    }

    /// Open the process-level cold-start span.
    ///
    /// Callable once. A second call while pending or after completion leaves
    /// the existing window untouched.
    pub fn start(&self, recorder: Arc<dyn SpanRecorder>, globals: &Attributes) {
        let mut state = self.lock();
        match *state {
            TimerState::NotStarted => {
                let handle = recorder.start_span(APP_START_SPAN_NAME);
                for (key, value) in globals.iter() {
                    recorder.set_attribute(handle, key, value.clone());
                }
                recorder.set_attribute(handle, COMPONENT_KEY, COMPONENT_APPSTART.into());
                recorder.set_attribute(handle, START_TYPE_KEY, "cold".into());
                debug!("cold-start window opened");
                *state = TimerState::Pending { recorder, handle };
                self.pending.store(true, Ordering::Release);
            }
            TimerState::Pending { .. } | TimerState::Completed => {
                warn!("startup timer already started; ignoring repeated start");
            }
        }
    }

    /// Close the cold-start span. No-op with a warning unless pending.
    pub fn end(&self) {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, TimerState::Completed) {
            TimerState::Pending { recorder, handle } => {
                recorder.end_span(handle);
                self.pending.store(false, Ordering::Release);
                debug!("cold-start window closed");
            }
            previous => {
                warn!("startup timer end without a pending window; ignoring");
                *state = previous;
            }
        }
    }

    /// Whether the process is still inside its cold-start window.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemoryRecorder;

    fn new_recorder() -> Arc<InMemoryRecorder> {
        Arc::new(InMemoryRecorder::new())
    }

    #[test]
    fn start_opens_cold_app_start_span() {
        let recorder = new_recorder();
        let timer = StartupTimer::new();

        assert!(!timer.is_pending());
        timer.start(recorder.clone(), &Attributes::new());
        assert!(timer.is_pending());
        assert_eq!(recorder.open_span_count(), 1);

        timer.end();
        assert!(!timer.is_pending());

        let spans = recorder.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "AppStart");
        assert_eq!(spans[0].attribute_str("start_type"), Some("cold"));
        assert_eq!(spans[0].attribute_str("component"), Some("appstart"));
    }

    #[test]
    fn repeated_start_leaves_one_pending_window() {
        let recorder = new_recorder();
        let timer = StartupTimer::new();

        timer.start(recorder.clone(), &Attributes::new());
        timer.start(recorder.clone(), &Attributes::new());

        assert!(timer.is_pending());
        assert_eq!(recorder.open_span_count(), 1);

        timer.end();
        assert_eq!(recorder.finished_spans().len(), 1);
    }

    #[test]
    fn end_without_start_is_a_no_op() {
        let timer = StartupTimer::new();
        timer.end();
        assert!(!timer.is_pending());

        // a start after the stray end still opens a window
        let recorder = new_recorder();
        timer.start(recorder.clone(), &Attributes::new());
        assert!(timer.is_pending());
    }

    #[test]
    fn end_is_one_shot() {
        let recorder = new_recorder();
        let timer = StartupTimer::new();
        timer.start(recorder.clone(), &Attributes::new());
        timer.end();
        timer.end();

        assert_eq!(recorder.finished_spans().len(), 1);
        assert!(!timer.is_pending());
    }

    #[test]
    fn start_seeds_global_attributes() {
        let recorder = new_recorder();
        let timer = StartupTimer::new();
        let globals = Attributes::new().with("deployment.environment", "prod");

        timer.start(recorder.clone(), &globals);
        timer.end();

        let spans = recorder.finished_spans();
        assert_eq!(
            spans[0].attribute_str("deployment.environment"),
            Some("prod")
        );
    }

    #[test]
    fn restart_after_completion_is_rejected() {
        let recorder = new_recorder();
        let timer = StartupTimer::new();
        timer.start(recorder.clone(), &Attributes::new());
        timer.end();

        timer.start(recorder.clone(), &Attributes::new());
        assert!(!timer.is_pending());
        assert_eq!(recorder.finished_spans().len(), 1);
        assert_eq!(recorder.open_span_count(), 0);
    }
}
