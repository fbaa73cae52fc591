//! Process-wide record of the visible screen.
//!
//! Holds the currently visible screen name and whichever screen was visible
//! before it. Written on every resume/pause, read when a standalone resume
//! wants its `last_screen` attribute. Concurrent writers are last-writer-wins;
//! only one screen is meaningfully current in the single-visible-screen model.

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct Visibility {
    current: Option<String>,
    previous: Option<String>,
}

/// Tracks the current and previous visible screen.
#[derive(Debug, Default)]
pub struct VisibleScreenTracker {
    state: Mutex<Visibility>,
}

impl VisibleScreenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A screen became visible: `previous := current; current := name`.
    pub fn record_visible(&self, name: &str) {
        let mut state = self.lock();
        state.previous = state.current.take();
        state.current = Some(name.to_string());
    }

    /// A screen left the foreground: it becomes the previous screen and
    /// nothing is current until the next resume.
    pub fn record_hidden(&self, name: &str) {
        let mut state = self.lock();
        state.previous = Some(name.to_string());
        state.current = None;
    }

    pub fn currently_visible(&self) -> Option<String> {
        self.lock().current.clone()
    }

    pub fn previously_visible(&self) -> Option<String> {
        self.lock().previous.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Visibility> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
