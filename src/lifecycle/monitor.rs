//! The screen lifecycle state machine.
//!
//! One [`LifecycleMonitor`] serves the whole process. Per-screen episode state
//! lives in an explicit table keyed by screen-instance id, looked up on every
//! transition; the table is the only per-screen mutable structure and is
//! guarded by a single lock. Shared cross-instance state (startup timer,
//! visible-screen tracker, foreground flag) is consulted and updated as
//! transitions classify themselves.
//!
//! ## Episode grouping
//!
//! A run of `Created, Started, Resumed` with nothing in between folds into one
//! span; the `Resumed` closes it. Which span depends on how the app got here:
//!
//! - cold: startup timer pending, no screen has claimed the cold start yet.
//!   The process-level "AppStart" span already exists (owned by the timer), so
//!   the screen gets a plain "Created" navigation span.
//! - warm: a fresh screen instance created while the app is already running.
//!   One "AppStart" span, `start_type=warm`.
//! - hot: an existing instance restarting (`Started` with no open episode).
//!   One "AppStart" span, `start_type=hot`.
//! - ordinary resume: `Resumed` with no open episode. One "Resumed" span with
//!   the previously visible screen as `last_screen`.
//!
//! Malformed host sequences never panic and never drop telemetry: an
//! unexpected transition simply opens a best-effort standalone span.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::GlobalAttributes;
use crate::telemetry::{SpanHandle, SpanRecorder};

use super::app_state::AppStateNotifier;
use super::startup::StartupTimer;
use super::transition::{LifecycleTransition, ScreenInstance};
use super::visible::VisibleScreenTracker;
use super::{
    APP_START_SPAN_NAME, COMPONENT_APPSTART, COMPONENT_KEY, COMPONENT_UI, LAST_SCREEN_KEY,
    SCREEN_KEY, START_TYPE_KEY,
};

/// Per-instance episode state.
///
/// Created on the first transition of an episode, cleared when the episode's
/// span closes. Holding the handle here is what lets consecutive transitions
/// fold into the same span.
#[derive(Debug, Default)]
struct EpisodeState {
    open_span: Option<SpanHandle>,
}

/// Receives every `(screen, transition)` pair and decides span boundaries,
/// attributes and events. Synchronous and non-blocking throughout.
pub struct LifecycleMonitor {
    recorder: Arc<dyn SpanRecorder>,
    startup: Arc<StartupTimer>,
    visible: Arc<VisibleScreenTracker>,
    app_state: Arc<AppStateNotifier>,
    globals: Arc<GlobalAttributes>,
    episodes: Mutex<HashMap<u64, EpisodeState>>,
    /// Process-wide foreground state, initially background.
    foreground: AtomicBool,
    /// Set once by the screen that rides the cold-start window.
    cold_start_claimed: AtomicBool,
}

impl LifecycleMonitor {
    pub fn new(
        recorder: Arc<dyn SpanRecorder>,
        startup: Arc<StartupTimer>,
        visible: Arc<VisibleScreenTracker>,
        app_state: Arc<AppStateNotifier>,
        globals: Arc<GlobalAttributes>,
    ) -> Self {
        Self {
            recorder,
            startup,
            visible,
            app_state,
            globals,
            episodes: Mutex::new(HashMap::new()),
            foreground: AtomicBool::new(false),
            cold_start_claimed: AtomicBool::new(false),
        }
    }

    /// Entry point for the host runtime. One call per transition, ordered per
    /// screen instance.
    pub fn on_transition(&self, screen: &ScreenInstance, transition: LifecycleTransition) {
        debug!(screen = screen.name(), %transition, "lifecycle transition");
        match transition {
            LifecycleTransition::Created => self.on_created(screen),
            LifecycleTransition::Started => self.on_started(screen),
            LifecycleTransition::Resumed => self.on_resumed(screen),
            LifecycleTransition::Paused => self.on_hidden(screen, transition),
            LifecycleTransition::Stopped => self.on_hidden(screen, transition),
            LifecycleTransition::Destroyed => self.on_hidden(screen, transition),
        }
    }

    /// Whether the app is currently considered foregrounded.
    pub fn is_app_foregrounded(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    fn on_created(&self, screen: &ScreenInstance) {
        let mut episodes = self.lock_episodes();
        let episode = episodes.entry(screen.id()).or_default();
        if episode.open_span.is_none() {
            let handle = if self.startup.is_pending()
                && !self.cold_start_claimed.swap(true, Ordering::SeqCst)
            {
                // cold start: the process-level AppStart span is already open
                // and owned by the startup timer; this screen only records its
                // own creation
                self.open_span("Created", screen, COMPONENT_UI)
            } else {
                let handle = self.open_span(APP_START_SPAN_NAME, screen, COMPONENT_APPSTART);
                self.recorder.set_attribute(handle, START_TYPE_KEY, "warm".into());
                handle
            };
            episode.open_span = Some(handle);
        }
        self.add_event(episode, LifecycleTransition::Created);
    }

    fn on_started(&self, screen: &ScreenInstance) {
        let mut episodes = self.lock_episodes();
        let episode = episodes.entry(screen.id()).or_default();
        if episode.open_span.is_none() {
            // started without a fresh creation: an existing instance restarting
            let handle = self.open_span(APP_START_SPAN_NAME, screen, COMPONENT_APPSTART);
            self.recorder.set_attribute(handle, START_TYPE_KEY, "hot".into());
            episode.open_span = Some(handle);
        }
        self.add_event(episode, LifecycleTransition::Started);
    }

    fn on_resumed(&self, screen: &ScreenInstance) {
        {
            let mut episodes = self.lock_episodes();
            let episode = episodes.entry(screen.id()).or_default();
            if episode.open_span.is_none() {
                let handle = self.open_span("Resumed", screen, COMPONENT_UI);
                // read before record_visible below overwrites it
                if let Some(previous) = self.visible.previously_visible() {
                    if previous != screen.name() {
                        self.recorder
                            .set_attribute(handle, LAST_SCREEN_KEY, previous.into());
                    }
                }
                episode.open_span = Some(handle);
            }
            self.add_event(episode, LifecycleTransition::Resumed);
            if let Some(handle) = episode.open_span.take() {
                self.recorder.end_span(handle);
            }
        }

        self.visible.record_visible(screen.name());

        // listener dispatch happens outside the episode lock
        if !self.foreground.swap(true, Ordering::SeqCst) {
            self.app_state.notify_foregrounded();
        }
    }

    /// Paused / Stopped / Destroyed all close out the same way: join an open
    /// episode if one exists, otherwise a standalone single-event span.
    fn on_hidden(&self, screen: &ScreenInstance, transition: LifecycleTransition) {
        {
            let mut episodes = self.lock_episodes();
            let episode = episodes.entry(screen.id()).or_default();
            if episode.open_span.is_none() {
                episode.open_span = Some(self.open_span(
                    span_name_for(transition),
                    screen,
                    COMPONENT_UI,
                ));
            }
            self.add_event(episode, transition);
            if let Some(handle) = episode.open_span.take() {
                self.recorder.end_span(handle);
            }
            if transition == LifecycleTransition::Destroyed {
                episodes.remove(&screen.id());
            }
        }

        match transition {
            LifecycleTransition::Paused => self.visible.record_hidden(screen.name()),
            LifecycleTransition::Stopped => {
                // single-visible-screen model: the last visible screen stopping
                // backgrounds the whole app
                if self.foreground.swap(false, Ordering::SeqCst) {
                    self.app_state.notify_backgrounded();
                }
            }
            _ => {}
        }
    }

    /// Open a span seeded with the global attributes, the component, and the
    /// screen identity.
    fn open_span(&self, name: &str, screen: &ScreenInstance, component: &str) -> SpanHandle {
        let handle = self.recorder.start_span(name);
        for (key, value) in self.globals.current().iter() {
            self.recorder.set_attribute(handle, key, value.clone());
        }
        self.recorder
            .set_attribute(handle, COMPONENT_KEY, component.into());
        self.recorder
            .set_attribute(handle, SCREEN_KEY, screen.name().into());
        handle
    }

    fn add_event(&self, episode: &EpisodeState, transition: LifecycleTransition) {
        if let Some(handle) = episode.open_span {
            self.recorder.add_event(handle, transition.event_name());
        }
    }

    fn lock_episodes(&self) -> MutexGuard<'_, HashMap<u64, EpisodeState>> {
        self.episodes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn span_name_for(transition: LifecycleTransition) -> &'static str {
    match transition {
        LifecycleTransition::Paused => "Paused",
        LifecycleTransition::Stopped => "Stopped",
        LifecycleTransition::Destroyed => "Destroyed",
        LifecycleTransition::Created => "Created",
        LifecycleTransition::Started => "Started",
        LifecycleTransition::Resumed => "Resumed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{Attributes, InMemoryRecorder};

    struct Fixture {
        recorder: Arc<InMemoryRecorder>,
        startup: Arc<StartupTimer>,
        monitor: LifecycleMonitor,
    }

    fn fixture() -> Fixture {
        fixture_with_globals(Attributes::new())
    }

    fn fixture_with_globals(globals: Attributes) -> Fixture {
        let recorder = Arc::new(InMemoryRecorder::new());
        let startup = Arc::new(StartupTimer::new());
        let monitor = LifecycleMonitor::new(
            recorder.clone(),
            startup.clone(),
            Arc::new(VisibleScreenTracker::new()),
            Arc::new(AppStateNotifier::new()),
            Arc::new(GlobalAttributes::new(globals)),
        );
        Fixture {
            recorder,
            startup,
            monitor,
        }
    }

    fn deliver(fixture: &Fixture, screen: &ScreenInstance, transitions: &[LifecycleTransition]) {
        for transition in transitions {
            fixture.monitor.on_transition(screen, *transition);
        }
    }

    #[test]
    fn grouped_creation_folds_three_transitions_into_one_span() {
        let fx = fixture();
        let screen = ScreenInstance::new(1, "MainScreen");

        deliver(
            &fx,
            &screen,
            &[
                LifecycleTransition::Created,
                LifecycleTransition::Started,
                LifecycleTransition::Resumed,
            ],
        );

        let spans = fx.recorder.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].event_names(), vec!["created", "started", "resumed"]);
    }

    #[test]
    fn global_attributes_seed_every_span() {
        let fx = fixture_with_globals(Attributes::new().with("tenant", "acme"));
        let screen = ScreenInstance::new(1, "MainScreen");

        deliver(&fx, &screen, &[LifecycleTransition::Resumed]);

        let spans = fx.recorder.finished_spans();
        assert_eq!(spans[0].attribute_str("tenant"), Some("acme"));
    }

    #[test]
    fn cold_start_claim_is_taken_once() {
        let fx = fixture();
        fx.startup
            .start(fx.recorder.clone() as Arc<dyn SpanRecorder>, &Attributes::new());

        let first = ScreenInstance::new(1, "MainScreen");
        let second = ScreenInstance::new(2, "OnboardingScreen");
        deliver(&fx, &first, &[LifecycleTransition::Created]);
        deliver(&fx, &second, &[LifecycleTransition::Created]);
        deliver(&fx, &first, &[LifecycleTransition::Resumed]);
        deliver(&fx, &second, &[LifecycleTransition::Resumed]);

        let spans = fx.recorder.finished_spans();
        let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
        // only the second screen produced an AppStart of its own
        assert_eq!(names, vec!["Created", "AppStart"]);
        assert_eq!(spans[1].attribute_str(START_TYPE_KEY), Some("warm"));
    }

    #[test]
    fn destroyed_clears_the_episode_table_entry() {
        let fx = fixture();
        let screen = ScreenInstance::new(7, "MainScreen");

        deliver(
            &fx,
            &screen,
            &[LifecycleTransition::Paused, LifecycleTransition::Destroyed],
        );
        assert!(fx.monitor.lock_episodes().is_empty());
    }

    #[test]
    fn foreground_state_tracks_resume_and_stop() {
        let fx = fixture();
        let screen = ScreenInstance::new(1, "MainScreen");

        assert!(!fx.monitor.is_app_foregrounded());
        deliver(&fx, &screen, &[LifecycleTransition::Resumed]);
        assert!(fx.monitor.is_app_foregrounded());

        deliver(
            &fx,
            &screen,
            &[LifecycleTransition::Paused, LifecycleTransition::Stopped],
        );
        assert!(!fx.monitor.is_app_foregrounded());
    }
}
