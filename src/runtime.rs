//! Install glue: wires configuration, recorder, timer and monitor together.
//!
//! This is the one-call entry point a host embeds at process init. It applies
//! the configured span-filter chain to the recorder, opens the cold-start
//! window, and hands back the lifecycle callback surface the host runtime
//! drives.

use std::sync::{Arc, Once};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::lifecycle::{
    AppStateListener, AppStateNotifier, LifecycleMonitor, StartupTimer, VisibleScreenTracker,
};
use crate::telemetry::{Attributes, SpanRecorder};

static DEBUG_SUBSCRIBER: Once = Once::new();

/// A fully wired instrumentation instance.
///
/// Owns the shared collaborators for the process lifetime; there is no
/// teardown. The host registers its lifecycle callbacks against
/// [`monitor`](Self::monitor) and calls
/// [`startup_complete`](Self::startup_complete) when first paint is done.
pub struct ScreenTrace {
    config: Config,
    startup: Arc<StartupTimer>,
    monitor: Arc<LifecycleMonitor>,
    app_state: Arc<AppStateNotifier>,
}

impl ScreenTrace {
    /// Wire everything up and open the cold-start window.
    ///
    /// The `recorder` is the export capability; it gets wrapped in the
    /// config's span-filter chain before anything writes through it.
    pub fn install(config: Config, recorder: Arc<dyn SpanRecorder>) -> Self {
        if config.is_debug_enabled() {
            init_debug_logging();
        }

        let recorder = config.decorate_recorder(recorder);
        let startup = Arc::new(StartupTimer::new());
        startup.start(recorder.clone(), &config.global_attributes().current());

        let visible = Arc::new(VisibleScreenTracker::new());
        let app_state = Arc::new(AppStateNotifier::new());
        let monitor = Arc::new(LifecycleMonitor::new(
            recorder,
            startup.clone(),
            visible,
            app_state.clone(),
            config.global_attributes().clone(),
        ));

        info!(
            application = config.application_name(),
            endpoint = config.endpoint(),
            "screen lifecycle instrumentation installed"
        );

        Self {
            config,
            startup,
            monitor,
            app_state,
        }
    }

    /// The callback surface the host runtime feeds transitions into.
    pub fn monitor(&self) -> &Arc<LifecycleMonitor> {
        &self.monitor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the cold-start window. Called once by whatever component decides
    /// "first paint complete"; repeat calls are warned no-ops.
    pub fn startup_complete(&self) {
        self.startup.end();
    }

    /// Whether the process is still inside its cold-start window.
    pub fn is_startup_pending(&self) -> bool {
        self.startup.is_pending()
    }

    /// Register for foreground/background flips. Listeners added mid-stream
    /// see only future flips.
    pub fn add_app_state_listener(&self, listener: Arc<dyn AppStateListener>) {
        self.app_state.add_listener(listener);
    }

    /// Update the global attributes merged into every future span.
    pub fn update_global_attributes(&self, mutator: impl FnOnce(&mut Attributes)) {
        self.config.update_global_attributes(mutator);
    }
}

fn init_debug_logging() {
    // never clobber a subscriber the host already installed
    DEBUG_SUBSCRIBER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .ok();
    });
}
