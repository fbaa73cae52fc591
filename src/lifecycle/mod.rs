//! The lifecycle-to-telemetry core.
//!
//! [`LifecycleMonitor`] receives raw screen transitions from the host runtime
//! and turns them into spans: grouped app-start episodes classified as
//! cold/warm/hot, standalone navigation spans, and process-wide
//! foreground/background notifications. The shared collaborators
//! ([`StartupTimer`], [`VisibleScreenTracker`], [`AppStateNotifier`]) are safe
//! under concurrent access from transitions racing across screen instances.

pub mod app_state;
pub mod monitor;
pub mod startup;
pub mod transition;
pub mod visible;

pub use app_state::{AppStateListener, AppStateNotifier};
pub use monitor::LifecycleMonitor;
pub use startup::StartupTimer;
pub use transition::{LifecycleTransition, ScreenInstance};
pub use visible::VisibleScreenTracker;

/// Span name shared by the process-level cold-start span and the warm/hot
/// screen start spans.
pub const APP_START_SPAN_NAME: &str = "AppStart";

/// Attribute key naming which part of the instrumentation produced a span.
pub const COMPONENT_KEY: &str = "component";
/// `component` value for plain screen navigation spans.
pub const COMPONENT_UI: &str = "ui";
/// `component` value for app-start spans.
pub const COMPONENT_APPSTART: &str = "appstart";

/// Attribute key carrying the screen identity.
pub const SCREEN_KEY: &str = "screen";
/// Attribute key carrying the previously visible screen on a resume.
pub const LAST_SCREEN_KEY: &str = "last_screen";
/// Attribute key carrying the cold/warm/hot classification.
pub const START_TYPE_KEY: &str = "start_type";
