//! screentrace library exports

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod runtime;
pub mod telemetry;

pub use config::{Config, ConfigBuilder, GlobalAttributes, SpanFilterBuilder};
pub use error::{ConfigError, Result};
pub use lifecycle::{
    AppStateListener, LifecycleMonitor, LifecycleTransition, ScreenInstance, StartupTimer,
    VisibleScreenTracker,
};
pub use runtime::ScreenTrace;
pub use telemetry::{AttributeValue, Attributes, InMemoryRecorder, SpanRecorder};
