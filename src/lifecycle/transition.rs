//! Raw lifecycle transitions delivered by the host runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One lifecycle transition for a single screen instance.
///
/// The host delivers these in an order consistent with that screen's real
/// lifecycle, but may skip values (a screen already created in a previous
/// episode restarts straight at `Started`). Transitions are never ordered
/// across different screen instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleTransition {
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    Destroyed,
}

impl LifecycleTransition {
    /// The event name recorded on spans for this transition.
    pub fn event_name(&self) -> &'static str {
        match self {
            LifecycleTransition::Created => "created",
            LifecycleTransition::Started => "started",
            LifecycleTransition::Resumed => "resumed",
            LifecycleTransition::Paused => "paused",
            LifecycleTransition::Stopped => "stopped",
            LifecycleTransition::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for LifecycleTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// A screen instance as seen by the monitor.
///
/// `id` distinguishes instances; `name` is the stable screen identity used as
/// a span attribute and is shared by all instances of the same screen type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScreenInstance {
    id: u64,
    name: String,
}

impl ScreenInstance {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
