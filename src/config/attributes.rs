//! Process-wide global attributes merged into every span.
//!
//! The store publishes an immutable [`Attributes`] snapshot behind a lock.
//! Readers clone the current snapshot; writers build a new one and swap it in.
//! Concurrent updates are last-writer-wins, with no protection beyond the
//! atomicity of the swap itself.

use std::sync::{PoisonError, RwLock};

use crate::telemetry::Attributes;

/// Atomically swappable attribute snapshot.
#[derive(Debug, Default)]
pub struct GlobalAttributes {
    snapshot: RwLock<Attributes>,
}

impl GlobalAttributes {
    pub fn new(initial: Attributes) -> Self {
        Self {
            snapshot: RwLock::new(initial),
        }
    }

    /// The current snapshot. Spans seed their attributes from this exactly
    /// once, at creation.
    pub fn current(&self) -> Attributes {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the current snapshot, apply `mutator`, publish the result.
    pub fn update(&self, mutator: impl FnOnce(&mut Attributes)) {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        mutator(&mut next);
        *guard = next;
    }
}
