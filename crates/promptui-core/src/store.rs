//! Current UI state
//!
//! Holds the fixed initial description and the current one. Every operation
//! goes through the same mutex, so updates and resets form a single total
//! order and a reader always gets a whole description.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::model::{UiComponent, UiDescription};

struct StoreState {
    initial: Arc<UiDescription>,
    current: Arc<UiDescription>,
}

pub struct UiStateStore {
    state: Mutex<StoreState>,
}

impl UiStateStore {
    pub fn new(initial: UiDescription) -> Self {
        let initial = Arc::new(initial);
        Self {
            state: Mutex::new(StoreState {
                current: Arc::clone(&initial),
                initial,
            }),
        }
    }

    /// A single blue background.
    pub fn default_initial() -> UiDescription {
        UiDescription::new(vec![UiComponent::background("blue")])
    }

    pub fn initial(&self) -> Arc<UiDescription> {
        Arc::clone(&self.lock().initial)
    }

    pub fn current(&self) -> Arc<UiDescription> {
        Arc::clone(&self.lock().current)
    }

    pub fn update(&self, ui: UiDescription) {
        let mut state = self.lock();
        state.current = Arc::new(ui);
        tracing::debug!("state updated ({} components)", state.current.len());
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.current = Arc::clone(&state.initial);
        tracing::debug!("state reset to initial");
    }

    // Whole descriptions are swapped under the lock, so a poisoned guard
    // still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for UiStateStore {
    fn default() -> Self {
        Self::new(Self::default_initial())
    }
}
