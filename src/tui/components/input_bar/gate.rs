//! The part of an input bar that other threads may touch.
//!
//! The enabled flag and the document keys used for autocompletion sit behind
//! the bar's own mutex. Every transition is decided under that lock and
//! returns the page request it implies, which the UI thread then applies.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::core::{ComponentId, Page, PageRequest};

#[derive(Debug, Default)]
struct GateState {
    enabled: bool,
    doc_keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InputGate {
    id: ComponentId,
    state: Arc<Mutex<GateState>>,
}

impl InputGate {
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(GateState::default())),
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // The state is two plain fields; a panic mid-update cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Enable the bar. Enabling an enabled bar does nothing.
    pub fn enable(&self) -> Option<PageRequest> {
        let mut state = self.lock();
        if state.enabled {
            return None;
        }
        state.enabled = true;
        debug!("{} enabled", self.id);
        Some(PageRequest::Show(Page::docked(self.id.clone())))
    }

    /// Disable the bar. Disabling a disabled bar does nothing.
    pub fn disable(&self) -> Option<PageRequest> {
        let mut state = self.lock();
        if !state.enabled {
            return None;
        }
        state.enabled = false;
        debug!("{} disabled", self.id);
        Some(PageRequest::Hide(self.id.clone()))
    }

    pub fn toggle(&self) -> PageRequest {
        let mut state = self.lock();
        state.enabled = !state.enabled;
        debug!("{} toggled to {}", self.id, state.enabled);
        if state.enabled {
            PageRequest::Show(Page::docked(self.id.clone()))
        } else {
            PageRequest::Hide(self.id.clone())
        }
    }

    /// Replace the document keys offered as completions.
    pub fn load_keys(&self, keys: Vec<String>) {
        self.lock().doc_keys = keys;
    }

    pub fn doc_keys(&self) -> Vec<String> {
        self.lock().doc_keys.clone()
    }
}
