//! Held-key tracking and suppress/allow decisions.
//!
//! The interdictor keeps a set of currently held normalized keys. A press
//! that completes a blocked combination is suppressed while interdiction is
//! enabled. Suppressed shortcuts are logged but carry no risk; the clipboard
//! watcher scores the paste content itself if anything gets through.

use crate::keys::{normalize, HotKey, BLOCKED_COMBOS};
use rdev::Key;
use std::collections::HashSet;
use tracing::{debug, info};

/// What the OS hook should do with a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecision {
    Allow,
    Suppress,
}

pub struct Interdictor {
    enabled: bool,
    held: HashSet<HotKey>,
}

impl Default for Interdictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interdictor {
    pub fn new() -> Self {
        Self {
            enabled: false,
            held: HashSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable suppression. Idempotent: returns `false` when already enabled.
    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        info!("shortcut blocking enabled");
        true
    }

    /// Disable suppression and forget held keys, so a combo held across the
    /// disable/enable boundary cannot fire from stale state.
    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        self.held.clear();
        info!("shortcut blocking disabled");
        true
    }

    pub fn on_press(&mut self, key: Key) -> KeyDecision {
        let Some(hot) = normalize(key) else {
            return KeyDecision::Allow;
        };
        self.held.insert(hot);
        if !self.enabled {
            return KeyDecision::Allow;
        }
        for combo in BLOCKED_COMBOS {
            if combo.keys.iter().all(|k| self.held.contains(k)) {
                debug!(combo = combo.label, "blocked shortcut suppressed");
                return KeyDecision::Suppress;
            }
        }
        KeyDecision::Allow
    }

    pub fn on_release(&mut self, key: Key) -> KeyDecision {
        if let Some(hot) = normalize(key) {
            self.held.remove(&hot);
        }
        KeyDecision::Allow
    }
}
