//! OS keyboard hook wiring for shortcut interdiction.
//!
//! `rdev::grab` has no stop API, so the hook thread is started once on the
//! first enable and lives for the process. Toggling flips the shared
//! interdictor between suppress and passthrough; disabling clears held keys
//! so no stale combo can fire later.

use crate::interdict::{Interdictor, KeyDecision};
use rdev::{grab, Event, EventType};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{error, info};
use vigil_core::VigilResult;

pub struct KeyboardGuard {
    interdictor: Arc<Mutex<Interdictor>>,
    hook_started: bool,
}

impl Default for KeyboardGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardGuard {
    pub fn new() -> Self {
        Self {
            interdictor: Arc::new(Mutex::new(Interdictor::new())),
            hook_started: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().is_enabled()
    }

    /// Enable blocking, installing the OS hook on first use. Idempotent:
    /// returns `false` when already enabled.
    pub fn enable(&mut self) -> VigilResult<bool> {
        let changed = self.lock().enable();
        if changed && !self.hook_started {
            self.spawn_hook();
            self.hook_started = true;
        }
        Ok(changed)
    }

    /// Disable blocking. The hook stays installed but passes everything
    /// through. Idempotent: returns `false` when already disabled.
    pub fn disable(&mut self) -> bool {
        self.lock().disable()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Interdictor> {
        self.interdictor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_hook(&self) {
        let interdictor = Arc::clone(&self.interdictor);
        thread::spawn(move || {
            info!("keyboard hook installed");
            let result = grab(move |event: Event| {
                let decision = {
                    let mut guard = interdictor.lock().unwrap_or_else(|e| e.into_inner());
                    match event.event_type {
                        EventType::KeyPress(key) => guard.on_press(key),
                        EventType::KeyRelease(key) => guard.on_release(key),
                        _ => KeyDecision::Allow,
                    }
                };
                match decision {
                    KeyDecision::Allow => Some(event),
                    KeyDecision::Suppress => None,
                }
            });
            if let Err(e) = result {
                error!("keyboard hook failed: {e:?}");
            }
        });
    }
}
