//! Clipboard polling worker.
//!
//! Polls the system clipboard at a fixed interval and feeds readings into the
//! paste scorer. Read failures are transient: logged at debug and treated as
//! "no change" for that cycle.

use crate::paste::PasteScorer;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use vigil_core::{now_ts, ChannelLog, ClipboardSettings, ShutdownToken, VigilError, VigilResult};

/// Textual clipboard contents supplier (system clipboard or test fixture).
pub trait ClipboardSource: Send {
    fn read_text(&mut self) -> VigilResult<String>;
}

/// System clipboard via arboard.
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> VigilResult<Self> {
        let clipboard = arboard::Clipboard::new()
            .map_err(|e| VigilError::Unavailable(format!("clipboard: {e}")))?;
        Ok(Self { clipboard })
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> VigilResult<String> {
        self.clipboard
            .get_text()
            .map_err(|e| VigilError::Clipboard(e.to_string()))
    }
}

/// Handle for the running clipboard channel.
pub struct ClipboardWatcher {
    log: Arc<ChannelLog>,
    token: ShutdownToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl ClipboardWatcher {
    /// Start polling the system clipboard. Fails with `Unavailable` when no
    /// clipboard is reachable, leaving the other channels unaffected.
    pub fn start(settings: ClipboardSettings) -> VigilResult<Self> {
        let source = SystemClipboard::new()?;
        Self::start_with_source(settings, source)
    }

    pub fn start_with_source<S>(settings: ClipboardSettings, mut source: S) -> VigilResult<Self>
    where
        S: ClipboardSource + 'static,
    {
        let mut scorer = PasteScorer::new(settings.clone());
        let log = scorer.log();
        let token = ShutdownToken::new();
        let worker_token = token.clone();
        let poll = Duration::from_millis(settings.poll_interval_ms.max(1));

        let worker = thread::spawn(move || {
            info!("clipboard polling started");
            loop {
                match source.read_text() {
                    Ok(text) => {
                        scorer.observe(&text, now_ts());
                    }
                    Err(e) => debug!("could not read clipboard: {e}"),
                }
                // Bounded wait doubles as the cancellation point.
                if worker_token.wait_timeout(poll) {
                    break;
                }
            }
        });

        Ok(Self {
            log,
            token,
            worker: Some(worker),
        })
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        Arc::clone(&self.log)
    }

    pub fn risk_score(&self) -> f64 {
        self.log.risk_score()
    }

    /// Stop polling. Idempotent: returns `false` when already stopped.
    pub fn stop(&mut self) -> bool {
        if self.worker.is_none() {
            return false;
        }
        self.token.shutdown();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        info!("clipboard polling stopped");
        true
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
