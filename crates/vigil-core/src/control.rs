//! Cooperative shutdown for channel workers.
//!
//! Every channel loop is governed by a `ShutdownToken` checked each
//! iteration. Polling loops use `wait_timeout` instead of a bare sleep so a
//! shutdown request wakes them promptly rather than waiting out the interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

struct TokenInner {
    stopped: AtomicBool,
    lock: Mutex<()>,
    cvar: Condvar,
}

/// Clonable cancellation handle shared between a channel and its worker.
#[derive(Clone)]
pub struct ShutdownToken {
    inner: Arc<TokenInner>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                stopped: AtomicBool::new(false),
                lock: Mutex::new(()),
                cvar: Condvar::new(),
            }),
        }
    }

    /// Request shutdown and wake any worker blocked in `wait_timeout`.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.cvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Bounded wait: returns `true` if shutdown was requested, `false` if the
    /// timeout elapsed. Safe against spurious wakeups.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if self.inner.stopped.load(Ordering::SeqCst) {
                return true;
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return self.inner.stopped.load(Ordering::SeqCst);
            }
            let (g, _timed_out) = self
                .inner
                .cvar
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            guard = g;
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_times_out_when_not_shutdown() {
        let token = ShutdownToken::new();
        assert!(!token.wait_timeout(Duration::from_millis(10)));
        assert!(!token.is_shutdown());
    }

    #[test]
    fn shutdown_wakes_waiter() {
        let token = ShutdownToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(20));
        token.shutdown();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn shutdown_is_sticky() {
        let token = ShutdownToken::new();
        token.shutdown();
        token.shutdown();
        assert!(token.is_shutdown());
        assert!(token.wait_timeout(Duration::from_millis(1)));
    }
}
