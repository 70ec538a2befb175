//! Temporal scoring primitives shared by the channel state machines.
//!
//! `IntervalAccrual` handles sustained-condition scoring: once a condition
//! has held for a full interval, the consumed intervals are scored and the
//! timer origin advances by exactly the consumed time, so partial progress
//! toward the next interval is never thrown away. `RepeatEscalator` handles
//! rapid-repeat scoring: qualifying events inside a rolling window double the
//! risk each time.

use serde::{Deserialize, Serialize};

/// Full intervals consumed by one `IntervalAccrual::poll` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accrued {
    /// Number of complete intervals scored.
    pub intervals: u64,
    /// Condition duration at the moment of the poll (before the origin
    /// advanced), for event metadata.
    pub duration: f64,
}

/// Interval timer for sustained conditions (e.g. "no face for 10 s").
///
/// Unset until the condition starts; must be cleared the moment the
/// triggering condition ceases so stale duration never accumulates.
#[derive(Debug, Clone)]
pub struct IntervalAccrual {
    interval: f64,
    origin: Option<f64>,
}

impl IntervalAccrual {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            origin: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.origin.is_some()
    }

    /// Start the timer at `now` if it is not already running.
    pub fn start(&mut self, now: f64) {
        if self.origin.is_none() {
            self.origin = Some(now);
        }
    }

    /// Restart the timer at `now` unconditionally.
    pub fn restart(&mut self, now: f64) {
        self.origin = Some(now);
    }

    /// Condition ceased: reset to unset.
    pub fn clear(&mut self) {
        self.origin = None;
    }

    /// Consume any full intervals elapsed since the origin. The origin
    /// advances by `intervals × interval`, not to `now`.
    pub fn poll(&mut self, now: f64) -> Option<Accrued> {
        let origin = self.origin?;
        let duration = now - origin;
        if duration < self.interval {
            return None;
        }
        let intervals = (duration / self.interval).floor() as u64;
        self.origin = Some(origin + intervals as f64 * self.interval);
        Some(Accrued { intervals, duration })
    }
}

/// Rolling-window exponential escalation for repeated events.
///
/// The multiplier is `2^(n-1)` where `n` counts consecutive qualifying
/// events each within `window` seconds of the previous one. Risk only ever
/// escalates; nothing here reduces accumulated score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatEscalator {
    window: f64,
    last_event: Option<f64>,
    count: u32,
}

impl RepeatEscalator {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            last_event: None,
            count: 0,
        }
    }

    /// Record a qualifying event at `now` and return its multiplier.
    pub fn multiplier(&mut self, now: f64) -> f64 {
        match self.last_event {
            Some(last) if now - last < self.window => self.count += 1,
            _ => self.count = 1,
        }
        self.last_event = Some(now);
        // Exponent capped so the multiplier stays finite.
        2f64.powi((self.count.min(64) - 1) as i32)
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrual_advances_origin_by_consumed_intervals() {
        let mut timer = IntervalAccrual::new(10.0);
        timer.start(100.0);

        assert_eq!(timer.poll(105.0), None);

        let first = timer.poll(110.0).unwrap();
        assert_eq!(first.intervals, 1);
        assert_eq!(first.duration, 10.0);

        // Origin is now 110; 15 s later → one interval, 5 s of partial
        // progress retained.
        let second = timer.poll(125.0).unwrap();
        assert_eq!(second.intervals, 1);
        assert_eq!(timer.poll(129.0), None);
        assert_eq!(timer.poll(130.0).unwrap().intervals, 1);
    }

    #[test]
    fn accrual_consumes_multiple_intervals_at_once() {
        let mut timer = IntervalAccrual::new(10.0);
        timer.start(0.0);
        let got = timer.poll(25.0).unwrap();
        assert_eq!(got.intervals, 2);
        assert_eq!(got.duration, 25.0);
        // Remaining 5 s is not yet scored.
        assert_eq!(timer.poll(29.0), None);
    }

    #[test]
    fn cleared_timer_accrues_nothing() {
        let mut timer = IntervalAccrual::new(10.0);
        timer.start(0.0);
        timer.clear();
        assert_eq!(timer.poll(100.0), None);
        assert!(!timer.is_running());
    }

    #[test]
    fn escalator_doubles_within_window() {
        let mut esc = RepeatEscalator::new(60.0);
        assert_eq!(esc.multiplier(0.0), 1.0);
        assert_eq!(esc.multiplier(10.0), 2.0);
        assert_eq!(esc.multiplier(30.0), 4.0);
    }

    #[test]
    fn escalator_resets_after_window() {
        let mut esc = RepeatEscalator::new(60.0);
        assert_eq!(esc.multiplier(0.0), 1.0);
        assert_eq!(esc.multiplier(10.0), 2.0);
        // 70 s after the previous event: back to 1×.
        assert_eq!(esc.multiplier(80.0), 1.0);
        assert_eq!(esc.count(), 1);
    }
}
