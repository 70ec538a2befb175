//! Per-channel append-only event log.
//!
//! One writer (the owning channel's worker) appends; any number of readers
//! (aggregator, exporters, live consumers) take prefix-consistent snapshots.
//! Consumers that want push notification subscribe and receive every appended
//! event in order over an mpsc channel, replacing the single-callback design
//! with an event-sink any number of parties can attach to.

use crate::event::{RiskChannel, RiskEvent};
use std::sync::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::debug;

struct LogInner {
    events: Vec<RiskEvent>,
    risk_score: f64,
}

/// Append-only log plus the channel's cumulative risk score.
///
/// The score is updated under the same lock as the event list, so a reader
/// never observes a score that disagrees with the events it can see.
pub struct ChannelLog {
    channel: RiskChannel,
    inner: RwLock<LogInner>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<RiskEvent>>>,
}

impl ChannelLog {
    pub fn new(channel: RiskChannel) -> Self {
        Self {
            channel,
            inner: RwLock::new(LogInner {
                events: Vec::new(),
                risk_score: 0.0,
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn channel(&self) -> RiskChannel {
        self.channel
    }

    /// Append an event and return the new cumulative score.
    pub fn append(&self, event: RiskEvent) -> f64 {
        let score = {
            let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
            inner.risk_score += event.risk_delta;
            inner.events.push(event.clone());
            inner.risk_score
        };
        debug!(
            channel = self.channel.as_str(),
            label = %event.label,
            risk = event.risk_delta,
            total = score,
            "risk event appended"
        );
        // Notify subscribers outside the event lock; drop closed receivers.
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.retain(|tx| tx.send(event.clone()).is_ok());
        score
    }

    /// Current cumulative risk score (sum of all appended deltas).
    pub fn risk_score(&self) -> f64 {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .risk_score
    }

    /// Snapshot of all events appended so far, in append order.
    pub fn snapshot(&self) -> Vec<RiskEvent> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to future appends. Each subscriber sees every event in order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RiskEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RiskChannel;

    #[test]
    fn score_equals_sum_of_deltas() {
        let log = ChannelLog::new(RiskChannel::Vision);
        log.append(RiskEvent::at(1.0, RiskChannel::Vision, "A", 25.0));
        log.append(RiskEvent::at(2.0, RiskChannel::Vision, "B", 0.0));
        log.append(RiskEvent::at(3.0, RiskChannel::Vision, "C", 5.0));

        assert_eq!(log.risk_score(), 30.0);
        let total: f64 = log.snapshot().iter().map(|e| e.risk_delta).sum();
        assert_eq!(total, log.risk_score());
    }

    #[test]
    fn snapshot_preserves_append_order() {
        let log = ChannelLog::new(RiskChannel::Clipboard);
        for i in 0..5 {
            log.append(RiskEvent::at(i as f64, RiskChannel::Clipboard, format!("E{i}"), 1.0));
        }
        let labels: Vec<String> = log.snapshot().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["E0", "E1", "E2", "E3", "E4"]);
    }

    #[test]
    fn subscriber_receives_events_in_order() {
        let log = ChannelLog::new(RiskChannel::Voice);
        let mut rx = log.subscribe();
        log.append(RiskEvent::at(1.0, RiskChannel::Voice, "First", 10.0));
        log.append(RiskEvent::at(2.0, RiskChannel::Voice, "Second", 15.0));

        assert_eq!(rx.try_recv().unwrap().label, "First");
        assert_eq!(rx.try_recv().unwrap().label, "Second");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let log = ChannelLog::new(RiskChannel::Voice);
        let rx = log.subscribe();
        drop(rx);
        // Should not panic or grow the subscriber list.
        log.append(RiskEvent::at(1.0, RiskChannel::Voice, "E", 1.0));
        log.append(RiskEvent::at(2.0, RiskChannel::Voice, "E", 1.0));
        assert_eq!(log.len(), 2);
    }
}
