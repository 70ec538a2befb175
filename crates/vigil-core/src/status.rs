//! Status tiers and the session-level aggregator.
//!
//! The aggregator only reads: it never mutates channel state, and each
//! channel's `{risk, status}` pair comes from a single consistent read of
//! that channel's log.

use crate::event::RiskChannel;
use crate::log::ChannelLog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Aggregate score at or above this ejects the session.
pub const KICKOUT_THRESHOLD: f64 = 1000.0;

/// Derived status tier for a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    Safe,
    Warning1,
    Warning2,
    KickOut,
}

impl RiskStatus {
    /// Fixed thresholds: `< 70` Safe, `70–79` Warning-1, `80–99` Warning-2,
    /// `>= 100` direct-kickout-eligible.
    pub fn from_score(score: f64) -> Self {
        if score >= 100.0 {
            RiskStatus::KickOut
        } else if score >= 80.0 {
            RiskStatus::Warning2
        } else if score >= 70.0 {
            RiskStatus::Warning1
        } else {
            RiskStatus::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Safe => "Safe",
            RiskStatus::Warning1 => "Warning-1",
            RiskStatus::Warning2 => "Warning-2",
            RiskStatus::KickOut => "Direct kick out",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One channel's entry in a status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: RiskChannel,
    pub risk: f64,
    pub status: RiskStatus,
}

/// Side-effect-free snapshot of the whole session's risk state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub channels: Vec<ChannelReport>,
    pub aggregate: f64,
    pub aggregate_status: RiskStatus,
    pub kickout: bool,
}

impl StatusSnapshot {
    pub fn channel(&self, channel: RiskChannel) -> Option<&ChannelReport> {
        self.channels.iter().find(|r| r.channel == channel)
    }
}

/// Reads every registered channel's score and derives the session decision.
///
/// Channels progress at independent rates; each report reflects that
/// channel's state at the moment it was read.
pub struct Aggregator {
    logs: Vec<Arc<ChannelLog>>,
    kickout_threshold: f64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            logs: Vec::new(),
            kickout_threshold: KICKOUT_THRESHOLD,
        }
    }

    pub fn with_kickout_threshold(mut self, threshold: f64) -> Self {
        self.kickout_threshold = threshold;
        self
    }

    /// Register a channel's log for read-only scoring. A channel restarting
    /// with a fresh log replaces its previous registration, so each channel
    /// appears exactly once in every snapshot.
    pub fn register(&mut self, log: Arc<ChannelLog>) {
        match self.logs.iter_mut().find(|l| l.channel() == log.channel()) {
            Some(slot) => *slot = log,
            None => self.logs.push(log),
        }
    }

    /// Compute the current per-channel and aggregate status.
    pub fn compute_status(&self) -> StatusSnapshot {
        let channels: Vec<ChannelReport> = self
            .logs
            .iter()
            .map(|log| {
                let risk = log.risk_score();
                ChannelReport {
                    channel: log.channel(),
                    risk,
                    status: RiskStatus::from_score(risk),
                }
            })
            .collect();

        let aggregate: f64 = channels.iter().map(|r| r.risk).sum();
        StatusSnapshot {
            aggregate,
            aggregate_status: RiskStatus::from_score(aggregate),
            kickout: aggregate >= self.kickout_threshold,
            channels,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RiskEvent;

    #[test]
    fn status_tiers() {
        assert_eq!(RiskStatus::from_score(0.0), RiskStatus::Safe);
        assert_eq!(RiskStatus::from_score(69.9), RiskStatus::Safe);
        assert_eq!(RiskStatus::from_score(70.0), RiskStatus::Warning1);
        assert_eq!(RiskStatus::from_score(79.9), RiskStatus::Warning1);
        assert_eq!(RiskStatus::from_score(80.0), RiskStatus::Warning2);
        assert_eq!(RiskStatus::from_score(99.9), RiskStatus::Warning2);
        assert_eq!(RiskStatus::from_score(100.0), RiskStatus::KickOut);
    }

    #[test]
    fn empty_channels_are_safe() {
        let mut agg = Aggregator::new();
        for ch in [
            RiskChannel::Vision,
            RiskChannel::Voice,
            RiskChannel::Clipboard,
            RiskChannel::Mouse,
            RiskChannel::Window,
            RiskChannel::Peripheral,
        ] {
            agg.register(Arc::new(ChannelLog::new(ch)));
        }
        let snap = agg.compute_status();
        assert_eq!(snap.channels.len(), 6);
        assert_eq!(snap.aggregate, 0.0);
        assert_eq!(snap.aggregate_status, RiskStatus::Safe);
        assert!(!snap.kickout);
    }

    #[test]
    fn kickout_at_aggregate_threshold() {
        let mut agg = Aggregator::new();
        let vision = Arc::new(ChannelLog::new(RiskChannel::Vision));
        let voice = Arc::new(ChannelLog::new(RiskChannel::Voice));
        agg.register(Arc::clone(&vision));
        agg.register(Arc::clone(&voice));

        vision.append(RiskEvent::at(1.0, RiskChannel::Vision, "A", 950.0));
        voice.append(RiskEvent::at(2.0, RiskChannel::Voice, "B", 50.0));

        let snap = agg.compute_status();
        assert_eq!(snap.aggregate, 1000.0);
        assert!(snap.kickout);
        // Kickout is driven by the aggregate regardless of individual tiers.
        assert_eq!(snap.channel(RiskChannel::Voice).unwrap().status, RiskStatus::Safe);
    }

    #[test]
    fn reregistering_a_channel_replaces_its_log() {
        let mut agg = Aggregator::new();
        let first = Arc::new(ChannelLog::new(RiskChannel::Clipboard));
        first.append(RiskEvent::at(1.0, RiskChannel::Clipboard, "A", 20.0));
        agg.register(first);

        let second = Arc::new(ChannelLog::new(RiskChannel::Clipboard));
        second.append(RiskEvent::at(2.0, RiskChannel::Clipboard, "B", 40.0));
        agg.register(Arc::clone(&second));

        let snap = agg.compute_status();
        let entries: Vec<_> = snap
            .channels
            .iter()
            .filter(|r| r.channel == RiskChannel::Clipboard)
            .collect();
        assert_eq!(entries.len(), 1);
        // The lookup sees the replacement log, not the stale one.
        assert_eq!(snap.channel(RiskChannel::Clipboard).unwrap().risk, 40.0);
        assert_eq!(snap.aggregate, 40.0);
    }

    #[test]
    fn snapshot_is_stable() {
        let mut agg = Aggregator::new();
        let log = Arc::new(ChannelLog::new(RiskChannel::Clipboard));
        agg.register(Arc::clone(&log));
        log.append(RiskEvent::at(1.0, RiskChannel::Clipboard, "A", 20.0));

        let snap = agg.compute_status();
        log.append(RiskEvent::at(2.0, RiskChannel::Clipboard, "B", 40.0));
        // Earlier snapshot is unaffected by later appends.
        assert_eq!(snap.aggregate, 20.0);
        assert_eq!(agg.compute_status().aggregate, 60.0);
    }
}
