//! Generic channel pattern: significance filter, debounce, escalation.
//!
//! Channels without a bespoke state machine (mouse, window, peripheral)
//! plug in here: raw observations go through (a) a significance filter that
//! drops unchanged or sub-threshold observations, (b) a debounce window that
//! requires the condition to repeat before committing, and (c) the rolling
//! exponential escalation shared with the clipboard channel.

use crate::event::{RiskChannel, RiskEvent};
use crate::log::ChannelLog;
use crate::timing::RepeatEscalator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericChannelConfig {
    /// Observations with magnitude below this are ignored outright.
    pub significance_threshold: f64,
    /// Consecutive identical observations required before the event commits.
    pub debounce_count: u32,
    /// Rolling escalation window in seconds.
    pub escalation_window_secs: f64,
}

impl Default for GenericChannelConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.0,
            debounce_count: 1,
            escalation_window_secs: 60.0,
        }
    }
}

/// A pluggable channel conforming to the shared observation pattern.
pub struct GenericChannel {
    config: GenericChannelConfig,
    log: Arc<ChannelLog>,
    last_key: Option<String>,
    streak: u32,
    escalator: RepeatEscalator,
}

impl GenericChannel {
    pub fn new(channel: RiskChannel, config: GenericChannelConfig) -> Self {
        let escalator = RepeatEscalator::new(config.escalation_window_secs);
        Self {
            config,
            log: Arc::new(ChannelLog::new(channel)),
            last_key: None,
            streak: 0,
            escalator,
        }
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        Arc::clone(&self.log)
    }

    pub fn risk_score(&self) -> f64 {
        self.log.risk_score()
    }

    /// Feed one observation. `key` identifies the condition (a repeated key
    /// is "unchanged" and never re-scores); `magnitude` is the base risk.
    /// Returns the committed risk, if any.
    pub fn observe(&mut self, label: &str, key: &str, magnitude: f64, now: f64) -> Option<f64> {
        if magnitude < self.config.significance_threshold {
            return None;
        }

        if self.last_key.as_deref() == Some(key) {
            self.streak += 1;
        } else {
            self.last_key = Some(key.to_string());
            self.streak = 1;
        }

        // Commit exactly once, when the condition first survives debounce.
        if self.streak != self.config.debounce_count {
            return None;
        }

        let risk = magnitude * self.escalator.multiplier(now);
        debug!(
            channel = self.log.channel().as_str(),
            key, risk, "generic channel event committed"
        );
        self.log.append(
            RiskEvent::at(now, self.log.channel(), label, risk).with("observation", key),
        );
        Some(risk)
    }

    /// The condition under observation ceased; reset change tracking so the
    /// next occurrence scores again.
    pub fn reset(&mut self) {
        self.last_key = None;
        self.streak = 0;
    }
}
