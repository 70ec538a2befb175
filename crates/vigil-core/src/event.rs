//! Risk event data model.
//!
//! A `RiskEvent` is the immutable unit every channel emits: a timestamped,
//! labelled, risk-weighted record. `risk_delta` may be zero for informational
//! events (e.g. a neutral emotion observation kept for audit/graphing).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signal category an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskChannel {
    Vision,
    Voice,
    Clipboard,
    Mouse,
    Window,
    Peripheral,
}

impl RiskChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskChannel::Vision => "vision",
            RiskChannel::Voice => "voice",
            RiskChannel::Clipboard => "clipboard",
            RiskChannel::Mouse => "mouse",
            RiskChannel::Window => "window",
            RiskChannel::Peripheral => "peripheral",
        }
    }
}

impl std::fmt::Display for RiskChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored observation. Immutable once appended to a `ChannelLog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvent {
    /// UNIX seconds at detection time.
    pub timestamp: f64,
    pub channel: RiskChannel,
    /// Human-readable event label, e.g. "Looking Away" or "Human Voice Detected".
    pub label: String,
    /// Non-negative risk contribution (zero for informational events).
    pub risk_delta: f64,
    /// Channel-specific context (duration, intervals, content preview, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl RiskEvent {
    /// Create an event stamped with the current wall clock.
    pub fn new(channel: RiskChannel, label: impl Into<String>, risk_delta: f64) -> Self {
        Self::at(now_ts(), channel, label, risk_delta)
    }

    /// Create an event with an explicit timestamp (seconds).
    pub fn at(timestamp: f64, channel: RiskChannel, label: impl Into<String>, risk_delta: f64) -> Self {
        Self {
            timestamp,
            channel,
            label: label.into(),
            // Negative deltas would let a channel's score decrease; clamp.
            risk_delta: risk_delta.max(0.0),
            metadata: Map::new(),
        }
    }

    /// Attach one metadata entry (builder style).
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Current wall clock as UNIX seconds.
pub fn now_ts() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
