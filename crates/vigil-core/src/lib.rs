//! # vigil-core — multi-channel temporal risk-scoring engine
//!
//! Shared data model and plumbing for the session-integrity monitor: risk
//! events, per-channel append-only logs, status aggregation, cooperative
//! shutdown, and the temporal primitives (interval accrual, rolling
//! escalation) every channel state machine builds on.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  observation sources → channel state machines → ChannelLog │
//! │                                      │                    │
//! │                                      ▼ (read-only)        │
//! │                                 Aggregator → kickout      │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod event;
pub mod generic;
pub mod log;
pub mod status;
pub mod timing;

pub use config::{
    AudioSettings, ClipboardSettings, MonitorConfig, SessionSettings, VisionSettings,
};
pub use control::ShutdownToken;
pub use error::{VigilError, VigilResult};
pub use event::{now_ts, RiskChannel, RiskEvent};
pub use generic::{GenericChannel, GenericChannelConfig};
pub use log::ChannelLog;
pub use status::{
    Aggregator, ChannelReport, RiskStatus, StatusSnapshot, KICKOUT_THRESHOLD,
};
pub use timing::{Accrued, IntervalAccrual, RepeatEscalator};
