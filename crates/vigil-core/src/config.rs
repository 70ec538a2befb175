//! Layered monitor configuration.
//!
//! Defaults (the engine's documented thresholds) → optional `vigil.toml` →
//! `VIGIL_*` environment overrides (e.g. `VIGIL_AUDIO__SAMPLE_RATE=16000`).

use crate::error::VigilResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// Process every Nth captured frame.
    pub frame_process_rate: u32,
    /// Seconds of continuous face presence before scoring starts.
    pub warmup_secs: f64,
    /// Interval length for sustained-condition accrual.
    pub interval_secs: f64,
    /// Risk per full interval of continuous face absence.
    pub away_risk_per_interval: f64,
    /// Immediate risk per extra face on a count change.
    pub extra_face_immediate_risk: f64,
    /// Risk per extra face per full sustained interval.
    pub extra_face_interval_risk: f64,
    /// Vertical eye-coordinate difference above this is anomalous.
    pub eye_alignment_threshold: f64,
    pub eye_alignment_risk: f64,
    pub emotion_risk: f64,
    /// Emotion labels that contribute risk (case-insensitive).
    pub negative_emotions: Vec<String>,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            frame_process_rate: 5,
            warmup_secs: 5.0,
            interval_secs: 10.0,
            away_risk_per_interval: 10.0,
            extra_face_immediate_risk: 25.0,
            extra_face_interval_risk: 10.0,
            eye_alignment_threshold: 10.0,
            eye_alignment_risk: 5.0,
            emotion_risk: 1.0,
            negative_emotions: vec!["fear".into(), "sad".into(), "angry".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sample_rate: u32,
    /// Samples per chunk.
    pub chunk_size: usize,
    /// Calibrated threshold = mean ambient energy × this factor.
    pub sensitivity_factor: f64,
    pub calibration_secs: f64,
    /// Pre-trigger ring buffer length in seconds.
    pub pretrigger_secs: f64,
    /// Consecutive silence closing a segment, in seconds.
    pub silence_secs: f64,
    /// Segments with fewer chunks than this are discarded.
    pub min_segment_chunks: usize,
    /// Directory for saved voice recordings.
    pub recordings_dir: PathBuf,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            chunk_size: 1024,
            sensitivity_factor: 3.5,
            calibration_secs: 3.0,
            pretrigger_secs: 1.0,
            silence_secs: 2.0,
            min_segment_chunks: 10,
            recordings_dir: PathBuf::from("recordings"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardSettings {
    pub poll_interval_ms: u64,
    /// Rolling window for paste-risk escalation.
    pub escalation_window_secs: f64,
    /// Characters of clipboard text kept in event metadata.
    pub preview_chars: usize,
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            escalation_window_secs: 60.0,
            preview_chars: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Aggregate score at or above this ejects the session.
    pub kickout_threshold: f64,
    /// Peripheral inventory poll interval.
    pub peripheral_poll_ms: u64,
    /// Risk per newly attached peripheral.
    pub peripheral_risk: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            kickout_threshold: 1000.0,
            peripheral_poll_ms: 2000,
            peripheral_risk: 10.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub vision: VisionSettings,
    pub audio: AudioSettings,
    pub clipboard: ClipboardSettings,
    pub session: SessionSettings,
}

impl MonitorConfig {
    /// Defaults layered with `vigil.toml` (if present) and `VIGIL_*` env vars.
    pub fn load() -> VigilResult<Self> {
        Self::load_from("vigil")
    }

    pub fn load_from(file_stem: &str) -> VigilResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Config::try_from(&MonitorConfig::default())?)
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix("VIGIL").separator("__"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
