//! # vigil-vision — visual attention channel
//!
//! Consumes per-frame face detections (an external collaborator produces
//! them) and converts presence, count, emotion, and eye-landmark signals into
//! risk events: warm-up gating, looking-away interval accrual, extra-face
//! immediate and sustained scoring, and eye-alignment anomaly checks.

pub mod channel;
pub mod detector;
pub mod scorer;

pub use channel::VisionChannel;
pub use detector::{
    BoundingBox, EyeLandmarks, FaceDetector, FaceObservation, FrameObservation, FrameSource,
};
pub use scorer::AttentionScorer;
