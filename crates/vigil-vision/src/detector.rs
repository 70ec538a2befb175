//! External detection seam: frame sources and face detectors.
//!
//! Raw inference is a collaborator, not part of the engine. The channel only
//! sees `FrameObservation`s: face boxes, optional eye-landmark pairs, and an
//! emotion label per face.

use serde::{Deserialize, Serialize};
use vigil_core::VigilResult;

/// Axis-aligned face bounding box in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Left/right eye landmark pair for one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    /// (x, y) of the left eye.
    pub left: (f32, f32),
    /// (x, y) of the right eye.
    pub right: (f32, f32),
}

/// One detected face with optional landmarks and classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    pub eyes: Option<EyeLandmarks>,
    /// Emotion label from the classifier, e.g. "Happy" or "Fear".
    pub emotion: Option<String>,
}

/// Everything the detector saw in one processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub faces: Vec<FaceObservation>,
}

impl FrameObservation {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Blocking frame supplier (webcam, video file, test fixture). A read may
/// block for up to one capture period and must report stream errors without
/// terminating the process.
pub trait FrameSource: Send {
    type Frame;

    fn read_frame(&mut self) -> VigilResult<Self::Frame>;
}

/// Face/landmark/emotion inference over a single frame.
pub trait FaceDetector<F>: Send {
    fn detect(&mut self, frame: &F) -> VigilResult<FrameObservation>;
}
