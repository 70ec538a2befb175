//! # vigil-audio — voice detection channel
//!
//! Energy-threshold voice detection over a continuous chunk stream:
//! ambient calibration, a pre-trigger ring buffer so sound onsets are kept,
//! silence-run segmentation, and a WAV recording sink that scores each saved
//! segment by duration.

pub mod capture;
pub mod channel;
pub mod machine;
pub mod sink;

pub use capture::AudioCapture;
pub use channel::VoiceChannel;
pub use machine::{calibrate_threshold, chunk_energy, RecordedSegment, VoiceActivityMachine};
pub use sink::{RecordingSink, SegmentRecorder, WavSink};
