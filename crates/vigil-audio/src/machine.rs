//! Voice activity state machine: Idle ⇄ Recording.
//!
//! Chunk energy above the calibrated threshold opens a segment seeded with
//! the pre-trigger ring buffer, so the onset of the sound is not lost. A
//! consecutive run of below-threshold chunks totalling the silence cutoff
//! closes it. At most one segment is ever open.

use std::collections::VecDeque;
use tracing::{debug, info};

/// Mean absolute amplitude of a chunk, for samples already in [-1, 1].
pub fn chunk_energy(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs() as f64).sum::<f64>() / samples.len() as f64
}

/// Ambient threshold: mean energy over the calibration chunks × sensitivity.
pub fn calibrate_threshold(ambient_chunks: &[Vec<f32>], sensitivity_factor: f64) -> f64 {
    let total_samples: usize = ambient_chunks.iter().map(|c| c.len()).sum();
    if total_samples == 0 {
        return 0.0;
    }
    let total: f64 = ambient_chunks
        .iter()
        .flat_map(|c| c.iter())
        .map(|s| s.abs() as f64)
        .sum();
    (total / total_samples as f64) * sensitivity_factor
}

/// A closed segment: ordered raw chunks from ring-buffer seed to final chunk.
#[derive(Debug, Clone)]
pub struct RecordedSegment {
    pub chunks: Vec<Vec<f32>>,
}

impl RecordedSegment {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn samples(&self) -> Vec<f32> {
        self.chunks.iter().flat_map(|c| c.iter().copied()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MachineState {
    Idle,
    Recording,
}

pub struct VoiceActivityMachine {
    threshold: f64,
    state: MachineState,
    /// Bounded pre-trigger buffer, always holding the most recent chunks.
    ring: VecDeque<Vec<f32>>,
    ring_capacity: usize,
    /// Open segment buffer; non-empty only while `Recording`.
    frames: Vec<Vec<f32>>,
    silence_counter: usize,
    /// Consecutive silent chunks that close a segment.
    silence_limit: usize,
}

impl VoiceActivityMachine {
    /// `ring_capacity` and `silence_limit` are in chunks; callers derive them
    /// from seconds via `rate / chunk_size × secs`.
    pub fn new(threshold: f64, ring_capacity: usize, silence_limit: usize) -> Self {
        Self {
            threshold,
            state: MachineState::Idle,
            ring: VecDeque::with_capacity(ring_capacity.max(1)),
            ring_capacity: ring_capacity.max(1),
            frames: Vec::new(),
            silence_counter: 0,
            silence_limit,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_recording(&self) -> bool {
        self.state == MachineState::Recording
    }

    /// Feed one chunk; returns a closed segment when silence ends one.
    pub fn push_chunk(&mut self, chunk: Vec<f32>) -> Option<RecordedSegment> {
        let energy = chunk_energy(&chunk);

        // The ring always retains the most recent chunks, regardless of state.
        if self.ring.len() == self.ring_capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(chunk.clone());

        match self.state {
            MachineState::Idle => {
                if energy > self.threshold {
                    info!(
                        energy,
                        threshold = self.threshold,
                        "voice detected; recording started"
                    );
                    self.state = MachineState::Recording;
                    self.silence_counter = 0;
                    // Seed with the ring contents; the triggering chunk is
                    // already the ring's newest entry.
                    self.frames = self.ring.iter().cloned().collect();
                }
                None
            }
            MachineState::Recording => {
                self.frames.push(chunk);
                if energy < self.threshold {
                    self.silence_counter += 1;
                    if self.silence_counter > self.silence_limit {
                        debug!(chunks = self.frames.len(), "silence cutoff; segment closed");
                        self.state = MachineState::Idle;
                        self.silence_counter = 0;
                        let chunks = std::mem::take(&mut self.frames);
                        return Some(RecordedSegment { chunks });
                    }
                } else {
                    self.silence_counter = 0;
                }
                None
            }
        }
    }

    /// Drop all transient state after a stream error so a corrupt partial
    /// segment is never flushed.
    pub fn reset_transient(&mut self) {
        self.ring.clear();
        self.frames.clear();
        self.silence_counter = 0;
        self.state = MachineState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud(n: usize) -> Vec<f32> {
        vec![0.5; n]
    }

    fn quiet(n: usize) -> Vec<f32> {
        vec![0.001; n]
    }

    #[test]
    fn energy_is_mean_absolute_amplitude() {
        assert_eq!(chunk_energy(&[0.5, -0.5, 0.5, -0.5]), 0.5);
        assert_eq!(chunk_energy(&[]), 0.0);
    }

    #[test]
    fn calibration_scales_ambient_mean() {
        let ambient = vec![vec![0.1f32; 4], vec![0.1f32; 4]];
        let threshold = calibrate_threshold(&ambient, 3.5);
        assert!((threshold - 0.1 * 3.5).abs() < 1e-6);
    }

    #[test]
    fn segment_includes_pretrigger_ring() {
        // Ring of 4 chunks, silence cutoff after 2 silent chunks.
        let mut m = VoiceActivityMachine::new(0.1, 4, 2);

        // Fill the ring with ambient audio.
        for _ in 0..4 {
            assert!(m.push_chunk(quiet(8)).is_none());
        }
        // 3 loud chunks trigger and extend the recording.
        for _ in 0..3 {
            assert!(m.push_chunk(loud(8)).is_none());
        }
        assert!(m.is_recording());

        // Silence: counter reaches the limit on the 3rd quiet chunk.
        assert!(m.push_chunk(quiet(8)).is_none());
        assert!(m.push_chunk(quiet(8)).is_none());
        let segment = m.push_chunk(quiet(8)).expect("segment should close");
        assert!(!m.is_recording());

        // Seed: ring held 3 quiet + the trigger chunk at trigger time (ring
        // capacity 4), then 2 more loud chunks, then 3 closing quiet chunks.
        assert_eq!(segment.chunk_count(), 4 + 2 + 3);
    }

    #[test]
    fn loud_chunk_resets_silence_counter() {
        let mut m = VoiceActivityMachine::new(0.1, 2, 2);
        m.push_chunk(loud(8));
        assert!(m.is_recording());

        m.push_chunk(quiet(8));
        m.push_chunk(quiet(8));
        // Speech resumes before the cutoff: counter resets.
        m.push_chunk(loud(8));
        m.push_chunk(quiet(8));
        assert!(m.push_chunk(quiet(8)).is_none());
        let seg = m.push_chunk(quiet(8)).expect("closes after full silence run");
        assert!(seg.chunk_count() > 0);
    }

    #[test]
    fn only_one_segment_open_at_a_time() {
        let mut m = VoiceActivityMachine::new(0.1, 2, 1);
        m.push_chunk(loud(8));
        assert!(m.is_recording());
        // A second trigger while recording does not re-seed.
        let before = m.frames.len();
        m.push_chunk(loud(8));
        assert_eq!(m.frames.len(), before + 1);
    }

    #[test]
    fn reset_clears_partial_segment() {
        let mut m = VoiceActivityMachine::new(0.1, 2, 2);
        m.push_chunk(loud(8));
        assert!(m.is_recording());
        m.reset_transient();
        assert!(!m.is_recording());
        // Silence after the reset never closes a ghost segment.
        assert!(m.push_chunk(quiet(8)).is_none());
        assert!(m.push_chunk(quiet(8)).is_none());
        assert!(m.push_chunk(quiet(8)).is_none());
    }
}
