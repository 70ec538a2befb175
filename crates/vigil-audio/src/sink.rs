//! Recording sink: scoring and persistence of closed voice segments.
//!
//! Score integrity takes priority over artifact integrity: the risk event is
//! appended before persistence is attempted, and a failed write is logged
//! without discarding the event.

use crate::machine::RecordedSegment;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use vigil_core::{AudioSettings, ChannelLog, RiskChannel, RiskEvent, VigilError, VigilResult};

/// Persists one segment's samples at the given path.
pub trait RecordingSink: Send {
    fn persist(&self, path: &Path, samples: &[f32], sample_rate: u32) -> VigilResult<()>;
}

/// 16-bit mono WAV files via hound.
pub struct WavSink;

impl RecordingSink for WavSink {
    fn persist(&self, path: &Path, samples: &[f32], sample_rate: u32) -> VigilResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| VigilError::Persistence(e.to_string()))?;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer
                .write_sample(v)
                .map_err(|e| VigilError::Persistence(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| VigilError::Persistence(e.to_string()))?;
        Ok(())
    }
}

/// Applies the sink contract to closed segments: minimum-length gate,
/// duration-based risk, one event per saved segment.
pub struct SegmentRecorder {
    settings: AudioSettings,
    log: Arc<ChannelLog>,
    sink: Box<dyn RecordingSink>,
}

impl SegmentRecorder {
    pub fn new(settings: AudioSettings, log: Arc<ChannelLog>, sink: Box<dyn RecordingSink>) -> Self {
        Self {
            settings,
            log,
            sink,
        }
    }

    /// Commit one closed segment. Returns the risk scored, or `None` when the
    /// segment was too short to keep.
    pub fn commit(&self, segment: RecordedSegment) -> Option<f64> {
        if segment.chunk_count() < self.settings.min_segment_chunks {
            warn!(
                chunks = segment.chunk_count(),
                min = self.settings.min_segment_chunks,
                "segment too short; discarded"
            );
            return None;
        }

        let duration = segment.chunk_count() as f64 * self.settings.chunk_size as f64
            / self.settings.sample_rate as f64;
        let risk = 10.0 + duration.floor() * 5.0;
        let path = self.artifact_path();

        self.log.append(
            RiskEvent::new(RiskChannel::Voice, "Human Voice Detected", risk)
                .with("duration", (duration * 100.0).round() / 100.0)
                .with("recording_file", path.to_string_lossy().as_ref()),
        );

        match self
            .sink
            .persist(&path, &segment.samples(), self.settings.sample_rate)
        {
            Ok(()) => info!(
                path = %path.display(),
                duration,
                risk,
                "voice segment saved"
            ),
            // The event already carries the risk; losing the artifact must
            // not lose the score.
            Err(e) => error!(path = %path.display(), "failed to save segment: {e}"),
        }
        Some(risk)
    }

    fn artifact_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.settings
            .recordings_dir
            .join(format!("voice_{stamp}.wav"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MemorySink {
        saved: Arc<Mutex<Vec<(PathBuf, usize)>>>,
        fail: bool,
    }

    impl RecordingSink for MemorySink {
        fn persist(&self, path: &Path, samples: &[f32], _rate: u32) -> VigilResult<()> {
            if self.fail {
                return Err(VigilError::Persistence("disk full".into()));
            }
            self.saved
                .lock()
                .unwrap()
                .push((path.to_path_buf(), samples.len()));
            Ok(())
        }
    }

    fn settings() -> AudioSettings {
        AudioSettings {
            sample_rate: 8,
            chunk_size: 4,
            min_segment_chunks: 4,
            ..AudioSettings::default()
        }
    }

    fn segment(chunks: usize) -> RecordedSegment {
        RecordedSegment {
            chunks: vec![vec![0.5f32; 4]; chunks],
        }
    }

    #[test]
    fn short_segment_discarded_without_event_or_artifact() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::new(ChannelLog::new(RiskChannel::Voice));
        let recorder = SegmentRecorder::new(
            settings(),
            Arc::clone(&log),
            Box::new(MemorySink { saved: Arc::clone(&saved), fail: false }),
        );

        assert_eq!(recorder.commit(segment(3)), None);
        assert!(log.is_empty());
        assert!(saved.lock().unwrap().is_empty());
    }

    #[test]
    fn accepted_segment_scores_duration_risk() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::new(ChannelLog::new(RiskChannel::Voice));
        let recorder = SegmentRecorder::new(
            settings(),
            Arc::clone(&log),
            Box::new(MemorySink { saved: Arc::clone(&saved), fail: false }),
        );

        // 6 chunks × 4 samples at 8 Hz = 3.0 s → risk = 10 + 3×5 = 25.
        assert_eq!(recorder.commit(segment(6)), Some(25.0));
        let events = log.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, "Human Voice Detected");
        assert_eq!(events[0].risk_delta, 25.0);
        assert_eq!(events[0].metadata["duration"], 3.0);

        let writes = saved.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, 24); // 6 chunks × 4 samples
    }

    #[test]
    fn persistence_failure_keeps_the_event() {
        let log = Arc::new(ChannelLog::new(RiskChannel::Voice));
        let recorder = SegmentRecorder::new(
            settings(),
            Arc::clone(&log),
            Box::new(MemorySink { saved: Arc::new(Mutex::new(Vec::new())), fail: true }),
        );

        assert_eq!(recorder.commit(segment(6)), Some(25.0));
        assert_eq!(log.risk_score(), 25.0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn wav_sink_writes_all_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice_test.wav");
        let samples = vec![0.25f32; 128];
        WavSink.persist(&path, &samples, 8000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.len(), 128);
    }
}
