//! Voice channel worker: calibration, monitoring loop, clean shutdown.
//!
//! The cpal stream stays on the creating thread (it is not `Send` on every
//! platform); the worker thread owns the state machine and consumes chunks
//! over a std mpsc channel with a bounded receive timeout so shutdown is
//! prompt.

use crate::capture::AudioCapture;
use crate::machine::{calibrate_threshold, VoiceActivityMachine};
use crate::sink::{RecordingSink, SegmentRecorder, WavSink};
use cpal::Stream;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use vigil_core::{AudioSettings, ChannelLog, RiskChannel, ShutdownToken, VigilResult};

const RECV_TICK: Duration = Duration::from_millis(100);

/// Handle for a running audio channel.
pub struct VoiceChannel {
    log: Arc<ChannelLog>,
    token: ShutdownToken,
    worker: Option<thread::JoinHandle<()>>,
    // Dropping the stream stops capture and disconnects the worker.
    _stream: Option<Stream>,
}

impl VoiceChannel {
    /// Open the device, calibrate against ambient noise, and start the
    /// monitor loop, saving segments as WAV files.
    pub fn start(settings: AudioSettings) -> VigilResult<Self> {
        Self::start_with_sink(settings, Box::new(WavSink))
    }

    pub fn start_with_sink(
        settings: AudioSettings,
        sink: Box<dyn RecordingSink>,
    ) -> VigilResult<Self> {
        let capture = AudioCapture::new(&settings)?;
        let (chunk_tx, chunk_rx) = std::sync::mpsc::channel::<Vec<f32>>();
        let stream = capture.start(chunk_tx)?;

        let log = Arc::new(ChannelLog::new(RiskChannel::Voice));
        let recorder = SegmentRecorder::new(settings.clone(), Arc::clone(&log), sink);
        let token = ShutdownToken::new();
        let worker_token = token.clone();

        let worker = thread::spawn(move || {
            run_monitor_loop(settings, chunk_rx, recorder, &worker_token);
        });

        Ok(Self {
            log,
            token,
            worker: Some(worker),
            _stream: Some(stream),
        })
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        Arc::clone(&self.log)
    }

    pub fn risk_score(&self) -> f64 {
        self.log.risk_score()
    }

    /// Stop monitoring and release the capture device. Idempotent: returns
    /// `false` when already stopped.
    pub fn stop(&mut self) -> bool {
        if self.worker.is_none() {
            return false;
        }
        self.token.shutdown();
        self._stream = None;
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        info!("voice channel stopped");
        true
    }
}

impl Drop for VoiceChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

fn chunks_per_sec(settings: &AudioSettings) -> f64 {
    settings.sample_rate as f64 / settings.chunk_size.max(1) as f64
}

fn run_monitor_loop(
    settings: AudioSettings,
    chunk_rx: Receiver<Vec<f32>>,
    recorder: SegmentRecorder,
    token: &ShutdownToken,
) {
    // Calibration: a few seconds of ambient audio set the trigger threshold.
    let calib_chunks = (chunks_per_sec(&settings) * settings.calibration_secs).ceil() as usize;
    let mut ambient: Vec<Vec<f32>> = Vec::with_capacity(calib_chunks);
    info!(chunks = calib_chunks, "calibrating voice threshold");
    while ambient.len() < calib_chunks && !token.is_shutdown() {
        match chunk_rx.recv_timeout(RECV_TICK) {
            Ok(chunk) => ambient.push(chunk),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
    let threshold = calibrate_threshold(&ambient, settings.sensitivity_factor);
    info!(threshold, "calibration complete");

    let ring_capacity = (chunks_per_sec(&settings) * settings.pretrigger_secs).ceil() as usize;
    let silence_limit = (chunks_per_sec(&settings) * settings.silence_secs) as usize;
    let mut machine = VoiceActivityMachine::new(threshold, ring_capacity, silence_limit);

    info!("continuous voice monitoring started");
    while !token.is_shutdown() {
        match chunk_rx.recv_timeout(RECV_TICK) {
            Ok(chunk) => {
                if let Some(segment) = machine.push_chunk(chunk) {
                    recorder.commit(segment);
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("audio chunk stream disconnected");
                machine.reset_transient();
                break;
            }
        }
    }
}
