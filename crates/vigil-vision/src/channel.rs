//! Vision channel worker: frame sampling loop around the attention scorer.
//!
//! The loop owns the scorer exclusively; the only thing shared with the
//! outside is the read path of the channel log. Frame reads may block for up
//! to one capture period, so the shutdown token is checked every iteration.

use crate::detector::{FaceDetector, FrameSource};
use crate::scorer::AttentionScorer;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use vigil_core::{now_ts, ChannelLog, ShutdownToken, VigilResult, VisionSettings};

const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Handle for a running visual attention channel.
pub struct VisionChannel {
    log: Arc<ChannelLog>,
    token: ShutdownToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl VisionChannel {
    /// Spawn the frame loop. The source and detector move into the worker;
    /// only every `frame_process_rate`-th frame goes through detection.
    pub fn start<S, D>(settings: VisionSettings, source: S, detector: D) -> VigilResult<Self>
    where
        S: FrameSource + 'static,
        D: FaceDetector<S::Frame> + 'static,
    {
        let mut scorer = AttentionScorer::new(settings.clone());
        let log = scorer.log();
        let token = ShutdownToken::new();
        let worker_token = token.clone();
        let rate = settings.frame_process_rate;

        let worker = thread::spawn(move || {
            run_frame_loop(&mut scorer, source, detector, &settings, &worker_token);
        });

        info!(rate, "vision channel started");
        Ok(Self {
            log,
            token,
            worker: Some(worker),
        })
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        Arc::clone(&self.log)
    }

    pub fn risk_score(&self) -> f64 {
        self.log.risk_score()
    }

    /// Stop the frame loop and release the source. Idempotent: returns
    /// `false` when the channel was already stopped.
    pub fn stop(&mut self) -> bool {
        if self.worker.is_none() {
            return false;
        }
        self.token.shutdown();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        info!("vision channel stopped");
        true
    }
}

impl Drop for VisionChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_frame_loop<S, D>(
    scorer: &mut AttentionScorer,
    mut source: S,
    mut detector: D,
    settings: &VisionSettings,
    token: &ShutdownToken,
) where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
{
    let rate = settings.frame_process_rate.max(1) as u64;
    let mut frame_counter: u64 = 0;

    while !token.is_shutdown() {
        let frame = match source.read_frame() {
            Ok(f) => f,
            Err(e) => {
                // Transient capture hiccup: no observation this cycle. Back
                // off so a dead source cannot spin the loop.
                warn!("frame read failed: {e}");
                if token.wait_timeout(READ_RETRY_DELAY) {
                    break;
                }
                continue;
            }
        };

        frame_counter += 1;
        if frame_counter % rate != 0 {
            continue;
        }

        match detector.detect(&frame) {
            Ok(obs) => scorer.process(&obs, now_ts()),
            Err(e) => warn!("face detection failed: {e}"),
        }
    }
}
