//! Visual attention state machine.
//!
//! Converts per-frame detections into risk events: looking-away interval
//! accrual, extra-face change and sustained-duration scoring, negative
//! emotions, and eye-alignment anomalies. Scoring is suppressed until a face
//! has been present and a warm-up period has passed, so session start-up is
//! never penalized.

use crate::detector::{FaceObservation, FrameObservation};
use std::sync::Arc;
use tracing::{debug, info};
use vigil_core::{ChannelLog, IntervalAccrual, RiskChannel, RiskEvent, VisionSettings};

pub struct AttentionScorer {
    settings: VisionSettings,
    log: Arc<ChannelLog>,

    scoring_started: bool,
    detection_start_time: Option<f64>,

    no_face_timer: IntervalAccrual,

    prev_extra_faces: usize,
    extra_face_stable_count: u32,
    extra_face_timer: IntervalAccrual,
}

impl AttentionScorer {
    pub fn new(settings: VisionSettings) -> Self {
        let interval = settings.interval_secs;
        Self {
            settings,
            log: Arc::new(ChannelLog::new(RiskChannel::Vision)),
            scoring_started: false,
            detection_start_time: None,
            no_face_timer: IntervalAccrual::new(interval),
            prev_extra_faces: 0,
            extra_face_stable_count: 0,
            extra_face_timer: IntervalAccrual::new(interval),
        }
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        Arc::clone(&self.log)
    }

    pub fn risk_score(&self) -> f64 {
        self.log.risk_score()
    }

    pub fn scoring_started(&self) -> bool {
        self.scoring_started
    }

    /// Score one processed frame observed at `now` (UNIX seconds).
    pub fn process(&mut self, obs: &FrameObservation, now: f64) {
        if obs.faces.is_empty() {
            self.on_no_face(now);
            return;
        }

        if !self.scoring_started {
            self.scoring_started = true;
            self.detection_start_time = Some(now);
            info!(
                "face detected; scoring starts after {}s warm-up",
                self.settings.warmup_secs
            );
            return;
        }
        if let Some(start) = self.detection_start_time {
            if now - start < self.settings.warmup_secs {
                return;
            }
        }

        // A face is visible again: the absence timer must not keep accruing.
        self.no_face_timer.clear();

        self.score_extra_faces(obs.faces.len(), now);

        for face in &obs.faces {
            self.score_emotion(face, now);
            self.score_eye_alignment(face, now);
        }
    }

    fn on_no_face(&mut self, now: f64) {
        if self.scoring_started {
            self.no_face_timer.start(now);
            if let Some(acc) = self.no_face_timer.poll(now) {
                let risk = acc.intervals as f64 * self.settings.away_risk_per_interval;
                info!(
                    duration = acc.duration,
                    intervals = acc.intervals,
                    risk,
                    "no face detected; looking-away risk accrued"
                );
                self.log.append(
                    RiskEvent::at(now, RiskChannel::Vision, "Looking Away", risk)
                        .with("duration", acc.duration)
                        .with("intervals", acc.intervals),
                );
            }
        }
        // Absence interrupts any extra-face streak.
        self.prev_extra_faces = 0;
        self.extra_face_stable_count = 0;
        self.extra_face_timer.clear();
    }

    fn score_extra_faces(&mut self, face_count: usize, now: f64) {
        let extra = face_count.saturating_sub(1);
        if extra == 0 {
            self.prev_extra_faces = 0;
            self.extra_face_stable_count = 0;
            self.extra_face_timer.clear();
            return;
        }

        if extra == self.prev_extra_faces {
            self.extra_face_stable_count += 1;
        } else {
            // New extra-face count: immediate risk, duration timer restarts.
            self.extra_face_stable_count = 1;
            self.extra_face_timer.restart(now);
            let risk = extra as f64 * self.settings.extra_face_immediate_risk;
            info!(faces = face_count, extra, risk, "multiple faces detected");
            self.log.append(
                RiskEvent::at(now, RiskChannel::Vision, "Multiple Faces Detected", risk)
                    .with("faces_detected", face_count),
            );
        }

        if self.extra_face_stable_count >= 2 {
            if let Some(acc) = self.extra_face_timer.poll(now) {
                let risk = extra as f64
                    * self.settings.extra_face_interval_risk
                    * acc.intervals as f64;
                info!(
                    duration = acc.duration,
                    intervals = acc.intervals,
                    risk,
                    "extra faces sustained"
                );
                self.log.append(
                    RiskEvent::at(now, RiskChannel::Vision, "Extra Face Duration", risk)
                        .with("duration", acc.duration)
                        .with("intervals", acc.intervals),
                );
            }
        }
        self.prev_extra_faces = extra;
    }

    fn score_emotion(&mut self, face: &FaceObservation, now: f64) {
        let Some(emotion) = face.emotion.as_deref() else {
            return;
        };
        let negative = self
            .settings
            .negative_emotions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(emotion));
        let risk = if negative { self.settings.emotion_risk } else { 0.0 };
        debug!(emotion, risk, "emotion observed");
        // Zero-risk emotions are still logged for audit and graphing.
        self.log.append(
            RiskEvent::at(
                now,
                RiskChannel::Vision,
                format!("Emotion Detected: {emotion}"),
                risk,
            )
            .with("emotion", emotion),
        );
    }

    fn score_eye_alignment(&mut self, face: &FaceObservation, now: f64) {
        let Some(eyes) = face.eyes else {
            return;
        };

        let vertical_diff = (eyes.left.1 - eyes.right.1).abs() as f64;
        if vertical_diff > self.settings.eye_alignment_threshold {
            info!(vertical_diff, "abnormal vertical eye alignment");
            self.log.append(
                RiskEvent::at(
                    now,
                    RiskChannel::Vision,
                    "Abnormal Eye Vertical Alignment",
                    self.settings.eye_alignment_risk,
                )
                .with("vertical_diff", vertical_diff),
            );
        }

        // Left eye must sit strictly left of the right eye; anything else
        // indicates head tilt or a bad detection.
        if eyes.left.0 >= eyes.right.0 {
            info!(
                left_eye_x = eyes.left.0,
                right_eye_x = eyes.right.0,
                "abnormal horizontal eye alignment"
            );
            self.log.append(
                RiskEvent::at(
                    now,
                    RiskChannel::Vision,
                    "Abnormal Eye Horizontal Alignment",
                    self.settings.eye_alignment_risk,
                )
                .with("left_eye_x", eyes.left.0 as f64)
                .with("right_eye_x", eyes.right.0 as f64),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{BoundingBox, EyeLandmarks};

    fn face() -> FaceObservation {
        FaceObservation {
            bbox: BoundingBox { x1: 0.0, y1: 0.0, x2: 48.0, y2: 48.0 },
            eyes: None,
            emotion: None,
        }
    }

    fn frame(n: usize) -> FrameObservation {
        FrameObservation {
            faces: std::iter::repeat_with(face).take(n).collect(),
        }
    }

    /// Start scoring at t=0 and finish the warm-up by t=10.
    fn warmed_up() -> AttentionScorer {
        let mut scorer = AttentionScorer::new(VisionSettings::default());
        scorer.process(&frame(1), 0.0); // first detection
        scorer.process(&frame(1), 10.0); // past the 5 s warm-up
        assert!(scorer.scoring_started());
        assert_eq!(scorer.risk_score(), 0.0);
        scorer
    }

    #[test]
    fn no_scoring_before_first_face() {
        let mut scorer = AttentionScorer::new(VisionSettings::default());
        // An empty room before any detection accrues nothing.
        for t in 0..60 {
            scorer.process(&frame(0), t as f64);
        }
        assert!(!scorer.scoring_started());
        assert_eq!(scorer.risk_score(), 0.0);
    }

    #[test]
    fn warmup_suppresses_scoring() {
        let mut scorer = AttentionScorer::new(VisionSettings::default());
        scorer.process(&frame(3), 0.0);
        scorer.process(&frame(3), 2.0);
        scorer.process(&frame(3), 4.0);
        assert_eq!(scorer.risk_score(), 0.0);
    }

    #[test]
    fn looking_away_scores_per_full_interval() {
        let mut scorer = warmed_up();
        // 25 s of continuous absence, one processed frame per second.
        for t in 11..=35 {
            scorer.process(&frame(0), t as f64);
        }
        let events = scorer.log().snapshot();
        let away: Vec<_> = events.iter().filter(|e| e.label == "Looking Away").collect();
        // Exactly two intervals scored (at +10 s and +20 s); the trailing
        // 5 s of absence stays unscored.
        assert_eq!(away.len(), 2);
        assert!(away.iter().all(|e| e.risk_delta == 10.0));
        assert_eq!(scorer.risk_score(), 20.0);
    }

    #[test]
    fn face_reappearance_clears_away_timer() {
        let mut scorer = warmed_up();
        for t in 11..=19 {
            scorer.process(&frame(0), t as f64);
        }
        scorer.process(&frame(1), 20.0); // back before the interval completed
        for t in 21..=29 {
            scorer.process(&frame(0), t as f64);
        }
        // Neither absence stretch reached a full 10 s on its own.
        assert_eq!(scorer.risk_score(), 0.0);
    }

    #[test]
    fn single_frame_extra_face_scores_only_immediate_risk() {
        let mut scorer = warmed_up();
        scorer.process(&frame(2), 11.0);
        scorer.process(&frame(1), 12.0);
        // Run long enough that a leaked duration timer would fire.
        for t in 13..40 {
            scorer.process(&frame(1), t as f64);
        }
        let events = scorer.log().snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, "Multiple Faces Detected");
        assert_eq!(events[0].risk_delta, 25.0);
        assert!(!events.iter().any(|e| e.label == "Extra Face Duration"));
    }

    #[test]
    fn sustained_extra_faces_accrue_duration_risk() {
        let mut scorer = warmed_up();
        for t in 11..=26 {
            scorer.process(&frame(2), t as f64);
        }
        let events = scorer.log().snapshot();
        let immediate: Vec<_> = events
            .iter()
            .filter(|e| e.label == "Multiple Faces Detected")
            .collect();
        let sustained: Vec<_> = events
            .iter()
            .filter(|e| e.label == "Extra Face Duration")
            .collect();
        assert_eq!(immediate.len(), 1);
        assert_eq!(immediate[0].risk_delta, 25.0);
        // One full 10 s interval of one sustained extra face: 1 × 10 × 1.
        assert_eq!(sustained.len(), 1);
        assert_eq!(sustained[0].risk_delta, 10.0);
    }

    #[test]
    fn extra_face_count_change_rescores_immediately() {
        let mut scorer = warmed_up();
        scorer.process(&frame(2), 11.0); // +25
        scorer.process(&frame(3), 12.0); // count changed: +50
        let immediate: Vec<f64> = scorer
            .log()
            .snapshot()
            .iter()
            .filter(|e| e.label == "Multiple Faces Detected")
            .map(|e| e.risk_delta)
            .collect();
        assert_eq!(immediate, vec![25.0, 50.0]);
    }

    #[test]
    fn negative_emotion_adds_risk_neutral_is_informational() {
        let mut scorer = warmed_up();
        let mut happy = face();
        happy.emotion = Some("Happy".into());
        let mut fear = face();
        fear.emotion = Some("Fear".into());

        scorer.process(&FrameObservation { faces: vec![happy] }, 11.0);
        scorer.process(&FrameObservation { faces: vec![fear] }, 12.0);

        let events = scorer.log().snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].risk_delta, 0.0);
        assert_eq!(events[1].risk_delta, 1.0);
        assert_eq!(scorer.risk_score(), 1.0);
    }

    #[test]
    fn eye_alignment_anomalies_score_separately() {
        let mut scorer = warmed_up();
        let mut f = face();
        // Tilted (vertical diff 15 > 10) and mirrored (left x >= right x).
        f.eyes = Some(EyeLandmarks { left: (30.0, 35.0), right: (10.0, 20.0) });
        scorer.process(&FrameObservation { faces: vec![f] }, 11.0);

        let events = scorer.log().snapshot();
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.label == "Abnormal Eye Vertical Alignment"));
        assert!(events.iter().any(|e| e.label == "Abnormal Eye Horizontal Alignment"));
        assert_eq!(scorer.risk_score(), 10.0);
    }

    #[test]
    fn score_is_sum_of_all_frame_contributions() {
        let mut scorer = warmed_up();
        let mut f1 = face();
        f1.emotion = Some("Angry".into());
        let mut f2 = face();
        f2.emotion = Some("Neutral".into());
        f2.eyes = Some(EyeLandmarks { left: (40.0, 20.0), right: (20.0, 20.0) });

        // Two faces: +25 immediate, +1 emotion, +5 horizontal alignment.
        scorer.process(&FrameObservation { faces: vec![f1, f2] }, 11.0);
        assert_eq!(scorer.risk_score(), 31.0);
        let total: f64 = scorer.log().snapshot().iter().map(|e| e.risk_delta).sum();
        assert_eq!(total, scorer.risk_score());
    }
}
