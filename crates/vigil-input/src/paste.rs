//! Paste-risk scoring over clipboard changes.
//!
//! Unchanged or empty content never re-scores. Each qualifying change scores
//! `floor(words / 10) × 10`, doubled for every further qualifying change
//! inside the rolling escalation window.

use std::sync::Arc;
use tracing::info;
use vigil_core::{ChannelLog, ClipboardSettings, RepeatEscalator, RiskChannel, RiskEvent};

pub struct PasteScorer {
    settings: ClipboardSettings,
    log: Arc<ChannelLog>,
    last_clipboard: String,
    escalator: RepeatEscalator,
}

impl PasteScorer {
    pub fn new(settings: ClipboardSettings) -> Self {
        let escalator = RepeatEscalator::new(settings.escalation_window_secs);
        Self {
            settings,
            log: Arc::new(ChannelLog::new(RiskChannel::Clipboard)),
            last_clipboard: String::new(),
            escalator,
        }
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        Arc::clone(&self.log)
    }

    pub fn risk_score(&self) -> f64 {
        self.log.risk_score()
    }

    /// Feed one clipboard reading taken at `now`. Returns the committed risk
    /// when the content qualified as a new paste.
    pub fn observe(&mut self, text: &str, now: f64) -> Option<f64> {
        if text == self.last_clipboard || text.trim().is_empty() {
            return None;
        }

        let word_count = text.split_whitespace().count();
        let base_risk = (word_count / 10) as f64 * 10.0;
        let multiplier = self.escalator.multiplier(now);
        let risk = base_risk * multiplier;

        let preview: String = text.chars().take(self.settings.preview_chars).collect();
        info!(
            word_count,
            risk,
            repeat = self.escalator.count(),
            "clipboard change scored"
        );
        self.log.append(
            RiskEvent::at(now, RiskChannel::Clipboard, "Copy-Paste Detected", risk)
                .with("content_preview", preview)
                .with("word_count", word_count as u64),
        );

        self.last_clipboard = text.to_string();
        Some(risk)
    }
}
