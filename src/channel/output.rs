//! Spoken output with ordered fallback.
//!
//! Each line is displayed, then offered to the synthesis tiers in order
//! (network first, then the local engine). If no tier succeeds the line
//! degrades to a short pause. Callers never see an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::adapters::{LocalSynthesizer, NetworkSynthesizer, Synthesizer};
use crate::config::SpeechOutputSettings;

/// Displays and speaks dialog lines
#[derive(Clone)]
pub struct SpeechOutput {
    tiers: Vec<Arc<dyn Synthesizer>>,
    fallback_pause: Duration,
}

impl SpeechOutput {
    pub fn new(tiers: Vec<Arc<dyn Synthesizer>>, fallback_pause: Duration) -> Self {
        Self {
            tiers,
            fallback_pause,
        }
    }

    /// Display only, no audio and no pause
    pub fn silent() -> Self {
        Self::new(Vec::new(), Duration::ZERO)
    }

    /// Build the tiers described by the settings
    pub fn from_settings(settings: &SpeechOutputSettings) -> Self {
        let pause = Duration::from_millis(settings.pause_ms);
        if !settings.enabled {
            return Self::new(Vec::new(), Duration::ZERO);
        }

        let mut tiers: Vec<Arc<dyn Synthesizer>> = Vec::new();
        if settings.network {
            match NetworkSynthesizer::new(settings.language.clone(), settings.player.clone()) {
                Ok(tts) => tiers.push(Arc::new(tts)),
                Err(e) => warn!(error = %e, "Network speech synthesis unavailable"),
            }
        }
        tiers.push(Arc::new(LocalSynthesizer::new(
            settings.local_engine.clone(),
            settings.rate,
        )));

        Self::new(tiers, pause)
    }

    /// Names of the configured tiers, in order
    pub fn tier_names(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.name().to_string()).collect()
    }

    /// Display and speak `text`. Returns the tier that spoke it, if any.
    pub async fn speak(&self, text: &str) -> Option<String> {
        println!("Bot: {}", text);

        for tier in &self.tiers {
            match tier.speak(text).await {
                Ok(()) => return Some(tier.name().to_string()),
                Err(e) => debug!(tier = tier.name(), error = %e, "Speech tier failed"),
            }
        }

        if !self.tiers.is_empty() {
            debug!("No speech tier succeeded, pausing instead");
        }
        if !self.fallback_pause.is_zero() {
            tokio::time::sleep(self.fallback_pause).await;
        }
        None
    }
}
