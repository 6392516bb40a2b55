//! Dialog I/O channels.
//!
//! A channel displays and speaks bot lines and returns one [`Response`]
//! per prompt. Voice is preferred; if the microphone or the recognizer
//! cannot be set up, the session falls back to typed input for its whole
//! lifetime.

pub mod output;
pub mod text;
pub mod voice;

use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::adapters::{GoogleSpeechRecognizer, SoxRecorder};
use crate::config::ResolvedConfig;
use crate::domain::Response;

pub use output::SpeechOutput;
pub use text::TextChannel;
pub use voice::VoiceChannel;

/// How responses are captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Voice,
    Text,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Voice => write!(f, "voice"),
            InputMode::Text => write!(f, "text"),
        }
    }
}

/// One side of the dialog: speaks lines, collects responses
#[async_trait]
pub trait IoChannel: Send {
    fn mode(&self) -> InputMode;

    /// Display and speak a line that expects no answer
    async fn announce(&mut self, text: &str);

    /// Display and speak a prompt, then wait for a single response
    async fn prompt(&mut self, text: &str) -> Response;
}

/// Open the channel for a session, falling back to text input.
pub async fn open(config: &ResolvedConfig) -> Box<dyn IoChannel> {
    let output = SpeechOutput::from_settings(&config.speech_output);

    if config.voice.force_text {
        info!("Text input requested");
        return Box::new(TextChannel::stdin(output));
    }

    match open_voice(config, output.clone()).await {
        Ok(channel) => Box::new(channel),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Voice input unavailable");
            println!(
                "Microphone not available ({:#}). Switching to text input mode.",
                e
            );
            Box::new(TextChannel::stdin(output))
        }
    }
}

async fn open_voice(config: &ResolvedConfig, output: SpeechOutput) -> Result<VoiceChannel> {
    let voice = &config.voice;
    let key = voice
        .stt_api_key
        .clone()
        .context("No speech-to-text API key configured (set KYC_STT_API_KEY)")?;

    let recognizer = GoogleSpeechRecognizer::new(key, voice.language.clone());
    let recorder = SoxRecorder::new(voice.recorder.clone());

    VoiceChannel::initialize(
        output,
        Box::new(recorder),
        Box::new(recognizer),
        voice.capture_limits(),
        voice.calibration(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DialogSettings, SpeechOutputSettings, VoiceSettings};

    fn quiet_config(voice: VoiceSettings) -> ResolvedConfig {
        ResolvedConfig {
            records_dir: std::env::temp_dir(),
            config_file: None,
            dialog: DialogSettings::default(),
            voice,
            speech_output: SpeechOutputSettings {
                enabled: false,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_forced_text_mode() {
        let config = quiet_config(VoiceSettings {
            force_text: true,
            stt_api_key: Some("key".to_string()),
            ..Default::default()
        });
        assert_eq!(open(&config).await.mode(), InputMode::Text);
    }

    #[tokio::test]
    async fn test_missing_api_key_falls_back_to_text() {
        let config = quiet_config(VoiceSettings {
            stt_api_key: None,
            ..Default::default()
        });
        assert_eq!(open(&config).await.mode(), InputMode::Text);
    }

    #[tokio::test]
    async fn test_missing_recorder_falls_back_to_text() {
        let config = quiet_config(VoiceSettings {
            stt_api_key: Some("key".to_string()),
            recorder: "no-such-recorder-kyc".to_string(),
            calibration_seconds: 0.1,
            ..Default::default()
        });
        assert_eq!(open(&config).await.mode(), InputMode::Text);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(InputMode::Voice.to_string(), "voice");
        assert_eq!(InputMode::Text.to_string(), "text");
    }
}
