//! Spoken input channel: speak, capture, transcribe.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use super::{InputMode, IoChannel, SpeechOutput};
use crate::adapters::{AudioSource, CaptureError, CaptureLimits, RecognitionError, SpeechToText};
use crate::domain::{NoInputReason, Response};

/// Voice channel over an audio source and a speech-to-text backend
pub struct VoiceChannel {
    output: SpeechOutput,
    source: Box<dyn AudioSource>,
    recognizer: Box<dyn SpeechToText>,
    limits: CaptureLimits,
}

impl VoiceChannel {
    /// Calibrate the audio source and build the channel.
    ///
    /// Any error here means voice input is unusable for this session.
    pub async fn initialize(
        output: SpeechOutput,
        mut source: Box<dyn AudioSource>,
        recognizer: Box<dyn SpeechToText>,
        limits: CaptureLimits,
        calibration: Duration,
    ) -> Result<Self> {
        println!("Calibrating microphone for ambient noise... Please wait.");
        source
            .calibrate(calibration)
            .await
            .with_context(|| format!("Failed to calibrate audio source '{}'", source.name()))?;
        println!("Ready!");

        info!(
            source = source.name(),
            recognizer = recognizer.name(),
            "Voice input ready"
        );

        Ok(Self {
            output,
            source,
            recognizer,
            limits,
        })
    }

    async fn listen(&self) -> Response {
        println!("Listening...");

        let audio = match self.source.capture(&self.limits).await {
            Ok(audio) => audio,
            Err(CaptureError::Timeout) => {
                println!("Timeout: No speech detected.");
                return Response::NoInput(NoInputReason::Timeout);
            }
            Err(CaptureError::Device(e)) => {
                warn!(error = %e, "Audio capture failed");
                println!("Audio capture failed: {}", e);
                return Response::NoInput(NoInputReason::ServiceError(e));
            }
        };

        match self.recognizer.transcribe(&audio).await {
            Ok(text) => {
                println!("User (Speech): {}", text);
                Response::Text(text.to_lowercase())
            }
            Err(RecognitionError::Unintelligible) => {
                println!("Could not understand audio.");
                Response::NoInput(NoInputReason::Unintelligible)
            }
            Err(RecognitionError::Service(e)) => {
                warn!(error = %e, "Speech service error");
                println!("Speech Service Error: {}", e);
                Response::NoInput(NoInputReason::ServiceError(e))
            }
        }
    }
}

#[async_trait]
impl IoChannel for VoiceChannel {
    fn mode(&self) -> InputMode {
        InputMode::Voice
    }

    async fn announce(&mut self, text: &str) {
        self.output.speak(text).await;
    }

    async fn prompt(&mut self, text: &str) -> Response {
        self.output.speak(text).await;
        self.listen().await
    }
}
