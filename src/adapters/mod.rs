//! Adapter interfaces for external speech capabilities.
//!
//! Adapters hide the audio device, speech synthesis and speech-to-text
//! services behind narrow traits so the dialog never depends on a concrete
//! backend.

pub mod google_stt;
pub mod google_tts;
pub mod local_tts;
pub mod sox;

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

pub use google_stt::GoogleSpeechRecognizer;
pub use google_tts::NetworkSynthesizer;
pub use local_tts::LocalSynthesizer;
pub use sox::SoxRecorder;

/// Audio captured for one utterance
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    /// Encoded audio bytes
    pub bytes: Vec<u8>,

    /// MIME type of `bytes` (e.g. "audio/x-flac")
    pub content_type: String,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Bounds for a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureLimits {
    /// How long to wait for speech to start
    pub start_timeout: Duration,

    /// Maximum length of one phrase once speech started
    pub phrase_limit: Duration,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            start_timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(10),
        }
    }
}

/// Audio capture failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("No speech detected before timeout")]
    Timeout,

    #[error("Audio device error: {0}")]
    Device(String),
}

/// Speech-to-text failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("Speech was not understood")]
    Unintelligible,

    #[error("Speech service error: {0}")]
    Service(String),
}

/// A microphone-like audio source
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Measure ambient noise to tune speech detection. Failing here means
    /// the device is unusable.
    async fn calibrate(&mut self, duration: Duration) -> Result<()>;

    /// Capture one utterance
    async fn capture(&self, limits: &CaptureLimits) -> Result<CapturedAudio, CaptureError>;
}

/// Speech-to-text backend
#[async_trait]
pub trait SpeechToText: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe captured audio
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, RecognitionError>;
}

/// Text-to-speech backend
#[async_trait]
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Render `text` audibly, returning once playback finished
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Run a command to completion within `limit`, failing on non-zero exit
pub(crate) async fn run_command(program: &str, args: &[String], limit: Duration) -> Result<()> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn '{}'", program))?;

    let output = timeout(limit, child.wait_with_output())
        .await
        .with_context(|| format!("'{}' timed out after {:?}", program, limit))?
        .with_context(|| format!("Failed to wait for '{}'", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        anyhow::bail!(
            "'{}' failed with exit code {}: {}",
            program,
            exit_code,
            stderr.trim()
        );
    }

    Ok(())
}

/// Delete a temporary audio file.
///
/// A file still held by a player is left for the OS to clean up.
pub(crate) fn release_artifact(file: NamedTempFile) {
    let path = file.path().to_path_buf();
    match file.close() {
        Ok(()) => debug!(path = %path.display(), "Removed temp audio"),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "Temp audio still in use, leaving it");
        }
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp audio"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_artifact_removes_file() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());

        release_artifact(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_run_command_missing_program() {
        let result = run_command(
            "definitely-not-a-real-binary-kyc",
            &[],
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_err());
    }
}
