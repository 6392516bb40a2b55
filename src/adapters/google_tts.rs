//! Network speech synthesis via the Google Translate TTS endpoint.
//!
//! Text is split into short chunks, each fetched as MP3, concatenated into a
//! temp file and handed to an external player.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{release_artifact, run_command, Synthesizer};

/// Default Translate TTS endpoint
pub const TRANSLATE_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// The endpoint rejects longer queries
pub const MAX_CHUNK_CHARS: usize = 100;

/// Network synthesizer with local playback
pub struct NetworkSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    /// Player program followed by its arguments; the file path is appended
    player: Vec<String>,
    playback_timeout: Duration,
}

impl NetworkSynthesizer {
    /// Create a synthesizer for `language` playing through `player`
    pub fn new(language: impl Into<String>, player: Vec<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: TRANSLATE_TTS_ENDPOINT.to_string(),
            language: language.into(),
            player,
            playback_timeout: Duration::from_secs(60),
        })
    }

    /// Use a different endpoint (tests, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach TTS endpoint")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("TTS endpoint returned {}", status);
        }

        let bytes = response.bytes().await.context("Failed to read TTS audio")?;
        if bytes.is_empty() {
            anyhow::bail!("TTS endpoint returned no audio");
        }

        Ok(bytes.to_vec())
    }

    async fn play(&self, path: &std::path::Path) -> Result<()> {
        let (program, args) = self
            .player
            .split_first()
            .context("No audio player configured")?;

        let mut args = args.to_vec();
        args.push(path.to_string_lossy().to_string());

        run_command(program, &args, self.playback_timeout).await
    }
}

#[async_trait]
impl Synthesizer for NetworkSynthesizer {
    fn name(&self) -> &str {
        "google-translate-tts"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Ok(());
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, idx, chunks.len()).await?);
        }

        let mut artifact = tempfile::Builder::new()
            .prefix("kyc_tts_")
            .suffix(".mp3")
            .tempfile()
            .context("Failed to create temp audio file")?;
        artifact
            .write_all(&audio)
            .and_then(|_| artifact.flush())
            .context("Failed to write temp audio file")?;

        let result = self.play(artifact.path()).await;
        release_artifact(artifact);
        result
    }
}

/// Split text on whitespace into chunks of at most `max_chars` characters.
///
/// Words longer than `max_chars` are split mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        let needed = if current.is_empty() { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
