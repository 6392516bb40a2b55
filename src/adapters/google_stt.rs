//! Google Speech API (v2 web endpoint) speech-to-text backend.
//!
//! Endpoint: POST /speech-api/v2/recognize with raw FLAC audio.
//! The response body is newline-delimited JSON; the first object is usually
//! an empty `{"result":[]}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{CapturedAudio, RecognitionError, SpeechToText};

/// Default recognition endpoint
pub const SPEECH_API_ENDPOINT: &str = "http://www.google.com/speech-api/v2/recognize";

/// Speech API client
pub struct GoogleSpeechRecognizer {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    result: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternative: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl GoogleSpeechRecognizer {
    /// Create a recognizer with an API key and language (e.g. "en-US")
    pub fn new(key: impl Into<String>, language: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: SPEECH_API_ENDPOINT.to_string(),
            key: key.into(),
            language: language.into(),
        }
    }

    /// Use a different endpoint (tests, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SpeechToText for GoogleSpeechRecognizer {
    fn name(&self) -> &str {
        "google-speech"
    }

    async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, RecognitionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "chromium"),
                ("lang", self.language.as_str()),
                ("key", self.key.as_str()),
            ])
            .header(
                "Content-Type",
                format!("{}; rate={}", audio.content_type, audio.sample_rate),
            )
            .body(audio.bytes.clone())
            .send()
            .await
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionError::Service(format!(
                "recognition request failed: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::Service(e.to_string()))?;
        debug!(bytes = body.len(), "Recognition response received");

        parse_response(&body)
    }
}

/// Pick the first transcript from a newline-delimited recognition response
pub fn parse_response(body: &str) -> Result<String, RecognitionError> {
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed: RecognizeResponse = serde_json::from_str(line)
            .map_err(|e| RecognitionError::Service(format!("malformed response: {}", e)))?;

        let transcript = parsed
            .result
            .iter()
            .flat_map(|r| r.alternative.iter())
            .map(|a| a.transcript.trim())
            .find(|t| !t.is_empty());

        if let Some(text) = transcript {
            return Ok(text.to_string());
        }
    }

    Err(RecognitionError::Unintelligible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typical_response() {
        let body = r#"{"result":[]}
{"result":[{"alternative":[{"transcript":"Alice Kumar","confidence":0.93},{"transcript":"Alice Kumaar"}],"final":true}],"result_index":0}
"#;
        assert_eq!(parse_response(body).unwrap(), "Alice Kumar");
    }

    #[test]
    fn test_parse_empty_result_is_unintelligible() {
        assert_eq!(
            parse_response(r#"{"result":[]}"#),
            Err(RecognitionError::Unintelligible)
        );
        assert_eq!(parse_response(""), Err(RecognitionError::Unintelligible));
    }

    #[test]
    fn test_parse_garbage_is_service_error() {
        assert!(matches!(
            parse_response("<html>quota exceeded</html>"),
            Err(RecognitionError::Service(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let stt = GoogleSpeechRecognizer::new("key", "en-US")
            .with_endpoint("http://127.0.0.1:9/recognize");
        let audio = CapturedAudio {
            bytes: vec![0u8; 16],
            content_type: "audio/x-flac".to_string(),
            sample_rate: 16000,
        };
        assert!(matches!(
            stt.transcribe(&audio).await,
            Err(RecognitionError::Service(_))
        ));
    }
}
