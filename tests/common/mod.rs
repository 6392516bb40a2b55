//! Shared test helpers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kyc_voice::channel::{InputMode, IoChannel};
use kyc_voice::domain::{NoInputReason, Response};

/// Everything a scripted channel was asked to say
#[derive(Debug, Default)]
pub struct Transcript {
    pub prompts: Vec<String>,
    pub announcements: Vec<String>,
}

/// Channel that replays queued responses and records what it was told.
///
/// Once the script runs out every prompt gets `NoInput(Closed)`.
pub struct ScriptedChannel {
    responses: VecDeque<Response>,
    transcript: Arc<Mutex<Transcript>>,
}

impl ScriptedChannel {
    pub fn new(responses: Vec<Response>) -> (Self, Arc<Mutex<Transcript>>) {
        let transcript = Arc::new(Mutex::new(Transcript::default()));
        let channel = Self {
            responses: responses.into(),
            transcript: transcript.clone(),
        };
        (channel, transcript)
    }

    /// Script made of typed lines
    pub fn typed(lines: &[&str]) -> (Self, Arc<Mutex<Transcript>>) {
        Self::new(lines.iter().map(|l| Response::Text(l.to_string())).collect())
    }
}

#[async_trait]
impl IoChannel for ScriptedChannel {
    fn mode(&self) -> InputMode {
        InputMode::Text
    }

    async fn announce(&mut self, text: &str) {
        self.transcript
            .lock()
            .unwrap()
            .announcements
            .push(text.to_string());
    }

    async fn prompt(&mut self, text: &str) -> Response {
        self.transcript.lock().unwrap().prompts.push(text.to_string());
        self.responses
            .pop_front()
            .unwrap_or(Response::NoInput(NoInputReason::Closed))
    }
}
