//! Offline speech synthesis through a local engine (`say` on macOS,
//! `espeak` elsewhere).

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::{run_command, Synthesizer};

/// Default speaking rate in words per minute
pub const DEFAULT_RATE: u32 = 150;

/// Platform default engine
pub fn default_engine() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

/// Local subprocess synthesizer
pub struct LocalSynthesizer {
    program: String,
    rate: u32,
    timeout: Duration,
}

impl LocalSynthesizer {
    pub fn new(program: impl Into<String>, rate: u32) -> Self {
        Self {
            program: program.into(),
            rate,
            timeout: Duration::from_secs(60),
        }
    }

    /// Arguments for one utterance; `say` and `espeak` spell the rate flag
    /// differently
    pub fn args(&self, text: &str) -> Vec<String> {
        let rate_flag = if self.program.ends_with("say") { "-r" } else { "-s" };
        vec![rate_flag.to_string(), self.rate.to_string(), text.to_string()]
    }
}

#[async_trait]
impl Synthesizer for LocalSynthesizer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        run_command(&self.program, &self.args(text), self.timeout).await
    }
}
