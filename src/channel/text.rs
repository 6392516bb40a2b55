//! Typed input channel.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::warn;

use super::{InputMode, IoChannel, SpeechOutput};
use crate::domain::{NoInputReason, Response};

/// Reads one line per prompt, without a timeout
pub struct TextChannel<R> {
    output: SpeechOutput,
    reader: R,
}

impl TextChannel<BufReader<Stdin>> {
    /// Channel reading from the process stdin
    pub fn stdin(output: SpeechOutput) -> Self {
        Self::new(output, BufReader::new(tokio::io::stdin()))
    }
}

impl<R> TextChannel<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(output: SpeechOutput, reader: R) -> Self {
        Self { output, reader }
    }
}

#[async_trait]
impl<R> IoChannel for TextChannel<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn mode(&self) -> InputMode {
        InputMode::Text
    }

    async fn announce(&mut self, text: &str) {
        self.output.speak(text).await;
    }

    async fn prompt(&mut self, text: &str) -> Response {
        self.output.speak(text).await;

        println!("Enter your response:");
        print!("User (Text): ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) => Response::NoInput(NoInputReason::Closed),
            Ok(_) => Response::Text(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
            Err(e) => {
                warn!(error = %e, "Failed to read typed input");
                Response::NoInput(NoInputReason::Closed)
            }
        }
    }
}
