//! Collect one validated field with bounded retries.
//!
//! Each field runs a small state machine:
//!
//! ```text
//! Prompting ──► Validating ──► Succeeded
//!     ▲             │
//!     │             ├──► Retrying ──► Prompting   (attempts <= max_retries)
//!     │             └──► Exhausted               (otherwise)
//! ```
//!
//! The first attempt asks the field prompt; every retry asks only the
//! corrective "<error>. Please try again." prompt.

use tracing::{debug, info, instrument, warn};

use crate::channel::IoChannel;
use crate::domain::{AttemptResult, FieldSpec, Response};

use super::normalize::normalize;
use super::validate::validate;

/// Spoken when a field runs out of attempts
pub const EXHAUSTED_MESSAGE: &str =
    "I'm sorry, I couldn't verify that detail. Let's move on or restart.";

/// An accepted response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub raw: String,
    pub normalized: String,
}

enum State {
    Prompting,
    Validating(Response),
    Retrying,
    Succeeded(Collected),
    Exhausted,
}

/// Collect a field using the validator selected by its kind.
///
/// Returns `None` once `max_retries + 1` attempts have failed.
pub async fn collect(spec: &FieldSpec, channel: &mut dyn IoChannel) -> Option<Collected> {
    let kind = spec.kind;
    collect_with(spec, channel, move |raw, normalized| {
        validate(kind, raw, normalized)
    })
    .await
}

/// Collect a field with an explicit acceptance predicate
#[instrument(skip_all, fields(field = %spec.kind, max_retries = spec.max_retries))]
pub async fn collect_with<F>(
    spec: &FieldSpec,
    channel: &mut dyn IoChannel,
    accept: F,
) -> Option<Collected>
where
    F: Fn(&str, &str) -> bool,
{
    let mut attempts = 0u32;
    let mut prompt = spec.prompt.clone();
    let mut state = State::Prompting;

    loop {
        state = match state {
            State::Prompting => State::Validating(channel.prompt(&prompt).await),

            State::Validating(response) => {
                if let Response::NoInput(ref reason) = response {
                    debug!(%reason, "No usable input");
                }

                let attempt = evaluate(spec, &response, &accept);
                match attempt {
                    AttemptResult {
                        raw: Some(raw),
                        normalized: Some(normalized),
                        accepted: true,
                    } => State::Succeeded(Collected { raw, normalized }),
                    _ => {
                        attempts += 1;
                        if attempts <= spec.max_retries {
                            State::Retrying
                        } else {
                            State::Exhausted
                        }
                    }
                }
            }

            State::Retrying => {
                warn!(attempt = attempts, "Field not accepted, retrying");
                prompt = spec.retry_prompt();
                State::Prompting
            }

            State::Succeeded(collected) => {
                info!(failed_attempts = attempts, "Field accepted");
                return Some(collected);
            }

            State::Exhausted => {
                warn!(attempts, "Field attempts exhausted");
                channel.announce(EXHAUSTED_MESSAGE).await;
                return None;
            }
        };
    }
}

/// Normalize and validate one response. Empty text counts as no input.
fn evaluate<F>(spec: &FieldSpec, response: &Response, accept: &F) -> AttemptResult
where
    F: Fn(&str, &str) -> bool,
{
    match response.text() {
        Some(raw) if !raw.is_empty() => {
            let normalized = normalize(raw, spec.kind);
            let accepted = accept(raw, &normalized);
            AttemptResult {
                raw: Some(raw.to_string()),
                normalized: Some(normalized),
                accepted,
            }
        }
        _ => AttemptResult::default(),
    }
}
