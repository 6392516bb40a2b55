//! What an input channel hands back for a single prompt.

use std::fmt;

/// Outcome of one prompt on an input channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A transcript or typed line
    Text(String),

    /// Nothing usable was obtained
    NoInput(NoInputReason),
}

impl Response {
    /// The response text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            Response::NoInput(_) => None,
        }
    }
}

/// Why a prompt produced no usable input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoInputReason {
    /// No speech started before the start timeout
    Timeout,

    /// Audio was captured but could not be understood
    Unintelligible,

    /// The speech-to-text service failed
    ServiceError(String),

    /// The input stream was closed (EOF on stdin)
    Closed,
}

impl fmt::Display for NoInputReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoInputReason::Timeout => write!(f, "no speech detected"),
            NoInputReason::Unintelligible => write!(f, "could not understand audio"),
            NoInputReason::ServiceError(e) => write!(f, "speech service error: {}", e),
            NoInputReason::Closed => write!(f, "input closed"),
        }
    }
}

/// Result of a single collection attempt (discarded after use)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptResult {
    pub raw: Option<String>,
    pub normalized: Option<String>,
    pub accepted: bool,
}
