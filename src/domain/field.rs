//! Verification fields and their fixed dialog order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of information collected in one dialog turn.
///
/// The kind selects both the normalizer and the validator applied to a
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Full name, stored exactly as heard/typed
    Name,

    /// 10-digit phone number
    Phone,

    /// 10-character PAN (permanent account number)
    Pan,

    /// Final explicit consent
    Consent,
}

impl FieldKind {
    /// Fixed collection order for a session
    pub const SEQUENCE: [FieldKind; 4] = [
        FieldKind::Name,
        FieldKind::Phone,
        FieldKind::Pan,
        FieldKind::Consent,
    ];

    /// Stable identifier used as the record key
    pub fn id(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Phone => "phone",
            FieldKind::Pan => "pan",
            FieldKind::Consent => "consent",
        }
    }

    /// Position of this field within [`FieldKind::SEQUENCE`]
    pub fn position(&self) -> usize {
        match self {
            FieldKind::Name => 0,
            FieldKind::Phone => 1,
            FieldKind::Pan => 2,
            FieldKind::Consent => 3,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Immutable description of how one field is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Which field this is (selects normalizer + validator)
    pub kind: FieldKind,

    /// Question asked on the first attempt
    pub prompt: String,

    /// Corrective message; retries say "<error_message>. Please try again."
    pub error_message: String,

    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
}

impl FieldSpec {
    /// Default wording for a field
    pub fn for_kind(kind: FieldKind, max_retries: u32) -> Self {
        let (prompt, error_message) = match kind {
            FieldKind::Name => (
                "May I have your full name?",
                "I didn't catch a valid name",
            ),
            FieldKind::Phone => (
                "Please provide your 10-digit phone number.",
                "That didn't sound like a 10 digit number",
            ),
            FieldKind::Pan => (
                "Please state your 10-character PAN number.",
                "Invalid PAN format, it should be 10 alphanumeric characters",
            ),
            FieldKind::Consent => (
                "Do you consent to verification? Please say 'Yes, I consent' or 'No'.",
                "I need a clear confirmation. Please say 'Yes, I consent'.",
            ),
        };

        Self {
            kind,
            prompt: prompt.to_string(),
            error_message: error_message.to_string(),
            max_retries,
        }
    }

    /// Prompt spoken on every attempt after the first
    pub fn retry_prompt(&self) -> String {
        format!("{}. Please try again.", self.error_message)
    }
}

/// The full ordered field list for a session.
pub fn default_sequence(max_retries: u32) -> Vec<FieldSpec> {
    FieldKind::SEQUENCE
        .iter()
        .map(|kind| FieldSpec::for_kind(*kind, max_retries))
        .collect()
}
