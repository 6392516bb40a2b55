//! Acceptance rules per field kind.
//!
//! Validators see both the raw response and its normalized form. Rules are
//! shape-only: no PAN letter/digit positions, no negative consent phrases.

use crate::domain::FieldKind;

/// Words that count as affirmative consent
pub const CONSENT_WORDS: [&str; 3] = ["yes", "agree", "consent"];

/// Check a response against the rule for `kind`
pub fn validate(kind: FieldKind, raw: &str, normalized: &str) -> bool {
    match kind {
        FieldKind::Name => is_valid_name(raw, normalized),
        FieldKind::Phone => is_valid_phone(raw, normalized),
        FieldKind::Pan => is_valid_pan(raw, normalized),
        FieldKind::Consent => is_valid_consent(raw, normalized),
    }
}

pub fn is_valid_name(raw: &str, _normalized: &str) -> bool {
    !raw.trim().is_empty()
}

/// Exactly ten digits once non-digits are discarded
pub fn is_valid_phone(_raw: &str, normalized: &str) -> bool {
    normalized.chars().filter(|c| c.is_ascii_digit()).count() == 10
}

pub fn is_valid_pan(_raw: &str, normalized: &str) -> bool {
    normalized.chars().count() == 10 && normalized.chars().all(char::is_alphanumeric)
}

/// Consent is decided on the raw text; there is no negative-word check
pub fn is_valid_consent(raw: &str, _normalized: &str) -> bool {
    let lowered = raw.to_lowercase();
    CONSENT_WORDS.iter().any(|word| lowered.contains(word))
}
