//! Canonical forms for free-form responses.
//!
//! Every function here is total: any input, including the empty string,
//! yields a (possibly empty) output.

use crate::domain::FieldKind;

/// Normalize a raw response for the given field kind
pub fn normalize(raw: &str, kind: FieldKind) -> String {
    match kind {
        FieldKind::Phone => extract_digits(raw),
        FieldKind::Pan => strip_whitespace(raw).to_uppercase(),
        FieldKind::Name | FieldKind::Consent => strip_whitespace(raw),
    }
}

/// Remove every whitespace character
pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Extract the decimal digits of a phone response, in order.
///
/// If the response holds any ASCII digit, only those digits are kept and
/// words are ignored. Otherwise it is read as spoken digits: whole words
/// ("nine", "zero", "oh", "o") map to digits and "double"/"triple" repeat
/// the digit that follows.
pub fn extract_digits(raw: &str) -> String {
    if raw.chars().any(|c| c.is_ascii_digit()) {
        return raw.chars().filter(|c| c.is_ascii_digit()).collect();
    }
    spoken_digits(raw)
}

fn spoken_digits(raw: &str) -> String {
    let mut digits = String::new();
    let mut repeat = 1usize;

    for token in raw.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }

        let lowered = token.to_lowercase();
        if let Some(n) = multiplier(&lowered) {
            repeat = n;
            continue;
        }

        if let Some(d) = spoken_digit(&lowered) {
            push_repeated(&mut digits, d, repeat);
        }
        repeat = 1;
    }

    digits
}

fn push_repeated(out: &mut String, digit: char, times: usize) {
    for _ in 0..times {
        out.push(digit);
    }
}

fn spoken_digit(word: &str) -> Option<char> {
    let digit = match word {
        "zero" | "oh" | "o" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        _ => return None,
    };
    Some(digit)
}

fn multiplier(word: &str) -> Option<usize> {
    match word {
        "double" => Some(2),
        "triple" => Some(3),
        _ => None,
    }
}
