//! Session record accumulated during a dialog.
//!
//! A [`SessionRecord`] is filled one field at a time in the fixed
//! [`FieldKind::SEQUENCE`] order and is consumed exactly once when the
//! session resolves, producing an immutable [`SealedRecord`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::field::FieldKind;

/// Errors raised when mutating a session record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Field '{got}' stored out of order (expected '{expected}')")]
    OutOfOrder { expected: String, got: FieldKind },

    #[error("Field '{0}' is resolved by sealing the record, not stored as a value")]
    NotAValue(FieldKind),

    #[error("Invalid stored value for '{field}': {value:?}")]
    InvalidValue { field: FieldKind, value: String },

    #[error("Cannot approve record, missing field '{0}'")]
    Incomplete(FieldKind),
}

/// Mutable record for an in-progress session
#[derive(Debug, Clone, Default)]
pub struct SessionRecord {
    name: Option<String>,
    phone: Option<String>,
    pan: Option<String>,
    /// Position of the next field allowed to be stored
    next: usize,
}

impl SessionRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the derived value for the next field in sequence
    pub fn store(&mut self, field: FieldKind, value: String) -> Result<(), RecordError> {
        if field == FieldKind::Consent {
            return Err(RecordError::NotAValue(field));
        }

        if field.position() != self.next {
            let expected = FieldKind::SEQUENCE
                .get(self.next)
                .map(|k| k.id().to_string())
                .unwrap_or_else(|| "none".to_string());
            return Err(RecordError::OutOfOrder { expected, got: field });
        }

        let well_formed = match field {
            FieldKind::Name => !value.trim().is_empty(),
            FieldKind::Phone => value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()),
            FieldKind::Pan => {
                value.chars().count() == 10
                    && value.chars().all(char::is_alphanumeric)
                    && value.to_uppercase() == value
            }
            FieldKind::Consent => false,
        };
        if !well_formed {
            return Err(RecordError::InvalidValue { field, value });
        }

        match field {
            FieldKind::Name => self.name = Some(value),
            FieldKind::Phone => self.phone = Some(value),
            FieldKind::Pan => self.pan = Some(value),
            FieldKind::Consent => unreachable!("consent rejected above"),
        }
        self.next += 1;

        Ok(())
    }

    /// Get a stored value
    pub fn get(&self, field: FieldKind) -> Option<&str> {
        match field {
            FieldKind::Name => self.name.as_deref(),
            FieldKind::Phone => self.phone.as_deref(),
            FieldKind::Pan => self.pan.as_deref(),
            FieldKind::Consent => None,
        }
    }

    /// Spoken read-back of the identity fields
    pub fn summary(&self) -> String {
        format!(
            "Confirming details. Name: {}. Phone: {}. PAN: {}.",
            self.name.as_deref().unwrap_or_default(),
            self.phone.as_deref().unwrap_or_default(),
            self.pan.as_deref().unwrap_or_default(),
        )
    }

    /// Seal with consent given. All identity fields must be present.
    pub fn approve(self, timestamp: String) -> Result<SealedRecord, RecordError> {
        let name = self.name.ok_or(RecordError::Incomplete(FieldKind::Name))?;
        let phone = self.phone.ok_or(RecordError::Incomplete(FieldKind::Phone))?;
        let pan = self.pan.ok_or(RecordError::Incomplete(FieldKind::Pan))?;

        Ok(SealedRecord {
            name: Some(name),
            phone: Some(phone),
            pan: Some(pan),
            consent: true,
            timestamp,
            error: None,
        })
    }

    /// Seal with consent withheld
    pub fn decline(self, error: impl Into<String>, timestamp: String) -> SealedRecord {
        SealedRecord {
            name: self.name,
            phone: self.phone,
            pan: self.pan,
            consent: false,
            timestamp,
            error: Some(error.into()),
        }
    }
}

/// Terminal, serializable form of a session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,

    pub consent: bool,

    /// ISO-8601 (RFC 3339) local time
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Current local time as an ISO-8601 string
pub fn now_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SessionRecord {
        let mut record = SessionRecord::new();
        record.store(FieldKind::Name, "Alice Kumar".to_string()).unwrap();
        record.store(FieldKind::Phone, "9876543210".to_string()).unwrap();
        record.store(FieldKind::Pan, "ABCDE1234F".to_string()).unwrap();
        record
    }

    #[test]
    fn test_store_in_order() {
        let record = filled();
        assert_eq!(record.get(FieldKind::Name), Some("Alice Kumar"));
        assert_eq!(record.get(FieldKind::Phone), Some("9876543210"));
        assert_eq!(record.get(FieldKind::Pan), Some("ABCDE1234F"));
    }

    #[test]
    fn test_store_out_of_order_rejected() {
        let mut record = SessionRecord::new();
        let err = record
            .store(FieldKind::Phone, "9876543210".to_string())
            .unwrap_err();
        assert!(matches!(err, RecordError::OutOfOrder { .. }));
        assert_eq!(record.get(FieldKind::Phone), None);
    }

    #[test]
    fn test_store_rejects_malformed_values() {
        let mut record = SessionRecord::new();
        record.store(FieldKind::Name, "Bob".to_string()).unwrap();

        assert!(record.store(FieldKind::Phone, "98765".to_string()).is_err());
        record.store(FieldKind::Phone, "9876543210".to_string()).unwrap();

        assert!(record.store(FieldKind::Pan, "abcde1234f".to_string()).is_err());
        assert!(record.store(FieldKind::Pan, "ABCDE-234F".to_string()).is_err());
    }

    #[test]
    fn test_consent_is_not_a_value() {
        let mut record = filled();
        assert_eq!(
            record.store(FieldKind::Consent, "yes".to_string()),
            Err(RecordError::NotAValue(FieldKind::Consent))
        );
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            filled().summary(),
            "Confirming details. Name: Alice Kumar. Phone: 9876543210. PAN: ABCDE1234F."
        );
    }

    #[test]
    fn test_approved_record_serializes_exact_keys() {
        let sealed = filled().approve("2026-10-16T10:00:00+05:30".to_string()).unwrap();
        let value = serde_json::to_value(&sealed).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["consent", "name", "pan", "phone", "timestamp"]);
        assert_eq!(obj["consent"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_approve_incomplete_fails() {
        let mut record = SessionRecord::new();
        record.store(FieldKind::Name, "Bob".to_string()).unwrap();
        assert_eq!(
            record.approve(now_timestamp()),
            Err(RecordError::Incomplete(FieldKind::Phone))
        );
    }

    #[test]
    fn test_decline_carries_error() {
        let sealed = filled().decline("User denied consent", now_timestamp());
        assert!(!sealed.consent);
        assert_eq!(sealed.error.as_deref(), Some("User denied consent"));
    }
}
