//! Domain types for the verification dialog.
//!
//! This module contains the core data structures:
//! - Field: Field kinds, wording and the fixed dialog order
//! - Response: What an input channel returns per prompt
//! - Record: The session record and its sealed form

pub mod field;
pub mod record;
pub mod response;

// Re-export commonly used types
pub use field::{default_sequence, FieldKind, FieldSpec};
pub use record::{now_timestamp, RecordError, SealedRecord, SessionRecord};
pub use response::{AttemptResult, NoInputReason, Response};
