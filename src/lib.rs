//! kyc-voice - Guided voice/text KYC verification dialog
//!
//! Collects a user's name, phone number, PAN and consent through a spoken
//! (or typed) conversation, validating each answer and re-asking on
//! failure a bounded number of times.
//!
//! # Architecture
//!
//! The dialog is a fixed sequence of fields driven by a controller:
//! - Each field is collected by a retry loop (prompt, normalize, validate)
//! - Responses arrive through a single `IoChannel` chosen at startup
//! - Only a consented session produces a persisted record
//!
//! # Modules
//!
//! - `adapters`: Speech and audio backends (SoX, Google STT/TTS, local TTS)
//! - `channel`: Voice and text channels, spoken output with fallback
//! - `core`: Normalization, validation, retry loop, session, record store
//! - `domain`: Data structures (FieldSpec, Response, SessionRecord)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Voice session (requires SoX and KYC_STT_API_KEY)
//! kyc-voice
//!
//! # Typed session, records written to ./records
//! kyc-voice --text --records-dir records
//! ```

pub mod adapters;
pub mod channel;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::channel::{InputMode, IoChannel};
pub use crate::core::{RecordStore, SessionContext, SessionController, SessionOutcome};
pub use crate::domain::{FieldKind, FieldSpec, NoInputReason, Response, SealedRecord, SessionRecord};
