//! Dialog logic.
//!
//! This module contains:
//! - Normalize/Validate: per-field text rules
//! - Retry: bounded collection of one field
//! - Session: the fixed field sequence and its outcome
//! - Store: atomic persistence of completed records

pub mod normalize;
pub mod retry;
pub mod session;
pub mod store;
pub mod validate;

// Re-export commonly used types
pub use normalize::normalize;
pub use retry::{collect, collect_with, Collected, EXHAUSTED_MESSAGE};
pub use session::{
    DialogMessages, SessionContext, SessionController, SessionOutcome, DECLINED_ERROR,
};
pub use store::RecordStore;
pub use validate::validate;
