//! Session controller: drives the fixed field sequence to a terminal outcome.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::channel::IoChannel;
use crate::domain::{
    default_sequence, now_timestamp, FieldKind, FieldSpec, SealedRecord, SessionRecord,
};

use super::retry::{collect, Collected};
use super::store::RecordStore;

/// Error attached to a record when consent is not obtained
pub const DECLINED_ERROR: &str = "User denied consent or input failed.";

/// Spoken/displayed lines of the dialog that are not field prompts
#[derive(Debug, Clone)]
pub struct DialogMessages {
    pub welcome: String,
    pub recorded: String,
    pub cancelled: String,
}

impl Default for DialogMessages {
    fn default() -> Self {
        Self {
            welcome: "Welcome to KYC verification.".to_string(),
            recorded: "Thank you. Your details have been recorded. Verification is processing."
                .to_string(),
            cancelled: "Verification cancelled. Have a nice day.".to_string(),
        }
    }
}

/// Everything one session needs, built once at startup
pub struct SessionContext {
    pub session_id: Uuid,
    pub channel: Box<dyn IoChannel>,
    pub store: RecordStore,
    pub fields: Vec<FieldSpec>,
    pub messages: DialogMessages,
}

impl SessionContext {
    /// Context with the default field sequence and wording
    pub fn new(channel: Box<dyn IoChannel>, store: RecordStore, max_retries: u32) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            channel,
            store,
            fields: default_sequence(max_retries),
            messages: DialogMessages::default(),
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Consent given, record persisted
    Completed { record: SealedRecord, path: PathBuf },

    /// A field ran out of attempts; nothing was persisted
    Aborted { field: FieldKind },

    /// Consent not obtained; nothing was persisted
    Declined { record: SealedRecord },
}

impl SessionOutcome {
    /// Path of the persisted record, if any
    pub fn persisted_path(&self) -> Option<&PathBuf> {
        match self {
            SessionOutcome::Completed { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Drives one session through the field sequence
pub struct SessionController {
    ctx: SessionContext,
}

impl SessionController {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    fn spec(&self, kind: FieldKind) -> Result<FieldSpec> {
        self.ctx
            .fields
            .iter()
            .find(|s| s.kind == kind)
            .cloned()
            .with_context(|| format!("No field specification for '{}'", kind))
    }

    async fn collect_field(&mut self, kind: FieldKind) -> Result<Option<Collected>> {
        let spec = self.spec(kind)?;
        Ok(collect(&spec, self.ctx.channel.as_mut()).await)
    }

    /// Run the dialog to completion
    #[instrument(skip(self), fields(session_id = %self.ctx.session_id, mode = %self.ctx.channel.mode()))]
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        info!("Session started");
        let mut record = SessionRecord::new();

        let welcome = self.ctx.messages.welcome.clone();
        self.ctx.channel.announce(&welcome).await;

        for kind in [FieldKind::Name, FieldKind::Phone, FieldKind::Pan] {
            let Some(collected) = self.collect_field(kind).await? else {
                warn!(field = %kind, "Session aborted");
                return Ok(SessionOutcome::Aborted { field: kind });
            };
            record.store(kind, stored_value(kind, &collected))?;
        }

        let summary = record.summary();
        self.ctx.channel.announce(&summary).await;

        match self.collect_field(FieldKind::Consent).await? {
            Some(_) => {
                let sealed = record.approve(now_timestamp())?;
                let path = self.ctx.store.persist(&sealed).map_err(|e| {
                    error!(error = %e, "Failed to persist session record");
                    e
                })?;

                let recorded = self.ctx.messages.recorded.clone();
                self.ctx.channel.announce(&recorded).await;
                info!(path = %path.display(), "Session completed");

                Ok(SessionOutcome::Completed {
                    record: sealed,
                    path,
                })
            }
            None => {
                let cancelled = self.ctx.messages.cancelled.clone();
                self.ctx.channel.announce(&cancelled).await;
                warn!("Consent not obtained, nothing persisted");

                Ok(SessionOutcome::Declined {
                    record: record.decline(DECLINED_ERROR, now_timestamp()),
                })
            }
        }
    }
}

/// Value stored in the record for an accepted field
pub fn stored_value(kind: FieldKind, collected: &Collected) -> String {
    match kind {
        FieldKind::Name => collected.raw.clone(),
        FieldKind::Phone => collected
            .normalized
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect(),
        FieldKind::Pan => collected.normalized.to_uppercase(),
        FieldKind::Consent => collected.normalized.clone(),
    }
}
