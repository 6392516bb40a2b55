//! File persistence for completed sessions.
//!
//! One pretty-printed JSON file per completed session, named
//! `kyc_session_<unix-seconds>.json`. Files are written to a temp file in the
//! same directory and renamed without clobbering, so an interrupted write
//! never leaves a partial record behind.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::info;

use crate::domain::SealedRecord;

/// Gives up after this many name collisions within the same second
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Directory-backed record store
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at `dir` (created on first persist)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory records are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate file name for a given unix time and collision index
    pub fn file_name(unix_seconds: i64, collision: u32) -> String {
        if collision == 0 {
            format!("kyc_session_{}.json", unix_seconds)
        } else {
            format!("kyc_session_{}_{}.json", unix_seconds, collision)
        }
    }

    /// Persist a sealed record, returning the path written
    pub fn persist(&self, record: &SealedRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create records directory: {}", self.dir.display()))?;

        let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
        let unix_seconds = chrono::Utc::now().timestamp();

        let mut temp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temp file in {}", self.dir.display()))?;
        temp.write_all(json.as_bytes())
            .context("Failed to write record")?;
        temp.as_file().sync_all().context("Failed to sync record")?;

        for collision in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(Self::file_name(unix_seconds, collision));
            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    info!(path = %path.display(), "Session record persisted");
                    return Ok(path);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    temp = e.file;
                }
                Err(e) => {
                    return Err(e.error)
                        .with_context(|| format!("Failed to write record: {}", path.display()));
                }
            }
        }

        anyhow::bail!(
            "Could not find a free record file name in {}",
            self.dir.display()
        )
    }

    /// Load a previously persisted record
    pub fn load(path: &Path) -> Result<SealedRecord> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse record: {}", path.display()))
    }
}
