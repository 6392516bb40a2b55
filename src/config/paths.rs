//! Canonical paths for the verification dialog.
//!
//! Single source of truth - import this instead of hardcoding paths.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default state directory (~/.kyc)
pub fn default_home() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".kyc"))
}

/// Project-local config file relative to a project root
pub fn project_config(root: &std::path::Path) -> PathBuf {
    root.join(".kyc").join("config.yaml")
}
