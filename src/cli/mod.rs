//! Command-line interface for kyc-voice.
//!
//! Running the binary starts exactly one verification session.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::channel;
use crate::config::{self, ConfigOverrides};
use crate::core::{RecordStore, SessionContext, SessionController, SessionOutcome};

/// kyc-voice - Voice-driven KYC verification dialog
#[derive(Parser, Debug)]
#[command(name = "kyc-voice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Skip microphone setup and read typed responses (also KYC_TEXT_MODE)
    #[arg(long)]
    pub text: bool,

    /// Directory for completed session records (default: current directory)
    #[arg(long, env = "KYC_RECORDS_DIR")]
    pub records_dir: Option<PathBuf>,

    /// Config file (default: discovered .kyc/config.yaml)
    #[arg(long, env = "KYC_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Run one session and report its outcome
    pub async fn execute(self) -> Result<SessionOutcome> {
        let overrides = ConfigOverrides {
            config_file: self.config,
            records_dir: self.records_dir,
            force_text: self.text,
        };
        let cfg = config::load_config(&overrides)?;
        info!(
            config_file = ?cfg.config_file,
            records_dir = %cfg.records_dir.display(),
            "Configuration resolved"
        );

        let channel = channel::open(&cfg).await;
        let store = RecordStore::new(cfg.records_dir.clone());
        let ctx = SessionContext::new(channel, store, cfg.dialog.max_retries);

        let mut controller = SessionController::new(ctx);
        let outcome = controller.run().await?;
        report(&outcome)?;

        Ok(outcome)
    }
}

/// Print the final state of the session
fn report(outcome: &SessionOutcome) -> Result<()> {
    match outcome {
        SessionOutcome::Completed { record, path } => {
            let json = serde_json::to_string_pretty(record)
                .context("Failed to serialize session record")?;
            println!();
            println!("Session saved to {}", path.display());
            println!("{}", json);
        }
        SessionOutcome::Aborted { field } => {
            println!();
            println!("Session ended: {} could not be verified.", field);
        }
        SessionOutcome::Declined { .. } => {
            println!();
            println!("Session ended without consent. Nothing was saved.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "kyc-voice",
            "--text",
            "--records-dir",
            "/tmp/records",
            "--config",
            "/tmp/kyc.yaml",
        ])
        .unwrap();
        assert!(cli.text);
        assert_eq!(cli.records_dir, Some(PathBuf::from("/tmp/records")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/kyc.yaml")));
    }

    #[test]
    fn test_text_mode_env_does_not_break_parsing() {
        // KYC_TEXT_MODE is interpreted during config resolution
        std::env::set_var("KYC_TEXT_MODE", "1");
        let cli = Cli::try_parse_from(["kyc-voice"]);
        std::env::remove_var("KYC_TEXT_MODE");

        assert!(!cli.unwrap().text);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
