//! Configuration for the verification dialog.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (`--config`, `--records-dir`, `--text`)
//! 2. Environment variables (KYC_CONFIG, KYC_HOME, KYC_RECORDS_DIR,
//!    KYC_STT_API_KEY, KYC_TEXT_MODE)
//! 3. Config file (.kyc/config.yaml, or $KYC_HOME/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .kyc/config.yaml
//! - Falls back to $KYC_HOME/config.yaml (~/.kyc/config.yaml)
//! - Paths in config file are relative to the project root (parent of .kyc/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::local_tts;
use crate::adapters::CaptureLimits;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub version: Option<String>,
    #[serde(default)]
    pub dialog: DialogSettings,
    #[serde(default)]
    pub voice: VoiceSettings,
    #[serde(default)]
    pub speech_output: SpeechOutputSettings,
    #[serde(default)]
    pub records: RecordsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogSettings {
    /// Retries per field after the first attempt (default: 2)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceSettings {
    /// Seconds to wait for speech to start (default: 5)
    #[serde(default = "default_start_timeout")]
    pub start_timeout_seconds: u64,

    /// Maximum seconds per phrase (default: 10)
    #[serde(default = "default_phrase_limit")]
    pub phrase_limit_seconds: u64,

    /// Ambient noise calibration length (default: 1.0)
    #[serde(default = "default_calibration")]
    pub calibration_seconds: f64,

    /// Recognition language (default: en-US)
    #[serde(default = "default_recognition_language")]
    pub language: String,

    /// SoX recorder program (default: rec)
    #[serde(default = "default_recorder")]
    pub recorder: String,

    /// Speech-to-text API key (prefer KYC_STT_API_KEY)
    #[serde(default)]
    pub stt_api_key: Option<String>,

    /// Skip voice initialization and read typed input
    #[serde(default)]
    pub force_text: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeechOutputSettings {
    /// Speak prompts at all (text is always displayed)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Try network synthesis before the local engine
    #[serde(default = "default_true")]
    pub network: bool,

    /// Synthesis language (default: en)
    #[serde(default = "default_synthesis_language")]
    pub language: String,

    /// Player command for network audio; the file path is appended
    #[serde(default = "default_player")]
    pub player: Vec<String>,

    /// Local engine program (default: say on macOS, espeak elsewhere)
    #[serde(default = "default_local_engine")]
    pub local_engine: String,

    /// Local engine speaking rate (default: 150)
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Pause when no engine could speak, in milliseconds (default: 500)
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsConfig {
    /// Records directory (relative to project root)
    pub dir: Option<String>,
}

fn default_max_retries() -> u32 {
    2
}
fn default_start_timeout() -> u64 {
    5
}
fn default_phrase_limit() -> u64 {
    10
}
const MIN_CALIBRATION_SECONDS: f64 = 0.1;
const MAX_CALIBRATION_SECONDS: f64 = 60.0;

fn default_calibration() -> f64 {
    1.0
}
fn default_recognition_language() -> String {
    "en-US".to_string()
}
fn default_recorder() -> String {
    "rec".to_string()
}
fn default_true() -> bool {
    true
}
fn default_synthesis_language() -> String {
    "en".to_string()
}
fn default_player() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["afplay".to_string()]
    } else {
        vec!["mpg123".to_string(), "-q".to_string()]
    }
}
fn default_local_engine() -> String {
    local_tts::default_engine().to_string()
}
fn default_rate() -> u32 {
    local_tts::DEFAULT_RATE
}
fn default_pause_ms() -> u64 {
    500
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            start_timeout_seconds: default_start_timeout(),
            phrase_limit_seconds: default_phrase_limit(),
            calibration_seconds: default_calibration(),
            language: default_recognition_language(),
            recorder: default_recorder(),
            stt_api_key: None,
            force_text: false,
        }
    }
}

impl VoiceSettings {
    pub fn capture_limits(&self) -> CaptureLimits {
        CaptureLimits {
            start_timeout: Duration::from_secs(self.start_timeout_seconds),
            phrase_limit: Duration::from_secs(self.phrase_limit_seconds),
        }
    }

    /// Calibration length, clamped to 0.1–60 s
    pub fn calibration(&self) -> Duration {
        let seconds = self
            .calibration_seconds
            .clamp(MIN_CALIBRATION_SECONDS, MAX_CALIBRATION_SECONDS);
        Duration::try_from_secs_f64(seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_calibration()))
    }

    /// Reject values that cannot describe a duration
    pub fn validate(&self) -> Result<()> {
        if !self.calibration_seconds.is_finite() || self.calibration_seconds < 0.0 {
            anyhow::bail!(
                "voice.calibration_seconds must be a non-negative number, got {}",
                self.calibration_seconds
            );
        }
        Ok(())
    }
}

impl Default for SpeechOutputSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            network: true,
            language: default_synthesis_language(),
            player: default_player(),
            local_engine: default_local_engine(),
            rate: default_rate(),
            pause_ms: default_pause_ms(),
        }
    }
}

/// Command-line overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub records_dir: Option<PathBuf>,
    pub force_text: bool,
}

/// Environment variables consulted during resolution
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub config: Option<String>,
    pub home: Option<String>,
    pub records_dir: Option<String>,
    pub stt_api_key: Option<String>,
    pub text_mode: Option<String>,
}

impl EnvVars {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self {
            config: std::env::var("KYC_CONFIG").ok(),
            home: std::env::var("KYC_HOME").ok(),
            records_dir: std::env::var("KYC_RECORDS_DIR").ok(),
            stt_api_key: std::env::var("KYC_STT_API_KEY").ok(),
            text_mode: std::env::var("KYC_TEXT_MODE").ok(),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Where completed session records are written
    pub records_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub dialog: DialogSettings,
    pub voice: VoiceSettings,
    pub speech_output: SpeechOutputSettings,
}

/// Find config file by searching current directory and parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = paths::project_config(&current);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config YAML
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(content).context("Invalid config YAML")
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Combine file, environment and flags into the effective configuration
pub fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env: &EnvVars,
    overrides: &ConfigOverrides,
    cwd: &Path,
) -> Result<ResolvedConfig> {
    let (config_file, config) = match file {
        Some((path, config)) => (Some(path), config),
        None => (None, ConfigFile::default()),
    };

    // Base directory is the parent of .kyc/ (i.e., grandparent of config.yaml)
    let base_dir = config_file
        .as_deref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(cwd)
        .to_path_buf();

    let records_dir = if let Some(ref dir) = overrides.records_dir {
        dir.clone()
    } else if let Some(ref dir) = env.records_dir {
        PathBuf::from(dir)
    } else if let Some(ref dir) = config.records.dir {
        resolve_path(&base_dir, dir)
    } else {
        cwd.to_path_buf()
    };

    let mut voice = config.voice;
    voice.validate().context("Invalid voice settings")?;
    if let Some(ref key) = env.stt_api_key {
        voice.stt_api_key = Some(key.clone());
    }
    voice.stt_api_key = voice.stt_api_key.filter(|k| !k.trim().is_empty());
    if overrides.force_text || env.text_mode.as_deref().map(is_truthy).unwrap_or(false) {
        voice.force_text = true;
    }

    Ok(ResolvedConfig {
        records_dir,
        config_file,
        dialog: config.dialog,
        voice,
        speech_output: config.speech_output,
    })
}

/// Load configuration from all sources
pub fn load_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let env = EnvVars::from_env();
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let explicit = overrides
        .config_file
        .clone()
        .or_else(|| env.config.as_ref().map(PathBuf::from));

    let config_path = match explicit {
        Some(path) => Some(path),
        None => find_config_file(&cwd).or_else(|| {
            let home = env
                .home
                .as_ref()
                .map(PathBuf::from)
                .or_else(|| paths::default_home().ok())?;
            let path = home.join("config.yaml");
            path.exists().then_some(path)
        }),
    };

    let file = match config_path {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    resolve(file, &env, overrides, &cwd)
}
