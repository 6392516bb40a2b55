//! Microphone capture through SoX's `rec`.
//!
//! Each capture spawns one `rec` process recording mono 16 kHz FLAC with a
//! `silence` effect (recording starts when the level exceeds the calibrated
//! threshold and stops after one second below it) and a `trim` capping the
//! phrase length. The device is only held while that process runs.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{release_artifact, AudioSource, CaptureError, CaptureLimits, CapturedAudio};

pub const SAMPLE_RATE: u32 = 16_000;

/// Output smaller than this after the start timeout means no speech began
const HEADER_ALLOWANCE_BYTES: u64 = 8 * 1024;

/// Threshold used before calibration, in percent of full scale
const DEFAULT_THRESHOLD_PERCENT: f64 = 1.0;

/// Calibrated threshold = ambient RMS × this factor
const DYNAMIC_FACTOR: f64 = 1.5;

const MIN_THRESHOLD_PERCENT: f64 = 0.3;
const MAX_THRESHOLD_PERCENT: f64 = 20.0;

/// SoX-backed audio source
pub struct SoxRecorder {
    program: String,
    threshold_percent: f64,
}

impl SoxRecorder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }

    /// Current speech detection threshold in percent
    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    fn capture_args(&self, path: &str, phrase_limit: Duration) -> Vec<String> {
        let threshold = format!("{:.2}%", self.threshold_percent);
        vec![
            "-q".to_string(),
            "-c".to_string(),
            "1".to_string(),
            "-r".to_string(),
            SAMPLE_RATE.to_string(),
            "-b".to_string(),
            "16".to_string(),
            path.to_string(),
            "silence".to_string(),
            "1".to_string(),
            "0.1".to_string(),
            threshold.clone(),
            "1".to_string(),
            "1.0".to_string(),
            threshold,
            "trim".to_string(),
            "0".to_string(),
            format!("{:.1}", phrase_limit.as_secs_f64()),
        ]
    }
}

#[async_trait]
impl AudioSource for SoxRecorder {
    fn name(&self) -> &str {
        "sox"
    }

    async fn calibrate(&mut self, duration: Duration) -> Result<()> {
        let output = timeout(
            duration + Duration::from_secs(5),
            Command::new(&self.program)
                .args(["-q", "-c", "1", "-r"])
                .arg(SAMPLE_RATE.to_string())
                .args(["-n", "trim", "0"])
                .arg(format!("{:.1}", duration.as_secs_f64()))
                .arg("stat")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("Microphone calibration timed out")?
        .with_context(|| format!("Failed to run '{}' (is SoX installed?)", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Microphone unavailable: {}", stderr.trim());
        }

        let stats = String::from_utf8_lossy(&output.stderr);
        let rms = parse_rms_amplitude(&stats).context("Calibration produced no RMS level")?;
        self.threshold_percent = threshold_from_rms(rms);

        info!(rms, threshold = self.threshold_percent, "Microphone calibrated");
        Ok(())
    }

    async fn capture(&self, limits: &CaptureLimits) -> Result<CapturedAudio, CaptureError> {
        let artifact = tempfile::Builder::new()
            .prefix("kyc_capture_")
            .suffix(".flac")
            .tempfile()
            .map_err(|e| CaptureError::Device(format!("temp file: {}", e)))?;
        let path = artifact.path().to_string_lossy().to_string();

        let mut child = Command::new(&self.program)
            .args(self.capture_args(&path, limits.phrase_limit))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        // Start-of-speech window; a recorder that already exited is done
        let exit = match timeout(limits.start_timeout, child.wait()).await {
            Ok(exit) => Some(exit),
            Err(_) => {
                let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
                if size <= HEADER_ALLOWANCE_BYTES {
                    let _ = child.kill().await;
                    release_artifact(artifact);
                    debug!("No speech before start timeout");
                    return Err(CaptureError::Timeout);
                }

                // Phrase window plus slack for the trailing silence
                let remaining = limits.phrase_limit + Duration::from_secs(2);
                match timeout(remaining, child.wait()).await {
                    Ok(exit) => Some(exit),
                    Err(_) => {
                        warn!("Recorder overran phrase limit, stopping it");
                        let _ = child.kill().await;
                        None
                    }
                }
            }
        };

        match exit {
            Some(Ok(status)) if !status.success() => {
                release_artifact(artifact);
                return Err(CaptureError::Device(format!("recorder exited with {}", status)));
            }
            Some(Err(e)) => {
                release_artifact(artifact);
                return Err(CaptureError::Device(e.to_string()));
            }
            _ => {}
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CaptureError::Device(e.to_string()));
        release_artifact(artifact);
        let bytes = bytes?;

        if bytes.is_empty() {
            return Err(CaptureError::Timeout);
        }

        Ok(CapturedAudio {
            bytes,
            content_type: "audio/x-flac".to_string(),
            sample_rate: SAMPLE_RATE,
        })
    }
}

/// Extract "RMS amplitude" from SoX `stat` output
pub fn parse_rms_amplitude(stats: &str) -> Option<f64> {
    stats
        .lines()
        .find(|line| line.trim_start().starts_with("RMS") && line.contains("amplitude"))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|value| value.trim().parse().ok())
}

/// Convert ambient RMS (0.0–1.0) into a silence threshold percentage
pub fn threshold_from_rms(rms: f64) -> f64 {
    (rms * 100.0 * DYNAMIC_FACTOR).clamp(MIN_THRESHOLD_PERCENT, MAX_THRESHOLD_PERCENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_OUTPUT: &str = "\
Samples read:             16000
Length (seconds):      1.000000
Scaled by:         2147483647.0
Maximum amplitude:     0.031250
Minimum amplitude:    -0.027344
Midline amplitude:     0.001953
Mean    norm:          0.004119
Mean    amplitude:    -0.000019
RMS     amplitude:     0.005437
Maximum delta:         0.023438
";

    #[test]
    fn test_parse_rms() {
        assert_eq!(parse_rms_amplitude(STAT_OUTPUT), Some(0.005437));
        assert_eq!(parse_rms_amplitude("garbage"), None);
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(threshold_from_rms(0.0), MIN_THRESHOLD_PERCENT);
        assert_eq!(threshold_from_rms(1.0), MAX_THRESHOLD_PERCENT);
        assert!((threshold_from_rms(0.02) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_capture_args_include_limits() {
        let recorder = SoxRecorder::new("rec");
        let args = recorder.capture_args("/tmp/x.flac", Duration::from_secs(10));
        assert!(args.contains(&"silence".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("10.0"));
        assert!(args.contains(&"1.00%".to_string()));
    }

    /// Stand-in recorder: a shell script receiving the capture arguments
    #[cfg(unix)]
    fn fake_recorder(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("rec");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_returns_when_recorder_exits() {
        let temp = tempfile::TempDir::new().unwrap();
        // Output path is the eighth argument
        let program = fake_recorder(temp.path(), "head -c 20000 /dev/zero > \"$8\"");
        let recorder = SoxRecorder::new(program);

        let started = std::time::Instant::now();
        let audio = recorder.capture(&CaptureLimits::default()).await.unwrap();

        assert_eq!(audio.bytes.len(), 20000);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_times_out_without_speech() {
        let temp = tempfile::TempDir::new().unwrap();
        let program = fake_recorder(temp.path(), "sleep 10");
        let recorder = SoxRecorder::new(program);
        let limits = CaptureLimits {
            start_timeout: Duration::from_millis(200),
            phrase_limit: Duration::from_secs(10),
        };

        let started = std::time::Instant::now();
        assert_eq!(recorder.capture(&limits).await.unwrap_err(), CaptureError::Timeout);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_calibrate_missing_program_fails() {
        let mut recorder = SoxRecorder::new("no-such-recorder-kyc");
        assert!(recorder.calibrate(Duration::from_millis(100)).await.is_err());
        assert_eq!(recorder.threshold_percent(), DEFAULT_THRESHOLD_PERCENT);
    }
}
