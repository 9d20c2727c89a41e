//! Posture detection configuration

use crate::calibration::CalibrationTiming;
use crate::PostureError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Posture detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Slouch percentage above which the user counts as slouching
    pub threshold_percentage: f64,

    /// Countdown before calibration sampling starts (milliseconds)
    pub countdown_ms: u64,

    /// Minimum spacing between calibration samples (milliseconds)
    pub sample_interval_ms: u64,

    /// Length of the calibration sampling window (milliseconds)
    pub calibration_duration_ms: u64,

    /// Minimum spacing between slouch recomputations (milliseconds)
    pub recompute_interval_ms: u64,

    /// Application data directory
    pub data_dir: PathBuf,

    /// Baseline file name inside `data_dir`
    pub baseline_file: String,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            threshold_percentage: 15.0,
            countdown_ms: 3000,
            sample_interval_ms: 100,
            calibration_duration_ms: 3000,
            recompute_interval_ms: 100,
            data_dir: PathBuf::from("data"),
            baseline_file: "posture_calibration.bin".to_string(),
        }
    }
}

impl PostureConfig {
    /// Create strict config (alerts on smaller deviations)
    pub fn strict() -> Self {
        Self {
            threshold_percentage: 10.0,
            ..Default::default()
        }
    }

    /// Create lenient config (tolerates larger deviations)
    pub fn lenient() -> Self {
        Self {
            threshold_percentage: 25.0,
            ..Default::default()
        }
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.data_dir.join(&self.baseline_file)
    }

    pub fn calibration_timing(&self) -> CalibrationTiming {
        CalibrationTiming {
            countdown: Duration::from_millis(self.countdown_ms),
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            session_duration: Duration::from_millis(self.calibration_duration_ms),
        }
    }

    pub fn recompute_interval(&self) -> Duration {
        Duration::from_millis(self.recompute_interval_ms)
    }

    pub fn validate(&self) -> Result<(), PostureError> {
        if !self.threshold_percentage.is_finite() || self.threshold_percentage < 0.0 {
            return Err(PostureError::Config(format!(
                "threshold_percentage must be a non-negative number, got {}",
                self.threshold_percentage
            )));
        }
        if self.calibration_duration_ms == 0 {
            return Err(PostureError::Config(
                "calibration_duration_ms must be greater than zero".into(),
            ));
        }
        if self.baseline_file.trim().is_empty() {
            return Err(PostureError::Config("baseline_file must not be empty".into()));
        }
        Ok(())
    }
}
