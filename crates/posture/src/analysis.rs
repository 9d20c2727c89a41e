//! Per-frame posture readings and alerts

use crate::calibration::CalibrationProgress;
use crate::scorer::SlouchScore;
use serde::{Deserialize, Serialize};

/// Upper bound of the display ratio while below the threshold
const MAX_DISPLAY_RATIO: f64 = 0.9;

/// Posture alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureAlert {
    /// Slouch percentage above the threshold
    Slouching,

    /// No baseline yet, posture cannot be scored
    CalibrationNeeded,

    /// Calibration finished but the baseline could not be saved
    BaselineNotPersisted,
}

/// Posture state for one processed frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostureReading {
    /// Whether a usable pose was found in the frame
    pub pose_detected: bool,

    /// Calibration phase and progress
    pub calibration: CalibrationProgress,

    /// Calibration completed on this frame
    pub calibration_completed: bool,

    /// Whether a baseline is installed
    pub calibrated: bool,

    /// Slouch score (absent while uncalibrated or calibrating)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<SlouchScore>,

    /// Threshold the score was judged against
    pub threshold_percentage: f64,

    /// Active alerts
    pub alerts: Vec<PostureAlert>,
}

impl PostureReading {
    pub fn is_slouching(&self) -> bool {
        self.score.map_or(false, |s| s.is_slouching)
    }

    pub fn slouch_percentage(&self) -> Option<f64> {
        self.score.map(|s| s.percentage)
    }

    /// Check if any alerts are active
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// How close a below-threshold posture is to the threshold, for a
    /// green-to-yellow gradient. Capped at 0.9 so it never reads as an alert.
    pub fn display_ratio(&self) -> Option<f64> {
        let score = self.score?;
        if score.is_slouching {
            return None;
        }
        if self.threshold_percentage <= 0.0 {
            return Some(MAX_DISPLAY_RATIO);
        }
        Some((score.percentage / self.threshold_percentage).clamp(0.0, MAX_DISPLAY_RATIO))
    }

    /// One-line status text
    pub fn summary(&self) -> String {
        match self.score {
            Some(s) if s.is_slouching => format!(
                "Slouching: {}% (Threshold: {}%)",
                s.percentage as i64, self.threshold_percentage
            ),
            Some(s) => format!(
                "Posture: {}% (Threshold: {}%)",
                s.percentage as i64, self.threshold_percentage
            ),
            None if self.calibration.phase.is_active() => "Calibrating posture...".to_string(),
            None => "Posture: N/A (Calibration needed)".to_string(),
        }
    }
}
