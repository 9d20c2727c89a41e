//! Posture status shared with other threads
//!
//! The detector is the only writer. UI or alerting threads read the flags
//! and ask for a calibration through [`PostureStatus::request_calibration`],
//! which the detector picks up on its next frame.

use crate::calibration::CalibrationPhase;
use crate::scorer::SlouchScore;
use pose_landmarks::Baseline;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct PostureStatus {
    calibrated: AtomicBool,
    phase: AtomicU8,
    /// Flag and percentage are published together
    score: RwLock<SlouchScore>,
    calibration_requested: AtomicBool,
    baseline: RwLock<Option<Arc<Baseline>>>,
}

impl PostureStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> CalibrationPhase {
        CalibrationPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn is_calibrating(&self) -> bool {
        self.phase().is_active()
    }

    /// Last published score, flag and percentage from the same frame
    pub fn score(&self) -> SlouchScore {
        match self.score.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_slouching(&self) -> bool {
        self.score().is_slouching
    }

    pub fn slouch_percentage(&self) -> f64 {
        self.score().percentage
    }

    /// Current baseline, either the previous one or the new one as a whole
    pub fn baseline(&self) -> Option<Arc<Baseline>> {
        match self.baseline.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Ask the processing loop to start a calibration on its next frame
    pub fn request_calibration(&self) {
        self.calibration_requested.store(true, Ordering::Release);
    }

    pub fn calibration_requested(&self) -> bool {
        self.calibration_requested.load(Ordering::Acquire)
    }

    pub(crate) fn take_calibration_request(&self) -> bool {
        self.calibration_requested.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn publish_phase(&self, phase: CalibrationPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub(crate) fn publish_score(&self, score: SlouchScore) {
        match self.score.write() {
            Ok(mut guard) => *guard = score,
            Err(poisoned) => *poisoned.into_inner() = score,
        }
    }

    pub(crate) fn publish_baseline(&self, baseline: Option<Arc<Baseline>>) {
        let calibrated = baseline.is_some();
        match self.baseline.write() {
            Ok(mut guard) => *guard = baseline,
            Err(poisoned) => *poisoned.into_inner() = baseline,
        }
        self.calibrated.store(calibrated, Ordering::Release);
    }
}
