//! Posture Monitoring
//!
//! Slouch detection against a personal baseline:
//! - Timed calibration that averages the user's upright posture
//! - Weighted slouch score from shoulder drop, neck angle, and nose-neck distance
//! - Throttled recomputation independent of the frame rate
//! - Baseline persistence across restarts

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod scorer;
pub mod status;

pub use analysis::{PostureAlert, PostureReading};
pub use calibration::{CalibrationPhase, CalibrationProgress, CalibrationSession, CalibrationTiming};
pub use config::PostureConfig;
pub use scorer::{compute_metrics, ScoreCache, SlouchMetrics, SlouchScore, SlouchScorer};
pub use status::PostureStatus;

use pose_landmarks::{extract, Baseline, LandmarkSnapshot, PoseLandmarks};
use std::sync::Arc;
use std::time::Instant;
use storage::{BaselineStore, LoadError};
use thiserror::Error;
use tracing::{error, info, warn};

/// Posture error types
#[derive(Error, Debug)]
pub enum PostureError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Slouch detector: calibration, scoring, and baseline persistence
pub struct SlouchDetector {
    config: PostureConfig,
    store: BaselineStore,
    session: CalibrationSession,
    scorer: SlouchScorer,
    baseline: Option<Arc<Baseline>>,
    /// Last completed calibration could not be written to disk
    unsaved: bool,
    status: Arc<PostureStatus>,
}

impl SlouchDetector {
    /// Create a detector storing its baseline at the configured path
    pub fn new(config: PostureConfig) -> Result<Self, PostureError> {
        let store = BaselineStore::new(config.baseline_path());
        Self::with_store(config, store)
    }

    /// Create a detector with an explicit store.
    ///
    /// A previously saved baseline is restored once here. Failing to restore
    /// it leaves the detector uncalibrated.
    pub fn with_store(config: PostureConfig, store: BaselineStore) -> Result<Self, PostureError> {
        config.validate()?;

        let mut detector = Self {
            session: CalibrationSession::new(config.calibration_timing()),
            scorer: SlouchScorer::new(config.threshold_percentage, config.recompute_interval()),
            store,
            config,
            baseline: None,
            unsaved: false,
            status: Arc::new(PostureStatus::new()),
        };
        detector.restore_baseline();
        Ok(detector)
    }

    fn restore_baseline(&mut self) {
        match self.store.load() {
            Ok(baseline) => self.install_baseline(Some(baseline)),
            Err(LoadError::NotFound(path)) => {
                info!("No saved calibration at {}, calibration needed", path.display());
            }
            Err(e) => warn!("Ignoring saved calibration: {}", e),
        }
    }

    fn install_baseline(&mut self, baseline: Option<Baseline>) {
        let baseline = baseline.map(Arc::new);
        self.status.publish_baseline(baseline.clone());
        self.baseline = baseline;
    }

    /// Start (or restart) a calibration run
    pub fn start_calibration(&mut self, now: Instant) {
        self.session.start(now);
        self.status.publish_phase(self.session.phase());
        // Readings carry no score until the run completes
        self.status.publish_score(SlouchScore::default());
    }

    /// Process the pose detected in one frame, if any
    pub fn process_frame(&mut self, pose: Option<&PoseLandmarks>, now: Instant) -> PostureReading {
        let snapshot = pose.and_then(|p| extract(p));
        self.observe(snapshot.as_ref(), now)
    }

    /// Process an already extracted snapshot
    pub fn observe(&mut self, snapshot: Option<&LandmarkSnapshot>, now: Instant) -> PostureReading {
        if self.status.take_calibration_request() {
            self.start_calibration(now);
        }

        let mut calibration_completed = false;
        if self.session.is_active() {
            // Only the transition into Complete counts, later ticks are no-ops
            if self.session.tick(snapshot, now) {
                calibration_completed = true;
                self.finish_calibration();
            }
            self.status.publish_phase(self.session.phase());
        }

        let score = if self.session.is_active() {
            None
        } else if let Some(baseline) = self.baseline.clone() {
            let score = self.scorer.score(Some(&*baseline), snapshot, now);
            self.status.publish_score(score);
            Some(score)
        } else {
            None
        };

        let mut alerts = Vec::new();
        if score.map_or(false, |s| s.is_slouching) {
            alerts.push(PostureAlert::Slouching);
        }
        if self.baseline.is_none() && !self.session.is_active() {
            alerts.push(PostureAlert::CalibrationNeeded);
        }
        if self.unsaved {
            alerts.push(PostureAlert::BaselineNotPersisted);
        }

        PostureReading {
            pose_detected: snapshot.is_some(),
            calibration: self.session.progress(now),
            calibration_completed,
            calibrated: self.baseline.is_some(),
            score,
            threshold_percentage: self.scorer.threshold(),
            alerts,
        }
    }

    fn finish_calibration(&mut self) {
        let Some(baseline) = self.session.baseline().copied() else {
            return;
        };

        match self.store.save(&baseline) {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                error!("Calibration not persisted: {}", e);
                self.unsaved = true;
            }
        }

        self.scorer.reset();
        self.install_baseline(Some(baseline));
    }

    /// Forget the baseline, in memory and on disk
    pub fn reset_calibration(&mut self) -> std::io::Result<()> {
        self.session = CalibrationSession::new(self.config.calibration_timing());
        self.scorer.reset();
        self.unsaved = false;
        self.install_baseline(None);
        self.status.publish_phase(self.session.phase());
        self.status.publish_score(SlouchScore::default());
        self.store.clear()
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.session.phase()
    }

    pub fn is_calibrating(&self) -> bool {
        self.session.is_active()
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<Arc<Baseline>> {
        self.baseline.clone()
    }

    pub fn calibration_progress(&self, now: Instant) -> CalibrationProgress {
        self.session.progress(now)
    }

    /// Handle for reading state from other threads
    pub fn status(&self) -> Arc<PostureStatus> {
        Arc::clone(&self.status)
    }

    pub fn threshold(&self) -> f64 {
        self.scorer.threshold()
    }

    pub fn set_threshold(&mut self, threshold_percentage: f64) -> Result<(), PostureError> {
        if !threshold_percentage.is_finite() || threshold_percentage < 0.0 {
            return Err(PostureError::Config(format!(
                "threshold_percentage must be a non-negative number, got {}",
                threshold_percentage
            )));
        }
        self.config.threshold_percentage = threshold_percentage;
        self.scorer.set_threshold(threshold_percentage);
        Ok(())
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_landmarks::{Landmark, PoseIndex};
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn pose(shoulder_y: f64) -> PoseLandmarks {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); PoseIndex::POSE_LANDMARK_COUNT];
        landmarks[PoseIndex::NOSE] = Landmark::new(0.5, 0.3, 0.0);
        landmarks[PoseIndex::LEFT_EAR] = Landmark::new(0.55, 0.28, 0.0);
        landmarks[PoseIndex::RIGHT_EAR] = Landmark::new(0.45, 0.28, 0.0);
        landmarks[PoseIndex::LEFT_SHOULDER] = Landmark::new(0.3, shoulder_y, 0.0);
        landmarks[PoseIndex::RIGHT_SHOULDER] = Landmark::new(0.7, shoulder_y, 0.0);
        PoseLandmarks::new(landmarks)
    }

    fn detector_in(dir: &tempfile::TempDir) -> SlouchDetector {
        let config = PostureConfig {
            data_dir: dir.path().join("data"),
            ..Default::default()
        };
        SlouchDetector::new(config).unwrap()
    }

    /// Run a full calibration on an upright pose, returns the time it finished
    fn calibrate(detector: &mut SlouchDetector, t0: Instant) -> Instant {
        let upright = pose(0.5);
        detector.start_calibration(t0);
        let mut t = t0;
        loop {
            let reading = detector.process_frame(Some(&upright), t);
            if reading.calibration_completed {
                return t;
            }
            assert!(t < t0 + ms(10_000), "calibration did not finish");
            t += ms(50);
        }
    }

    #[test]
    fn test_starts_uncalibrated() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        assert!(!detector.is_calibrated());
        assert_eq!(detector.phase(), CalibrationPhase::Idle);

        let reading = detector.process_frame(Some(&pose(0.6)), Instant::now());
        assert!(reading.pose_detected);
        assert!(reading.score.is_none());
        assert_eq!(reading.alerts, vec![PostureAlert::CalibrationNeeded]);
    }

    #[test]
    fn test_calibrate_then_score() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        let t0 = Instant::now();

        let done = calibrate(&mut detector, t0);
        assert!(done >= t0 + ms(6000));
        assert!(detector.is_calibrated());
        assert_eq!(detector.phase(), CalibrationPhase::Complete);
        assert!(detector.store().path().exists());

        let baseline = detector.baseline().unwrap();
        assert!((baseline.nose.y - 0.3).abs() < 1e-12);
        assert!((baseline.neck.y - 0.5).abs() < 1e-12);

        let reading = detector.process_frame(Some(&pose(0.5)), done + ms(100));
        assert_eq!(reading.score.unwrap().percentage, 0.0);
        assert!(!reading.is_slouching());

        let reading = detector.process_frame(Some(&pose(0.55)), done + ms(200));
        let score = reading.score.unwrap();
        assert!((score.percentage - 20.0).abs() < 1e-9);
        assert!(score.is_slouching);
        assert_eq!(reading.alerts, vec![PostureAlert::Slouching]);
        assert!(detector.status().is_slouching());
    }

    #[test]
    fn test_no_scoring_while_calibrating() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        let t0 = Instant::now();
        detector.start_calibration(t0);

        let reading = detector.process_frame(Some(&pose(0.5)), t0 + ms(500));
        assert!(detector.is_calibrating());
        assert!(reading.score.is_none());
        assert!(reading.alerts.is_empty());
        assert_eq!(reading.calibration.countdown_seconds, Some(3));
    }

    #[test]
    fn test_baseline_restored_on_construction() {
        let dir = tempfile::tempdir().unwrap();
        let t0 = Instant::now();
        let saved = {
            let mut detector = detector_in(&dir);
            calibrate(&mut detector, t0);
            detector.baseline().unwrap()
        };

        let detector = detector_in(&dir);
        assert!(detector.is_calibrated());
        assert!(detector.status().is_calibrated());
        assert_eq!(*detector.baseline().unwrap(), *saved);
        assert_eq!(detector.phase(), CalibrationPhase::Idle);
    }

    #[test]
    fn test_corrupt_baseline_leaves_uncalibrated() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("posture_calibration.bin"), b"garbage").unwrap();

        let detector = detector_in(&dir);
        assert!(!detector.is_calibrated());
    }

    #[test]
    fn test_save_failure_keeps_baseline_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the data directory should be
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"").unwrap();

        let mut detector = detector_in(&dir);
        let t0 = Instant::now();
        let done = calibrate(&mut detector, t0);

        assert!(detector.is_calibrated());
        let reading = detector.process_frame(Some(&pose(0.5)), done + ms(100));
        assert!(reading.alerts.contains(&PostureAlert::BaselineNotPersisted));
    }

    #[test]
    fn test_calibration_request_from_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        let status = detector.status();

        status.request_calibration();
        assert!(!status.is_calibrating());

        detector.process_frame(None, Instant::now());
        assert!(detector.is_calibrating());
        assert!(status.is_calibrating());
        assert_eq!(status.phase(), CalibrationPhase::Countdown);
    }

    #[test]
    fn test_recalibration_replaces_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        let t0 = Instant::now();
        let done = calibrate(&mut detector, t0);
        let first = detector.baseline().unwrap();

        // Old baseline stays installed until the new run completes
        detector.start_calibration(done + ms(1000));
        assert!(detector.is_calibrated());

        let slumped = pose(0.56);
        let mut t = done + ms(1000);
        while !detector.process_frame(Some(&slumped), t).calibration_completed {
            t += ms(50);
        }

        let second = detector.baseline().unwrap();
        assert_ne!(*first, *second);
        assert!((second.left_shoulder.y - 0.56).abs() < 1e-12);
        assert_eq!(detector.store().load().unwrap(), *second);
    }

    #[test]
    fn test_recalibration_clears_published_score() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        let status = detector.status();
        let done = calibrate(&mut detector, Instant::now());

        let reading = detector.process_frame(Some(&pose(0.6)), done + ms(100));
        assert!(reading.is_slouching());
        assert!(status.is_slouching());

        detector.start_calibration(done + ms(200));
        let reading = detector.process_frame(Some(&pose(0.6)), done + ms(300));
        assert!(reading.score.is_none());
        assert!(!status.is_slouching());
        assert_eq!(status.slouch_percentage(), 0.0);
        assert_eq!(status.score(), SlouchScore::default());
    }

    #[test]
    fn test_reset_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        calibrate(&mut detector, Instant::now());

        detector.reset_calibration().unwrap();
        assert!(!detector.is_calibrated());
        assert!(!detector.status().is_calibrated());
        assert!(!detector.store().path().exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PostureConfig {
            threshold_percentage: -1.0,
            ..Default::default()
        };
        assert!(matches!(SlouchDetector::new(config), Err(PostureError::Config(_))));
    }

    #[test]
    fn test_set_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut detector = detector_in(&dir);
        detector.set_threshold(30.0).unwrap();
        assert_eq!(detector.threshold(), 30.0);
        assert!(detector.set_threshold(f64::INFINITY).is_err());
        assert_eq!(detector.threshold(), 30.0);
    }
}
