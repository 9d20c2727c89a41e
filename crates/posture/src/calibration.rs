//! Posture calibration session
//!
//! A calibration run goes `Idle -> Countdown -> Sampling -> Complete`. The
//! countdown gives the user time to sit up straight, sampling collects
//! snapshots at a bounded rate over a fixed window, and completion averages
//! them into a [`Baseline`].

use pose_landmarks::{Baseline, LandmarkSnapshot};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Calibration lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CalibrationPhase {
    #[default]
    Idle = 0,
    Countdown = 1,
    Sampling = 2,
    Complete = 3,
}

impl CalibrationPhase {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => CalibrationPhase::Countdown,
            2 => CalibrationPhase::Sampling,
            3 => CalibrationPhase::Complete,
            _ => CalibrationPhase::Idle,
        }
    }

    /// Countdown or sampling in progress
    pub fn is_active(&self) -> bool {
        matches!(self, CalibrationPhase::Countdown | CalibrationPhase::Sampling)
    }
}

/// Durations that shape a calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTiming {
    pub countdown: Duration,
    pub sample_interval: Duration,
    pub session_duration: Duration,
}

impl Default for CalibrationTiming {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(3),
            sample_interval: Duration::from_millis(100),
            session_duration: Duration::from_secs(3),
        }
    }
}

/// Calibration progress for display
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationProgress {
    pub phase: CalibrationPhase,
    /// Whole seconds left on the countdown, rounded up
    pub countdown_seconds: Option<u64>,
    /// Sampling progress (0-100)
    pub percent: u8,
}

/// Calibration state machine
#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    timing: CalibrationTiming,
    phase: CalibrationPhase,
    /// Start of the current phase (or of the current sampling window)
    phase_started: Option<Instant>,
    last_sample: Option<Instant>,
    samples: Vec<LandmarkSnapshot>,
    baseline: Option<Baseline>,
    /// Sampling windows that ended without a single sample
    empty_windows: u32,
}

impl CalibrationSession {
    pub fn new(timing: CalibrationTiming) -> Self {
        Self {
            timing,
            ..Default::default()
        }
    }

    /// Begin a calibration run. Any run in progress is discarded.
    pub fn start(&mut self, now: Instant) {
        if self.phase.is_active() {
            debug!("Restarting calibration from {:?}", self.phase);
        }
        self.phase = CalibrationPhase::Countdown;
        self.phase_started = Some(now);
        self.last_sample = None;
        self.samples.clear();
        self.baseline = None;
        self.empty_windows = 0;
        info!(
            "Calibration started, sampling begins in {:.1}s",
            self.timing.countdown.as_secs_f64()
        );
    }

    /// Advance the session by one frame.
    ///
    /// Returns `true` once the session is complete, including on every call
    /// after completion.
    pub fn tick(&mut self, snapshot: Option<&LandmarkSnapshot>, now: Instant) -> bool {
        match self.phase {
            CalibrationPhase::Idle => false,
            CalibrationPhase::Countdown => {
                if self.elapsed(now) >= self.timing.countdown {
                    self.phase = CalibrationPhase::Sampling;
                    self.phase_started = Some(now);
                    self.samples.clear();
                    self.last_sample = Some(now);
                    debug!("Countdown finished, sampling posture");
                }
                false
            }
            CalibrationPhase::Sampling => self.sample(snapshot, now),
            CalibrationPhase::Complete => true,
        }
    }

    fn sample(&mut self, snapshot: Option<&LandmarkSnapshot>, now: Instant) -> bool {
        if self.elapsed(now) < self.timing.session_duration {
            let due = self
                .last_sample
                .map_or(true, |t| now.saturating_duration_since(t) >= self.timing.sample_interval);
            if let (true, Some(s)) = (due, snapshot) {
                self.samples.push(*s);
                self.last_sample = Some(now);
            }
            return false;
        }

        // Window over: make sure at least one sample exists
        if self.samples.is_empty() {
            if let Some(s) = snapshot {
                self.samples.push(*s);
            }
        }

        match Baseline::from_samples(&self.samples) {
            Some(baseline) => {
                info!("Calibration complete with {} samples", self.samples.len());
                self.baseline = Some(baseline);
                self.samples.clear();
                self.phase = CalibrationPhase::Complete;
                true
            }
            None => {
                self.empty_windows += 1;
                warn!(
                    "No calibration samples collected yet, extending sampling (attempt {})",
                    self.empty_windows + 1
                );
                self.phase_started = Some(now);
                false
            }
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.phase_started
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == CalibrationPhase::Complete
    }

    /// Baseline produced by the last completed run
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn samples(&self) -> &[LandmarkSnapshot] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn timing(&self) -> CalibrationTiming {
        self.timing
    }

    /// Number of sampling windows that had to be repeated
    pub fn empty_windows(&self) -> u32 {
        self.empty_windows
    }

    /// Time left on the countdown, `None` outside the countdown
    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        (self.phase == CalibrationPhase::Countdown)
            .then(|| self.timing.countdown.saturating_sub(self.elapsed(now)))
    }

    /// Fraction of the current sampling window elapsed (0.0-1.0)
    pub fn sampling_progress(&self, now: Instant) -> f64 {
        match self.phase {
            CalibrationPhase::Sampling => {
                let total = self.timing.session_duration.as_secs_f64();
                if total <= 0.0 {
                    return 1.0;
                }
                (self.elapsed(now).as_secs_f64() / total).min(1.0)
            }
            CalibrationPhase::Complete => 1.0,
            _ => 0.0,
        }
    }

    pub fn progress(&self, now: Instant) -> CalibrationProgress {
        let countdown_seconds = self
            .countdown_remaining(now)
            .filter(|r| !r.is_zero())
            .map(|r| r.as_secs() + 1);

        CalibrationProgress {
            phase: self.phase,
            countdown_seconds,
            percent: (self.sampling_progress(now) * 100.0) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_landmarks::Point3;

    fn snap(y: f64) -> LandmarkSnapshot {
        LandmarkSnapshot::new(
            Point3::new(0.5, y - 0.2, 0.0),
            Point3::new(0.3, y, 0.0),
            Point3::new(0.7, y, 0.0),
            Point3::new(0.55, y - 0.22, 0.0),
            Point3::new(0.45, y - 0.22, 0.0),
        )
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Session past its countdown, sampling from `t0 + 3s`
    fn sampling_session(t0: Instant) -> CalibrationSession {
        let mut session = CalibrationSession::new(CalibrationTiming::default());
        session.start(t0);
        assert!(!session.tick(Some(&snap(0.5)), t0 + ms(3000)));
        assert_eq!(session.phase(), CalibrationPhase::Sampling);
        session
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut session = CalibrationSession::default();
        assert!(!session.tick(Some(&snap(0.5)), Instant::now()));
        assert_eq!(session.phase(), CalibrationPhase::Idle);
        assert_eq!(session.sample_count(), 0);
    }

    #[test]
    fn test_countdown_never_samples() {
        let t0 = Instant::now();
        let mut session = CalibrationSession::new(CalibrationTiming::default());
        session.start(t0);

        for step in 0..30 {
            assert!(!session.tick(Some(&snap(0.5)), t0 + ms(step * 99)));
            assert_eq!(session.phase(), CalibrationPhase::Countdown);
            assert_eq!(session.sample_count(), 0);
        }

        // The transition frame itself is not sampled
        assert!(!session.tick(Some(&snap(0.5)), t0 + ms(3000)));
        assert_eq!(session.phase(), CalibrationPhase::Sampling);
        assert_eq!(session.sample_count(), 0);

        session.tick(Some(&snap(0.5)), t0 + ms(3100));
        assert_eq!(session.sample_count(), 1);
    }

    #[test]
    fn test_sample_spacing() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);

        session.tick(Some(&snap(0.5)), start + ms(100));
        session.tick(Some(&snap(0.5)), start + ms(150));
        session.tick(Some(&snap(0.5)), start + ms(199));
        assert_eq!(session.sample_count(), 1);

        session.tick(Some(&snap(0.5)), start + ms(200));
        assert_eq!(session.sample_count(), 2);
    }

    #[test]
    fn test_missing_snapshot_not_sampled() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);

        session.tick(None, start + ms(100));
        assert_eq!(session.sample_count(), 0);
        // Still due on the next frame with a pose
        session.tick(Some(&snap(0.5)), start + ms(120));
        assert_eq!(session.sample_count(), 1);
    }

    #[test]
    fn test_completion_averages_samples() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);

        session.tick(Some(&snap(0.4)), start + ms(100));
        session.tick(Some(&snap(0.6)), start + ms(200));
        assert!(!session.tick(Some(&snap(0.6)), start + ms(2999)));
        assert_eq!(session.sample_count(), 3);

        // This frame only closes the window
        assert!(session.tick(Some(&snap(0.9)), start + ms(3000)));
        assert!(session.is_complete());
        assert_eq!(session.sample_count(), 0);

        let baseline = session.baseline().unwrap();
        let expected = (0.4 + 0.6 + 0.6) / 3.0;
        assert!((baseline.left_shoulder.y - expected).abs() < 1e-12);
        assert!((baseline.neck.y - expected).abs() < 1e-12);
    }

    #[test]
    fn test_completion_is_idempotent() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);
        session.tick(Some(&snap(0.5)), start + ms(100));
        assert!(session.tick(Some(&snap(0.5)), start + ms(3000)));

        let baseline = *session.baseline().unwrap();
        for i in 1..5 {
            assert!(session.tick(Some(&snap(0.9)), start + ms(3000 + i * 500)));
            assert_eq!(*session.baseline().unwrap(), baseline);
            assert_eq!(session.sample_count(), 0);
        }
    }

    #[test]
    fn test_forced_final_sample() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);

        // Nobody in frame for the whole window, then a pose appears
        session.tick(None, start + ms(1500));
        assert!(session.tick(Some(&snap(0.55)), start + ms(3000)));
        assert!((session.baseline().unwrap().left_shoulder.y - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_retries() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);

        assert!(!session.tick(None, start + ms(3000)));
        assert_eq!(session.phase(), CalibrationPhase::Sampling);
        assert_eq!(session.empty_windows(), 1);

        // A fresh window started at the retry
        assert!(!session.tick(Some(&snap(0.5)), start + ms(3100)));
        assert_eq!(session.sample_count(), 1);
        assert!(!session.tick(Some(&snap(0.5)), start + ms(5999)));
        assert!(session.tick(Some(&snap(0.5)), start + ms(6000)));
    }

    #[test]
    fn test_restart_discards_progress() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);
        session.tick(Some(&snap(0.5)), start + ms(100));
        assert_eq!(session.sample_count(), 1);

        session.start(start + ms(200));
        assert_eq!(session.phase(), CalibrationPhase::Countdown);
        assert_eq!(session.sample_count(), 0);
        assert!(session.baseline().is_none());
    }

    #[test]
    fn test_restart_after_completion() {
        let t0 = Instant::now();
        let mut session = sampling_session(t0);
        let start = t0 + ms(3000);
        session.tick(Some(&snap(0.5)), start + ms(100));
        assert!(session.tick(None, start + ms(3000)));

        session.start(start + ms(4000));
        assert!(!session.tick(Some(&snap(0.5)), start + ms(4100)));
        assert_eq!(session.phase(), CalibrationPhase::Countdown);
    }

    #[test]
    fn test_progress() {
        let t0 = Instant::now();
        let mut session = CalibrationSession::new(CalibrationTiming::default());
        assert_eq!(session.progress(t0).phase, CalibrationPhase::Idle);

        session.start(t0);
        let p = session.progress(t0 + ms(500));
        assert_eq!(p.phase, CalibrationPhase::Countdown);
        assert_eq!(p.countdown_seconds, Some(3));
        assert_eq!(p.percent, 0);
        assert_eq!(session.progress(t0 + ms(2500)).countdown_seconds, Some(1));

        session.tick(None, t0 + ms(3000));
        let p = session.progress(t0 + ms(4500));
        assert_eq!(p.phase, CalibrationPhase::Sampling);
        assert_eq!(p.countdown_seconds, None);
        assert_eq!(p.percent, 50);
    }
}
