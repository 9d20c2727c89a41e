//! Slouch scoring against a calibration baseline

use pose_landmarks::{Baseline, LandmarkSnapshot};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Weight of the shoulder drop signal
pub const SHOULDER_WEIGHT: f64 = 0.8;
/// Weight of the neck angle signal
pub const ANGLE_WEIGHT: f64 = 0.1;
/// Weight of the nose-neck distance signal
pub const DISTANCE_WEIGHT: f64 = 0.4;
/// Percentage points per degree of neck angle change
pub const ANGLE_SCALE: f64 = 2.0;
/// Floor for a degenerate calibration nose-neck distance
pub const MIN_CALIBRATION_DISTANCE: f64 = 0.001;

/// Component signals of one slouch computation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlouchMetrics {
    /// Shoulder drop relative to the calibrated nose-shoulder height (%)
    pub shoulder_pct: f64,
    /// Change of the neck-to-nose direction (degrees)
    pub angle_deg: f64,
    pub angle_pct: f64,
    /// Live over calibrated nose-neck distance
    pub distance_ratio: f64,
    /// Shrinkage of the nose-neck distance (%)
    pub distance_pct: f64,
    /// Weighted composite
    pub slouch_pct: f64,
}

/// Compute the slouch signals of `live` against `baseline`
pub fn compute_metrics(baseline: &Baseline, live: &LandmarkSnapshot) -> SlouchMetrics {
    // Shoulders move down the frame (y grows) when slouching
    let avg_drop = ((live.left_shoulder.y - baseline.left_shoulder.y)
        + (live.right_shoulder.y - baseline.right_shoulder.y))
        / 2.0;
    let reference = baseline.nose_to_shoulder_height();
    let shoulder_pct = if reference > 0.0 {
        avg_drop / reference * 100.0
    } else {
        0.0
    };

    let angle_deg = neck_angle_change(baseline, live);
    let angle_pct = angle_deg * ANGLE_SCALE;

    let mut cal_distance = baseline.nose.xy_distance(&baseline.neck);
    if cal_distance <= 0.0 {
        cal_distance = MIN_CALIBRATION_DISTANCE;
    }
    let distance_ratio = live.nose.xy_distance(&live.neck) / cal_distance;
    let distance_pct = if distance_ratio < 1.0 {
        (1.0 - distance_ratio) * 100.0
    } else {
        0.0
    };

    let slouch_pct =
        shoulder_pct * SHOULDER_WEIGHT + angle_pct * ANGLE_WEIGHT + distance_pct * DISTANCE_WEIGHT;

    SlouchMetrics {
        shoulder_pct,
        angle_deg,
        angle_pct,
        distance_ratio,
        distance_pct,
        slouch_pct,
    }
}

/// Angle in degrees between the calibrated and live neck-to-nose directions.
/// Zero when either direction is undefined.
fn neck_angle_change(baseline: &Baseline, live: &LandmarkSnapshot) -> f64 {
    let (cx, cy) = baseline.neck.xy_vector_to(&baseline.nose);
    let (lx, ly) = live.neck.xy_vector_to(&live.nose);

    let cal_norm = (cx * cx + cy * cy).sqrt();
    let live_norm = (lx * lx + ly * ly).sqrt();
    if !(cal_norm > 0.0 && live_norm > 0.0) {
        return 0.0;
    }

    let dot = (cx / cal_norm) * (lx / live_norm) + (cy / cal_norm) * (ly / live_norm);
    dot.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Result of a scoring call
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlouchScore {
    pub is_slouching: bool,
    /// Raw slouch percentage, also meaningful below the threshold
    pub percentage: f64,
}

/// Last computed score
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreCache {
    pub score: SlouchScore,
    pub computed_at: Option<Instant>,
}

/// Threshold decision with throttled recomputation
#[derive(Debug, Clone)]
pub struct SlouchScorer {
    threshold_percentage: f64,
    recompute_interval: Duration,
    cache: ScoreCache,
}

impl SlouchScorer {
    pub fn new(threshold_percentage: f64, recompute_interval: Duration) -> Self {
        Self {
            threshold_percentage,
            recompute_interval,
            cache: ScoreCache::default(),
        }
    }

    /// Score `live` against `baseline`.
    ///
    /// With either input missing the result is not slouching with the last
    /// computed percentage. Within the recompute interval of the previous
    /// computation the cached score is returned as is.
    pub fn score(
        &mut self,
        baseline: Option<&Baseline>,
        live: Option<&LandmarkSnapshot>,
        now: Instant,
    ) -> SlouchScore {
        let (baseline, live) = match (baseline, live) {
            (Some(b), Some(l)) => (b, l),
            _ => {
                return SlouchScore {
                    is_slouching: false,
                    percentage: self.cache.score.percentage,
                }
            }
        };

        if let Some(at) = self.cache.computed_at {
            if now.saturating_duration_since(at) < self.recompute_interval {
                return self.cache.score;
            }
        }

        let metrics = compute_metrics(baseline, live);
        let score = SlouchScore {
            is_slouching: self.exceeds_threshold(metrics.slouch_pct),
            percentage: metrics.slouch_pct,
        };
        debug!(
            "Slouch {:.1}% (shoulder {:.1}%, angle {:.1}deg, distance {:.1}%), slouching={}",
            metrics.slouch_pct,
            metrics.shoulder_pct,
            metrics.angle_deg,
            metrics.distance_pct,
            score.is_slouching
        );

        self.cache = ScoreCache {
            score,
            computed_at: Some(now),
        };
        score
    }

    /// Strictly above the threshold counts as slouching
    pub fn exceeds_threshold(&self, percentage: f64) -> bool {
        percentage > self.threshold_percentage
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_percentage
    }

    /// Takes effect at the next recomputation
    pub fn set_threshold(&mut self, threshold_percentage: f64) {
        self.threshold_percentage = threshold_percentage;
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Forget the cached score so the next call recomputes
    pub fn reset(&mut self) {
        self.cache = ScoreCache::default();
    }
}
