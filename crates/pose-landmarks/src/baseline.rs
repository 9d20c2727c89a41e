//! Calibration baselines

use crate::point::Point3;
use crate::snapshot::{LandmarkKey, LandmarkSnapshot};
use serde::{Deserialize, Serialize};

/// Reference posture averaged from calibration samples.
///
/// Only constructible from at least one snapshot, or by deserializing a
/// previously saved baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baseline(LandmarkSnapshot);

impl Baseline {
    /// Per-key, per-coordinate arithmetic mean of `samples`.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_samples(samples: &[LandmarkSnapshot]) -> Option<Baseline> {
        let (first, rest) = samples.split_first()?;
        let n = samples.len() as f64;

        let mut sum = *first;
        for sample in rest {
            for key in LandmarkKey::ALL {
                let acc = sum.get_mut(key);
                *acc = *acc + sample.get(key);
            }
        }

        for key in LandmarkKey::ALL {
            let acc = sum.get_mut(key);
            *acc = *acc / n;
        }

        Some(Baseline(sum))
    }

    /// Wrap a snapshot that is already a reference posture
    pub fn from_snapshot(snapshot: LandmarkSnapshot) -> Baseline {
        Baseline(snapshot)
    }

    pub fn landmarks(&self) -> &LandmarkSnapshot {
        &self.0
    }

    pub fn get(&self, key: LandmarkKey) -> Point3 {
        self.0.get(key)
    }

    /// Vertical nose to shoulder-midline distance, the scale for shoulder drop
    pub fn nose_to_shoulder_height(&self) -> f64 {
        (self.0.nose.y - self.0.shoulder_midline_y()).abs()
    }
}

impl std::ops::Deref for Baseline {
    type Target = LandmarkSnapshot;

    fn deref(&self) -> &LandmarkSnapshot {
        &self.0
    }
}
