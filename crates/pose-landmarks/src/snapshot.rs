//! Upper-body landmark snapshots

use crate::point::Point3;
use crate::source::PoseSource;
use crate::PoseIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Named points of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKey {
    LeftShoulder,
    RightShoulder,
    Neck,
    Nose,
    LeftEar,
    RightEar,
}

impl LandmarkKey {
    pub const ALL: [LandmarkKey; 6] = [
        LandmarkKey::LeftShoulder,
        LandmarkKey::RightShoulder,
        LandmarkKey::Neck,
        LandmarkKey::Nose,
        LandmarkKey::LeftEar,
        LandmarkKey::RightEar,
    ];
}

/// The six points posture analysis works on, taken from one frame.
///
/// `neck` is not a detector landmark: it is always the midpoint of the
/// two shoulders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    pub left_shoulder: Point3,
    pub right_shoulder: Point3,
    pub neck: Point3,
    pub nose: Point3,
    pub left_ear: Point3,
    pub right_ear: Point3,
}

impl LandmarkSnapshot {
    /// Build a snapshot, deriving the neck from the shoulders
    pub fn new(
        nose: Point3,
        left_shoulder: Point3,
        right_shoulder: Point3,
        left_ear: Point3,
        right_ear: Point3,
    ) -> Self {
        Self {
            left_shoulder,
            right_shoulder,
            neck: Point3::midpoint(left_shoulder, right_shoulder),
            nose,
            left_ear,
            right_ear,
        }
    }

    pub fn get(&self, key: LandmarkKey) -> Point3 {
        match key {
            LandmarkKey::LeftShoulder => self.left_shoulder,
            LandmarkKey::RightShoulder => self.right_shoulder,
            LandmarkKey::Neck => self.neck,
            LandmarkKey::Nose => self.nose,
            LandmarkKey::LeftEar => self.left_ear,
            LandmarkKey::RightEar => self.right_ear,
        }
    }

    pub fn get_mut(&mut self, key: LandmarkKey) -> &mut Point3 {
        match key {
            LandmarkKey::LeftShoulder => &mut self.left_shoulder,
            LandmarkKey::RightShoulder => &mut self.right_shoulder,
            LandmarkKey::Neck => &mut self.neck,
            LandmarkKey::Nose => &mut self.nose,
            LandmarkKey::LeftEar => &mut self.left_ear,
            LandmarkKey::RightEar => &mut self.right_ear,
        }
    }

    /// Iterate `(key, point)` pairs in `LandmarkKey::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkKey, Point3)> + '_ {
        LandmarkKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, p)| p.is_finite())
    }

    /// Mean of the two shoulder heights
    pub fn shoulder_midline_y(&self) -> f64 {
        (self.left_shoulder.y + self.right_shoulder.y) / 2.0
    }
}

/// Project a pose into a snapshot.
///
/// Returns `None` when any required landmark is missing or carries a
/// non-finite coordinate. Partial snapshots are never produced.
pub fn extract<S: PoseSource + ?Sized>(source: &S) -> Option<LandmarkSnapshot> {
    let point = |idx: usize| source.landmark(idx).map(|l| l.position());

    let snapshot = LandmarkSnapshot::new(
        point(PoseIndex::NOSE)?,
        point(PoseIndex::LEFT_SHOULDER)?,
        point(PoseIndex::RIGHT_SHOULDER)?,
        point(PoseIndex::LEFT_EAR)?,
        point(PoseIndex::RIGHT_EAR)?,
    );

    if !snapshot.is_finite() {
        debug!("Discarding pose with non-finite landmark coordinates");
        return None;
    }

    Some(snapshot)
}
