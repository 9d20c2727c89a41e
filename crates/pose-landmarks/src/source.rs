//! Pose landmark sources

use crate::point::Point3;
use serde::{Deserialize, Serialize};

/// A single landmark as delivered by the pose detector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Likelihood the landmark is visible in the frame (0-1)
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

fn default_visibility() -> f64 {
    1.0
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: 1.0,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Anything that exposes landmarks by anatomical index.
///
/// Returns `None` for indices the source does not carry.
pub trait PoseSource {
    fn landmark(&self, index: usize) -> Option<Landmark>;
}

impl PoseSource for [Landmark] {
    fn landmark(&self, index: usize) -> Option<Landmark> {
        self.get(index).copied()
    }
}

impl PoseSource for Vec<Landmark> {
    fn landmark(&self, index: usize) -> Option<Landmark> {
        self.get(index).copied()
    }
}

/// Visibility both shoulders need before the shoulder line is worth showing
pub const MIN_SHOULDER_VISIBILITY: f64 = 0.5;

/// Landmarks for one detected pose in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmarks {
    pub landmarks: Vec<Landmark>,
}

impl PoseLandmarks {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Both shoulders visible above the given confidence
    pub fn shoulders_visible(&self, min_visibility: f64) -> bool {
        [crate::PoseIndex::LEFT_SHOULDER, crate::PoseIndex::RIGHT_SHOULDER]
            .iter()
            .all(|&idx| {
                self.landmark(idx)
                    .map_or(false, |l| l.visibility > min_visibility)
            })
    }
}

impl PoseSource for PoseLandmarks {
    fn landmark(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }
}

impl<T: PoseSource + ?Sized> PoseSource for &T {
    fn landmark(&self, index: usize) -> Option<Landmark> {
        (**self).landmark(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoseIndex;

    #[test]
    fn test_slice_source_bounds() {
        let points = vec![Landmark::new(0.1, 0.2, 0.3); 3];
        assert!(points.as_slice().landmark(2).is_some());
        assert!(points.as_slice().landmark(3).is_none());
    }

    #[test]
    fn test_shoulders_visible() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); PoseIndex::POSE_LANDMARK_COUNT];
        let pose = PoseLandmarks::new(landmarks.clone());
        assert!(pose.shoulders_visible(0.5));

        landmarks[PoseIndex::RIGHT_SHOULDER] = Landmark::new(0.5, 0.5, 0.0).with_visibility(0.2);
        let pose = PoseLandmarks::new(landmarks);
        assert!(!pose.shoulders_visible(0.5));
    }

    #[test]
    fn test_visibility_defaults_when_missing() {
        let l: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":0.0}"#).unwrap();
        assert_eq!(l.visibility, 1.0);
    }
}
