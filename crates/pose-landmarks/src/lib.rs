//! Pose Landmark Library for Posture Monitoring
//!
//! Provides the data model shared by the posture pipeline:
//! - Per-frame pose landmarks as delivered by the landmark detector
//! - Six-point upper-body snapshots (shoulders, neck, nose, ears)
//! - Calibration baselines averaged from snapshots

pub mod baseline;
pub mod point;
pub mod snapshot;
pub mod source;

pub use baseline::Baseline;
pub use point::Point3;
pub use snapshot::{extract, LandmarkKey, LandmarkSnapshot};
pub use source::{Landmark, PoseLandmarks, PoseSource, MIN_SHOULDER_VISIBILITY};

/// Landmark indices used for posture, in the detector's fixed 33-point numbering
pub struct PoseIndex;

impl PoseIndex {
    pub const NOSE: usize = 0;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;

    /// Number of landmarks a full body pose carries
    pub const POSE_LANDMARK_COUNT: usize = 33;
}
