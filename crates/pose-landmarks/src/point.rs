//! 3D points in normalized camera space

use serde::{Deserialize, Serialize};

/// A point in normalized camera coordinates.
///
/// `x` and `y` are roughly in [0, 1] relative to the frame, `y` grows
/// downwards. `z` is depth relative to the hips and unitless.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Exact arithmetic midpoint of two points
    pub fn midpoint(a: Point3, b: Point3) -> Point3 {
        Point3 {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
            z: (a.z + b.z) / 2.0,
        }
    }

    /// Planar (x, y) vector from `self` to `other`
    pub fn xy_vector_to(&self, other: &Point3) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    /// Euclidean distance in the image plane, depth ignored
    pub fn xy_distance(&self, other: &Point3) -> f64 {
        let (dx, dy) = self.xy_vector_to(other);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Div<f64> for Point3 {
    type Output = Point3;

    fn div(self, rhs: f64) -> Point3 {
        Point3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}
