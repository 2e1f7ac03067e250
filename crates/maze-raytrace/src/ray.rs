//! Ray representation.

use maze_math::{distance_squared, Point3, Vec3};

/// A finite directed segment from `start` to `end`.
///
/// Camera rays run from the eye to a far point; boundary probes and movement
/// probes are short segments. Intersections are only reported on the segment
/// itself, never on the infinite line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point of the segment.
    pub start: Point3,
    /// End point of the segment.
    pub end: Point3,
}

impl Ray {
    /// Create a new ray from `start` to `end`.
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Unnormalized direction `end - start`.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    /// Evaluate the segment at parameter `t`: `start + t * (end - start)`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.start + t * self.direction()
    }

    /// Squared length of the segment.
    #[inline]
    pub fn length_squared(&self) -> f64 {
        distance_squared(&self.start, &self.end)
    }
}
