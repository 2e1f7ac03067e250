//! Camera pose and per-pixel view angle tables.

use maze_math::{add_and_normalize, Point3};
use std::f64::consts::FRAC_PI_2;

/// Eye position and view direction.
///
/// `heading` is measured from +y towards +x. `pitch` is measured from +z, so
/// `π/2` looks level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Eye position.
    pub position: Point3,
    /// Horizontal angle in radians.
    pub heading: f64,
    /// Vertical angle in radians.
    pub pitch: f64,
}

impl Pose {
    /// Create a pose.
    pub fn new(position: Point3, heading: f64, pitch: f64) -> Self {
        Self {
            position,
            heading,
            pitch,
        }
    }

    /// Level pose looking along +y.
    pub fn level(position: Point3) -> Self {
        Self::new(position, 0.0, FRAC_PI_2)
    }

    /// Far end of a camera ray offset from the view direction by the given
    /// horizontal and vertical angles.
    ///
    /// The horizontal and vertical parts are applied independently: x and y
    /// follow the heading, z follows the pitch.
    pub fn far_point(&self, h_offset: f64, v_offset: f64, far: f64) -> Point3 {
        let h = add_and_normalize(self.heading, h_offset);
        let v = add_and_normalize(self.pitch, v_offset);
        Point3::new(
            self.position.x + h.sin() * far,
            self.position.y + h.cos() * far,
            self.position.z + v.cos() * far,
        )
    }
}

/// Angular offset of every screen column and row from the view direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewAngles {
    /// One entry per screen column, negative on the left.
    pub horizontal: Vec<f64>,
    /// One entry per screen row, negative towards the top.
    pub vertical: Vec<f64>,
}

impl ViewAngles {
    /// Build the tables for a `width` x `height` screen.
    ///
    /// Each axis steps by `(len / 2 + 0.5) / width` per pixel, so both
    /// tables are scaled by the screen width.
    pub fn new(width: usize, height: usize, focal_depth: f64) -> Self {
        let pitch = |len: usize| (len as f64 / 2.0 + 0.5) / width as f64;
        Self {
            horizontal: offsets(width, pitch(width), focal_depth),
            vertical: offsets(height, pitch(height), focal_depth),
        }
    }
}

/// Symmetric angle table. For an odd length the centre entry is zero.
fn offsets(len: usize, pitch: f64, depth: f64) -> Vec<f64> {
    let mut angles = vec![0.0; len];
    let half = len / 2;
    let right = half + len % 2;
    for i in 0..half {
        let angle = ((0.5 + i as f64 * pitch) / depth).atan();
        angles[half - 1 - i] = -angle;
        angles[right + i] = angle;
    }
    angles
}
