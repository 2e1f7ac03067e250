//! Player movement with wall collision.

use std::collections::HashSet;
use std::time::Duration;

use maze_math::{add_and_normalize, Point3};
use maze_raytrace::{BoundaryOrder, Octree, Ray};

use crate::camera::Pose;

/// Distance moved per step at factor 1.
pub const DEFAULT_VELOCITY: f64 = 0.25;

/// A player walking through the maze.
#[derive(Debug, Clone)]
pub struct Player {
    /// Current pose.
    pub pose: Pose,
    /// Distance moved per step at factor 1.
    pub velocity: f64,
    /// Heading change per step, in radians.
    pub rot_velocity: f64,
    visited: HashSet<(i64, i64)>,
}

impl Player {
    /// Player standing at `pose`.
    pub fn new(pose: Pose) -> Self {
        let mut player = Self {
            pose,
            velocity: DEFAULT_VELOCITY,
            rot_velocity: 0.0,
            visited: HashSet::new(),
        };
        player.mark_visited();
        player
    }

    /// Advance one step scaled by `factor`.
    ///
    /// The x and y displacements are probed separately. If the probe along
    /// an axis hits a surface the player bounces back along that axis instead.
    /// The heading then turns by `rot_velocity`.
    pub fn step(&mut self, octree: &Octree, factor: f64) {
        let order = BoundaryOrder::default();
        let heading = self.pose.heading;

        let dx = self.velocity * factor * heading.sin();
        let p = self.pose.position;
        let probe = Ray::new(p, Point3::new(p.x + dx, p.y, p.z));
        let blocked = octree.trace(&probe, &order).is_some();
        self.pose.position.x += if blocked { -dx } else { dx };

        let dy = self.velocity * factor * heading.cos();
        let p = self.pose.position;
        let probe = Ray::new(p, Point3::new(p.x, p.y + dy, p.z));
        let blocked = octree.trace(&probe, &order).is_some();
        self.pose.position.y += if blocked { -dy } else { dy };

        self.pose.heading = add_and_normalize(self.pose.heading, self.rot_velocity);
        self.mark_visited();
    }

    /// Whether the player has stood in the unit cell containing (`x`, `y`).
    pub fn has_visited(&self, x: f64, y: f64) -> bool {
        self.visited.contains(&cell(x, y))
    }

    /// Number of distinct unit cells visited.
    pub fn visited_cells(&self) -> usize {
        self.visited.len()
    }

    fn mark_visited(&mut self) {
        let p = self.pose.position;
        self.visited.insert(cell(p.x, p.y));
    }
}

fn cell(x: f64, y: f64) -> (i64, i64) {
    (x.floor() as i64, y.floor() as i64)
}

/// Movement scale for a frame that took `elapsed` against a `budget`.
///
/// Frames within budget move by the nominal step; slower frames move
/// proportionally further so speed stays constant in wall time.
pub fn frame_factor(elapsed: Duration, budget: Duration) -> f64 {
    if budget.is_zero() || elapsed <= budget {
        return 1.0;
    }
    let budget = budget.as_secs_f64();
    1.0 + (elapsed.as_secs_f64() - budget) / budget
}
