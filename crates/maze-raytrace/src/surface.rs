//! Planar parallelogram surfaces and the ray/surface intersection test.

use maze_math::{ratio_in_unit_range, Point3, Vec3, MICRO};
use serde::{Deserialize, Serialize};

use crate::Ray;

/// Index of a surface in the octree's surface table.
pub type SurfaceId = usize;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Opaque black, used for background pixels.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White, the default surface color.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Darken this color with distance.
    ///
    /// Each channel loses `min(ln(distance) * scale, cap)`, with a half-step
    /// bias that tints far surfaces slightly warm. Channels saturate at
    /// `0..=255`.
    pub fn attenuate(self, distance: f64, scale: f64, cap: f64) -> Self {
        let offset = (distance.ln() * scale).min(cap);
        let channel = |c: u8, bias: f64| (f64::from(c) - (offset + bias)).clamp(0.0, 255.0) as u8;
        Self {
            r: channel(self.r, -0.5),
            g: channel(self.g, 0.0),
            b: channel(self.b, 0.5),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A parallelogram spanned by two edges from a shared origin.
///
/// The fourth corner is always `edge1_target + (edge2_target - origin)`;
/// general quads are not representable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Shared corner of both edges.
    pub origin: Point3,
    /// End of the first edge.
    pub edge1_target: Point3,
    /// End of the second edge.
    pub edge2_target: Point3,
    /// Base color before distance attenuation.
    pub color: Color,
}

impl Quad {
    /// Create a quad from its origin and the targets of its two edges.
    pub fn new(origin: Point3, edge1_target: Point3, edge2_target: Point3, color: Color) -> Self {
        Self {
            origin,
            edge1_target,
            edge2_target,
            color,
        }
    }

    /// First edge vector.
    #[inline]
    pub fn edge1(&self) -> Vec3 {
        self.edge1_target - self.origin
    }

    /// Second edge vector.
    #[inline]
    pub fn edge2(&self) -> Vec3 {
        self.edge2_target - self.origin
    }

    /// The four corners in boundary order.
    pub fn corners(&self) -> [Point3; 4] {
        [
            self.origin,
            self.edge1_target,
            self.edge1_target + self.edge2(),
            self.edge2_target,
        ]
    }

    /// Intersect a ray segment with this parallelogram.
    ///
    /// Solves `start + t·(end − start) = origin + u·edge1 + v·edge2` with
    /// Cramer's rule on scalar triple products. The hit is kept only when
    /// `t ∈ [0, 1]` (on the segment) and `u, v ∈ [0, 1)` (inside the
    /// parallelogram, far edges excluded so a shared edge belongs to one
    /// quad only). Returns `None` for parallel or coincident rays.
    pub fn intersect(&self, ray: &Ray) -> Option<Point3> {
        let lba = ray.start - ray.end;
        let e1 = self.edge1();
        let e2 = self.edge2();
        let normal = e1.cross(&e2);

        let det = lba.dot(&normal);
        if det.abs() < MICRO {
            return None;
        }

        let diff = ray.start - self.origin;
        let tn = normal.dot(&diff);
        if !ratio_in_unit_range(tn, det, true) {
            return None;
        }
        let un = e2.cross(&lba).dot(&diff);
        if !ratio_in_unit_range(un, det, false) {
            return None;
        }
        let vn = lba.cross(&e1).dot(&diff);
        if !ratio_in_unit_range(vn, det, false) {
            return None;
        }

        Some(ray.at(tn / det))
    }
}

/// A renderable surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    /// Planar parallelogram.
    Quad(Quad),
}

impl Surface {
    /// Intersect a ray segment with this surface.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<Point3> {
        match self {
            Surface::Quad(quad) => quad.intersect(ray),
        }
    }

    /// Corner points used for spatial indexing.
    pub fn corners(&self) -> [Point3; 4] {
        match self {
            Surface::Quad(quad) => quad.corners(),
        }
    }

    /// Boundary edges as segments between consecutive corners.
    pub fn edges(&self) -> [Ray; 4] {
        let c = self.corners();
        [
            Ray::new(c[0], c[1]),
            Ray::new(c[1], c[2]),
            Ray::new(c[2], c[3]),
            Ray::new(c[3], c[0]),
        ]
    }

    /// Base color of the surface.
    pub fn color(&self) -> Color {
        match self {
            Surface::Quad(quad) => quad.color,
        }
    }
}

impl From<Quad> for Surface {
    fn from(quad: Quad) -> Self {
        Surface::Quad(quad)
    }
}
