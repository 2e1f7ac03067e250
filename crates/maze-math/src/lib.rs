#![warn(missing_docs)]

//! Math types for the maze ray tracer.
//!
//! Thin wrappers around nalgebra providing the point and vector types used
//! by the spatial index and renderer, plus the handful of scalar helpers
//! (distances, tolerances, heading arithmetic) shared across crates.

use std::f64::consts::PI;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Determinant magnitude below which a linear system is treated as singular.
pub const MICRO: f64 = 1e-6;

/// Outward offset applied to octree boundary planes.
pub const MILLI: f64 = 1e-3;

/// A full turn in radians.
pub const TWO_PI: f64 = PI * 2.0;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    nalgebra::distance(a, b)
}

/// Squared Euclidean distance between two points.
///
/// Preferred on comparison-only paths since it avoids the square root.
#[inline]
pub fn distance_squared(a: &Point3, b: &Point3) -> f64 {
    nalgebra::distance_squared(a, b)
}

/// Add `delta` to the heading `theta` and wrap the result into `[0, 2π)`.
#[inline]
pub fn add_and_normalize(theta: f64, delta: f64) -> f64 {
    (theta + delta).rem_euclid(TWO_PI)
}

/// Convert an angle in degrees to radians.
#[inline]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Check that a parametric numerator lies within `[0, |den|]` on the side of
/// `den`, i.e. that `num / den` is in `[0, 1]` without dividing.
///
/// A zero numerator is accepted regardless of the denominator's sign.
/// With `closed_upper == false` the upper bound is excluded.
#[inline]
pub fn ratio_in_unit_range(num: f64, den: f64, closed_upper: bool) -> bool {
    if num != 0.0 && num.is_sign_negative() != den.is_sign_negative() {
        return false;
    }
    if closed_upper {
        num.abs() <= den.abs()
    } else {
        num.abs() < den.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 6.0, 3.0);
        assert_relative_eq!(distance(&a, &b), 5.0);
        assert_relative_eq!(distance_squared(&a, &b), 25.0);
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        let v: Vec3 = b - a;
        assert_eq!(v, Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(a + v, b);
        assert_eq!(Vec3::x().cross(&Vec3::y()), Vec3::z());
        assert_eq!(Vec3::x().dot(&Vec3::y()), 0.0);
    }

    #[test]
    fn test_add_and_normalize_wraps() {
        assert_relative_eq!(add_and_normalize(TWO_PI - 0.1, 0.2), 0.1, epsilon = 1e-12);
        assert_relative_eq!(add_and_normalize(0.1, -0.2), TWO_PI - 0.1, epsilon = 1e-12);
        assert_relative_eq!(add_and_normalize(1.0, 0.5), 1.5);
    }

    #[test]
    fn test_degrees_to_radians() {
        assert_relative_eq!(degrees_to_radians(180.0), PI);
        assert_relative_eq!(degrees_to_radians(90.0), PI / 2.0);
    }

    #[test]
    fn test_ratio_in_unit_range() {
        assert!(ratio_in_unit_range(0.5, 1.0, true));
        assert!(ratio_in_unit_range(-0.5, -1.0, true));
        assert!(ratio_in_unit_range(0.0, -1.0, true));
        assert!(ratio_in_unit_range(1.0, 1.0, true));
        assert!(!ratio_in_unit_range(1.0, 1.0, false));
        assert!(!ratio_in_unit_range(-0.5, 1.0, true));
        assert!(!ratio_in_unit_range(1.5, 1.0, true));
    }
}
