//! Render configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::segment::SegmentLayout;

/// Distance shading parameters.
///
/// A hit at distance `d` loses `min(ln(d) * scale, cap)` from every channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shading {
    /// Multiplier applied to the log distance.
    pub scale: f64,
    /// Largest amount subtracted from a channel.
    pub cap: f64,
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            scale: 45.0,
            cap: 215.0,
        }
    }
}

/// Frame rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Screen width in pixels.
    pub width: usize,
    /// Screen height in pixels.
    pub height: usize,
    /// Number of segments, one per worker.
    pub workers: usize,
    /// Whether segments are column strips or row strips.
    pub layout: SegmentLayout,
    /// Distance from the eye to the projection plane, in pixel units.
    pub focal_depth: f64,
    /// Length of camera rays.
    pub far_distance: f64,
    /// Spacing of the sparse sample grid in pixels.
    pub sparse_stride: usize,
    /// Entries in each worker's surface cache; 0 disables the cache.
    pub cache_capacity: usize,
    /// Distance shading.
    pub shading: Shading,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            workers: 8,
            layout: SegmentLayout::Columns,
            focal_depth: 128.0,
            far_distance: 4096.0,
            sparse_stride: 8,
            cache_capacity: 1024,
            shading: Shading::default(),
        }
    }
}

impl RenderSettings {
    /// Validate settings.
    ///
    /// Divisibility of the screen by the worker count is checked when the
    /// segments are partitioned.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSettings(
                "width and height must be positive".into(),
            ));
        }
        if self.workers == 0 {
            return Err(RenderError::InvalidSettings(
                "workers must be at least 1".into(),
            ));
        }
        if self.sparse_stride == 0 {
            return Err(RenderError::InvalidSettings(
                "sparse_stride must be at least 1".into(),
            ));
        }
        if !(self.focal_depth > 0.0) || !self.focal_depth.is_finite() {
            return Err(RenderError::InvalidSettings(
                "focal_depth must be positive".into(),
            ));
        }
        if !(self.far_distance > 0.0) || !self.far_distance.is_finite() {
            return Err(RenderError::InvalidSettings(
                "far_distance must be positive".into(),
            ));
        }
        if self.shading.scale < 0.0 || !(0.0..=255.0).contains(&self.shading.cap) {
            return Err(RenderError::InvalidSettings(
                "shading scale must be non-negative and cap between 0 and 255".into(),
            ));
        }
        Ok(())
    }

    /// Size of one frame in bytes (four bytes per pixel).
    pub fn frame_len(&self) -> usize {
        self.width * self.height * 4
    }
}
