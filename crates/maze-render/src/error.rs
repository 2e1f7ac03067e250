//! Error types for scene loading and frame rendering.

use thiserror::Error;

/// Errors that can occur while setting up or rendering frames.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Invalid render settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The screen cannot be split evenly between the workers.
    #[error("{extent} pixels cannot be split evenly between {workers} workers")]
    IndivisibleSegments {
        /// Screen width or height along the split axis.
        extent: usize,
        /// Requested worker count.
        workers: usize,
    },

    /// A worker stopped before reporting its segment done.
    #[error("worker lost: {completed} of {expected} segments completed")]
    WorkerLost {
        /// Segments that reported done.
        completed: usize,
        /// Segments in the frame.
        expected: usize,
    },

    /// A scanline does not fit inside the frame buffer.
    #[error("scanline at byte {offset} with {len} bytes overflows a {size} byte frame")]
    ScanlineOutOfBounds {
        /// Byte offset of the scanline.
        offset: usize,
        /// Scanline length in bytes.
        len: usize,
        /// Frame buffer size in bytes.
        size: usize,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Octree construction failed.
    #[error(transparent)]
    Octree(#[from] maze_raytrace::OctreeError),
}

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The scene file could not be read.
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),

    /// The scene file is not valid scene JSON.
    #[error("failed to parse scene: {0}")]
    Json(#[from] serde_json::Error),

    /// A surface does not have exactly four points.
    #[error("surface {index} has {count} points, expected 4")]
    PointCount {
        /// Position of the surface in the file.
        index: usize,
        /// Number of points found.
        count: usize,
    },

    /// The scene defines no player start.
    #[error("scene has no players")]
    NoPlayers,
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
