//! Error types for index construction.

use thiserror::Error;

/// Errors that can occur while building the spatial index.
#[derive(Error, Debug)]
pub enum OctreeError {
    /// Invalid octree settings.
    #[error("invalid octree settings: {0}")]
    InvalidSettings(String),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, OctreeError>;
