use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maze_raytrace::OctreeSettings;
use maze_render::RenderSettings;
use serde::Deserialize;

/// Settings file contents
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderSettings,
    pub octree: OctreeSettings,
}

impl Config {
    /// Load from a TOML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
