//! JSON scene loading.
//!
//! A scene file lists player start poses and surfaces:
//!
//! ```json
//! {
//!   "players": [{ "x": 0, "y": 0, "z": 0, "height": 1, "htheta": 0, "vtheta": 90 }],
//!   "surfaces": [[{ "x": 0, "y": 0, "z": 0 }, { "x": 10, "y": 0, "z": 0 },
//!                 { "x": 10, "y": 0, "z": 5 }, { "x": 0, "y": 0, "z": 5 }]]
//! }
//! ```
//!
//! Each surface is four corners in boundary order. The first is the origin,
//! the second ends the first edge and the fourth ends the second edge; the
//! third is implied by parallelogram closure and ignored.

use std::fs;
use std::path::Path;

use log::info;
use maze_math::{degrees_to_radians, Point3};
use maze_raytrace::{Color, Quad, Surface};
use serde::Deserialize;

use crate::camera::Pose;
use crate::error::SceneError;

#[derive(Debug, Deserialize)]
struct SceneFile {
    #[serde(default)]
    players: Vec<PlayerRecord>,
    #[serde(default)]
    surfaces: Vec<Vec<PointRecord>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    z: f64,
}

impl From<PointRecord> for Point3 {
    fn from(p: PointRecord) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Deserialize)]
struct PlayerRecord {
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    htheta: f64,
    #[serde(default = "level_vtheta")]
    vtheta: f64,
}

fn level_vtheta() -> f64 {
    90.0
}

/// A loaded scene: player starts and surfaces.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Player start poses, eye height applied and angles in radians.
    pub poses: Vec<Pose>,
    /// Surfaces in file order.
    pub surfaces: Vec<Surface>,
}

impl Scene {
    /// Parse a scene from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let file: SceneFile = serde_json::from_str(json)?;
        if file.players.is_empty() {
            return Err(SceneError::NoPlayers);
        }

        let surfaces = file
            .surfaces
            .iter()
            .enumerate()
            .map(|(index, points)| match points.as_slice() {
                [origin, edge1, _, edge2] => Ok(Surface::Quad(Quad::new(
                    (*origin).into(),
                    (*edge1).into(),
                    (*edge2).into(),
                    Color::WHITE,
                ))),
                _ => Err(SceneError::PointCount {
                    index,
                    count: points.len(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let poses = file
            .players
            .iter()
            .map(|p| {
                Pose::new(
                    Point3::new(p.x, p.y, p.z + p.height),
                    degrees_to_radians(p.htheta),
                    degrees_to_radians(p.vtheta),
                )
            })
            .collect();

        Ok(Self { poses, surfaces })
    }

    /// Read and parse a scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;
        info!(
            "loaded {}: {} surfaces, {} players",
            path.display(),
            scene.surfaces.len(),
            scene.poses.len()
        );
        Ok(scene)
    }

    /// Start pose of the first player, if there is one.
    ///
    /// Always `Some` for a scene from [`Scene::from_json`].
    pub fn start(&self) -> Option<&Pose> {
        self.poses.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    const SCENE: &str = r#"{
        "players": [{ "x": 1, "y": 2, "z": 0, "height": 1.5, "htheta": 180, "vtheta": 90 }],
        "surfaces": [
            [{ "x": 0, "y": 10, "z": -2.5 }, { "x": 10, "y": 10, "z": -2.5 },
             { "x": 10, "y": 10, "z": 2.5 }, { "x": 0, "y": 10, "z": 2.5 }]
        ]
    }"#;

    #[test]
    fn test_parse_scene() {
        let scene = Scene::from_json(SCENE).unwrap();
        assert_eq!(scene.surfaces.len(), 1);
        let pose = scene.start().unwrap();
        assert_eq!(pose.position, Point3::new(1.0, 2.0, 1.5));
        assert_relative_eq!(pose.heading, std::f64::consts::PI);
        assert_relative_eq!(pose.pitch, FRAC_PI_2);

        let Surface::Quad(quad) = scene.surfaces[0];
        assert_eq!(quad.origin, Point3::new(0.0, 10.0, -2.5));
        assert_eq!(quad.edge1_target, Point3::new(10.0, 10.0, -2.5));
        assert_eq!(quad.edge2_target, Point3::new(0.0, 10.0, 2.5));
        assert_eq!(quad.corners()[2], Point3::new(10.0, 10.0, 2.5));
    }

    #[test]
    fn test_player_defaults() {
        let scene = Scene::from_json(r#"{ "players": [{ "x": 0, "y": 0, "z": 3 }] }"#).unwrap();
        assert!(scene.surfaces.is_empty());
        let pose = scene.start().unwrap();
        assert_eq!(pose.position.z, 3.0);
        assert_eq!(pose.heading, 0.0);
        assert_relative_eq!(pose.pitch, FRAC_PI_2);

        let empty = Scene {
            poses: Vec::new(),
            surfaces: scene.surfaces,
        };
        assert!(empty.start().is_none());
    }

    #[test]
    fn test_wrong_point_count() {
        let json = r#"{
            "players": [{ "x": 0, "y": 0, "z": 0 }],
            "surfaces": [
                [{ "x": 0, "y": 0, "z": 0 }, { "x": 1, "y": 0, "z": 0 },
                 { "x": 1, "y": 1, "z": 0 }, { "x": 0, "y": 1, "z": 0 }],
                [{ "x": 0, "y": 0, "z": 0 }, { "x": 1, "y": 0, "z": 0 }, { "x": 1, "y": 1, "z": 0 }]
            ]
        }"#;
        assert!(matches!(
            Scene::from_json(json),
            Err(SceneError::PointCount { index: 1, count: 3 })
        ));
    }

    #[test]
    fn test_no_players() {
        assert!(matches!(
            Scene::from_json(r#"{ "players": [], "surfaces": [] }"#),
            Err(SceneError::NoPlayers)
        ));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(Scene::from_json("{ players"), Err(SceneError::Json(_))));
        assert!(matches!(
            Scene::load("/nonexistent/maze/scene.json"),
            Err(SceneError::Io(_))
        ));
    }
}
