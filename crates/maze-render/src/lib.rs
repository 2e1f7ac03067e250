#![warn(missing_docs)]

//! Frame rendering for the octree maze ray tracer.
//!
//! Each frame is cut into equal segments, one per worker. A worker traces a
//! sparse grid of its pixels through the octree and flood-fills the rest
//! from those seeds, then streams shaded scanlines back to the driver,
//! which is the only writer of the frame.
//!
//! # Example
//!
//! ```ignore
//! use maze_raytrace::{Octree, OctreeSettings};
//! use maze_render::{FrameBuffer, FrameRenderer, RenderSettings, Scene};
//!
//! let scene = Scene::load("maze.json")?;
//! let start = *scene.start().expect("scene has a player");
//! let octree = Octree::build(scene.surfaces.clone(), OctreeSettings::default())?;
//!
//! let settings = RenderSettings::default();
//! let mut frame = FrameBuffer::new(settings.width, settings.height);
//! let mut renderer = FrameRenderer::new(settings)?;
//! let stats = renderer.render_frame(&octree, &start, &mut frame)?;
//!
//! println!("frame took {:?}", stats.elapsed);
//! ```

pub mod camera;
pub mod error;
pub mod frame;
pub mod frontier;
pub mod player;
pub mod scene;
pub mod segment;
pub mod settings;

pub use camera::{Pose, ViewAngles};
pub use error::{RenderError, Result, SceneError};
pub use frame::{render_segment, FrameBuffer, FrameRenderer, FrameSink, FrameStats, SegmentMessage};
pub use frontier::{FrontierPoint, RenderContext};
pub use player::{frame_factor, Player};
pub use scene::Scene;
pub use segment::{partition, Segment, SegmentLayout};
pub use settings::{RenderSettings, Shading};
