#![warn(missing_docs)]

//! Octree-indexed ray tracing of planar quad surfaces.
//!
//! The scene is a fixed list of parallelogram surfaces. They are indexed once
//! into an octree whose leaves list every surface touching their box, and
//! rays are then walked leaf to leaf until the closest hit is confirmed.
//!
//! # Architecture
//!
//! - [`Ray`] - Finite directed segment from a start point to an end point
//! - [`Surface`] / [`Quad`] - Parallelogram surfaces and their intersection test
//! - [`octree`] - Spatial index construction and point lookup
//! - [`trace`] - Leaf-to-leaf traversal returning the closest [`RayHit`]
//! - [`SurfaceCache`] - Optional per-worker hint of recently hit surfaces
//!
//! # Example
//!
//! ```ignore
//! use maze_math::Point3;
//! use maze_raytrace::{BoundaryOrder, Color, Octree, OctreeSettings, Quad, Ray, Surface};
//!
//! let wall = Surface::Quad(Quad::new(
//!     Point3::new(0.0, 0.0, 5.0),
//!     Point3::new(10.0, 0.0, 5.0),
//!     Point3::new(0.0, 10.0, 5.0),
//!     Color::WHITE,
//! ));
//! let octree = Octree::build(vec![wall], OctreeSettings::default())?;
//!
//! let ray = Ray::new(Point3::new(5.0, 5.0, 0.0), Point3::new(5.0, 5.0, 10.0));
//! let hit = octree.trace(&ray, &BoundaryOrder::for_ray(&ray));
//! ```

mod cache;
pub mod error;
pub mod octree;
mod ray;
pub mod surface;
pub mod trace;

pub use cache::SurfaceCache;
pub use error::{OctreeError, Result};
pub use octree::{Aabb, Face, NodeId, Octree, OctreeNode, OctreeSettings, OctreeStats};
pub use ray::Ray;
pub use surface::{Color, Quad, Surface, SurfaceId};
pub use trace::{BoundaryOrder, RayHit};
