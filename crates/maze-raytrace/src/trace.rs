//! Leaf-to-leaf ray traversal through the octree.
//!
//! A trace walks the leaves pierced by a ray, testing each leaf's surfaces
//! and keeping the closest hit. A hit only becomes the answer once the walk
//! stands in the leaf that contains the hit point; otherwise a closer hit
//! may still be waiting in a leaf further along the ray.

use std::collections::HashSet;

use log::trace;
use maze_math::{distance_squared, Point3};

use crate::cache::SurfaceCache;
use crate::octree::{Face, NodeId, Octree};
use crate::surface::SurfaceId;
use crate::Ray;

/// Result of a ray/scene intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space intersection point.
    pub point: Point3,
    /// Squared distance from the ray's start to `point`.
    pub dist2: f64,
    /// Surface that was hit.
    pub surface: SurfaceId,
    /// Whether the hit came from a full traversal rather than flood fill.
    pub is_final: bool,
}

impl RayHit {
    /// Euclidean distance from the ray's start.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.dist2.sqrt()
    }
}

/// Order in which a leaf's faces are probed when handing a ray to the next
/// leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryOrder(pub [Face; 6]);

impl BoundaryOrder {
    /// Exit faces first (along the sign of each direction component, x then
    /// y then z), then the opposite faces.
    pub fn for_ray(ray: &Ray) -> Self {
        let d = ray.direction();
        let pick = |positive: bool, max: Face, min: Face| {
            if positive {
                (max, min)
            } else {
                (min, max)
            }
        };
        let (x_exit, x_entry) = pick(d.x >= 0.0, Face::XMax, Face::XMin);
        let (y_exit, y_entry) = pick(d.y >= 0.0, Face::YMax, Face::YMin);
        let (z_exit, z_entry) = pick(d.z >= 0.0, Face::ZMax, Face::ZMin);
        Self([x_exit, y_exit, z_exit, x_entry, y_entry, z_entry])
    }

    /// Faces in probe order.
    pub fn faces(&self) -> &[Face; 6] {
        &self.0
    }
}

impl Default for BoundaryOrder {
    fn default() -> Self {
        Self([Face::ZMin, Face::YMin, Face::XMax, Face::YMax, Face::XMin, Face::ZMax])
    }
}

impl Octree {
    /// Find the closest surface hit along `ray`.
    ///
    /// Returns `None` when the ray leaves the indexed volume without a
    /// confirmed hit, when its start lies outside the root box, or when the
    /// walk stops making progress. Equal distances keep the surface found
    /// first.
    pub fn trace(&self, ray: &Ray, order: &BoundaryOrder) -> Option<RayHit> {
        self.trace_seeded(ray, order, None)
    }

    /// Like [`Octree::trace`], but tries the surface last hit by a ray with
    /// the same end x coordinate first and records the winner.
    ///
    /// The cached surface only seeds the search; every leaf check still runs.
    pub fn trace_cached(
        &self,
        ray: &Ray,
        order: &BoundaryOrder,
        cache: &mut SurfaceCache,
    ) -> Option<RayHit> {
        let key = SurfaceCache::key(ray);
        let seed = cache.get(key).filter(|&id| id < self.surfaces().len());
        let hit = self.trace_seeded(ray, order, seed);
        if let Some(hit) = &hit {
            cache.insert(key, hit.surface);
        }
        hit
    }

    fn trace_seeded(
        &self,
        ray: &Ray,
        order: &BoundaryOrder,
        seed: Option<SurfaceId>,
    ) -> Option<RayHit> {
        let mut visited: HashSet<SurfaceId> = HashSet::new();
        let mut best: Option<RayHit> = None;

        if let Some(id) = seed {
            visited.insert(id);
            best = self.hit_surface(ray, id);
        }

        let mut travel = *ray;
        let mut previous: Option<NodeId> = None;

        loop {
            let leaf_id = self.locate(&travel.start)?;
            if previous == Some(leaf_id) {
                trace!("trace stalled in leaf {} at {:?}", leaf_id.0, travel.start);
                return None;
            }
            previous = Some(leaf_id);
            let leaf = self.node(leaf_id);

            for &id in &leaf.surfaces {
                if !visited.insert(id) {
                    continue;
                }
                let Some(point) = self.surface(id).intersect(&travel) else {
                    continue;
                };
                let dist2 = distance_squared(&ray.start, &point);
                if best.map_or(true, |b| dist2 < b.dist2) {
                    best = Some(RayHit {
                        point,
                        dist2,
                        surface: id,
                        is_final: true,
                    });
                }
            }

            if let Some(hit) = best {
                if self.locate(&hit.point) == Some(leaf_id) {
                    return Some(hit);
                }
            }

            let next = order
                .faces()
                .iter()
                .find_map(|&face| leaf.bounds.boundary(face).intersect(&travel))?;
            travel.start = next;
        }
    }

    fn hit_surface(&self, ray: &Ray, id: SurfaceId) -> Option<RayHit> {
        let point = self.surface(id).intersect(ray)?;
        Some(RayHit {
            point,
            dist2: distance_squared(&ray.start, &point),
            surface: id,
            is_final: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octree::OctreeSettings;
    use crate::surface::{Color, Quad, Surface};

    fn wall(x0: f64, y0: f64, x1: f64, y1: f64) -> Surface {
        Surface::Quad(Quad::new(
            Point3::new(x0, y0, -2.5),
            Point3::new(x1, y1, -2.5),
            Point3::new(x0, y0, 2.5),
            Color::WHITE,
        ))
    }

    fn maze() -> Vec<Surface> {
        let mut surfaces = Vec::new();
        for i in 0..6 {
            let x = i as f64 * 30.0 - 89.0;
            surfaces.push(wall(x, -100.0, x, 100.0));
            surfaces.push(wall(-100.0, x + 7.0, 100.0, x + 7.0));
        }
        surfaces.push(wall(3.0, 3.0, 9.0, 3.0));
        surfaces
    }

    /// Closest hit over every surface, ignoring the index.
    fn brute_force(surfaces: &[Surface], ray: &Ray) -> Option<(SurfaceId, f64)> {
        surfaces
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.intersect(ray).map(|p| (id, distance_squared(&ray.start, &p))))
            .fold(None, |best: Option<(SurfaceId, f64)>, (id, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((id, d)),
            })
    }

    fn fan(eye: Point3) -> Vec<Ray> {
        let mut rays = Vec::new();
        for i in 0..90 {
            let h = i as f64 * 0.0703 + 0.013;
            for j in 0..12 {
                let v = 1.2 + j as f64 * 0.061;
                let end = Point3::new(
                    eye.x + h.sin() * 4096.0,
                    eye.y + h.cos() * 4096.0,
                    eye.z + v.cos() * 4096.0,
                );
                rays.push(Ray::new(eye, end));
            }
        }
        rays
    }

    #[test]
    fn test_trace_single_wall() {
        let surfaces = vec![wall(10.0, -5.0, 10.0, 5.0)];
        let tree = Octree::build(surfaces, OctreeSettings::default()).unwrap();
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Point3::new(100.0, 0.0, 0.0));
        let hit = tree.trace(&ray, &BoundaryOrder::for_ray(&ray)).unwrap();
        assert_eq!(hit.surface, 0);
        assert!(hit.is_final);
        assert!((hit.point.x - 10.0).abs() < 1e-12);
        assert!((hit.dist2 - 100.0).abs() < 1e-9);
        assert!((hit.distance() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_trace_miss() {
        let surfaces = vec![wall(10.0, -5.0, 10.0, 5.0)];
        let tree = Octree::build(surfaces, OctreeSettings::default()).unwrap();
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Point3::new(-100.0, 0.0, 0.0));
        assert!(tree.trace(&ray, &BoundaryOrder::for_ray(&ray)).is_none());
    }

    #[test]
    fn test_trace_start_outside_root() {
        let tree = Octree::build(maze(), OctreeSettings::default()).unwrap();
        let ray = Ray::new(Point3::new(5000.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0));
        assert!(tree.trace(&ray, &BoundaryOrder::for_ray(&ray)).is_none());
    }

    #[test]
    fn test_trace_picks_closest_of_stacked_walls() {
        let surfaces = vec![
            wall(40.0, -5.0, 40.0, 5.0),
            wall(20.0, -5.0, 20.0, 5.0),
            wall(60.0, -5.0, 60.0, 5.0),
            wall(30.0, -5.0, 30.0, 5.0),
        ];
        let tree = Octree::build(surfaces, OctreeSettings::default()).unwrap();
        assert!(tree.len() > 1);
        let ray = Ray::new(Point3::new(0.5, 0.25, 0.1), Point3::new(4096.0, 0.25, 0.1));
        let hit = tree.trace(&ray, &BoundaryOrder::for_ray(&ray)).unwrap();
        assert_eq!(hit.surface, 1);

        // From the other side the far wall is closest
        let ray = Ray::new(Point3::new(100.5, 0.25, 0.1), Point3::new(-4096.0, 0.25, 0.1));
        let hit = tree.trace(&ray, &BoundaryOrder::for_ray(&ray)).unwrap();
        assert_eq!(hit.surface, 2);
    }

    #[test]
    fn test_trace_agrees_with_brute_force() {
        let surfaces = maze();
        let tree = Octree::build(surfaces.clone(), OctreeSettings::default()).unwrap();
        let eye = Point3::new(-3.3, 4.7, 0.9);

        let mut expected = 0;
        let mut found = 0;
        for ray in fan(eye) {
            let brute = brute_force(&surfaces, &ray);
            let traced = tree.trace(&ray, &BoundaryOrder::for_ray(&ray));
            if brute.is_some() {
                expected += 1;
            }
            if let Some(hit) = traced {
                found += 1;
                let (_, d) = brute.unwrap();
                assert!((hit.dist2 - d).abs() <= 1e-9 * d.max(1.0), "{} vs {}", hit.dist2, d);
                let direct = surfaces[hit.surface].intersect(&ray).unwrap();
                assert!(distance_squared(&direct, &hit.point) < 1e-9);
            }
        }
        assert!(expected > 0);
        assert!(found * 100 >= expected * 95, "{} of {} rays resolved", found, expected);
    }

    #[test]
    fn test_trace_deterministic() {
        let tree = Octree::build(maze(), OctreeSettings::default()).unwrap();
        let eye = Point3::new(12.1, -7.4, 0.3);
        for ray in fan(eye) {
            let order = BoundaryOrder::for_ray(&ray);
            assert_eq!(tree.trace(&ray, &order), tree.trace(&ray, &order));
        }
    }

    #[test]
    fn test_trace_cached_matches_uncached() {
        let tree = Octree::build(maze(), OctreeSettings::default()).unwrap();
        let mut cache = SurfaceCache::new(64);
        for eye in [Point3::new(-3.3, 4.7, 0.9), Point3::new(-3.1, 4.5, 0.9)] {
            for ray in fan(eye) {
                let order = BoundaryOrder::for_ray(&ray);
                if let Some(plain) = tree.trace(&ray, &order) {
                    let cached = tree.trace_cached(&ray, &order, &mut cache).unwrap();
                    assert!((plain.dist2 - cached.dist2).abs() <= 1e-9 * plain.dist2.max(1.0));
                }
            }
        }
        assert!(!cache.is_empty());
        assert!(cache.len() <= 64);
    }

    #[test]
    fn test_trace_cached_ignores_stale_seed() {
        let tree = Octree::build(maze(), OctreeSettings::default()).unwrap();
        let ray = Ray::new(Point3::new(-3.3, 4.7, 0.9), Point3::new(4096.0, 4.7, 0.9));
        let order = BoundaryOrder::for_ray(&ray);
        let plain = tree.trace(&ray, &order).unwrap();

        let mut cache = SurfaceCache::new(8);
        cache.insert(SurfaceCache::key(&ray), 9999);
        let cached = tree.trace_cached(&ray, &order, &mut cache).unwrap();
        assert_eq!(cached.surface, plain.surface);
        assert_eq!(cache.get(SurfaceCache::key(&ray)), Some(plain.surface));
    }

    #[test]
    fn test_boundary_order_for_ray() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, -1.0, 1.0));
        let order = BoundaryOrder::for_ray(&ray);
        assert_eq!(&order.faces()[..3], &[Face::XMax, Face::YMin, Face::ZMax]);
        for face in Face::ALL {
            assert_eq!(order.faces().iter().filter(|&&f| f == face).count(), 1);
        }
    }

    #[test]
    fn test_default_order_is_permutation() {
        let order = BoundaryOrder::default();
        for face in Face::ALL {
            assert!(order.faces().contains(&face));
        }
    }
}
