//! Per-segment rendering: sparse sampling followed by frontier flood fill.
//!
//! Only every `sparse_stride`-th pixel in each direction is traced through
//! the octree. Each hit seeds a flood fill that tests neighbouring pixels
//! against the seed's surface alone, spreading for as long as that surface
//! keeps being hit. Pixels no fill reaches stay background.

use std::collections::{HashMap, HashSet};

use maze_math::{distance_squared, Point3};
use maze_raytrace::{BoundaryOrder, Octree, Ray, RayHit, SurfaceCache, SurfaceId};

use crate::camera::{Pose, ViewAngles};
use crate::segment::Segment;
use crate::settings::{RenderSettings, Shading};

/// A pixel waiting to be tested against an assumed surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierPoint {
    /// Surface inherited from the neighbour that enqueued this pixel.
    pub surface: SurfaceId,
    /// Pixel index within the segment (`y * width + x`).
    pub pixel: usize,
    /// Column within the segment.
    pub x: usize,
    /// Row within the segment.
    pub y: usize,
}

/// Working state for rendering one segment of one frame.
///
/// Owned by a single worker; nothing in it is shared.
pub struct RenderContext<'a> {
    octree: &'a Octree,
    segment: Segment,
    eye: Point3,
    xs: Vec<f64>,
    ys: Vec<f64>,
    zs: Vec<f64>,
    results: Vec<Option<RayHit>>,
    visited: HashMap<SurfaceId, HashSet<usize>>,
    frontier: Vec<FrontierPoint>,
    next_frontier: Vec<FrontierPoint>,
    cache: Option<SurfaceCache>,
    stride: usize,
    traced: usize,
}

impl<'a> RenderContext<'a> {
    /// Precompute ray endpoints for every column and row of `segment`.
    pub fn new(
        octree: &'a Octree,
        pose: &Pose,
        segment: Segment,
        angles: &ViewAngles,
        settings: &RenderSettings,
    ) -> Self {
        let far = settings.far_distance;
        let (xs, ys) = angles.horizontal[segment.x..segment.x + segment.width]
            .iter()
            .map(|&h| {
                let p = pose.far_point(h, 0.0, far);
                (p.x, p.y)
            })
            .unzip();
        let zs = angles.vertical[segment.y..segment.y + segment.height]
            .iter()
            .map(|&v| pose.far_point(0.0, v, far).z)
            .collect();

        let cache = (settings.cache_capacity > 0)
            .then(|| SurfaceCache::new(settings.cache_capacity));

        Self {
            octree,
            segment,
            eye: pose.position,
            xs,
            ys,
            zs,
            results: vec![None; segment.len()],
            visited: HashMap::new(),
            frontier: Vec::new(),
            next_frontier: Vec::with_capacity(1024),
            cache,
            stride: settings.sparse_stride.max(1),
            traced: 0,
        }
    }

    /// Camera ray through segment pixel (`x`, `y`).
    #[inline]
    pub fn ray_for(&self, x: usize, y: usize) -> Ray {
        Ray::new(self.eye, Point3::new(self.xs[x], self.ys[x], self.zs[y]))
    }

    /// Per-pixel hits, row-major within the segment.
    pub fn results(&self) -> &[Option<RayHit>] {
        &self.results
    }

    /// The segment being rendered.
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Number of full octree traces performed so far.
    pub fn traced(&self) -> usize {
        self.traced
    }

    /// Trace the sparse grid and seed the frontier from every hit.
    ///
    /// The grid starts `stride / 2` pixels in, pulled back to the last
    /// column or row when the segment is narrower than that.
    pub fn sparse_pass(&mut self) {
        let offset = self.stride / 2;
        let x0 = offset.min(self.segment.width.saturating_sub(1));
        let y0 = offset.min(self.segment.height.saturating_sub(1));
        for y in (y0..self.segment.height).step_by(self.stride) {
            for x in (x0..self.segment.width).step_by(self.stride) {
                let pixel = y * self.segment.width + x;
                if let Some(hit) = self.explore_pixel(x, y, pixel) {
                    self.expand(FrontierPoint {
                        surface: hit.surface,
                        pixel,
                        x,
                        y,
                    });
                }
            }
        }
    }

    /// Spread seeded surfaces to neighbouring pixels until the frontier is
    /// exhausted.
    pub fn flood_fill(&mut self) {
        while !self.next_frontier.is_empty() {
            std::mem::swap(&mut self.frontier, &mut self.next_frontier);
            let frontier = std::mem::take(&mut self.frontier);
            for &fp in &frontier {
                let ray = self.ray_for(fp.x, fp.y);
                let Some(point) = self.octree.surface(fp.surface).intersect(&ray) else {
                    continue;
                };
                let dist2 = distance_squared(&self.eye, &point);
                if let Some(existing) = &self.results[fp.pixel] {
                    if existing.is_final || dist2 > existing.dist2 {
                        continue;
                    }
                }
                self.results[fp.pixel] = Some(RayHit {
                    point,
                    dist2,
                    surface: fp.surface,
                    is_final: false,
                });
                self.expand(fp);
            }
            self.frontier = frontier;
            self.frontier.clear();
        }
    }

    /// Shade every row of the segment.
    ///
    /// Yields the byte offset of each row in a BGRA frame `screen_width`
    /// pixels wide, together with the row's bytes. Background pixels are
    /// black; the fourth byte of every pixel is zero.
    pub fn scanlines<'s>(
        &'s self,
        screen_width: usize,
        shading: &'s Shading,
    ) -> impl Iterator<Item = (usize, Vec<u8>)> + 's {
        let octree: &'s Octree = self.octree;
        let results = &self.results[..];
        let segment = self.segment;
        (0..segment.height).map(move |y| {
            let mut data = vec![0u8; segment.width * 4];
            for (x, px) in data.chunks_exact_mut(4).enumerate() {
                if let Some(hit) = &results[y * segment.width + x] {
                    let c = octree
                        .surface(hit.surface)
                        .color()
                        .attenuate(hit.distance(), shading.scale, shading.cap);
                    px.copy_from_slice(&[c.b, c.g, c.r, 0]);
                }
            }
            (segment.row_offset(y, screen_width), data)
        })
    }

    fn explore_pixel(&mut self, x: usize, y: usize, pixel: usize) -> Option<RayHit> {
        let ray = self.ray_for(x, y);
        let order = BoundaryOrder::for_ray(&ray);
        self.traced += 1;
        let hit = match self.cache.as_mut() {
            Some(cache) => self.octree.trace_cached(&ray, &order, cache),
            None => self.octree.trace(&ray, &order),
        }?;
        self.visited.entry(hit.surface).or_default().insert(pixel);
        self.results[pixel] = Some(hit);
        Some(hit)
    }

    fn expand(&mut self, fp: FrontierPoint) {
        let (w, h) = (self.segment.width, self.segment.height);
        let (x, y) = (fp.x, fp.y);
        if x > 0 {
            self.visit_if_unvisited(fp.surface, x - 1, y);
        }
        if x + 1 < w {
            self.visit_if_unvisited(fp.surface, x + 1, y);
        }
        if y > 0 {
            self.visit_if_unvisited(fp.surface, x, y - 1);
        }
        if y + 1 < h {
            self.visit_if_unvisited(fp.surface, x, y + 1);
        }
    }

    fn visit_if_unvisited(&mut self, surface: SurfaceId, x: usize, y: usize) {
        let pixel = y * self.segment.width + x;
        if self.results[pixel].is_some_and(|hit| hit.is_final) {
            return;
        }
        if !self.visited.entry(surface).or_default().insert(pixel) {
            return;
        }
        self.next_frontier.push(FrontierPoint {
            surface,
            pixel,
            x,
            y,
        });
    }
}
