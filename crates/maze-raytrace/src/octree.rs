//! Octree spatial index over scene surfaces.
//!
//! The tree is built once, top-down, and is read-only afterwards. Nodes live
//! in a flat arena and refer to their children by [`NodeId`]; there are no
//! parent links. A node either is a leaf or has exactly eight children that
//! partition its box by the axis midpoints.

use log::{debug, info};
use maze_math::{Point3, Vec3, MILLI};
use serde::{Deserialize, Serialize};

use crate::error::{OctreeError, Result};
use crate::surface::{Color, Quad, Surface, SurfaceId};

/// Identifier of an octree node.
///
/// Ids are handed out in construction order and double as the node's index
/// in the arena. Traversal uses them only to detect "landed in the same node
/// again".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One of the six faces of an axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Face at `min.x`.
    XMin,
    /// Face at `max.x`.
    XMax,
    /// Face at `min.y`.
    YMin,
    /// Face at `max.y`.
    YMax,
    /// Face at `min.z`.
    ZMin,
    /// Face at `max.z`.
    ZMax,
}

impl Face {
    /// All six faces.
    pub const ALL: [Face; 6] = [
        Face::XMin,
        Face::XMax,
        Face::YMin,
        Face::YMax,
        Face::ZMin,
        Face::ZMax,
    ];

    /// Axis index (0 = x, 1 = y, 2 = z) this face is perpendicular to.
    pub fn axis(self) -> usize {
        match self {
            Face::XMin | Face::XMax => 0,
            Face::YMin | Face::YMax => 1,
            Face::ZMin | Face::ZMax => 2,
        }
    }

    /// Whether this is the upper face along its axis.
    pub fn is_max(self) -> bool {
        matches!(self, Face::XMax | Face::YMax | Face::ZMax)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Create a box from its corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Cube centred on the origin with the given half extent.
    pub fn cube(half_extent: f64) -> Self {
        Self {
            min: Point3::new(-half_extent, -half_extent, -half_extent),
            max: Point3::new(half_extent, half_extent, half_extent),
        }
    }

    /// Test whether a point lies in the closed box.
    #[inline]
    pub fn contains(&self, p: &Point3) -> bool {
        self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
            && self.min.z <= p.z
            && p.z <= self.max.z
    }

    /// Midpoint of the box; its coordinates are the split axes.
    #[inline]
    pub fn mid(&self) -> Point3 {
        midpoint(&self.min, &self.max)
    }

    /// Edge lengths along each axis.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Volume of the box.
    pub fn volume(&self) -> f64 {
        let d = self.extent();
        d.x * d.y * d.z
    }

    /// Child octant `i`: bit 0 selects the upper x half, bit 1 the upper y
    /// half and bit 2 the upper z half.
    pub fn octant(&self, i: usize) -> Aabb {
        let mid = self.mid();
        let mut min = self.min;
        let mut max = mid;
        for axis in 0..3 {
            if i & (1 << axis) != 0 {
                min[axis] = mid[axis];
                max[axis] = self.max[axis];
            }
        }
        Aabb { min, max }
    }

    /// Index of the octant containing `p`, comparing against the midpoint.
    /// Points on a split plane go to the upper half.
    #[inline]
    pub fn octant_of(&self, p: &Point3) -> usize {
        let mid = self.mid();
        let mut i = 0;
        if p.x >= mid.x {
            i |= 1;
        }
        if p.y >= mid.y {
            i |= 2;
        }
        if p.z >= mid.z {
            i |= 4;
        }
        i
    }

    /// Zero-thickness quad on `face`, pushed outward by [`MILLI`] and grown by
    /// [`MILLI`] on both in-plane axes.
    ///
    /// Rays crossing it land just inside the neighbouring box, never exactly
    /// on the shared plane.
    pub fn boundary(&self, face: Face) -> Quad {
        let lo = self.min - Vec3::repeat(MILLI);
        let hi = self.max + Vec3::repeat(MILLI);
        let axis = face.axis();
        let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);

        let mut origin = lo;
        if face.is_max() {
            origin[axis] = hi[axis];
        }
        let mut edge1_target = origin;
        edge1_target[a] = hi[a];
        let mut edge2_target = origin;
        edge2_target[b] = hi[b];

        Quad::new(origin, edge1_target, edge2_target, Color::BLACK)
    }
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}

/// Octree construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeSettings {
    /// A node holding this many surfaces or fewer is not split.
    pub min_surfaces: usize,
    /// A node with any edge this short or shorter is not split.
    pub min_node_size: f64,
    /// Half the edge length of the root cube, centred on the origin.
    pub root_half_extent: f64,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            min_surfaces: 2,
            min_node_size: 8.0,
            root_half_extent: 1024.0,
        }
    }
}

impl OctreeSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_node_size > 0.0) {
            return Err(OctreeError::InvalidSettings("min_node_size must be positive".into()));
        }
        if !(self.root_half_extent > 0.0) || !self.root_half_extent.is_finite() {
            return Err(OctreeError::InvalidSettings(
                "root_half_extent must be positive and finite".into(),
            ));
        }
        if self.min_node_size <= MILLI * 4.0 {
            return Err(OctreeError::InvalidSettings(format!(
                "min_node_size must exceed the boundary offset ({})",
                MILLI * 4.0
            )));
        }
        Ok(())
    }
}

/// A node of the octree.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Construction-order id, equal to the arena index.
    pub id: NodeId,
    /// Box covered by this node.
    pub bounds: Aabb,
    /// Surfaces touching this node's box.
    pub surfaces: Vec<SurfaceId>,
    /// The eight children, or `None` for a leaf.
    pub children: Option<[NodeId; 8]>,
}

impl OctreeNode {
    /// Whether this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Summary of an octree's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctreeStats {
    /// Total number of nodes.
    pub nodes: usize,
    /// Number of leaves.
    pub leaves: usize,
    /// Depth of the deepest leaf (root = 0).
    pub max_depth: usize,
    /// Largest surface list held by a leaf.
    pub max_leaf_surfaces: usize,
    /// Sum of surface list lengths over all leaves.
    pub leaf_surface_refs: usize,
}

/// Octree over a fixed surface table.
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    surfaces: Vec<Surface>,
    settings: OctreeSettings,
}

impl Octree {
    /// Build the octree over `surfaces`.
    ///
    /// The root box is the cube of half extent `settings.root_half_extent`.
    pub fn build(surfaces: Vec<Surface>, settings: OctreeSettings) -> Result<Self> {
        settings.validate()?;

        let bounds = Aabb::cube(settings.root_half_extent);
        let all: Vec<SurfaceId> = (0..surfaces.len()).collect();

        let mut builder = OctreeBuilder {
            surfaces: &surfaces,
            settings: &settings,
            nodes: Vec::new(),
            next_id: 0,
        };
        builder.build_node(bounds, &all);
        let nodes = builder.nodes;

        let tree = Self {
            nodes,
            surfaces,
            settings,
        };
        let stats = tree.stats();
        info!(
            "built octree over {} surfaces: {} nodes, {} leaves, depth {}",
            tree.surfaces.len(),
            stats.nodes,
            stats.leaves,
            stats.max_depth
        );
        Ok(tree)
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> &OctreeNode {
        &self.nodes[0]
    }

    /// Look up a node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &OctreeNode {
        &self.nodes[id.index()]
    }

    /// All nodes in construction order.
    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    /// Iterate over the leaves.
    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Depth of the deepest leaf; a lone root has depth 0.
    pub fn depth(&self) -> usize {
        self.stats().max_depth
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists even for an empty scene.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The surface table.
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Look up a surface by id.
    #[inline]
    pub fn surface(&self, id: SurfaceId) -> &Surface {
        &self.surfaces[id]
    }

    /// Settings the tree was built with.
    pub fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    /// Find the leaf containing `point`.
    ///
    /// Returns `None` if the point lies outside the root box (including NaN
    /// coordinates). Points on a split plane resolve to the upper octant.
    pub fn locate(&self, point: &Point3) -> Option<NodeId> {
        let mut current = self.root();
        if !current.bounds.contains(point) {
            return None;
        }
        while let Some(children) = &current.children {
            current = self.node(children[current.bounds.octant_of(point)]);
        }
        Some(current.id)
    }

    /// Compute shape statistics.
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            nodes: self.nodes.len(),
            ..OctreeStats::default()
        };
        let mut stack = vec![(self.root().id, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            match &node.children {
                Some(children) => stack.extend(children.iter().map(|&c| (c, depth + 1))),
                None => {
                    stats.leaves += 1;
                    stats.max_depth = stats.max_depth.max(depth);
                    stats.max_leaf_surfaces = stats.max_leaf_surfaces.max(node.surfaces.len());
                    stats.leaf_surface_refs += node.surfaces.len();
                }
            }
        }
        stats
    }
}

/// Recursive builder owning the node arena and the id counter.
struct OctreeBuilder<'a> {
    surfaces: &'a [Surface],
    settings: &'a OctreeSettings,
    nodes: Vec<OctreeNode>,
    next_id: u32,
}

impl OctreeBuilder<'_> {
    fn build_node(&mut self, bounds: Aabb, candidates: &[SurfaceId]) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let members: Vec<SurfaceId> = candidates
            .iter()
            .copied()
            .filter(|&ix| touches(&bounds, &self.surfaces[ix]))
            .collect();

        let extent = bounds.extent();
        let min_size = self.settings.min_node_size;
        let split = members.len() > self.settings.min_surfaces
            && extent.x > min_size
            && extent.y > min_size
            && extent.z > min_size;

        debug_assert_eq!(id.index(), self.nodes.len());
        self.nodes.push(OctreeNode {
            id,
            bounds,
            surfaces: members,
            children: None,
        });

        if split {
            let pool = self.nodes[id.index()].surfaces.clone();
            let mut children = [NodeId(0); 8];
            for (i, child) in children.iter_mut().enumerate() {
                *child = self.build_node(bounds.octant(i), &pool);
            }
            self.nodes[id.index()].children = Some(children);
        } else if self.nodes[id.index()].surfaces.len() > self.settings.min_surfaces {
            debug!(
                "leaf {} at minimum size holds {} surfaces",
                id.0,
                self.nodes[id.index()].surfaces.len()
            );
        }

        id
    }
}

/// A surface touches a box if any corner is inside it, or any edge crosses
/// one of the box's boundary planes.
fn touches(bounds: &Aabb, surface: &Surface) -> bool {
    if surface.corners().iter().any(|c| bounds.contains(c)) {
        return true;
    }
    let faces = Face::ALL.map(|face| bounds.boundary(face));
    surface
        .edges()
        .iter()
        .any(|edge| faces.iter().any(|face| face.intersect(edge).is_some()))
}
