//! Per-worker memo of the surface last hit by similar rays.

use std::collections::HashMap;

use crate::surface::SurfaceId;
use crate::Ray;

/// Bounded map from a coarse ray key to the surface it last hit.
///
/// Rays in the same screen column share their end x coordinate, so that
/// coordinate is the key. When the map is full it is cleared rather than
/// evicting single entries.
#[derive(Debug, Clone)]
pub struct SurfaceCache {
    entries: HashMap<u64, SurfaceId>,
    capacity: usize,
}

impl SurfaceCache {
    /// Create an empty cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Cache key for a ray.
    #[inline]
    pub fn key(ray: &Ray) -> u64 {
        ray.end.x.to_bits()
    }

    /// Surface recorded for `key`, if any.
    #[inline]
    pub fn get(&self, key: u64) -> Option<SurfaceId> {
        self.entries.get(&key).copied()
    }

    /// Record the surface hit for `key`.
    pub fn insert(&mut self, key: u64, surface: SurfaceId) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.entries.clear();
        }
        self.entries.insert(key, surface);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
