//! 3D R*-tree over node positions.
//!
//! Answers nearest-node queries in O(log n). The engine rebuilds
//! it in bulk after positions change instead of updating entries in place.

use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};

use crate::graph::{NodeId, Vec3};

/// A node position tagged with its id.
type Entry = GeomWithData<[f32; 3], NodeId>;

#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<Entry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nearest(&self, point: Vec3) -> Option<NodeId> {
        self.tree
            .nearest_neighbor(&point.to_array())
            .map(|entry| entry.data)
    }

    /// Nearest node, if it lies within `max_distance` of `point`.
    pub fn nearest_within(&self, point: Vec3, max_distance: f32) -> Option<NodeId> {
        let query = point.to_array();
        self.tree
            .nearest_neighbor(&query)
            .filter(|entry| entry.distance_2(&query) <= max_distance * max_distance)
            .map(|entry| entry.data)
    }

    /// Replace the contents with `points`, bulk loaded.
    pub fn rebuild(&mut self, points: &[(NodeId, Vec3)]) {
        let entries = points
            .iter()
            .map(|&(id, position)| Entry::new(position.to_array(), id))
            .collect();
        self.tree = RTree::bulk_load(entries);
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
