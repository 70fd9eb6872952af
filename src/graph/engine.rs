//! GraphEngine - Core graph data structure.
//!
//! The GraphEngine stores the graph topology using petgraph's StableGraph
//! and maintains SoA (Structure of Arrays) buffers for positions and force
//! accumulators, so the simulation can walk them linearly and JavaScript can
//! read positions through zero-copy `Float32Array` views.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};
use tracing::info;

use super::description::{
    round_coordinate, EdgeSpec, GraphDescription, LayoutSnapshot, NodeSnapshot,
};
use super::edge::{Edge, EdgeId};
use super::node::{Node, NodeId};
use super::vec3::Vec3;
use crate::error::{Error, Result};
use crate::spatial::SpatialIndex;

/// The core graph engine.
///
/// This struct manages:
/// - Graph topology via petgraph (arena + index, edges hold node indices)
/// - Position/force buffers in SoA layout
/// - Spatial index for nearest-node queries
/// - ID mapping between caller string ids and internal slots
pub struct GraphEngine {
    /// The underlying graph structure. Node weights are the node records,
    /// edge weights the edge records.
    graph: StableGraph<Node, Edge, Directed>,

    /// Map from caller id to slot
    key_to_id: HashMap<String, NodeId>,

    /// Graph-level direction flag. Only affects adjacency queries and
    /// arrow geometry; the simulation treats every edge as a spring.
    directed: bool,

    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
    pos_z: Vec<f32>,

    /// Per-iteration force accumulators, zero between iterations
    force_x: Vec<f32>,
    force_y: Vec<f32>,
    force_z: Vec<f32>,

    /// Spatial index for nearest-node queries
    spatial: SpatialIndex,

    /// Whether the spatial index needs rebuilding
    spatial_dirty: bool,
}

impl GraphEngine {
    /// Create a new empty graph engine.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a graph engine with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            key_to_id: HashMap::with_capacity(node_capacity),
            directed: true,
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            pos_z: Vec::with_capacity(node_capacity),
            force_x: Vec::with_capacity(node_capacity),
            force_y: Vec::with_capacity(node_capacity),
            force_z: Vec::with_capacity(node_capacity),
            spatial: SpatialIndex::new(),
            spatial_dirty: false,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the current graph with `description`.
    ///
    /// Every edge endpoint must name a node in `description.nodes`, and every
    /// size must be positive and finite. On error the current graph is left
    /// exactly as it was.
    pub fn load(&mut self, description: &GraphDescription) -> Result<()> {
        let mut staged = Self::with_capacity(description.nodes.len(), description.edges.len());
        staged.directed = description.directed;

        for (key, spec) in &description.nodes {
            let size = validate_size("node size", spec.size)?;
            let location = spec.location.unwrap_or(Vec3::ZERO);
            if !location.is_finite() {
                return Err(Error::invalid_parameter(
                    "node location",
                    format!("node {key} has a non-finite location"),
                ));
            }

            let mut node = Node::new(key.clone()).with_size(size);
            node.color = spec.color.clone();
            node.attributes = spec.attributes.clone();
            staged.push_node(node, location);
        }

        for (i, spec) in description.edges.iter().enumerate() {
            let source = staged.resolve(i, &spec.source)?;
            let target = staged.resolve(i, &spec.target)?;
            let size = validate_size("edge size", spec.size)?;

            let mut edge = Edge::new(source, target).with_size(size);
            edge.color = spec.color.clone();
            edge.attributes = spec.attributes.clone();
            staged.graph.add_edge(index_of(source), index_of(target), edge);
        }

        staged.spatial_dirty = true;
        *self = staged;

        info!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            directed = self.directed,
            "graph loaded"
        );
        Ok(())
    }

    fn push_node(&mut self, node: Node, location: Vec3) -> NodeId {
        let id = NodeId(self.graph.node_count() as u32);
        self.key_to_id.insert(node.key.clone(), id);
        self.graph.add_node(node);

        self.pos_x.push(location.x);
        self.pos_y.push(location.y);
        self.pos_z.push(location.z);
        self.force_x.push(0.0);
        self.force_y.push(0.0);
        self.force_z.push(0.0);
        id
    }

    fn resolve(&self, edge: usize, key: &str) -> Result<NodeId> {
        self.key_to_id
            .get(key)
            .copied()
            .ok_or_else(|| Error::InvalidReference {
                edge,
                node_id: key.to_string(),
            })
    }

    /// Discard all nodes and edges. Calling it on an empty graph is a no-op.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.key_to_id.clear();
        self.directed = true;
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
        self.force_x.clear();
        self.force_y.clear();
        self.force_z.clear();
        self.spatial.clear();
        self.spatial_dirty = false;
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Look up the slot of a caller id.
    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.key_to_id.get(key).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(index_of(id))
    }

    /// Caller id of a slot.
    pub fn node_key(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.key.as_str())
    }

    /// All nodes in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |index| {
                self.graph
                    .node_weight(index)
                    .map(|node| (NodeId(index.index() as u32), node))
            })
    }

    /// Get a node's position.
    pub fn node_position(&self, id: NodeId) -> Option<Vec3> {
        (id.slot() < self.pos_x.len()).then(|| self.position(id.slot()))
    }

    /// Set a node's position. Returns false if the node doesn't exist.
    pub fn set_node_position(&mut self, id: NodeId, position: Vec3) -> bool {
        if id.slot() >= self.pos_x.len() {
            return false;
        }
        self.set_position(id.slot(), position);
        true
    }

    /// Ids of adjacent nodes: outgoing neighbors for a directed graph, all
    /// neighbors otherwise.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        let index = index_of(id);
        let mut neighbors: Vec<NodeId> = if self.directed {
            self.graph
                .neighbors_directed(index, Direction::Outgoing)
                .map(|n| NodeId(n.index() as u32))
                .collect()
        } else {
            self.graph
                .neighbors_undirected(index)
                .map(|n| NodeId(n.index() as u32))
                .collect()
        };
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges in input order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.graph.edge_indices().filter_map(move |index| {
            self.graph
                .edge_weight(index)
                .map(|edge| (EdgeId(index.index() as u32), edge))
        })
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    /// Get Z positions slice.
    pub fn positions_z(&self) -> &[f32] {
        &self.pos_z
    }

    /// Positions interleaved as [x0, y0, z0, x1, y1, z1, ...].
    pub fn positions_flat(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.pos_x.len() * 3);
        for i in 0..self.pos_x.len() {
            flat.extend_from_slice(&[self.pos_x[i], self.pos_y[i], self.pos_z[i]]);
        }
        flat
    }

    #[inline]
    pub(crate) fn position(&self, slot: usize) -> Vec3 {
        Vec3::new(self.pos_x[slot], self.pos_y[slot], self.pos_z[slot])
    }

    #[inline]
    pub(crate) fn set_position(&mut self, slot: usize, position: Vec3) {
        self.pos_x[slot] = position.x;
        self.pos_y[slot] = position.y;
        self.pos_z[slot] = position.z;
        self.spatial_dirty = true;
    }

    #[inline]
    pub(crate) fn force(&self, slot: usize) -> Vec3 {
        Vec3::new(self.force_x[slot], self.force_y[slot], self.force_z[slot])
    }

    #[inline]
    pub(crate) fn add_force(&mut self, slot: usize, force: Vec3) {
        self.force_x[slot] += force.x;
        self.force_y[slot] += force.y;
        self.force_z[slot] += force.z;
    }

    /// Zero every force accumulator.
    pub(crate) fn reset_forces(&mut self) {
        self.force_x.fill(0.0);
        self.force_y.fill(0.0);
        self.force_z.fill(0.0);
    }

    /// Size factor of the node in `slot`.
    #[inline]
    pub(crate) fn size(&self, slot: usize) -> f32 {
        self.graph
            .node_weight(NodeIndex::new(slot))
            .map_or(1.0, |node| node.size)
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Find the nearest node to a point.
    pub fn find_nearest_node(&mut self, point: Vec3) -> Option<NodeId> {
        self.ensure_spatial_index_up_to_date();
        self.spatial.nearest(point)
    }

    /// Find the nearest node within a maximum distance.
    pub fn find_nearest_node_within(&mut self, point: Vec3, max_distance: f32) -> Option<NodeId> {
        self.ensure_spatial_index_up_to_date();
        self.spatial.nearest_within(point, max_distance)
    }

    /// Rebuild the spatial index from current positions.
    pub fn rebuild_spatial_index(&mut self) {
        let points: Vec<_> = (0..self.pos_x.len())
            .map(|i| (NodeId(i as u32), self.position(i)))
            .collect();

        self.spatial.rebuild(&points);
        self.spatial_dirty = false;
    }

    fn ensure_spatial_index_up_to_date(&mut self) {
        if self.spatial_dirty {
            self.rebuild_spatial_index();
        }
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Axis-aligned bounding box of all nodes as (min, max).
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.pos_x.is_empty() {
            return None;
        }

        let first = self.position(0);
        let bounds = (1..self.pos_x.len()).fold((first, first), |(min, max), i| {
            let p = self.position(i);
            (
                Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        Some(bounds)
    }

    /// Current layout in the input schema, positions rounded to three decimals.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let nodes = self
            .nodes()
            .map(|(id, node)| {
                let p = self.position(id.slot());
                let snapshot = NodeSnapshot {
                    color: node.color.clone(),
                    location: [
                        round_coordinate(p.x),
                        round_coordinate(p.y),
                        round_coordinate(p.z),
                    ],
                    size: (node.size != 1.0).then_some(node.size),
                    attributes: node.attributes.clone(),
                };
                (node.key.clone(), snapshot)
            })
            .collect();

        let edges = self
            .edges()
            .map(|(_, edge)| EdgeSpec {
                source: self.node_key(edge.source).unwrap_or_default().to_string(),
                target: self.node_key(edge.target).unwrap_or_default().to_string(),
                size: (edge.size != 1.0).then_some(edge.size),
                color: edge.color.clone(),
                attributes: edge.attributes.clone(),
            })
            .collect();

        LayoutSnapshot {
            directed: self.directed,
            edges,
            nodes,
        }
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn index_of(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.slot())
}

fn validate_size(name: &'static str, size: Option<f32>) -> Result<f32> {
    match size {
        None => Ok(1.0),
        Some(size) if size.is_finite() && size > 0.0 => Ok(size),
        Some(size) => Err(Error::invalid_parameter(
            name,
            format!("must be positive and finite, got {size}"),
        )),
    }
}
