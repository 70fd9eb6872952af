//! Edge type and related structures.
//!
//! Edges are the springs of the force simulation. Each edge has:
//! - A slot handle (`EdgeId`) giving its position in the ordered edge list
//! - Source and target node handles
//! - A size/weight factor scaling its spring force
//! - Opaque display attributes

use std::fmt;

use serde_json::{Map, Value};

use super::node::NodeId;

/// Position of an edge in the graph's ordered edge sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    #[inline]
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

/// Default spring weight for edges that don't specify one.
pub const DEFAULT_EDGE_SIZE: f32 = 1.0;

/// An edge record owned by the graph engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    /// Spring force multiplier.
    pub size: f32,
    pub color: Option<String>,
    pub attributes: Map<String, Value>,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            size: DEFAULT_EDGE_SIZE,
            color: None,
            attributes: Map::new(),
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}
