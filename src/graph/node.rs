//! Node type and related structures.
//!
//! Nodes are the particles of the force simulation. Each node has:
//! - A slot handle (`NodeId`) valid until the graph is cleared or replaced
//! - The caller's string identifier, unique within a graph
//! - A size factor acting as relative charge/mass in the simulation
//! - Opaque display attributes the layout engine never interprets
//!
//! Positions and force accumulators are not stored here; they live in the
//! engine's structure-of-arrays buffers, indexed by `NodeId`.

use std::fmt;

use serde_json::{Map, Value};

/// Slot handle for a node inside a loaded graph.
///
/// Wraps a u32 for efficient storage and WebAssembly interop. Handles are
/// dense (`0..node_count`) and are invalidated by `clear()` and by loading a
/// new graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Default size factor for nodes that don't specify one.
pub const DEFAULT_NODE_SIZE: f32 = 1.0;

/// A node record owned by the graph engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Caller-supplied identifier.
    pub key: String,
    /// Relative charge/mass multiplier, always positive.
    pub size: f32,
    /// Display color, passed through untouched.
    pub color: Option<String>,
    /// Any other display attributes from the input.
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: DEFAULT_NODE_SIZE,
            color: None,
            attributes: Map::new(),
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}
