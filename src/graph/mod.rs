//! Graph data structures and operations.
//!
//! This module provides the core graph structure using petgraph's StableGraph
//! for arena-style node/edge storage, with Structure of Arrays (SoA) layout
//! for positions and force accumulators.

pub mod description;
mod edge;
mod engine;
mod node;
mod vec3;

pub use description::{EdgeSpec, GraphDescription, LayoutSnapshot, NodeSnapshot, NodeSpec};
pub use edge::{Edge, EdgeId, DEFAULT_EDGE_SIZE};
pub use engine::GraphEngine;
pub use node::{Node, NodeId, DEFAULT_NODE_SIZE};
pub use vec3::Vec3;
