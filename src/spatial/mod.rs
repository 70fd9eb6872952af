//! Spatial queries over node positions.
//!
//! An R-tree index answers nearest-node and radius queries in O(log n);
//! ray picking and hover tracking back the presentation layer's pointer
//! interaction.

pub mod picking;
mod rtree;

pub use picking::{pick_ray, HoverEvent, HoverTracker, RayHit, DEFAULT_NODE_RADIUS};
pub use rtree::SpatialIndex;
