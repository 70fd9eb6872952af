//! Per-edge geometry for the presentation layer.
//!
//! A renderer draws each edge as a unit cylinder placed at the midpoint,
//! oriented toward the target and stretched to the edge length. Directed
//! graphs also get an arrow cone at the midpoint.

use serde::Serialize;

use crate::graph::{Edge, EdgeId, GraphEngine, Vec3};

/// Arrow cone placement for one directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowPlacement {
    pub position: Vec3,
    /// Unit vector toward the target.
    pub direction: Vec3,
    /// Uniform scale: the edge's `arrowSize` attribute, else the square
    /// root of its size.
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeGeometry {
    #[serde(skip)]
    pub edge: EdgeId,
    pub source: String,
    pub target: String,
    pub midpoint: Vec3,
    /// Unit vector from source to target, zero for a zero-length edge.
    pub direction: Vec3,
    pub length: f32,
    /// Cylinder thickness.
    pub size: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow: Option<ArrowPlacement>,
}

/// Geometry of every edge at the current positions, in edge order.
pub fn edge_geometry(engine: &GraphEngine) -> Vec<EdgeGeometry> {
    engine
        .edges()
        .map(|(id, edge)| geometry_of(engine, id, edge))
        .collect()
}

fn geometry_of(engine: &GraphEngine, id: EdgeId, edge: &Edge) -> EdgeGeometry {
    let from = engine.position(edge.source.slot());
    let to = engine.position(edge.target.slot());
    let midpoint = from.midpoint(to);
    let direction = (to - from).normalize_or_zero();

    let arrow = engine.is_directed().then(|| ArrowPlacement {
        position: midpoint,
        direction,
        scale: arrow_scale(edge),
    });

    EdgeGeometry {
        edge: id,
        source: engine.node_key(edge.source).unwrap_or_default().to_string(),
        target: engine.node_key(edge.target).unwrap_or_default().to_string(),
        midpoint,
        direction,
        length: from.distance(to),
        size: edge.size,
        arrow,
    }
}

fn arrow_scale(edge: &Edge) -> f32 {
    edge.attributes
        .get("arrowSize")
        .and_then(|value| value.as_f64())
        .map(|size| size as f32)
        .unwrap_or_else(|| edge.size.sqrt())
}
