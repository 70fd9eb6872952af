//! Ray picking and hover tracking as pure queries.
//!
//! The renderer turns a pointer position into a world-space ray; everything
//! after that (which node the ray hits, whether the hovered node changed)
//! is answered here, without any rendering context.

use crate::graph::{GraphEngine, NodeId, Vec3};

/// Default sphere radius of a node with size 1.0.
pub const DEFAULT_NODE_RADIUS: f32 = 2.0;

/// Result of a successful ray pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    /// Distance along the ray to the first intersection.
    pub distance: f32,
}

/// Find the closest node whose sphere the ray intersects.
///
/// Each node is a sphere of radius `base_radius * size`. `direction` does not
/// need to be normalized. Nodes behind the origin are ignored.
pub fn pick_ray(
    engine: &GraphEngine,
    origin: Vec3,
    direction: Vec3,
    base_radius: f32,
) -> Option<RayHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let mut best: Option<RayHit> = None;
    for (id, node) in engine.nodes() {
        let radius = base_radius * node.size;
        let center = engine.position(id.slot());
        let Some(distance) = intersect_sphere(origin, direction, center, radius) else {
            continue;
        };
        if best.is_none_or(|hit| distance < hit.distance) {
            best = Some(RayHit { node: id, distance });
        }
    }
    best
}

/// Distance along a normalized ray to a sphere, if it is hit.
fn intersect_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let along = to_center.dot(direction);
    let off_axis_sq = to_center.length_squared() - along * along;
    let radius_sq = radius * radius;
    if off_axis_sq > radius_sq {
        return None;
    }

    let half_chord = (radius_sq - off_axis_sq).sqrt();
    let near = along - half_chord;
    let far = along + half_chord;
    if far < 0.0 {
        None
    } else if near >= 0.0 {
        Some(near)
    } else {
        // Origin is inside the sphere
        Some(far)
    }
}

/// Hover transition produced by [`HoverTracker::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    Enter(NodeId),
    Exit(NodeId),
}

/// Remembers the hovered node between pointer moves.
#[derive(Debug, Clone, Default)]
pub struct HoverTracker {
    current: Option<NodeId>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Feed the latest pick result. Moving from one node straight to another
    /// yields an exit followed by an enter.
    pub fn update(&mut self, hit: Option<NodeId>) -> Vec<HoverEvent> {
        if hit == self.current {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if let Some(previous) = self.current {
            events.push(HoverEvent::Exit(previous));
        }
        if let Some(next) = hit {
            events.push(HoverEvent::Enter(next));
        }
        self.current = hit;
        events
    }

    /// Forget the hovered node, e.g. after the graph was replaced.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
