//! A graph together with the scheduler that lays it out.
//!
//! The session is the only writer of node positions. While a run is in
//! flight every other mutation (reload, clear, manual placement, random
//! placement) is rejected with [`Error::ConcurrentRun`]; reads are always
//! allowed and observe the state between two iterations.

use tracing::warn;

use crate::error::{Error, Result};
use crate::graph::{GraphDescription, GraphEngine, LayoutSnapshot, NodeId, Vec3};
use crate::layout::{
    edge_geometry, random_layout, EdgeGeometry, LayoutScheduler, RandomLayoutConfig,
    SimulationConfig, TickReport,
};
use crate::spatial::{pick_ray, HoverEvent, HoverTracker, RayHit};

#[derive(Default)]
pub struct LayoutSession {
    engine: GraphEngine,
    scheduler: LayoutScheduler,
    hover: HoverTracker,
}

impl LayoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &LayoutScheduler {
        &self.scheduler
    }

    fn ensure_idle(&self, operation: &'static str) -> Result<()> {
        match self.scheduler.busy_error() {
            Some(err) => {
                warn!(operation, %err, "rejected while a layout is running");
                Err(err)
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Graph lifecycle
    // =========================================================================

    /// Replace the graph. On error the previous graph is kept.
    pub fn load(&mut self, description: &GraphDescription) -> Result<()> {
        self.ensure_idle("load")?;
        self.engine.load(description)?;
        self.hover.reset();
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<()> {
        self.ensure_idle("load")?;
        let description = GraphDescription::from_json(text)?;
        self.load(&description)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_idle("clear")?;
        self.engine.clear();
        self.hover.reset();
        Ok(())
    }

    /// Move a node by hand. Returns false for an unknown id.
    pub fn set_node_position(&mut self, key: &str, position: Vec3) -> Result<bool> {
        self.ensure_idle("set_node_position")?;
        if !position.is_finite() {
            return Err(Error::invalid_parameter(
                "location",
                "coordinates must be finite",
            ));
        }
        Ok(match self.engine.node_id(key) {
            Some(id) => self.engine.set_node_position(id, position),
            None => false,
        })
    }

    pub fn random_layout(&mut self, config: &RandomLayoutConfig) -> Result<()> {
        self.ensure_idle("random_layout")?;
        random_layout(&mut self.engine, config)
    }

    // =========================================================================
    // Force layout runs
    // =========================================================================

    pub fn start_layout(&mut self, config: &SimulationConfig) -> Result<()> {
        self.scheduler.start(&mut self.engine, config)
    }

    pub fn tick(&mut self, budget: u32) -> TickReport {
        self.scheduler.tick(&mut self.engine, budget)
    }

    /// Start a run and execute all of it before returning.
    pub fn run_layout(&mut self, config: &SimulationConfig) -> Result<TickReport> {
        self.start_layout(config)?;
        Ok(self.scheduler.run_to_completion(&mut self.engine))
    }

    pub fn cancel_layout(&mut self) -> u32 {
        self.scheduler.cancel()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn progress(&self) -> Option<(u32, u32)> {
        self.scheduler.progress()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn nearest_node(&mut self, point: Vec3) -> Option<NodeId> {
        self.engine.find_nearest_node(point)
    }

    pub fn nearest_node_within(&mut self, point: Vec3, max_distance: f32) -> Option<NodeId> {
        self.engine.find_nearest_node_within(point, max_distance)
    }

    pub fn pick_ray(&self, origin: Vec3, direction: Vec3, base_radius: f32) -> Option<RayHit> {
        pick_ray(&self.engine, origin, direction, base_radius)
    }

    /// Pick along a pointer ray and report hover transitions.
    pub fn hover(&mut self, origin: Vec3, direction: Vec3, base_radius: f32) -> Vec<HoverEvent> {
        let hit = pick_ray(&self.engine, origin, direction, base_radius).map(|hit| hit.node);
        self.hover.update(hit)
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hover.current()
    }

    pub fn edge_geometry(&self) -> Vec<EdgeGeometry> {
        edge_geometry(&self.engine)
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.engine.snapshot()
    }
}
