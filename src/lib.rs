//! Lodestar Graph - WASM Module
//!
//! Force-directed 3D layout for node/edge graphs. The core is plain Rust and
//! fully usable natively; this crate root adds a JavaScript-friendly API via
//! wasm-bindgen that a three.js (or similar) renderer drives.
//!
//! # Architecture
//!
//! - `graph`: Graph model on petgraph's StableGraph with SoA position buffers
//! - `layout`: Force simulation, run scheduler, random placement, edge geometry
//! - `spatial`: R-tree nearest-node queries, ray picking and hover tracking
//! - `session`: Graph + scheduler with the single-writer rule enforced
//! - `error`: Crate error type

use js_sys::Float32Array;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod layout;
pub mod session;
pub mod spatial;

pub use error::{Error, Result};

use graph::{GraphDescription, NodeId, Vec3};
use layout::{RandomLayoutConfig, SimulationConfig};
use session::LayoutSession;
use spatial::{HoverEvent, DEFAULT_NODE_RADIUS};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Hover transition as handed to JavaScript: `{ kind: "enter", node: "a" }`.
#[derive(Serialize)]
struct HoverChange<'a> {
    kind: &'static str,
    node: &'a str,
}

/// Main entry point for the layout engine.
///
/// Wraps a [`LayoutSession`] and exposes it to JavaScript. Node ids cross the
/// boundary as strings; positions as `Float32Array`s.
#[wasm_bindgen]
pub struct LodestarGraphWasm {
    session: LayoutSession,
}

impl Default for LodestarGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl LodestarGraphWasm {
    /// Create an engine with an empty graph.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            session: LayoutSession::new(),
        }
    }

    // =========================================================================
    // Graph lifecycle
    // =========================================================================

    /// Load a graph from a JS object: `{ nodes: { id: {...} }, edges: [...],
    /// directed }`, or an array of `[source, target]` pairs.
    pub fn load(&mut self, graph: JsValue) -> std::result::Result<(), JsError> {
        let value: serde_json::Value = serde_wasm_bindgen::from_value(graph)?;
        let description = GraphDescription::from_value(value)?;
        self.session.load(&description)?;
        Ok(())
    }

    /// Load a graph from its JSON text.
    #[wasm_bindgen(js_name = loadJson)]
    pub fn load_json(&mut self, text: &str) -> std::result::Result<(), JsError> {
        self.session.load_json(text)?;
        Ok(())
    }

    /// Load a directed graph from `[[source, target], ...]`.
    #[wasm_bindgen(js_name = loadEdgePairs)]
    pub fn load_edge_pairs(&mut self, pairs: JsValue) -> std::result::Result<(), JsError> {
        let value: serde_json::Value = serde_wasm_bindgen::from_value(pairs)?;
        if !value.is_array() {
            return Err(JsError::new("expected an array of [source, target] pairs"));
        }
        let description = GraphDescription::from_value(value)?;
        self.session.load(&description)?;
        Ok(())
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) -> std::result::Result<(), JsError> {
        self.session.clear()?;
        Ok(())
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.session.engine().node_count()
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> usize {
        self.session.engine().edge_count()
    }

    /// Node ids in slot order, matching the position buffers.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Vec<String> {
        self.session
            .engine()
            .nodes()
            .map(|(_, node)| node.key.clone())
            .collect()
    }

    /// Move a node by hand (e.g. while dragging). Returns false for an
    /// unknown id.
    #[wasm_bindgen(js_name = setNodePosition)]
    pub fn set_node_position(
        &mut self,
        id: &str,
        x: f32,
        y: f32,
        z: f32,
    ) -> std::result::Result<bool, JsError> {
        Ok(self.session.set_node_position(id, Vec3::new(x, y, z))?)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Start a force layout run. `options` is `{ iterations, forceStrength,
    /// dimensions, seed }`, every field optional.
    #[wasm_bindgen(js_name = startLayout)]
    pub fn start_layout(&mut self, options: JsValue) -> std::result::Result<(), JsError> {
        let config = simulation_config(options)?;
        self.session.start_layout(&config)?;
        Ok(())
    }

    /// Execute up to `budget` iterations. Call once per animation frame.
    ///
    /// Returns `{ executed, remaining, finished, last }`.
    pub fn tick(&mut self, budget: u32) -> std::result::Result<JsValue, JsError> {
        let report = self.session.tick(budget);
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Start a run and finish it before returning.
    #[wasm_bindgen(js_name = runLayout)]
    pub fn run_layout(&mut self, options: JsValue) -> std::result::Result<JsValue, JsError> {
        let config = simulation_config(options)?;
        let report = self.session.run_layout(&config)?;
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Abandon the current run. Returns the number of discarded iterations.
    #[wasm_bindgen(js_name = cancelLayout)]
    pub fn cancel_layout(&mut self) -> u32 {
        self.session.cancel_layout()
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// `[completed, total]` while a run is active.
    pub fn progress(&self) -> Option<Vec<u32>> {
        self.session
            .progress()
            .map(|(completed, total)| vec![completed, total])
    }

    /// Non-colliding random placement. `options` is `{ edgeLength,
    /// separation, density, concentric, dimensions, seed }`.
    #[wasm_bindgen(js_name = randomLayout)]
    pub fn random_layout(&mut self, options: JsValue) -> std::result::Result<(), JsError> {
        let mut config: RandomLayoutConfig = options_or_default(options)?;
        if config.seed.is_none() {
            config.seed = Some(random_seed());
        }
        self.session.random_layout(&config)?;
        Ok(())
    }

    // =========================================================================
    // Position Buffer Access
    // =========================================================================

    /// Positions interleaved as [x0, y0, z0, x1, ...] (copied).
    pub fn positions(&self) -> Vec<f32> {
        self.session.engine().positions_flat()
    }

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.session.engine().positions_x()) }
    }

    /// Get a zero-copy view of Y positions. Same caveats as X.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.session.engine().positions_y()) }
    }

    /// Get a zero-copy view of Z positions. Same caveats as X.
    #[wasm_bindgen(js_name = getPositionsZView)]
    pub fn get_positions_z_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.session.engine().positions_z()) }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Midpoint, direction, length (and arrow placement when directed) of
    /// every edge.
    #[wasm_bindgen(js_name = edgeGeometry)]
    pub fn edge_geometry(&self) -> std::result::Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.session.edge_geometry())?)
    }

    /// The laid-out graph as JSON, coordinates rounded to three decimals.
    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self, pretty: bool) -> std::result::Result<String, JsError> {
        let snapshot = self.session.snapshot();
        let text = if pretty {
            snapshot.to_json_pretty()?
        } else {
            snapshot.to_json_compact()?
        };
        Ok(text)
    }

    /// Bounding box as [minX, minY, minZ, maxX, maxY, maxZ].
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.session.engine().bounds().map(|(min, max)| {
            vec![min.x, min.y, min.z, max.x, max.y, max.z]
        })
    }

    // =========================================================================
    // Picking
    // =========================================================================

    /// Id of the node closest to a point.
    #[wasm_bindgen(js_name = nearestNode)]
    pub fn nearest_node(&mut self, x: f32, y: f32, z: f32) -> Option<String> {
        let id = self.session.nearest_node(Vec3::new(x, y, z))?;
        self.key_of(id)
    }

    /// Id of the node closest to a point, if within `max_distance`.
    #[wasm_bindgen(js_name = nearestNodeWithin)]
    pub fn nearest_node_within(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        max_distance: f32,
    ) -> Option<String> {
        let id = self
            .session
            .nearest_node_within(Vec3::new(x, y, z), max_distance)?;
        self.key_of(id)
    }

    /// Id of the first node hit by a world-space ray. Each node is a sphere
    /// of `base_radius` (default 2) times its size.
    #[wasm_bindgen(js_name = pickRay)]
    #[allow(clippy::too_many_arguments)]
    pub fn pick_ray(
        &self,
        origin_x: f32,
        origin_y: f32,
        origin_z: f32,
        dir_x: f32,
        dir_y: f32,
        dir_z: f32,
        base_radius: Option<f32>,
    ) -> Option<String> {
        let hit = self.session.pick_ray(
            Vec3::new(origin_x, origin_y, origin_z),
            Vec3::new(dir_x, dir_y, dir_z),
            base_radius.unwrap_or(DEFAULT_NODE_RADIUS),
        )?;
        self.key_of(hit.node)
    }

    /// Pick along the pointer ray and return the hover transitions since the
    /// previous call, as `[{ kind: "exit" | "enter", node }]`.
    #[allow(clippy::too_many_arguments)]
    pub fn hover(
        &mut self,
        origin_x: f32,
        origin_y: f32,
        origin_z: f32,
        dir_x: f32,
        dir_y: f32,
        dir_z: f32,
        base_radius: Option<f32>,
    ) -> std::result::Result<JsValue, JsError> {
        let events = self.session.hover(
            Vec3::new(origin_x, origin_y, origin_z),
            Vec3::new(dir_x, dir_y, dir_z),
            base_radius.unwrap_or(DEFAULT_NODE_RADIUS),
        );
        let engine = self.session.engine();
        let changes: Vec<HoverChange<'_>> = events
            .iter()
            .filter_map(|event| {
                let (kind, id) = match *event {
                    HoverEvent::Enter(id) => ("enter", id),
                    HoverEvent::Exit(id) => ("exit", id),
                };
                engine.node_key(id).map(|node| HoverChange { kind, node })
            })
            .collect();
        Ok(serde_wasm_bindgen::to_value(&changes)?)
    }

    fn key_of(&self, id: NodeId) -> Option<String> {
        self.session.engine().node_key(id).map(str::to_string)
    }
}

/// Deserialize an optional options object, falling back to defaults.
fn options_or_default<T>(options: JsValue) -> std::result::Result<T, JsError>
where
    T: DeserializeOwned + Default,
{
    if options.is_undefined() || options.is_null() {
        return Ok(T::default());
    }
    Ok(serde_wasm_bindgen::from_value(options)?)
}

fn simulation_config(options: JsValue) -> std::result::Result<SimulationConfig, JsError> {
    let mut config: SimulationConfig = options_or_default(options)?;
    if config.seed.is_none() {
        config.seed = Some(random_seed());
    }
    Ok(config)
}

/// Seed for runs that didn't ask for one.
fn random_seed() -> u64 {
    (js_sys::Math::random() * u32::MAX as f64) as u64
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::graph::GraphEngine;
    use crate::layout::{edge_geometry, random_layout, LayoutScheduler};

    const SAMPLE: &str = r#"{
        "directed": true,
        "nodes": {
            "hub": {"location": [0, 0, 0], "size": 2, "color": "0xff0000", "label": "Hub"},
            "1": {},
            "2": {"location": [3, 1, 0]},
            "3": {"location": [-2, 4, 1]}
        },
        "edges": [
            {"source": 1, "target": "hub"},
            {"source": 2, "target": "hub", "size": 0.5},
            {"source": 3, "target": "hub", "arrowSize": 0.3}
        ]
    }"#;

    fn star(leaves: usize) -> GraphEngine {
        let pairs: Vec<(String, String)> = (0..leaves)
            .map(|i| (format!("leaf{i}"), "center".to_string()))
            .collect();
        let mut engine = GraphEngine::new();
        engine
            .load(&GraphDescription::from_edge_pairs(pairs))
            .unwrap();
        engine
    }

    #[test]
    fn test_json_to_layout_to_snapshot() {
        let mut session = LayoutSession::new();
        session.load_json(SAMPLE).unwrap();
        assert_eq!(session.engine().node_count(), 4);
        assert_eq!(session.engine().edge_count(), 3);

        let report = session
            .run_layout(&SimulationConfig {
                iterations: 300,
                ..SimulationConfig::default()
            })
            .unwrap();
        assert_eq!(report.executed, 300);
        assert!(session.engine().positions_flat().iter().all(|v| v.is_finite()));

        let snapshot = session.snapshot();
        let hub = &snapshot.nodes["hub"];
        assert_eq!(hub.size, Some(2.0));
        assert_eq!(hub.color.as_deref(), Some("0xff0000"));
        assert_eq!(hub.attributes["label"], "Hub");
        for node in snapshot.nodes.values() {
            for c in node.location {
                assert_eq!(c, (c * 1000.0).round() / 1000.0);
            }
        }

        // The snapshot is itself a loadable graph
        let text = snapshot.to_json_pretty().unwrap();
        let mut reloaded = GraphEngine::new();
        reloaded
            .load(&GraphDescription::from_json(&text).unwrap())
            .unwrap();
        assert_eq!(reloaded.node_count(), 4);
        assert_eq!(reloaded.snapshot(), snapshot);
    }

    #[test]
    fn test_random_seed_then_force_layout() {
        let mut engine = star(20);
        random_layout(&mut engine, &RandomLayoutConfig::default()).unwrap();

        let mut scheduler = LayoutScheduler::new();
        scheduler
            .start(
                &mut engine,
                &SimulationConfig {
                    iterations: 500,
                    ..SimulationConfig::default()
                },
            )
            .unwrap();
        let mut ticks = 0;
        while scheduler.is_running() {
            scheduler.tick(&mut engine, 64);
            ticks += 1;
        }
        assert_eq!(ticks, 8);

        let (min, max) = engine.bounds().unwrap();
        assert!(min.is_finite() && max.is_finite());

        let geometry = edge_geometry(&engine);
        assert_eq!(geometry.len(), 20);
        for g in &geometry {
            assert_eq!(g.target, "center");
            assert!(g.length > 0.0);
            assert!((g.direction.length() - 1.0).abs() < 1e-4);
            assert!(g.arrow.is_some());
        }
    }

    #[test]
    fn test_edge_pairs_pipeline_with_numeric_ids() {
        let description = GraphDescription::from_json("[[1, 2], [2, 3], [3, 1], [4, 1]]").unwrap();
        let mut session = LayoutSession::new();
        session.load(&description).unwrap();
        assert_eq!(session.engine().node_count(), 4);
        assert!(session.engine().node_id("4").is_some());

        session
            .random_layout(&RandomLayoutConfig {
                seed: Some(3),
                ..RandomLayoutConfig::default()
            })
            .unwrap();
        session
            .run_layout(&SimulationConfig {
                iterations: 100,
                dimensions: 2,
                ..SimulationConfig::default()
            })
            .unwrap();
        assert!(session.engine().positions_z().iter().all(|&z| z == 0.0));
    }

    #[test]
    fn test_clear_and_reload() {
        let mut session = LayoutSession::new();
        session.load_json(SAMPLE).unwrap();
        session
            .run_layout(&SimulationConfig {
                iterations: 10,
                ..SimulationConfig::default()
            })
            .unwrap();

        session.clear().unwrap();
        assert!(session.engine().is_empty());
        assert!(session.engine().bounds().is_none());
        assert!(session.edge_geometry().is_empty());

        session.load_json(SAMPLE).unwrap();
        assert_eq!(session.engine().node_count(), 4);
        let hub = session.engine().node_id("hub").unwrap();
        assert_eq!(session.engine().node_position(hub), Some(Vec3::ZERO));
    }
}
