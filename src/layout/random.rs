//! Brute-force random placement.
//!
//! Gives every node a position at most `edge_length` away (per axis) from an
//! already placed neighbor while keeping every pair more than `separation`
//! apart. Useful as a seed for the force simulation or as a cheap layout on
//! its own.
//!
//! Placement grows outward from the roots, the nodes that are edge targets
//! but never sources. A source is placed relative to its target once the
//! target has a position. Nodes without edges count as roots.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::force::{Dimensions, DEFAULT_SEED};
use crate::error::{Error, Result};
use crate::graph::{GraphEngine, Vec3};

/// Collisions tolerated while placing a single node.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomLayoutConfig {
    /// Maximum per-axis offset of a node from the neighbor it hangs off.
    pub edge_length: f32,
    /// Minimum distance between any two nodes.
    pub separation: f32,
    /// If positive, confines nodes to a sphere of radius
    /// `edge_count / density` around the origin.
    pub density: f32,
    /// Keep roots in the center instead of pushing them to one side.
    pub concentric: bool,
    pub dimensions: u8,
    pub seed: Option<u64>,
}

impl Default for RandomLayoutConfig {
    fn default() -> Self {
        Self {
            edge_length: 20.0,
            separation: 10.0,
            density: 0.0,
            concentric: false,
            dimensions: 3,
            seed: None,
        }
    }
}

impl RandomLayoutConfig {
    pub fn validate(&self) -> Result<Dimensions> {
        if !(self.edge_length.is_finite() && self.edge_length > 0.0) {
            return Err(Error::invalid_parameter(
                "edgeLength",
                format!("must be positive and finite, got {}", self.edge_length),
            ));
        }
        if !(self.separation.is_finite() && self.separation >= 0.0) {
            return Err(Error::invalid_parameter(
                "separation",
                format!("must be non-negative and finite, got {}", self.separation),
            ));
        }
        if !(self.density.is_finite() && self.density >= 0.0) {
            return Err(Error::invalid_parameter(
                "density",
                format!("must be non-negative and finite, got {}", self.density),
            ));
        }
        Dimensions::from_count(self.dimensions)
    }
}

/// Place every node of `engine`. Positions are only written if every node
/// could be placed.
pub fn random_layout(engine: &mut GraphEngine, config: &RandomLayoutConfig) -> Result<()> {
    let dimensions = config.validate()?;
    let mut placer = Placer {
        config,
        dimensions,
        rng: SmallRng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED)),
        placed: vec![None; engine.node_count()],
        placed_points: Vec::with_capacity(engine.node_count()),
        radius_limit: engine.edge_count() as f32 / density_or_epsilon(config.density),
        roots: 0,
    };

    let edges: Vec<(usize, usize)> = engine
        .edges()
        .map(|(_, edge)| (edge.source.slot(), edge.target.slot()))
        .collect();

    let mut is_source = vec![false; engine.node_count()];
    for &(source, _) in &edges {
        is_source[source] = true;
    }
    let roots: Vec<usize> = (0..engine.node_count())
        .filter(|&slot| !is_source[slot])
        .collect();
    for slot in roots {
        placer.place_root(slot)?;
    }

    loop {
        let mut waiting = false;
        let mut progressed = false;
        for &(source, target) in &edges {
            if placer.placed[source].is_some() {
                continue;
            }
            let Some(anchor) = placer.placed[target] else {
                waiting = true;
                continue;
            };
            placer.place_near(source, anchor)?;
            progressed = true;
        }

        if !waiting {
            break;
        }
        if !progressed {
            // A cycle nobody outside points into: promote one of its nodes.
            let stuck = edges
                .iter()
                .map(|&(_, target)| target)
                .find(|&target| placer.placed[target].is_none());
            match stuck {
                Some(slot) => placer.place_root(slot)?,
                None => break,
            }
        }
    }

    for (slot, position) in placer.placed.into_iter().enumerate() {
        if let Some(position) = position {
            engine.set_position(slot, position);
        }
    }

    info!(
        nodes = engine.node_count(),
        roots = placer.roots,
        "random layout placed"
    );
    Ok(())
}

fn density_or_epsilon(density: f32) -> f32 {
    if density > 0.0 { density } else { 1e-6 }
}

struct Placer<'a> {
    config: &'a RandomLayoutConfig,
    dimensions: Dimensions,
    rng: SmallRng,
    placed: Vec<Option<Vec3>>,
    placed_points: Vec<Vec3>,
    radius_limit: f32,
    roots: usize,
}

impl Placer<'_> {
    /// Roots are lined up along x, `separation` apart. With no separation
    /// they all share the origin.
    fn place_root(&mut self, slot: usize) -> Result<()> {
        let mut attempts = 0;
        loop {
            let candidate = Vec3::new(self.config.separation * self.roots as f32, 0.0, 0.0);
            self.roots += 1;
            if self.config.separation == 0.0 || !self.collides(candidate) {
                self.commit(slot, candidate);
                return Ok(());
            }
            attempts += 1;
            if attempts > MAX_PLACEMENT_ATTEMPTS {
                return Err(Error::Placement { attempts });
            }
        }
    }

    fn place_near(&mut self, slot: usize, anchor: Vec3) -> Result<()> {
        let mut attempts = 0;
        loop {
            let candidate = self.propose(anchor);
            if !self.collides(candidate) && candidate.length() <= self.radius_limit {
                self.commit(slot, candidate);
                debug!(slot, attempts, "node placed");
                return Ok(());
            }
            attempts += 1;
            if attempts > MAX_PLACEMENT_ATTEMPTS {
                return Err(Error::Placement { attempts });
            }
        }
    }

    fn propose(&mut self, anchor: Vec3) -> Vec3 {
        let length = self.config.edge_length;
        // Outside concentric mode nodes only grow in +x, which pushes the
        // roots to the edge of the layout.
        let x = if self.config.concentric {
            self.rng.gen_range(-1.0f32..1.0)
        } else {
            self.rng.gen_range(0.0f32..1.0)
        };
        let y = self.rng.gen_range(-1.0f32..1.0);
        let z = match self.dimensions {
            Dimensions::Three => self.rng.gen_range(-1.0f32..1.0),
            Dimensions::Two => 0.0,
        };
        anchor + Vec3::new(x, y, z) * length
    }

    fn collides(&self, candidate: Vec3) -> bool {
        self.placed_points
            .iter()
            .any(|&other| candidate.distance(other) <= self.config.separation)
    }

    fn commit(&mut self, slot: usize, position: Vec3) {
        self.placed[slot] = Some(position);
        self.placed_points.push(position);
    }
}
