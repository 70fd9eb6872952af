//! Force-directed layout: one simulation iteration at a time.
//!
//! Every iteration accumulates two independent contributions per node and
//! then integrates them:
//! - **Repulsion**: inverse-square push between every ordered pair of
//!   distinct nodes closer than `max_distance`, scaled by the other node's
//!   size (Coulomb-like, size acts as charge).
//! - **Springs**: per edge, `(d² - k²) / (d·k)` along the edge, which is zero
//!   at `d = k` (Hooke-like), scaled by the edge size and the other node's
//!   size.
//! - **Integration**: force × damping, clamped per axis to `max_velocity`,
//!   added to the position; accumulators are then zeroed.
//!
//! Damping starts at 0.01 and drops by `0.01 / iterations` at the start of
//! every iteration, so the layout cools down over a run.

use std::ops::Range;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{GraphEngine, Vec3};

pub const DEFAULT_ITERATIONS: u32 = 10_000;
pub const DEFAULT_FORCE_STRENGTH: f32 = 10.0;
pub const INITIAL_DAMPING: f32 = 0.01;
/// Largest per-axis displacement of a node in one iteration.
pub const MAX_VELOCITY: f32 = 2.0;
/// Pairs at least this far apart don't repel; springs never stretch further.
pub const MAX_DISTANCE: f32 = 50.0;
/// Below this separation the direction between two nodes is meaningless.
pub const MIN_DISTANCE: f32 = 0.1;
/// Per-component range of the random direction substituted for
/// near-coincident nodes. Repulsion and springs draw from the same range.
pub const DEGENERATE_JITTER: Range<f32> = 0.1..0.2;
pub const DEFAULT_SEED: u64 = 0x1d6a_5eed;
/// Largest accepted force strength. Keeps `k² / MIN_DISTANCE²` and the
/// per-node force sums well inside f32 range.
pub const MAX_FORCE_STRENGTH: f32 = 1.0e12;

/// Whether the layout uses the z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimensions {
    Two,
    #[default]
    Three,
}

impl Dimensions {
    /// Parse the `dimensions` option (2 or 3).
    pub fn from_count(count: u8) -> Result<Self> {
        match count {
            2 => Ok(Dimensions::Two),
            3 => Ok(Dimensions::Three),
            other => Err(Error::invalid_parameter(
                "dimensions",
                format!("must be 2 or 3, got {other}"),
            )),
        }
    }
}

/// User-facing simulation options. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Number of iterations in a run (must be positive).
    pub iterations: i64,
    /// Equilibrium spring length and repulsion scale (must be positive).
    pub force_strength: f32,
    /// 3 (default) or 2; a 2D layout keeps every z at 0.
    pub dimensions: u8,
    /// RNG seed for degenerate-case directions.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: i64::from(DEFAULT_ITERATIONS),
            force_strength: DEFAULT_FORCE_STRENGTH,
            dimensions: 3,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check ranges and produce the parameters of one run.
    pub fn validate(&self) -> Result<SimulationParams> {
        let iterations = u32::try_from(self.iterations)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                Error::invalid_parameter(
                    "iterations",
                    format!("must be a positive integer, got {}", self.iterations),
                )
            })?;

        let params = SimulationParams {
            iterations,
            force_strength: self.force_strength,
            dimensions: Dimensions::from_count(self.dimensions)?,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            ..SimulationParams::default()
        };
        params.validate()?;
        Ok(params)
    }
}

/// Validated parameters, fixed for the duration of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub iterations: u32,
    pub force_strength: f32,
    pub initial_damping: f32,
    pub max_velocity: f32,
    pub max_distance: f32,
    pub dimensions: Dimensions,
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            force_strength: DEFAULT_FORCE_STRENGTH,
            initial_damping: INITIAL_DAMPING,
            max_velocity: MAX_VELOCITY,
            max_distance: MAX_DISTANCE,
            dimensions: Dimensions::Three,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulationParams {
    /// Range checks shared by every way of starting a run.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::invalid_parameter("iterations", "must be positive"));
        }
        if !(self.force_strength > 0.0 && self.force_strength <= MAX_FORCE_STRENGTH) {
            return Err(Error::invalid_parameter(
                "forceStrength",
                format!(
                    "must be in (0, {MAX_FORCE_STRENGTH:e}], got {}",
                    self.force_strength
                ),
            ));
        }
        for (name, value) in [
            ("initialDamping", self.initial_damping),
            ("maxVelocity", self.max_velocity),
            ("maxDistance", self.max_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::invalid_parameter(
                    name,
                    format!("must be non-negative and finite, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Amount damping drops by every iteration.
    pub fn damping_step(&self) -> f32 {
        self.initial_damping / self.iterations as f32
    }
}

/// What one iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationStats {
    /// Damping applied during this iteration.
    pub damping: f32,
    /// Largest absolute per-axis displacement of any node.
    pub max_displacement: f32,
}

/// Computes iterations of the force-directed layout over a [`GraphEngine`].
///
/// Holds only the run parameters and the RNG used for degenerate cases.
pub struct ForceSimulation {
    params: SimulationParams,
    rng: SmallRng,
    /// (source slot, target slot, edge size), refilled every iteration
    springs: Vec<(usize, usize, f32)>,
}

impl ForceSimulation {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            params,
            rng: SmallRng::seed_from_u64(params.seed),
            springs: Vec::new(),
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Zero every force accumulator and, for a 2D run, flatten z.
    pub fn prepare(&self, engine: &mut GraphEngine) {
        engine.reset_forces();
        if self.params.dimensions == Dimensions::Two {
            for slot in 0..engine.node_count() {
                let p = engine.position(slot);
                if p.z != 0.0 {
                    engine.set_position(slot, Vec3::new(p.x, p.y, 0.0));
                }
            }
        }
    }

    /// Run one iteration: decay `damping`, accumulate forces, integrate.
    pub fn step(&mut self, engine: &mut GraphEngine, damping: &mut f32) -> IterationStats {
        *damping = (*damping - self.params.damping_step()).max(0.0);

        self.apply_repulsion(engine);
        self.apply_springs(engine);
        let max_displacement = self.integrate(engine, *damping);

        IterationStats {
            damping: *damping,
            max_displacement,
        }
    }

    fn apply_repulsion(&mut self, engine: &mut GraphEngine) {
        let n = engine.node_count();
        let k_sq = self.params.force_strength * self.params.force_strength;

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (delta, distance) = self.separation(engine.position(i), engine.position(j));
                if distance >= self.params.max_distance {
                    continue;
                }

                let push = delta * (k_sq / (distance * distance));
                let (size_i, size_j) = (engine.size(i), engine.size(j));
                engine.add_force(i, -(push * size_j));
                engine.add_force(j, push * size_i);
            }
        }
    }

    fn apply_springs(&mut self, engine: &mut GraphEngine) {
        let k = self.params.force_strength;
        let mut springs = std::mem::take(&mut self.springs);
        springs.clear();
        springs.extend(
            engine
                .edges()
                .map(|(_, edge)| (edge.source.slot(), edge.target.slot(), edge.size)),
        );

        for &(source, target, weight) in &springs {
            let (delta, distance) =
                self.separation(engine.position(source), engine.position(target));
            let distance = distance.min(self.params.max_distance);

            let pull = delta * ((distance * distance - k * k) / (distance * k) * weight);
            let (size_source, size_target) = (engine.size(source), engine.size(target));
            engine.add_force(source, pull * size_target);
            engine.add_force(target, -(pull * size_source));
        }
        self.springs = springs;
    }

    fn integrate(&self, engine: &mut GraphEngine, damping: f32) -> f32 {
        let mut max_displacement = 0.0_f32;

        for slot in 0..engine.node_count() {
            let damped = (engine.force(slot) * damping).clamp_components(self.params.max_velocity);
            // Overflowed sums (inf - inf, inf * 0) leave that axis in place
            let mut step = Vec3::new(
                nan_to_zero(damped.x),
                nan_to_zero(damped.y),
                nan_to_zero(damped.z),
            );
            if self.params.dimensions == Dimensions::Two {
                step.z = 0.0;
            }
            let next = engine.position(slot) + step;
            engine.set_position(slot, next);
            max_displacement = max_displacement
                .max(step.x.abs())
                .max(step.y.abs())
                .max(step.z.abs());
        }

        engine.reset_forces();
        max_displacement
    }

    /// Vector from `from` to `to` and its length, with a random direction
    /// substituted when the points nearly coincide.
    fn separation(&mut self, from: Vec3, to: Vec3) -> (Vec3, f32) {
        let delta = to - from;
        let distance = delta.length();
        if distance >= MIN_DISTANCE {
            return (delta, distance);
        }

        let jitter = Vec3::new(
            self.rng.gen_range(DEGENERATE_JITTER),
            self.rng.gen_range(DEGENERATE_JITTER),
            match self.params.dimensions {
                Dimensions::Three => self.rng.gen_range(DEGENERATE_JITTER),
                Dimensions::Two => 0.0,
            },
        );
        (jitter, jitter.length())
    }
}

#[inline]
fn nan_to_zero(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value }
}
