//! Layout algorithms.
//!
//! The force-directed simulation computes one iteration at a time and the
//! scheduler drives it through a run. Random placement seeds positions, and
//! edge geometry turns the result into renderable primitives.

pub mod force;
pub mod geometry;
pub mod random;
pub mod scheduler;

pub use force::{Dimensions, ForceSimulation, IterationStats, SimulationConfig, SimulationParams};
pub use geometry::{edge_geometry, ArrowPlacement, EdgeGeometry};
pub use random::{random_layout, RandomLayoutConfig};
pub use scheduler::{LayoutScheduler, SchedulerState, TickReport};
