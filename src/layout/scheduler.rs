//! Cooperative scheduling of force-simulation iterations.
//!
//! A run is a FIFO queue of iteration tasks. The host drains it in slices
//! with [`LayoutScheduler::tick`] (typically once per animation frame) or all
//! at once with [`LayoutScheduler::run_to_completion`]. Iteration k+1 only
//! starts after iteration k has been integrated, and nothing else can touch
//! the graph in between because every call borrows it mutably.
//!
//! State machine: `Idle -> Running -> Idle`. Starting a run while one is in
//! flight is rejected; [`LayoutScheduler::cancel`] drops the remaining
//! iterations and returns to `Idle`.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::force::{ForceSimulation, IterationStats, SimulationConfig, SimulationParams};
use crate::error::{Error, Result};
use crate::graph::GraphEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// One queued iteration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IterationTask {
    index: u32,
}

struct ActiveRun {
    simulation: ForceSimulation,
    /// Decremented by every iteration
    damping: f32,
    queue: VecDeque<IterationTask>,
    completed: u32,
    total: u32,
}

/// Outcome of a [`LayoutScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Iterations executed by this call.
    pub executed: u32,
    /// Iterations still queued afterwards.
    pub remaining: u32,
    /// True if this call executed the last iteration of the run.
    pub finished: bool,
    /// Stats of the last iteration executed by this call.
    pub last: Option<IterationStats>,
}

impl TickReport {
    fn idle() -> Self {
        Self {
            executed: 0,
            remaining: 0,
            finished: false,
            last: None,
        }
    }
}

/// Drives a [`ForceSimulation`] through a fixed number of iterations.
#[derive(Default)]
pub struct LayoutScheduler {
    run: Option<ActiveRun>,
}

impl LayoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        if self.run.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// `(completed, total)` iterations of the active run.
    pub fn progress(&self) -> Option<(u32, u32)> {
        self.run.as_ref().map(|run| (run.completed, run.total))
    }

    /// Current damping of the active run.
    pub fn damping(&self) -> Option<f32> {
        self.run.as_ref().map(|run| run.damping)
    }

    /// Error to report when something needs the scheduler to be idle.
    pub fn busy_error(&self) -> Option<Error> {
        self.progress()
            .map(|(completed, total)| Error::ConcurrentRun { completed, total })
    }

    /// Validate `config` and queue a new run. Nothing is executed yet.
    pub fn start(&mut self, engine: &mut GraphEngine, config: &SimulationConfig) -> Result<()> {
        let params = config.validate()?;
        self.start_with_params(engine, params)
    }

    /// Queue a run with parameters built in code. They go through the same
    /// range checks as a [`SimulationConfig`].
    pub fn start_with_params(
        &mut self,
        engine: &mut GraphEngine,
        params: SimulationParams,
    ) -> Result<()> {
        if let Some(err) = self.busy_error() {
            warn!(%err, "rejected layout start");
            return Err(err);
        }
        params.validate()?;

        let simulation = ForceSimulation::new(params);
        simulation.prepare(engine);

        let queue = (0..params.iterations)
            .map(|index| IterationTask { index })
            .collect();
        self.run = Some(ActiveRun {
            simulation,
            damping: params.initial_damping,
            queue,
            completed: 0,
            total: params.iterations,
        });

        info!(
            iterations = params.iterations,
            force_strength = params.force_strength,
            nodes = engine.node_count(),
            edges = engine.edge_count(),
            "layout run started"
        );
        Ok(())
    }

    /// Execute up to `budget` queued iterations in order.
    pub fn tick(&mut self, engine: &mut GraphEngine, budget: u32) -> TickReport {
        let Some(run) = self.run.as_mut() else {
            return TickReport::idle();
        };

        let mut executed = 0;
        let mut last = None;
        while executed < budget {
            let Some(task) = run.queue.pop_front() else {
                break;
            };
            debug_assert_eq!(task.index, run.completed);
            last = Some(run.simulation.step(engine, &mut run.damping));
            run.completed += 1;
            executed += 1;
        }

        let remaining = run.queue.len() as u32;
        debug!(executed, remaining, damping = run.damping, "layout tick");

        let finished = remaining == 0;
        if finished {
            info!(iterations = run.total, "layout run finished");
            self.run = None;
        }

        TickReport {
            executed,
            remaining,
            finished,
            last,
        }
    }

    /// Execute every queued iteration now.
    pub fn run_to_completion(&mut self, engine: &mut GraphEngine) -> TickReport {
        self.tick(engine, u32::MAX)
    }

    /// Drop the active run without executing its remaining iterations.
    /// Returns how many iterations were discarded.
    pub fn cancel(&mut self) -> u32 {
        match self.run.take() {
            Some(run) => {
                let discarded = run.queue.len() as u32;
                info!(completed = run.completed, discarded, "layout run cancelled");
                discarded
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeSpec, GraphDescription, NodeSpec, Vec3};

    fn path_graph() -> GraphEngine {
        let mut description = GraphDescription::default();
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            description.nodes.insert(
                key.to_string(),
                NodeSpec {
                    location: Some(Vec3::new(i as f32, 0.5 * i as f32, 0.0)),
                    ..NodeSpec::default()
                },
            );
        }
        description.edges.push(EdgeSpec::new("a", "b"));
        description.edges.push(EdgeSpec::new("b", "c"));
        let mut engine = GraphEngine::new();
        engine.load(&description).unwrap();
        engine
    }

    fn config(iterations: i64) -> SimulationConfig {
        SimulationConfig {
            iterations,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_state_machine() {
        let mut engine = path_graph();
        let mut scheduler = LayoutScheduler::new();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.start(&mut engine, &config(10)).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(scheduler.progress(), Some((0, 10)));
        assert_eq!(scheduler.damping(), Some(0.01));

        let report = scheduler.tick(&mut engine, 4);
        assert_eq!(report.executed, 4);
        assert_eq!(report.remaining, 6);
        assert!(!report.finished);
        assert_eq!(scheduler.progress(), Some((4, 10)));

        let report = scheduler.tick(&mut engine, 100);
        assert_eq!(report.executed, 6);
        assert_eq!(report.remaining, 0);
        assert!(report.finished);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        // Idle ticks do nothing
        assert_eq!(scheduler.tick(&mut engine, 5), TickReport::idle());
    }

    #[test]
    fn test_invalid_parameters_do_not_start() {
        let mut engine = path_graph();
        let before = engine.positions_flat();
        let mut scheduler = LayoutScheduler::new();

        let err = scheduler.start(&mut engine, &config(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));

        let bad_strength = SimulationConfig {
            force_strength: -2.0,
            ..SimulationConfig::default()
        };
        assert!(scheduler.start(&mut engine, &bad_strength).is_err());

        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(engine.positions_flat(), before);
    }

    #[test]
    fn test_direct_params_are_validated() {
        let mut engine = path_graph();
        let before = engine.positions_flat();
        let mut scheduler = LayoutScheduler::new();

        for force_strength in [0.0, -3.0] {
            let params = SimulationParams {
                iterations: 5,
                force_strength,
                ..SimulationParams::default()
            };
            let err = scheduler.start_with_params(&mut engine, params).unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidParameter { name: "forceStrength", .. }
            ));
        }
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.run_to_completion(&mut engine).executed, 0);
        assert_eq!(engine.positions_flat(), before);
    }

    #[test]
    fn test_concurrent_start_rejected() {
        let mut engine = path_graph();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start(&mut engine, &config(20)).unwrap();
        scheduler.tick(&mut engine, 5);

        let err = scheduler.start(&mut engine, &config(20)).unwrap_err();
        assert!(matches!(
            err,
            Error::ConcurrentRun {
                completed: 5,
                total: 20
            }
        ));
        // The original run is unaffected
        assert_eq!(scheduler.progress(), Some((5, 20)));
    }

    #[test]
    fn test_cancel_discards_remaining_iterations() {
        let mut engine = path_graph();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start(&mut engine, &config(50)).unwrap();
        scheduler.tick(&mut engine, 10);
        let frozen = engine.positions_flat();

        assert_eq!(scheduler.cancel(), 40);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.tick(&mut engine, 10).executed, 0);
        assert_eq!(engine.positions_flat(), frozen);

        assert_eq!(scheduler.cancel(), 0);
        scheduler.start(&mut engine, &config(5)).unwrap();
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_sliced_run_matches_single_run() {
        let mut sliced = path_graph();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start(&mut sliced, &config(60)).unwrap();
        while scheduler.is_running() {
            scheduler.tick(&mut sliced, 7);
        }

        let mut whole = path_graph();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start(&mut whole, &config(60)).unwrap();
        let report = scheduler.run_to_completion(&mut whole);
        assert_eq!(report.executed, 60);
        assert!(report.finished);

        assert_eq!(sliced.positions_flat(), whole.positions_flat());
    }

    #[test]
    fn test_damping_reaches_zero_on_last_iteration() {
        let mut engine = path_graph();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start(&mut engine, &config(8)).unwrap();

        let mut previous = f32::INFINITY;
        while scheduler.is_running() {
            let stats = scheduler.tick(&mut engine, 1).last.unwrap();
            assert!(stats.damping < previous);
            previous = stats.damping;
        }
        assert!(previous.abs() < 1e-6);
    }

    #[test]
    fn test_empty_graph_runs() {
        let mut engine = GraphEngine::new();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start(&mut engine, &config(3)).unwrap();
        let report = scheduler.run_to_completion(&mut engine);
        assert_eq!(report.executed, 3);
        assert!(report.finished);
    }
}
