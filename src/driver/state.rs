//! Run-scoped mutable state
//!
//! One `RunState` exists per run. It mirrors what is currently configured
//! on the solver so the escalation controller can skip reconfiguration
//! calls whose value would not change.

use crate::control::RunConfig;
use crate::solver::DisplacementControl;
use std::time::{Duration, Instant};

/// Mutable state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Index into the algorithm sequence currently selected on the solver
    pub active_algorithm_index: usize,

    /// Iteration cap currently configured on the convergence test
    pub active_max_iterations: u32,

    /// Tolerance currently configured on the convergence test
    pub active_tolerance: f64,

    /// Increment currently configured on the integrator (static runs only)
    pub active_step: Option<f64>,

    /// Attempts since the last cadence progress print
    pub attempt_counter: usize,

    /// Increments completed so far
    pub completed: usize,

    /// Increments planned for the run
    pub total: usize,

    /// Solver attempts made in the whole run
    pub attempts: usize,

    /// Controlled degree of freedom (static runs only)
    pub control: Option<DisplacementControl>,

    start: Instant,
}

impl RunState {
    /// Fresh state matching the one-time setup the orchestrator issues
    pub fn new(config: &RunConfig, total: usize, control: Option<DisplacementControl>) -> Self {
        Self {
            active_algorithm_index: 0,
            active_max_iterations: config.test.max_iterations,
            active_tolerance: config.test.tolerance,
            active_step: control.map(|_| config.step.initial_step),
            attempt_counter: 0,
            completed: 0,
            total,
            attempts: 0,
            control,
            start: Instant::now(),
        }
    }

    /// Wall-clock time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Fraction of planned increments completed (1.0 for an empty plan)
    pub fn progress_fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Record one solver attempt; true when a cadence print is due
    pub fn record_attempt(&mut self, print_every: usize) -> bool {
        self.attempts += 1;
        self.attempt_counter += 1;
        if print_every > 0 && self.attempt_counter >= print_every {
            self.attempt_counter = 0;
            true
        } else {
            false
        }
    }

    /// Check if every planned increment has been applied
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}
