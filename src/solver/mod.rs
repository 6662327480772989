//! Solver collaborator interface
//!
//! The driver never iterates, assembles or evaluates residuals itself. It
//! talks to an incremental nonlinear solver through the `Solver` trait:
//! configure the convergence test, pick an algorithm, size a displacement
//! increment, attempt one step, and read back the residual norms of the
//! last attempt.
//!
//! Any `Err` returned here is a collaborator error (bad test type, bad
//! call sequence, ...). It is never retried. Non-convergence is reported
//! through `StepOutcome`, not through `Err`.

pub mod scripted;

pub use scripted::{AttemptContext, ScriptFile, ScriptedAttempt, ScriptedSolver, SolverCall};

use crate::algorithm::Algorithm;
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Convergence test names understood by the reference solvers
pub const KNOWN_TEST_TYPES: [&str; 10] = [
    "NormUnbalance",
    "NormDispIncr",
    "EnergyIncr",
    "RelativeNormUnbalance",
    "RelativeNormDispIncr",
    "RelativeTotalNormDispIncr",
    "RelativeEnergyIncr",
    "FixedNumIter",
    "NormDispAndUnbalance",
    "NormDispOrUnbalance",
];

/// Controlled degree of freedom for displacement-controlled loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplacementControl {
    /// Node tag
    pub node: u32,

    /// Degree of freedom at the node (1-based, as analysts write it)
    pub dof: u32,
}

impl DisplacementControl {
    pub fn new(node: u32, dof: u32) -> Self {
        Self { node, dof }
    }
}

/// Result of attempting a single increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Whether the convergence test was satisfied
    pub converged: bool,
}

impl StepOutcome {
    pub fn converged() -> Self {
        Self { converged: true }
    }

    pub fn failed() -> Self {
        Self { converged: false }
    }
}

/// Incremental nonlinear solver driven by the analyzer
///
/// Calls are blocking and may be expensive. Configuration calls may reset
/// solver history, so the driver only issues them when a value changes.
pub trait Solver {
    /// Configure the convergence test
    fn configure_test(
        &mut self,
        test_type: &str,
        tolerance: f64,
        max_iterations: u32,
        print_flag: i32,
    ) -> Result<()>;

    /// Select a catalog iteration algorithm
    fn select_algorithm(&mut self, algorithm: &Algorithm) -> Result<()>;

    /// Set the displacement increment of a displacement-controlled integrator
    fn configure_increment(&mut self, control: &DisplacementControl, step: f64) -> Result<()>;

    /// Attempt exactly one increment
    ///
    /// Transient analyses pass the time increment. Static analyses pass the
    /// configured displacement increment, which the solver may ignore.
    fn attempt_step(&mut self, step: f64) -> Result<StepOutcome>;

    /// Residual norms recorded by the convergence test during the last attempt
    fn last_residual_norms(&self) -> Vec<f64>;
}

impl<S: Solver + ?Sized> Solver for &mut S {
    fn configure_test(
        &mut self,
        test_type: &str,
        tolerance: f64,
        max_iterations: u32,
        print_flag: i32,
    ) -> Result<()> {
        (**self).configure_test(test_type, tolerance, max_iterations, print_flag)
    }

    fn select_algorithm(&mut self, algorithm: &Algorithm) -> Result<()> {
        (**self).select_algorithm(algorithm)
    }

    fn configure_increment(&mut self, control: &DisplacementControl, step: f64) -> Result<()> {
        (**self).configure_increment(control, step)
    }

    fn attempt_step(&mut self, step: f64) -> Result<StepOutcome> {
        (**self).attempt_step(step)
    }

    fn last_residual_norms(&self) -> Vec<f64> {
        (**self).last_residual_norms()
    }
}
