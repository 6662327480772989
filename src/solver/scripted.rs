//! Scripted solver collaborator
//!
//! Replays a recorded sequence of attempt results, then falls back to a
//! policy. Every call it receives is logged, which makes it the workhorse
//! of the test suite and of the `replay` command.

use crate::algorithm::Algorithm;
use crate::errors::{AnalyzeError, Result};
use crate::solver::{DisplacementControl, Solver, StepOutcome, KNOWN_TEST_TYPES};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Residual norm reported by the built-in failing policies
const DEFAULT_FAILURE_NORM: f64 = 1.0;

/// One scripted attempt result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedAttempt {
    /// Whether the attempt converges
    pub converged: bool,

    /// Residual norms reported for the attempt
    #[serde(default)]
    pub norms: Vec<f64>,
}

impl ScriptedAttempt {
    /// Converging attempt
    pub fn converge() -> Self {
        Self {
            converged: true,
            norms: Vec::new(),
        }
    }

    /// Failing attempt ending at `norm`
    pub fn fail(norm: f64) -> Self {
        Self {
            converged: false,
            norms: vec![norm],
        }
    }
}

impl Default for ScriptedAttempt {
    fn default() -> Self {
        Self::converge()
    }
}

/// Calls received by the scripted solver
#[derive(Debug, Clone, PartialEq)]
pub enum SolverCall {
    ConfigureTest {
        test_type: String,
        tolerance: f64,
        max_iterations: u32,
        print_flag: i32,
    },
    SelectAlgorithm(Algorithm),
    ConfigureIncrement {
        control: DisplacementControl,
        step: f64,
    },
    AttemptStep(f64),
}

impl SolverCall {
    /// Check if this call reconfigures the solver
    pub fn is_configuration(&self) -> bool {
        !matches!(self, SolverCall::AttemptStep(_))
    }
}

/// Solver configuration visible to a fallback policy
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptContext {
    /// Zero-based attempt number across the solver's lifetime
    pub index: usize,

    /// Step passed to `attempt_step`
    pub step: f64,

    /// Algorithm currently selected
    pub algorithm: Option<Algorithm>,

    /// Current iteration cap
    pub max_iterations: Option<u32>,

    /// Current test tolerance
    pub tolerance: Option<f64>,

    /// Current displacement increment
    pub increment: Option<f64>,
}

/// Fallback policy once the script is exhausted
pub type AttemptPolicy = Box<dyn FnMut(&AttemptContext) -> ScriptedAttempt>;

/// Replay script file format
///
/// ```json
/// {
///   "attempts": [{ "converged": false, "norms": [40.0, 3.2] }],
///   "max_step": 0.05,
///   "fallback": { "converged": true }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptFile {
    /// Attempt results replayed in order
    #[serde(default)]
    pub attempts: Vec<ScriptedAttempt>,

    /// After the script: steps larger than this fail with `fallback.norms`
    #[serde(default)]
    pub max_step: Option<f64>,

    /// After the script: result for every other attempt
    #[serde(default)]
    pub fallback: ScriptedAttempt,
}

impl ScriptFile {
    /// Parse a script from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let script: ScriptFile = serde_json::from_str(text)?;
        script.validate()?;
        Ok(script)
    }

    /// Load a script from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        if let Some(limit) = self.max_step {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(AnalyzeError::ScriptError(format!(
                    "max_step must be a positive number, got {}",
                    limit
                )));
            }
        }

        let norms = self.attempts.iter().chain(std::iter::once(&self.fallback));
        for attempt in norms {
            if attempt.norms.iter().any(|n| !n.is_finite() || *n < 0.0) {
                return Err(AnalyzeError::ScriptError(
                    "residual norms must be finite and non-negative".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Solver collaborator driven by a script and a fallback policy
pub struct ScriptedSolver {
    script: VecDeque<ScriptedAttempt>,
    policy: AttemptPolicy,
    calls: Vec<SolverCall>,
    last_norms: Vec<f64>,
    algorithm: Option<Algorithm>,
    max_iterations: Option<u32>,
    tolerance: Option<f64>,
    increment: Option<f64>,
    attempts: usize,
}

impl ScriptedSolver {
    /// Create a solver that consults `policy` for every attempt
    pub fn with_policy<F>(policy: F) -> Self
    where
        F: FnMut(&AttemptContext) -> ScriptedAttempt + 'static,
    {
        Self {
            script: VecDeque::new(),
            policy: Box::new(policy),
            calls: Vec::new(),
            last_norms: Vec::new(),
            algorithm: None,
            max_iterations: None,
            tolerance: None,
            increment: None,
            attempts: 0,
        }
    }

    /// Solver that converges on every attempt
    pub fn always_converge() -> Self {
        Self::with_policy(|_| ScriptedAttempt::converge())
    }

    /// Solver that fails every attempt with a terminal residual of `norm`
    pub fn always_fail(norm: f64) -> Self {
        Self::with_policy(move |_| ScriptedAttempt::fail(norm))
    }

    /// Solver that only converges for steps no larger than `limit` in magnitude
    pub fn converge_below(limit: f64) -> Self {
        Self::with_policy(move |ctx| {
            if ctx.step.abs() <= limit {
                ScriptedAttempt::converge()
            } else {
                ScriptedAttempt::fail(DEFAULT_FAILURE_NORM)
            }
        })
    }

    /// Solver that replays `attempts` then converges
    pub fn from_attempts(attempts: Vec<ScriptedAttempt>) -> Self {
        Self::always_converge().with_script(attempts)
    }

    /// Solver described by a replay script file
    pub fn from_script(file: ScriptFile) -> Self {
        let ScriptFile {
            attempts,
            max_step,
            fallback,
        } = file;

        Self::with_policy(move |ctx| match max_step {
            Some(limit) if ctx.step.abs() > limit => ScriptedAttempt {
                converged: false,
                norms: if fallback.norms.is_empty() {
                    vec![DEFAULT_FAILURE_NORM]
                } else {
                    fallback.norms.clone()
                },
            },
            _ => fallback.clone(),
        })
        .with_script(attempts)
    }

    /// Queue scripted attempts ahead of the policy
    pub fn with_script(mut self, attempts: Vec<ScriptedAttempt>) -> Self {
        self.script.extend(attempts);
        self
    }

    /// Every call received so far
    pub fn calls(&self) -> &[SolverCall] {
        &self.calls
    }

    /// Configuration calls received so far
    pub fn configuration_calls(&self) -> Vec<&SolverCall> {
        self.calls.iter().filter(|c| c.is_configuration()).collect()
    }

    /// Steps passed to `attempt_step`, in order
    pub fn attempted_steps(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SolverCall::AttemptStep(step) => Some(*step),
                _ => None,
            })
            .collect()
    }

    /// Number of attempts made
    pub fn attempt_count(&self) -> usize {
        self.attempts
    }

    /// Forget recorded calls, keeping solver configuration
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Solver for ScriptedSolver {
    fn configure_test(
        &mut self,
        test_type: &str,
        tolerance: f64,
        max_iterations: u32,
        print_flag: i32,
    ) -> Result<()> {
        if !KNOWN_TEST_TYPES.contains(&test_type) {
            return Err(AnalyzeError::SolverError(format!(
                "unknown test type '{}'",
                test_type
            )));
        }
        if !(tolerance > 0.0) {
            return Err(AnalyzeError::SolverError(format!(
                "test tolerance must be positive, got {}",
                tolerance
            )));
        }

        self.calls.push(SolverCall::ConfigureTest {
            test_type: test_type.to_string(),
            tolerance,
            max_iterations,
            print_flag,
        });
        self.tolerance = Some(tolerance);
        self.max_iterations = Some(max_iterations);
        Ok(())
    }

    fn select_algorithm(&mut self, algorithm: &Algorithm) -> Result<()> {
        if algorithm.is_user_defined() {
            return Err(AnalyzeError::SolverError(format!(
                "{} is not a solver algorithm",
                algorithm
            )));
        }

        self.calls.push(SolverCall::SelectAlgorithm(*algorithm));
        self.algorithm = Some(*algorithm);
        Ok(())
    }

    fn configure_increment(&mut self, control: &DisplacementControl, step: f64) -> Result<()> {
        self.calls.push(SolverCall::ConfigureIncrement {
            control: *control,
            step,
        });
        self.increment = Some(step);
        Ok(())
    }

    fn attempt_step(&mut self, step: f64) -> Result<StepOutcome> {
        self.calls.push(SolverCall::AttemptStep(step));

        let ctx = AttemptContext {
            index: self.attempts,
            step,
            algorithm: self.algorithm,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            increment: self.increment,
        };
        self.attempts += 1;

        let attempt = match self.script.pop_front() {
            Some(attempt) => attempt,
            None => (self.policy)(&ctx),
        };

        self.last_norms = attempt.norms;
        Ok(StepOutcome {
            converged: attempt.converged,
        })
    }

    fn last_residual_norms(&self) -> Vec<f64> {
        self.last_norms.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_policy() {
        let mut solver = ScriptedSolver::from_attempts(vec![ScriptedAttempt::fail(5.0)]);

        assert!(!solver.attempt_step(0.1).unwrap().converged);
        assert_eq!(solver.last_residual_norms(), vec![5.0]);

        assert!(solver.attempt_step(0.1).unwrap().converged);
        assert!(solver.last_residual_norms().is_empty());
        assert_eq!(solver.attempt_count(), 2);
    }

    #[test]
    fn test_rejects_unknown_test_type() {
        let mut solver = ScriptedSolver::always_converge();
        let result = solver.configure_test("Bogus", 1e-6, 10, 0);
        assert!(matches!(result, Err(AnalyzeError::SolverError(_))));
        assert!(solver.calls().is_empty());
    }

    #[test]
    fn test_rejects_non_positive_tolerance() {
        let mut solver = ScriptedSolver::always_converge();
        assert!(solver.configure_test("EnergyIncr", 0.0, 10, 0).is_err());
    }

    #[test]
    fn test_policy_sees_configuration() {
        let mut solver = ScriptedSolver::with_policy(|ctx| {
            if ctx.max_iterations == Some(50) {
                ScriptedAttempt::converge()
            } else {
                ScriptedAttempt::fail(1.0)
            }
        });

        solver.configure_test("EnergyIncr", 1e-6, 7, 0).unwrap();
        assert!(!solver.attempt_step(0.01).unwrap().converged);

        solver.configure_test("EnergyIncr", 1e-6, 50, 0).unwrap();
        assert!(solver.attempt_step(0.01).unwrap().converged);
    }

    #[test]
    fn test_converge_below_limit() {
        let mut solver = ScriptedSolver::converge_below(0.25);
        assert!(!solver.attempt_step(-0.5).unwrap().converged);
        assert!(solver.attempt_step(-0.25).unwrap().converged);
        assert_eq!(solver.attempted_steps(), vec![-0.5, -0.25]);
    }

    #[test]
    fn test_script_file_parsing() {
        let json = r#"{
            "attempts": [{"converged": false, "norms": [40.0, 3.2]}],
            "max_step": 0.05
        }"#;
        let script = ScriptFile::from_json(json).unwrap();
        assert_eq!(script.attempts.len(), 1);
        assert!(script.fallback.converged);

        let mut solver = ScriptedSolver::from_script(script);
        assert!(!solver.attempt_step(0.01).unwrap().converged);
        assert_eq!(solver.last_residual_norms(), vec![40.0, 3.2]);
        assert!(!solver.attempt_step(0.1).unwrap().converged);
        assert!(solver.attempt_step(0.05).unwrap().converged);
    }

    #[test]
    fn test_script_file_rejects_bad_limit() {
        let result = ScriptFile::from_json(r#"{"max_step": -1.0}"#);
        assert!(matches!(result, Err(AnalyzeError::ScriptError(_))));
    }

    #[test]
    fn test_user_defined_not_accepted_directly() {
        let mut solver = ScriptedSolver::always_converge();
        assert!(solver.select_algorithm(&Algorithm::UserDefined(0)).is_err());
    }
}
