//! Escalation controller
//!
//! Drives one planned increment to convergence. Failed attempts go through
//! the ladder in `ladder::decide`; follow-up attempts are kept on an
//! explicit stack so bisection depth never grows the call stack.

use crate::algorithm::UserAlgorithms;
use crate::control::RunConfig;
use crate::display_mode::DisplayMode;
use crate::driver::RunState;
use crate::errors::{AnalyzeError, Result};
use crate::recovery::ladder::{bisection_depth_bound, decide, needs_residual_norm};
use crate::recovery::types::{Attempt, EscalationAction, IncrementOutcome};
use crate::solver::Solver;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use std::time::Instant;

/// Stack capacity reserved up front, beyond which the stack just grows
const MAX_RESERVED_DEPTH: usize = 64;

/// Escalation controller for a single run
pub struct EscalationController<'a, S: Solver> {
    config: &'a RunConfig,
    state: &'a mut RunState,
    solver: &'a mut S,
    hooks: &'a UserAlgorithms,
    display: &'a DisplayMode,
    telemetry: &'a TelemetryCollector,
}

impl<'a, S: Solver> EscalationController<'a, S> {
    /// Create a controller over the run's state and solver
    pub fn new(
        config: &'a RunConfig,
        state: &'a mut RunState,
        solver: &'a mut S,
        hooks: &'a UserAlgorithms,
        display: &'a DisplayMode,
        telemetry: &'a TelemetryCollector,
    ) -> Self {
        Self {
            config,
            state,
            solver,
            hooks,
            display,
            telemetry,
        }
    }

    /// Apply `step` to the solver, escalating until it converges or the
    /// ladder is exhausted
    ///
    /// Returns `Converged` when the first attempt succeeds and `Recovered`
    /// when escalation or bisection was needed. In both cases the whole of
    /// `step` has been applied. `Err` is a collaborator or configuration
    /// error and is never retried.
    pub fn attempt_increment(
        &mut self,
        step: f64,
        algorithm_index: usize,
        max_iterations: u32,
        tolerance: f64,
    ) -> Result<IncrementOutcome> {
        let depth = bisection_depth_bound(
            step,
            self.config.step.min_step,
            self.config.step.relaxation,
        );
        let mut pending = Vec::with_capacity(depth.min(MAX_RESERVED_DEPTH) + 2);
        pending.push(Attempt {
            step,
            algorithm_index,
            max_iterations,
            tolerance,
        });

        let mut attempts = 0usize;
        while let Some(attempt) = pending.pop() {
            self.synchronize(&attempt)?;
            attempts += 1;

            if self.try_step(&attempt)? {
                continue;
            }

            let last_norm = if needs_residual_norm(self.config, &attempt) {
                self.solver.last_residual_norms().last().copied()
            } else {
                None
            };

            let action = decide(self.config, self.state.active_tolerance, &attempt, last_norm);
            self.report(&attempt, &action, last_norm);

            match action {
                EscalationAction::AddTestIterations { next }
                | EscalationAction::SwitchAlgorithm { next }
                | EscalationAction::LoosenTolerance { next } => pending.push(next),
                EscalationAction::Bisect { first, rest } => {
                    pending.push(rest);
                    pending.push(first);
                }
                EscalationAction::GiveUp { .. } => return Ok(IncrementOutcome::Failed),
            }
        }

        Ok(if attempts == 1 {
            IncrementOutcome::Converged
        } else {
            IncrementOutcome::Recovered
        })
    }

    /// Bring the solver in line with `attempt`, skipping unchanged values
    fn synchronize(&mut self, attempt: &Attempt) -> Result<()> {
        if attempt.algorithm_index != self.state.active_algorithm_index {
            let algorithm = self
                .config
                .escalation
                .algorithms
                .get(attempt.algorithm_index)
                .ok_or_else(|| {
                    AnalyzeError::config(format!(
                        "algorithm index {} outside a sequence of {}",
                        attempt.algorithm_index,
                        self.config.escalation.algorithms.len()
                    ))
                })?;

            self.hooks.apply(algorithm, &mut *self.solver)?;
            self.state.active_algorithm_index = attempt.algorithm_index;
            self.display.show_notice(&format!("algorithm {}", algorithm));
            self.telemetry.record(TelemetryEvent::AlgorithmSelected {
                code: algorithm.code(),
                timestamp: Instant::now(),
            });
        }

        if attempt.max_iterations != self.state.active_max_iterations
            || attempt.tolerance != self.state.active_tolerance
        {
            let test = &self.config.test;
            self.solver.configure_test(
                &test.test_type,
                attempt.tolerance,
                attempt.max_iterations,
                test.print_flag,
            )?;
            self.state.active_max_iterations = attempt.max_iterations;
            self.state.active_tolerance = attempt.tolerance;
            self.display.show_notice(&format!(
                "test {} {:e} {}",
                test.test_type, attempt.tolerance, attempt.max_iterations
            ));
            self.telemetry.record(TelemetryEvent::TestConfigured {
                tolerance: attempt.tolerance,
                max_iterations: attempt.max_iterations,
                timestamp: Instant::now(),
            });
        }

        if self.config.is_static() && self.state.active_step != Some(attempt.step) {
            let control = self.state.control.ok_or_else(|| {
                AnalyzeError::config("static run without a controlled degree of freedom")
            })?;
            self.solver.configure_increment(&control, attempt.step)?;
            self.state.active_step = Some(attempt.step);
            self.display.show_notice(&format!(
                "integrator DisplacementControl {} {} {}",
                control.node, control.dof, attempt.step
            ));
            self.telemetry.record(TelemetryEvent::IncrementConfigured {
                step: attempt.step,
                timestamp: Instant::now(),
            });
        }

        Ok(())
    }

    /// Attempt one step and do the per-attempt bookkeeping
    fn try_step(&mut self, attempt: &Attempt) -> Result<bool> {
        let outcome = self.solver.attempt_step(attempt.step)?;

        self.telemetry.record(TelemetryEvent::StepAttempted {
            step: attempt.step,
            converged: outcome.converged,
            timestamp: Instant::now(),
        });

        if self.config.reporting.debug || self.display.verbosity().show_traces() {
            self.display.show_trace(&format!(
                "step {:e} algorithm #{} iterations {} tolerance {:e}: {}",
                attempt.step,
                attempt.algorithm_index,
                attempt.max_iterations,
                attempt.tolerance,
                if outcome.converged { "converged" } else { "failed" }
            ));
        }

        if self.state.record_attempt(self.config.reporting.print_every) {
            self.display
                .show_progress(self.state.completed, self.state.total, self.state.elapsed());
        }

        Ok(outcome.converged)
    }

    fn report(&self, attempt: &Attempt, action: &EscalationAction, last_norm: Option<f64>) {
        let now = Instant::now();
        match action {
            EscalationAction::AddTestIterations { next } => {
                self.display.show_info(&format!(
                    "Adding iterations: {} -> {}",
                    attempt.max_iterations, next.max_iterations
                ));
                self.telemetry.record(TelemetryEvent::IterationsExpanded {
                    step: attempt.step,
                    max_iterations: next.max_iterations,
                    timestamp: now,
                });
            }
            EscalationAction::SwitchAlgorithm { next } => {
                let name = self
                    .config
                    .escalation
                    .algorithms
                    .get(next.algorithm_index)
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                self.display.show_info(&format!("Trying algorithm {}", name));
                self.telemetry.record(TelemetryEvent::AlgorithmSwitched {
                    step: attempt.step,
                    algorithm_index: next.algorithm_index,
                    timestamp: now,
                });
            }
            EscalationAction::LoosenTolerance { next } => {
                self.display.show_warning(&format!(
                    "Step {:e} at the floor, loosening tolerance to {:e}",
                    attempt.step, next.tolerance
                ));
                self.telemetry.record(TelemetryEvent::ToleranceLoosened {
                    step: attempt.step,
                    tolerance: next.tolerance,
                    timestamp: now,
                });
            }
            EscalationAction::Bisect { first, rest } => {
                self.display.show_info(&format!(
                    "Dividing step {:e} into {:e} + {:e}",
                    attempt.step, first.step, rest.step
                ));
                self.telemetry.record(TelemetryEvent::StepBisected {
                    step: attempt.step,
                    first: first.step,
                    rest: rest.step,
                    timestamp: now,
                });
            }
            EscalationAction::GiveUp { step } => {
                self.display.show_warning(&format!(
                    "No recovery options left at step {:e}",
                    step
                ));
                self.telemetry.record(TelemetryEvent::RecoveryExhausted {
                    step: *step,
                    timestamp: now,
                });
            }
        }

        if needs_residual_norm(self.config, attempt)
            && !matches!(action, EscalationAction::AddTestIterations { .. })
        {
            match last_norm {
                Some(norm) => self.display.show_notice(&format!(
                    "residual norm {:e} not below {:e}, skipping extra iterations",
                    norm, self.config.escalation.norm_threshold
                )),
                None => self
                    .display
                    .show_notice("no residual norm reported, skipping extra iterations"),
            }
        }
    }
}
