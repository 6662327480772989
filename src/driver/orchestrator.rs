//! Run orchestrator
//!
//! Owns the solver for the duration of a run: builds and validates the
//! configuration, plans the increments, issues the one-time setup, then
//! feeds increments to the escalation controller in order. The first
//! increment that cannot be recovered ends the run.

use crate::algorithm::UserAlgorithms;
use crate::control::{ControlOverrides, RunConfig};
use crate::display_mode::DisplayMode;
use crate::driver::report::{RunOutcome, RunReport};
use crate::driver::state::RunState;
use crate::errors::{AnalyzeError, Result};
use crate::planning::{plan_static, plan_transient};
use crate::recovery::{EscalationController, IncrementOutcome};
use crate::solver::{DisplacementControl, Solver};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

/// Adaptive analysis driver around a solver
pub struct SmartAnalyzer<S: Solver> {
    solver: S,
    hooks: UserAlgorithms,
    display: DisplayMode,
    telemetry: TelemetryCollector,
}

impl<S: Solver> SmartAnalyzer<S> {
    /// Create a silent analyzer with no user algorithms
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            hooks: UserAlgorithms::new(),
            display: DisplayMode::silent(),
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Use these user-defined algorithm hooks
    pub fn with_hooks(mut self, hooks: UserAlgorithms) -> Self {
        self.hooks = hooks;
        self
    }

    /// Report through this display
    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    /// Record events into this collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Give the solver back
    pub fn into_solver(self) -> S {
        self.solver
    }

    /// Run `npts` time steps of size `dt`
    pub fn run_transient(
        &mut self,
        dt: f64,
        npts: usize,
        overrides: Option<&ControlOverrides>,
    ) -> Result<RunReport> {
        let config = RunConfig::transient(dt).with_overrides(overrides);
        config.validate()?;
        if config.step.initial_step < 0.0 {
            return Err(AnalyzeError::config(format!(
                "time step must be positive, got {}",
                config.step.initial_step
            )));
        }

        let increments = plan_transient(config.step.initial_step, npts);
        self.drive(config, increments, None)
    }

    /// Load `control` through `targets` in increments no larger than `max_step`
    pub fn run_static(
        &mut self,
        control: DisplacementControl,
        max_step: f64,
        targets: &[f64],
        overrides: Option<&ControlOverrides>,
    ) -> Result<RunReport> {
        let plan = plan_static(targets, max_step)?;
        let mut config = RunConfig::static_loading(plan.initial_step).with_overrides(overrides);
        // the integrator always starts from the planned step
        config.step.initial_step = plan.initial_step;
        config.validate()?;

        self.drive(config, plan.increments, Some(control))
    }

    fn drive(
        &mut self,
        config: RunConfig,
        increments: Vec<f64>,
        control: Option<DisplacementControl>,
    ) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = RunState::new(&config, increments.len(), control);

        self.display.show_parameters(&config);

        if !increments.is_empty() {
            self.setup(&config, &state)?;
        }

        self.display.begin_run(increments.len());
        let outcome = self.drive_increments(&config, &mut state, &increments);
        self.display.end_run();
        let outcome = outcome?;

        let elapsed = state.elapsed();
        self.telemetry.record(TelemetryEvent::RunFinished {
            success: outcome == RunOutcome::Succeeded,
            duration_ms: elapsed.as_millis() as u64,
            timestamp: Instant::now(),
        });

        let report = RunReport {
            run_id,
            kind: config.kind,
            outcome,
            started_at,
            elapsed,
            completed_increments: state.completed,
            total_increments: state.total,
            attempts: state.attempts,
        };

        match report.outcome {
            RunOutcome::Succeeded => self.display.show_success(&report.summary()),
            RunOutcome::Failed => self.display.show_error(&report.summary()),
        }

        Ok(report)
    }

    /// Initial test, default algorithm and, for static runs, initial increment
    fn setup(&mut self, config: &RunConfig, state: &RunState) -> Result<()> {
        let now = Instant::now();

        self.solver.configure_test(
            &config.test.test_type,
            config.test.tolerance,
            config.test.max_iterations,
            config.test.print_flag,
        )?;
        self.telemetry.record(TelemetryEvent::TestConfigured {
            tolerance: config.test.tolerance,
            max_iterations: config.test.max_iterations,
            timestamp: now,
        });

        let algorithm = config
            .default_algorithm()
            .ok_or_else(|| AnalyzeError::config("algorithms must contain at least one entry"))?;
        self.hooks.apply(algorithm, &mut self.solver)?;
        self.telemetry.record(TelemetryEvent::AlgorithmSelected {
            code: algorithm.code(),
            timestamp: now,
        });

        if let (Some(control), Some(step)) = (state.control, state.active_step) {
            self.solver.configure_increment(&control, step)?;
            self.telemetry.record(TelemetryEvent::IncrementConfigured {
                step,
                timestamp: now,
            });
        }

        Ok(())
    }

    fn drive_increments(
        &mut self,
        config: &RunConfig,
        state: &mut RunState,
        increments: &[f64],
    ) -> Result<RunOutcome> {
        for (index, increment) in increments.iter().enumerate() {
            let outcome = EscalationController::new(
                config,
                &mut *state,
                &mut self.solver,
                &self.hooks,
                &self.display,
                &self.telemetry,
            )
            .attempt_increment(
                *increment,
                0,
                config.test.max_iterations,
                config.test.tolerance,
            )?;

            if outcome == IncrementOutcome::Failed {
                return Ok(RunOutcome::Failed);
            }

            state.completed += 1;
            self.display.increment_completed(state.completed);
            self.telemetry.record(TelemetryEvent::IncrementCompleted {
                index,
                recovered: outcome == IncrementOutcome::Recovered,
                timestamp: Instant::now(),
            });

            if config.reporting.debug {
                self.display.show_trace(&format!(
                    "increment {}/{} done, {:.2}% complete",
                    state.completed,
                    state.total,
                    state.progress_fraction() * 100.0
                ));
            }
        }

        Ok(RunOutcome::Succeeded)
    }
}

/// Run a transient analysis against `solver` with default reporting
pub fn run_transient<S: Solver>(
    solver: &mut S,
    dt: f64,
    npts: usize,
    overrides: Option<&ControlOverrides>,
) -> Result<RunReport> {
    SmartAnalyzer::new(solver).run_transient(dt, npts, overrides)
}

/// Run a displacement-controlled analysis against `solver` with default reporting
pub fn run_static<S: Solver>(
    solver: &mut S,
    control: DisplacementControl,
    max_step: f64,
    targets: &[f64],
    overrides: Option<&ControlOverrides>,
) -> Result<RunReport> {
    SmartAnalyzer::new(solver).run_static(control, max_step, targets, overrides)
}
