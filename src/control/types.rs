//! Run configuration type definitions

use crate::algorithm::{Algorithm, USER_ALGORITHM_SLOTS};
use crate::errors::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of incremental analysis being driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// Time history analysis, increments are time steps
    Transient,

    /// Displacement-controlled loading, increments are displacement sub-steps
    Static,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Transient => write!(f, "Transient"),
            AnalysisKind::Static => write!(f, "Static"),
        }
    }
}

/// Convergence test posed to the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPolicy {
    /// Test type name passed through to the solver (default: EnergyIncr)
    pub test_type: String,

    /// Initial test tolerance (default: 1e-6)
    pub tolerance: f64,

    /// Initial iteration cap (default: 7)
    pub max_iterations: u32,

    /// Solver print flag (default: 0)
    pub print_flag: i32,
}

impl Default for TestPolicy {
    fn default() -> Self {
        Self {
            test_type: "EnergyIncr".to_string(),
            tolerance: 1.0e-6,
            max_iterations: 7,
            print_flag: 0,
        }
    }
}

/// Which rungs of the escalation ladder are enabled, and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Retry with more iterations when the last residual norm is close
    pub try_add_test_iterations: bool,

    /// Last residual norm below which more iterations are worth trying (default: 1e3)
    pub norm_threshold: f64,

    /// Iteration cap used when growing the budget (default: 50)
    pub expanded_max_iterations: u32,

    /// Walk through `algorithms` on failure
    pub try_alternate_algorithms: bool,

    /// Algorithm sequence, index 0 is the default (default: KrylovNewton)
    pub algorithms: Vec<Algorithm>,

    /// Loosen the test tolerance once the step floor is reached
    pub try_loosen_tolerance: bool,

    /// Tolerance used when loosening (default: 1.0)
    pub loosened_tolerance: f64,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            try_add_test_iterations: false,
            norm_threshold: 1.0e3,
            expanded_max_iterations: 50,
            try_alternate_algorithms: false,
            algorithms: vec![Algorithm::default()],
            try_loosen_tolerance: false,
            loosened_tolerance: 1.0,
        }
    }
}

/// Step sizing rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPolicy {
    /// Step configured before the first increment
    pub initial_step: f64,

    /// Bisection factor, strictly between 0 and 1 (default: 0.5)
    pub relaxation: f64,

    /// Magnitude floor for bisection (default: 1e-6)
    pub min_step: f64,
}

/// Console reporting cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingPolicy {
    /// Print progress every this many attempts, 0 disables (default: 10)
    pub print_every: usize,

    /// Trace every attempt and every increment
    pub debug: bool,
}

impl Default for ReportingPolicy {
    fn default() -> Self {
        Self {
            print_every: 10,
            debug: false,
        }
    }
}

/// Complete, validated configuration of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub kind: AnalysisKind,
    pub test: TestPolicy,
    pub escalation: EscalationPolicy,
    pub step: StepPolicy,
    pub reporting: ReportingPolicy,
}

impl RunConfig {
    /// Defaults for a run of `kind` whose first increment is `initial_step`
    pub fn defaults(kind: AnalysisKind, initial_step: f64) -> Self {
        Self {
            kind,
            test: TestPolicy::default(),
            escalation: EscalationPolicy::default(),
            step: StepPolicy {
                initial_step,
                relaxation: 0.5,
                min_step: 1.0e-6,
            },
            reporting: ReportingPolicy::default(),
        }
    }

    /// Defaults for a time history analysis with time step `dt`
    pub fn transient(dt: f64) -> Self {
        Self::defaults(AnalysisKind::Transient, dt)
    }

    /// Defaults for a displacement-controlled analysis
    pub fn static_loading(initial_step: f64) -> Self {
        Self::defaults(AnalysisKind::Static, initial_step)
    }

    /// Check if the run is displacement controlled
    pub fn is_static(&self) -> bool {
        self.kind == AnalysisKind::Static
    }

    /// Default algorithm (index 0 of the sequence)
    pub fn default_algorithm(&self) -> Option<&Algorithm> {
        self.escalation.algorithms.first()
    }

    /// Named parameter values, in the order they are printed at run start
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let algorithms = self
            .escalation
            .algorithms
            .iter()
            .map(|a| a.code().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        vec![
            ("analysis", self.kind.to_string()),
            ("test_type", self.test.test_type.clone()),
            ("tolerance", format!("{:e}", self.test.tolerance)),
            ("max_iterations", self.test.max_iterations.to_string()),
            ("print_flag", self.test.print_flag.to_string()),
            ("try_add_test_iterations", self.escalation.try_add_test_iterations.to_string()),
            ("norm_threshold", format!("{:e}", self.escalation.norm_threshold)),
            ("expanded_max_iterations", self.escalation.expanded_max_iterations.to_string()),
            ("try_loosen_tolerance", self.escalation.try_loosen_tolerance.to_string()),
            ("loosened_tolerance", format!("{:e}", self.escalation.loosened_tolerance)),
            ("try_alternate_algorithms", self.escalation.try_alternate_algorithms.to_string()),
            ("algorithms", format!("[{}]", algorithms)),
            ("initial_step", self.step.initial_step.to_string()),
            ("relaxation", self.step.relaxation.to_string()),
            ("min_step", format!("{:e}", self.step.min_step)),
            ("print_every", self.reporting.print_every.to_string()),
            ("debug", self.reporting.debug.to_string()),
        ]
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("tolerance", self.test.tolerance),
            ("norm_threshold", self.escalation.norm_threshold),
            ("loosened_tolerance", self.escalation.loosened_tolerance),
            ("initial_step", self.step.initial_step),
            ("relaxation", self.step.relaxation),
            ("min_step", self.step.min_step),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(AnalyzeError::config(format!("{} must be finite, got {}", name, value)));
            }
        }

        if self.test.test_type.trim().is_empty() {
            return Err(AnalyzeError::config("test_type must not be empty"));
        }

        if self.test.tolerance <= 0.0 {
            return Err(AnalyzeError::config("tolerance must be greater than 0"));
        }

        if self.test.max_iterations == 0 {
            return Err(AnalyzeError::config("max_iterations must be greater than 0"));
        }

        if self.escalation.expanded_max_iterations == 0 {
            return Err(AnalyzeError::config(
                "expanded_max_iterations must be greater than 0",
            ));
        }

        if self.escalation.loosened_tolerance <= 0.0 {
            return Err(AnalyzeError::config("loosened_tolerance must be greater than 0"));
        }

        if self.escalation.algorithms.is_empty() {
            return Err(AnalyzeError::config("algorithms must contain at least one entry"));
        }

        for algorithm in &self.escalation.algorithms {
            if let Algorithm::UserDefined(slot) = algorithm {
                if *slot >= USER_ALGORITHM_SLOTS {
                    return Err(AnalyzeError::config(format!(
                        "user algorithm slot {} out of range (0..{})",
                        slot, USER_ALGORITHM_SLOTS
                    )));
                }
            }
        }

        if self.step.relaxation <= 0.0 || self.step.relaxation >= 1.0 {
            return Err(AnalyzeError::config(
                "relaxation must be strictly between 0.0 and 1.0",
            ));
        }

        if self.step.min_step <= 0.0 {
            return Err(AnalyzeError::config("min_step must be greater than 0"));
        }

        if self.step.initial_step == 0.0 {
            return Err(AnalyzeError::config("initial_step must not be zero"));
        }

        Ok(())
    }
}
