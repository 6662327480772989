//! Partial configuration overrides
//!
//! Callers only name the parameters they want to change. Everything left
//! out keeps the default for the analysis kind.

use crate::algorithm::Algorithm;
use crate::control::types::RunConfig;
use serde::{Deserialize, Serialize};

/// User overrides applied on top of the defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlOverrides {
    pub test_type: Option<String>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<u32>,
    pub print_flag: Option<i32>,

    pub try_add_test_iterations: Option<bool>,
    pub norm_threshold: Option<f64>,
    pub expanded_max_iterations: Option<u32>,
    pub try_alternate_algorithms: Option<bool>,

    /// Algorithm sequence as catalog codes
    pub algorithms: Option<Vec<Algorithm>>,
    pub try_loosen_tolerance: Option<bool>,
    pub loosened_tolerance: Option<f64>,

    pub initial_step: Option<f64>,
    pub relaxation: Option<f64>,
    pub min_step: Option<f64>,

    pub print_every: Option<usize>,
    pub debug: Option<bool>,
}

impl ControlOverrides {
    /// Create an empty override set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing is overridden
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `other` on top of `self`; values set in `other` win
    pub fn merged(&self, other: &ControlOverrides) -> ControlOverrides {
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                ControlOverrides {
                    $($field: other.$field.clone().or_else(|| self.$field.clone()),)*
                }
            };
        }

        pick!(
            test_type,
            tolerance,
            max_iterations,
            print_flag,
            try_add_test_iterations,
            norm_threshold,
            expanded_max_iterations,
            try_alternate_algorithms,
            algorithms,
            try_loosen_tolerance,
            loosened_tolerance,
            initial_step,
            relaxation,
            min_step,
            print_every,
            debug,
        )
    }

    /// Write every set value into `config`
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(test_type) = &self.test_type {
            config.test.test_type = test_type.clone();
        }
        if let Some(v) = self.tolerance {
            config.test.tolerance = v;
        }
        if let Some(v) = self.max_iterations {
            config.test.max_iterations = v;
        }
        if let Some(v) = self.print_flag {
            config.test.print_flag = v;
        }

        if let Some(v) = self.try_add_test_iterations {
            config.escalation.try_add_test_iterations = v;
        }
        if let Some(v) = self.norm_threshold {
            config.escalation.norm_threshold = v;
        }
        if let Some(v) = self.expanded_max_iterations {
            config.escalation.expanded_max_iterations = v;
        }
        if let Some(v) = self.try_alternate_algorithms {
            config.escalation.try_alternate_algorithms = v;
        }
        if let Some(algorithms) = &self.algorithms {
            config.escalation.algorithms = algorithms.clone();
        }
        if let Some(v) = self.try_loosen_tolerance {
            config.escalation.try_loosen_tolerance = v;
        }
        if let Some(v) = self.loosened_tolerance {
            config.escalation.loosened_tolerance = v;
        }

        if let Some(v) = self.initial_step {
            config.step.initial_step = v;
        }
        if let Some(v) = self.relaxation {
            config.step.relaxation = v;
        }
        if let Some(v) = self.min_step {
            config.step.min_step = v;
        }

        if let Some(v) = self.print_every {
            config.reporting.print_every = v;
        }
        if let Some(v) = self.debug {
            config.reporting.debug = v;
        }
    }
}

impl RunConfig {
    /// Apply optional overrides, consuming the defaults
    pub fn with_overrides(mut self, overrides: Option<&ControlOverrides>) -> Self {
        if let Some(overrides) = overrides {
            overrides.apply_to(&mut self);
        }
        self
    }
}
