//! Escalation type definitions

use serde::{Deserialize, Serialize};

/// One posing of an increment to the solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Signed increment
    pub step: f64,

    /// Index into the configured algorithm sequence
    pub algorithm_index: usize,

    /// Convergence test iteration cap
    pub max_iterations: u32,

    /// Convergence test tolerance
    pub tolerance: f64,
}

/// Result of driving one increment through the escalation ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncrementOutcome {
    /// Accepted on the first attempt, as posed
    Converged,

    /// Accepted after escalation or subdivision; the full increment was applied
    Recovered,

    /// Every recovery option exhausted
    Failed,
}

impl IncrementOutcome {
    /// Check if the increment was applied
    pub fn is_success(&self) -> bool {
        !matches!(self, IncrementOutcome::Failed)
    }
}

/// Next move after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EscalationAction {
    /// Same increment with the expanded iteration cap
    AddTestIterations { next: Attempt },

    /// Same increment with the next algorithm in the sequence
    SwitchAlgorithm { next: Attempt },

    /// Same increment with the loosened tolerance, algorithm and cap reset
    LoosenTolerance { next: Attempt },

    /// Two sub-increments applied in order, each starting a fresh ladder
    Bisect { first: Attempt, rest: Attempt },

    /// Step floor reached with nothing left to try
    GiveUp { step: f64 },
}

impl EscalationAction {
    /// Short name of the rung taken
    pub fn name(&self) -> &'static str {
        match self {
            EscalationAction::AddTestIterations { .. } => "add_test_iterations",
            EscalationAction::SwitchAlgorithm { .. } => "switch_algorithm",
            EscalationAction::LoosenTolerance { .. } => "loosen_tolerance",
            EscalationAction::Bisect { .. } => "bisect",
            EscalationAction::GiveUp { .. } => "give_up",
        }
    }

    /// Check if this action ends the increment
    pub fn is_terminal(&self) -> bool {
        matches!(self, EscalationAction::GiveUp { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(IncrementOutcome::Converged.is_success());
        assert!(IncrementOutcome::Recovered.is_success());
        assert!(!IncrementOutcome::Failed.is_success());
    }

    #[test]
    fn test_action_terminal() {
        assert!(EscalationAction::GiveUp { step: 1e-7 }.is_terminal());
        let next = Attempt {
            step: 0.1,
            algorithm_index: 1,
            max_iterations: 7,
            tolerance: 1e-6,
        };
        assert!(!EscalationAction::SwitchAlgorithm { next }.is_terminal());
        assert_eq!(EscalationAction::SwitchAlgorithm { next }.name(), "switch_algorithm");
    }
}
