//! User-defined algorithm hooks
//!
//! Up to three caller-supplied strategies can stand in for catalog entries.
//! Selecting `Algorithm::UserDefined(slot)` runs the hook registered in that
//! slot against the solver instead of calling `Solver::select_algorithm`.

use crate::algorithm::types::{Algorithm, USER_ALGORITHM_SLOTS};
use crate::errors::{AnalyzeError, Result};
use crate::solver::Solver;
use std::fmt;

/// Caller-supplied algorithm strategy
pub type UserAlgorithmFn = Box<dyn Fn(&mut dyn Solver) -> Result<()>>;

/// Registry of user-defined algorithm hooks
#[derive(Default)]
pub struct UserAlgorithms {
    hooks: [Option<UserAlgorithmFn>; USER_ALGORITHM_SLOTS],
}

impl UserAlgorithms {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook in a slot, replacing any previous one
    pub fn register<F>(&mut self, slot: usize, hook: F) -> Result<()>
    where
        F: Fn(&mut dyn Solver) -> Result<()> + 'static,
    {
        let entry = self.hooks.get_mut(slot).ok_or_else(|| {
            AnalyzeError::config(format!(
                "user algorithm slot {} out of range (0..{})",
                slot, USER_ALGORITHM_SLOTS
            ))
        })?;
        *entry = Some(Box::new(hook));
        Ok(())
    }

    /// Builder form of `register`
    pub fn with<F>(mut self, slot: usize, hook: F) -> Result<Self>
    where
        F: Fn(&mut dyn Solver) -> Result<()> + 'static,
    {
        self.register(slot, hook)?;
        Ok(self)
    }

    /// Check if a slot has a hook
    pub fn has(&self, slot: usize) -> bool {
        self.hooks.get(slot).map_or(false, Option::is_some)
    }

    /// Number of registered hooks
    pub fn len(&self) -> usize {
        self.hooks.iter().filter(|h| h.is_some()).count()
    }

    /// Check if no hooks are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put `algorithm` in effect on the solver
    pub fn apply(&self, algorithm: &Algorithm, solver: &mut dyn Solver) -> Result<()> {
        match algorithm {
            Algorithm::UserDefined(slot) => {
                let hook = self
                    .hooks
                    .get(*slot)
                    .and_then(Option::as_ref)
                    .ok_or(AnalyzeError::MissingUserAlgorithm { slot: *slot })?;
                hook(solver)
            }
            _ => solver.select_algorithm(algorithm),
        }
    }
}

impl fmt::Debug for UserAlgorithms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<bool> = self.hooks.iter().map(Option::is_some).collect();
        f.debug_struct("UserAlgorithms").field("registered", &slots).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ScriptedSolver, SolverCall};

    #[test]
    fn test_empty_registry() {
        let hooks = UserAlgorithms::new();
        assert!(hooks.is_empty());
        assert!(!hooks.has(0));
    }

    #[test]
    fn test_register_out_of_range() {
        let mut hooks = UserAlgorithms::new();
        let result = hooks.register(3, |_| Ok(()));
        assert!(matches!(result, Err(AnalyzeError::ConfigError(_))));
    }

    #[test]
    fn test_catalog_algorithm_goes_to_solver() {
        let hooks = UserAlgorithms::new();
        let mut solver = ScriptedSolver::always_converge();
        hooks.apply(&Algorithm::Bfgs, &mut solver).unwrap();
        assert_eq!(solver.calls(), &[SolverCall::SelectAlgorithm(Algorithm::Bfgs)]);
    }

    #[test]
    fn test_user_hook_runs_against_solver() {
        let hooks = UserAlgorithms::new()
            .with(1, |solver| solver.select_algorithm(&Algorithm::from_code(42)?))
            .unwrap();
        assert!(hooks.has(1));

        let mut solver = ScriptedSolver::always_converge();
        hooks.apply(&Algorithm::UserDefined(1), &mut solver).unwrap();
        assert_eq!(
            solver.calls(),
            &[SolverCall::SelectAlgorithm(Algorithm::from_code(42).unwrap())]
        );
    }

    #[test]
    fn test_missing_hook_is_error() {
        let hooks = UserAlgorithms::new();
        let mut solver = ScriptedSolver::always_converge();
        let result = hooks.apply(&Algorithm::UserDefined(0), &mut solver);
        assert!(matches!(result, Err(AnalyzeError::MissingUserAlgorithm { slot: 0 })));
        assert!(solver.calls().is_empty());
    }
}
