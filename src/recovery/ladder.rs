//! Escalation ladder decisions
//!
//! Pure functions: given a failed attempt, pick the next rung. Order is
//! fixed: grow iterations, switch algorithm, loosen tolerance at the step
//! floor (or give up), bisect.

use crate::control::RunConfig;
use crate::recovery::types::{Attempt, EscalationAction};

/// Check if the ladder will look at the residual norm of the failed attempt
pub fn needs_residual_norm(config: &RunConfig, attempt: &Attempt) -> bool {
    config.escalation.try_add_test_iterations
        && attempt.max_iterations != config.escalation.expanded_max_iterations
}

/// Pick the next move after `attempt` failed
///
/// `active_tolerance` is the tolerance currently configured on the solver;
/// `last_norm` is the terminal residual norm of the failed attempt, if the
/// solver reported one.
pub fn decide(
    config: &RunConfig,
    active_tolerance: f64,
    attempt: &Attempt,
    last_norm: Option<f64>,
) -> EscalationAction {
    let policy = &config.escalation;

    if needs_residual_norm(config, attempt) {
        if let Some(norm) = last_norm {
            if norm < policy.norm_threshold {
                return EscalationAction::AddTestIterations {
                    next: Attempt {
                        max_iterations: policy.expanded_max_iterations,
                        ..*attempt
                    },
                };
            }
        }
    }

    if policy.try_alternate_algorithms && attempt.algorithm_index + 1 < policy.algorithms.len() {
        return EscalationAction::SwitchAlgorithm {
            next: Attempt {
                algorithm_index: attempt.algorithm_index + 1,
                ..*attempt
            },
        };
    }

    if attempt.step.abs() < 2.0 * config.step.min_step {
        if policy.try_loosen_tolerance && active_tolerance != policy.loosened_tolerance {
            return EscalationAction::LoosenTolerance {
                next: Attempt {
                    step: attempt.step,
                    algorithm_index: 0,
                    max_iterations: config.test.max_iterations,
                    tolerance: policy.loosened_tolerance,
                },
            };
        }
        return EscalationAction::GiveUp { step: attempt.step };
    }

    let (first, rest) = bisect(attempt.step, config.step.relaxation, config.step.min_step);
    EscalationAction::Bisect {
        first: Attempt {
            step: first,
            algorithm_index: 0,
            ..*attempt
        },
        rest: Attempt {
            step: rest,
            algorithm_index: 0,
            ..*attempt
        },
    }
}

/// Split `step` into `(first, rest)` with `first + rest == step`
///
/// `first` is `step * relaxation`, pushed out to `min_step` in magnitude
/// when it would be smaller. Both parts keep the sign of `step` as long as
/// `|step| >= 2 * min_step`.
pub fn bisect(step: f64, relaxation: f64, min_step: f64) -> (f64, f64) {
    let mut first = step * relaxation;
    if first > 0.0 && first < min_step {
        first = min_step;
    } else if first < 0.0 && first > -min_step {
        first = -min_step;
    }
    (first, step - first)
}

/// Longest chain of bisections `step` can go through before hitting the floor
///
/// Each split shrinks a piece by at least `max(relaxation, 1 - relaxation)`.
pub fn bisection_depth_bound(step: f64, min_step: f64, relaxation: f64) -> usize {
    let ratio = step.abs() / (2.0 * min_step);
    if !(ratio.is_finite() && ratio > 1.0) {
        return 0;
    }
    let shrink = relaxation.max(1.0 - relaxation);
    if !(shrink > 0.0 && shrink < 1.0) {
        return 0;
    }
    (ratio.ln() / (1.0 / shrink).ln()).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;

    fn attempt(step: f64) -> Attempt {
        Attempt {
            step,
            algorithm_index: 0,
            max_iterations: 7,
            tolerance: 1e-6,
        }
    }

    fn config() -> RunConfig {
        let mut config = RunConfig::transient(0.01);
        config.step.min_step = 0.1;
        config
    }

    #[test]
    fn test_add_iterations_when_close() {
        let mut config = config();
        config.escalation.try_add_test_iterations = true;
        config.escalation.try_alternate_algorithms = true;
        config.escalation.algorithms = vec![Algorithm::default(), Algorithm::Bfgs];

        let action = decide(&config, 1e-6, &attempt(1.0), Some(10.0));
        match action {
            EscalationAction::AddTestIterations { next } => {
                assert_eq!(next.max_iterations, 50);
                assert_eq!(next.step, 1.0);
                assert_eq!(next.algorithm_index, 0);
            }
            other => panic!("expected AddTestIterations, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_iterations_when_norm_large() {
        let mut config = config();
        config.escalation.try_add_test_iterations = true;

        let action = decide(&config, 1e-6, &attempt(1.0), Some(5e3));
        assert!(matches!(action, EscalationAction::Bisect { .. }));
    }

    #[test]
    fn test_skip_iterations_already_expanded() {
        let mut config = config();
        config.escalation.try_add_test_iterations = true;
        let mut expanded = attempt(1.0);
        expanded.max_iterations = 50;

        assert!(!needs_residual_norm(&config, &expanded));
        let action = decide(&config, 1e-6, &expanded, Some(1.0));
        match action {
            EscalationAction::Bisect { first, rest } => {
                assert_eq!(first.max_iterations, 50);
                assert_eq!(rest.max_iterations, 50);
            }
            other => panic!("expected Bisect, got {:?}", other),
        }
    }

    #[test]
    fn test_switch_algorithm_keeps_parameters() {
        let mut config = config();
        config.escalation.try_alternate_algorithms = true;
        config.escalation.algorithms = vec![Algorithm::default(), Algorithm::Bfgs];

        let mut current = attempt(0.5);
        current.max_iterations = 50;
        let action = decide(&config, 1e-6, &current, None);
        assert_eq!(
            action,
            EscalationAction::SwitchAlgorithm {
                next: Attempt {
                    algorithm_index: 1,
                    ..current
                }
            }
        );

        let mut last = current;
        last.algorithm_index = 1;
        assert!(matches!(decide(&config, 1e-6, &last, None), EscalationAction::Bisect { .. }));
    }

    #[test]
    fn test_floor_gives_up_without_loosening() {
        let config = config();
        let action = decide(&config, 1e-6, &attempt(0.19), None);
        assert_eq!(action, EscalationAction::GiveUp { step: 0.19 });
    }

    #[test]
    fn test_floor_loosens_tolerance_once() {
        let mut config = config();
        config.escalation.try_loosen_tolerance = true;

        let mut current = attempt(-0.15);
        current.algorithm_index = 2;
        current.max_iterations = 50;
        let action = decide(&config, 1e-6, &current, None);
        assert_eq!(
            action,
            EscalationAction::LoosenTolerance {
                next: Attempt {
                    step: -0.15,
                    algorithm_index: 0,
                    max_iterations: 7,
                    tolerance: 1.0,
                }
            }
        );

        let action = decide(&config, 1.0, &current, None);
        assert!(action.is_terminal());
    }

    #[test]
    fn test_bisect_resets_algorithm() {
        let config = config();
        let mut current = attempt(1.0);
        current.algorithm_index = 3;
        match decide(&config, 1e-6, &current, None) {
            EscalationAction::Bisect { first, rest } => {
                assert_eq!(first.algorithm_index, 0);
                assert_eq!(rest.algorithm_index, 0);
                assert_eq!(first.step + rest.step, 1.0);
            }
            other => panic!("expected Bisect, got {:?}", other),
        }
    }

    #[test]
    fn test_bisect_preserves_sign() {
        assert_eq!(bisect(-0.8, 0.5, 0.1), (-0.4, -0.4));
        assert_eq!(bisect(0.8, 0.5, 0.1), (0.4, 0.4));
    }

    #[test]
    fn test_bisect_clamps_to_min_step() {
        let (first, rest) = bisect(0.25, 0.1, 0.1);
        assert_eq!(first, 0.1);
        assert!((rest - 0.15).abs() < 1e-12);

        let (first, rest) = bisect(-0.25, 0.1, 0.1);
        assert_eq!(first, -0.1);
        assert!((rest + 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_depth_bound() {
        assert_eq!(bisection_depth_bound(0.1, 0.1, 0.5), 0);
        assert_eq!(bisection_depth_bound(0.9, 0.1, 0.5), 3);
        assert_eq!(bisection_depth_bound(-0.9, 0.1, 0.5), 3);
        assert!(bisection_depth_bound(1.0, 1e-6, 0.5) >= 18);
    }
}
