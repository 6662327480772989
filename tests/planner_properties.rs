//! Property tests for the protocol planner and bisection

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use smart_analyze::planning::plan_static;
use smart_analyze::recovery::{bisect, bisection_depth_bound};

/// Quarter-unit targets and eighth-unit steps keep every value exact
fn protocol(raw_targets: &[i8], raw_step: u8) -> (Vec<f64>, f64) {
    let targets = raw_targets.iter().map(|t| *t as f64 / 4.0).collect();
    let max_step = (raw_step as f64 + 1.0) / 8.0;
    (targets, max_step)
}

#[quickcheck]
fn prop_increments_sum_to_final_target(raw_targets: Vec<i8>, raw_step: u8) -> TestResult {
    let (targets, max_step) = protocol(&raw_targets, raw_step);
    if targets.first().map_or(true, |t| *t <= 0.0) {
        return TestResult::discard();
    }

    let plan = plan_static(&targets, max_step).unwrap();
    let total: f64 = plan.increments.iter().sum();
    let last = *targets.last().unwrap();
    TestResult::from_bool((total - last).abs() < 1e-9)
}

#[quickcheck]
fn prop_increments_within_max_step(raw_targets: Vec<i8>, raw_step: u8) -> TestResult {
    let (targets, max_step) = protocol(&raw_targets, raw_step);
    if targets.first().map_or(true, |t| *t <= 0.0) {
        return TestResult::discard();
    }

    let plan = plan_static(&targets, max_step).unwrap();
    TestResult::from_bool(
        plan.increments
            .iter()
            .all(|inc| *inc != 0.0 && inc.abs() <= max_step),
    )
}

#[quickcheck]
fn prop_legs_keep_their_sign(raw_targets: Vec<i8>, raw_step: u8) -> TestResult {
    let (targets, max_step) = protocol(&raw_targets, raw_step);
    if targets.first().map_or(true, |t| *t <= 0.0) {
        return TestResult::discard();
    }

    let plan = plan_static(&targets, max_step).unwrap();
    let mut remaining = plan.increments.iter();

    for leg in &plan.legs {
        // zero-length legs own no increments
        if leg.is_empty() {
            continue;
        }

        let mut covered = 0.0;
        while (covered - leg.delta()).abs() > 1e-9 {
            match remaining.next() {
                Some(inc) if inc.signum() == leg.delta().signum() => covered += inc,
                _ => return TestResult::failed(),
            }
        }
    }

    TestResult::from_bool(remaining.next().is_none())
}

#[quickcheck]
fn prop_bisection_terminates(raw_step: i32, raw_min: u16, raw_relaxation: u8) -> TestResult {
    if raw_step == 0 || raw_relaxation == 0 || raw_relaxation == u8::MAX {
        return TestResult::discard();
    }

    let step = raw_step as f64 / 1000.0;
    let min_step = (raw_min as f64 + 1.0) / 1.0e4;
    let relaxation = raw_relaxation as f64 / u8::MAX as f64;
    let bound = bisection_depth_bound(step, min_step, relaxation);

    // follow the larger part, the longest chain bisection can take
    let mut current = step;
    let mut depth = 0usize;
    while current.abs() >= 2.0 * min_step {
        let (first, rest) = bisect(current, relaxation, min_step);

        let shrinks = first.abs() < current.abs() && rest.abs() < current.abs();
        let same_sign = first.signum() == current.signum() && rest.signum() == current.signum();
        if !(shrinks && same_sign && first != 0.0 && rest != 0.0) {
            return TestResult::failed();
        }

        current = if first.abs() >= rest.abs() { first } else { rest };
        depth += 1;
        if depth > bound + 2 {
            return TestResult::failed();
        }
    }

    TestResult::passed()
}

#[test]
fn test_cyclic_protocol_example() {
    let plan = plan_static(&[1.0, -1.0, 1.0, -1.0, 0.0], 0.5).unwrap();
    let magnitudes: Vec<f64> = plan.legs.iter().map(|leg| leg.delta().abs()).collect();
    assert_eq!(magnitudes, vec![1.0, 2.0, 2.0, 2.0, 1.0]);
    assert_eq!(plan.len(), 16);
    assert_eq!(plan.initial_step, 0.5);
}
