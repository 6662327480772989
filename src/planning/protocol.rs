//! Protocol planner
//!
//! Turns a transient run (`dt`, `npts`) or a displacement loading protocol
//! (targets, largest increment) into the ordered increments the escalation
//! controller works through.

use crate::errors::{AnalyzeError, Result};
use crate::planning::types::{Leg, StaticPlan};

/// `npts` time increments of size `step`
pub fn plan_transient(step: f64, npts: usize) -> Vec<f64> {
    vec![step; npts]
}

/// Split a displacement protocol into increments no larger than `max_step`
///
/// `targets` are absolute displacements reached one after another from zero;
/// the first one must be positive. Each leg yields `max_step` chunks in the
/// leg's direction plus one non-zero remainder. Legs of zero length yield
/// nothing.
pub fn plan_static(targets: &[f64], max_step: f64) -> Result<StaticPlan> {
    if !(max_step.is_finite() && max_step > 0.0) {
        return Err(AnalyzeError::config(format!(
            "max_step must be greater than 0, got {}",
            max_step
        )));
    }

    if let Some(bad) = targets.iter().find(|t| !t.is_finite()) {
        return Err(AnalyzeError::config(format!("target {} is not finite", bad)));
    }

    let first = match targets.first() {
        Some(first) => *first,
        None => {
            return Ok(StaticPlan {
                increments: Vec::new(),
                initial_step: max_step,
                legs: Vec::new(),
            })
        }
    };

    if first <= 0.0 {
        return Err(AnalyzeError::config(format!(
            "first target must be positive, got {}",
            first
        )));
    }

    let legs: Vec<Leg> = std::iter::once(0.0)
        .chain(targets.iter().copied())
        .zip(targets.iter().copied())
        .map(|(from, to)| Leg { from, to })
        .collect();

    let mut increments = Vec::new();
    for leg in &legs {
        split_leg(leg, max_step, &mut increments);
    }

    Ok(StaticPlan {
        increments,
        initial_step: max_step.min(first),
        legs,
    })
}

fn split_leg(leg: &Leg, max_step: f64, out: &mut Vec<f64>) {
    if leg.is_empty() {
        return;
    }

    let length = leg.delta().abs();
    let direction = leg.direction();

    let mut chunks = 0usize;
    while length - chunks as f64 * max_step > max_step {
        out.push(direction * max_step);
        chunks += 1;
    }
    out.push(direction * (length - chunks as f64 * max_step));
}
