//! Protocol planning type definitions

use serde::{Deserialize, Serialize};

/// One monotonic stretch of a loading protocol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Target displacement where the leg starts
    pub from: f64,

    /// Target displacement where the leg ends
    pub to: f64,
}

impl Leg {
    /// Signed length of the leg
    pub fn delta(&self) -> f64 {
        self.to - self.from
    }

    /// Direction of loading: +1.0 or -1.0
    pub fn direction(&self) -> f64 {
        if self.delta() < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Check if the leg moves nowhere
    pub fn is_empty(&self) -> bool {
        self.delta() == 0.0
    }
}

/// Ordered increments of a displacement-controlled run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPlan {
    /// Signed displacement increments, in loading order
    pub increments: Vec<f64>,

    /// Increment configured on the integrator before the first attempt
    pub initial_step: f64,

    /// Loading legs the increments were cut from
    pub legs: Vec<Leg>,
}

impl StaticPlan {
    /// Number of planned increments
    pub fn len(&self) -> usize {
        self.increments.len()
    }

    /// Check if there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.increments.is_empty()
    }

    /// Displacement reached after every increment is applied
    pub fn final_displacement(&self) -> f64 {
        self.increments.iter().sum()
    }

    /// Total travelled distance
    pub fn total_distance(&self) -> f64 {
        self.legs.iter().map(|leg| leg.delta().abs()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_direction() {
        assert_eq!(Leg { from: 1.0, to: -1.0 }.direction(), -1.0);
        assert_eq!(Leg { from: -1.0, to: 1.0 }.direction(), 1.0);
        assert!(Leg { from: 0.5, to: 0.5 }.is_empty());
    }

    #[test]
    fn test_plan_totals() {
        let plan = StaticPlan {
            increments: vec![0.5, 0.5, -0.5],
            initial_step: 0.5,
            legs: vec![Leg { from: 0.0, to: 1.0 }, Leg { from: 1.0, to: 0.5 }],
        };
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.final_displacement(), 0.5);
        assert_eq!(plan.total_distance(), 1.5);
    }
}
