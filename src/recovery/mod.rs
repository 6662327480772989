//! Step recovery for failed increments
//! Escalation ladder decisions and the controller that applies them

pub mod escalation;
pub mod ladder;
pub mod types;

pub use escalation::EscalationController;
pub use ladder::{bisect, bisection_depth_bound, decide};
pub use types::{Attempt, EscalationAction, IncrementOutcome};
