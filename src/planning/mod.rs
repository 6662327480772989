//! Protocol planning
//! Converts transient and displacement protocols into ordered increments

pub mod protocol;
pub mod types;

pub use protocol::{plan_static, plan_transient};
pub use types::{Leg, StaticPlan};
