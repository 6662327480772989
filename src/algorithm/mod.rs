//! Iteration algorithm catalog
//! Closed enumeration of solver algorithms plus user-defined hooks

pub mod hooks;
pub mod types;

pub use hooks::{UserAlgorithmFn, UserAlgorithms};
pub use types::{AccelerationOptions, Algorithm, LineSearch, NewtonTangent, USER_ALGORITHM_SLOTS};
