//! smart-analyze - Adaptive convergence control for incremental nonlinear analyses
//!
//! Sits between a caller running a whole protocol (a time series or a
//! sequence of target displacements) and a solver that can attempt one
//! increment at a time. When an increment fails, the driver changes the
//! problem posed to the solver until the increment goes through or every
//! option is exhausted.
//!
//! # Architecture
//!
//! - **planning**: protocol to ordered increments
//! - **recovery**: escalation ladder and bisection for one increment
//! - **driver**: run state, orchestration and reporting
//! - **solver**: the solver collaborator interface

pub mod errors;
pub mod algorithm;
pub mod solver;
pub mod control;
pub mod planning;
pub mod recovery;
pub mod driver;

// Re-export commonly used types
pub use errors::{AnalyzeError, Result};
pub use driver::{run_static, run_transient, RunOutcome, RunReport, SmartAnalyzer};

// Console output and run statistics
pub mod telemetry;
pub mod cli;

// Display mode abstraction for library and CLI use
pub mod display_mode;
pub use display_mode::DisplayMode;
