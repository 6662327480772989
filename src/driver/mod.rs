//! Analysis driver
//! Run state, orchestration of planned increments and the run report

pub mod orchestrator;
pub mod report;
pub mod state;

pub use orchestrator::{run_static, run_transient, SmartAnalyzer};
pub use report::{RunOutcome, RunReport};
pub use state::RunState;
