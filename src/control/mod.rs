//! Run configuration
//! Defaults per analysis kind, partial user overrides and validation

pub mod overrides;
pub mod types;

pub use overrides::ControlOverrides;
pub use types::{AnalysisKind, EscalationPolicy, ReportingPolicy, RunConfig, StepPolicy, TestPolicy};
