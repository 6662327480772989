//! Error types for smart-analyze
//!
//! Configuration mistakes and collaborator failures are errors. Running out
//! of recovery options is not: that is a failed `RunReport`.

use thiserror::Error;

/// Main error type for the analysis driver
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// Malformed run configuration, detected before any solver call
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Algorithm code outside the catalog
    #[error("Unknown algorithm type: {code}")]
    UnknownAlgorithm { code: i32 },

    /// User-defined algorithm selected but no hook registered for the slot
    #[error("User-defined algorithm {slot} has no registered hook")]
    MissingUserAlgorithm { slot: usize },

    /// Error raised by the solver collaborator (not a convergence failure)
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Malformed replay script
    #[error("Script error: {0}")]
    ScriptError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("Analyze error: {0}")]
    Generic(String),
}

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// Convert anyhow errors to AnalyzeError
impl From<anyhow::Error> for AnalyzeError {
    fn from(err: anyhow::Error) -> Self {
        AnalyzeError::Generic(err.to_string())
    }
}

impl AnalyzeError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        AnalyzeError::ConfigError(message.into())
    }
}
