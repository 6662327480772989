//! CLI module for smart-analyze
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, ReplayAnalysis, Verbosity};
pub use config::{Config, DisplayConfig};
