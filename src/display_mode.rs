//! Display mode abstraction for library, console and progress-bar output
//!
//! The driver reports through a `DisplayMode` so the same run can print to
//! a terminal, feed an `indicatif` bar, or stay silent inside tests.

use crate::cli::Verbosity;
use crate::control::RunConfig;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Display mode determines how output is rendered
#[derive(Clone)]
pub enum DisplayMode {
    /// No output at all
    Silent,

    /// Direct terminal output
    Console { verbosity: Verbosity },

    /// Terminal output routed through a progress bar over the increments
    Progress { bar: ProgressBar, verbosity: Verbosity },
}

impl DisplayMode {
    /// Create silent display mode
    pub fn silent() -> Self {
        Self::Silent
    }

    /// Create console display mode
    pub fn console(verbosity: Verbosity) -> Self {
        Self::Console { verbosity }
    }

    /// Create progress-bar display mode
    pub fn progress(verbosity: Verbosity) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} increments | {elapsed_precise} | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self::Progress { bar, verbosity }
    }

    /// Verbosity in effect (`Quiet` when silent)
    pub fn verbosity(&self) -> Verbosity {
        match self {
            Self::Silent => Verbosity::Quiet,
            Self::Console { verbosity } | Self::Progress { verbosity, .. } => *verbosity,
        }
    }

    /// Check if this mode prints nothing
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }

    fn emit(&self, line: String) {
        match self {
            Self::Silent => {}
            Self::Console { .. } => println!("{}", line),
            Self::Progress { bar, .. } => bar.println(line),
        }
    }

    fn shows_normal(&self) -> bool {
        !self.is_silent() && self.verbosity() != Verbosity::Quiet
    }

    /// Show an informational message
    pub fn show_info(&self, message: &str) {
        if self.shows_normal() {
            self.emit(format!("{} {}", ">>>".cyan(), message));
        }
    }

    /// Show a reconfiguration notice (verbose only)
    pub fn show_notice(&self, message: &str) {
        if !self.is_silent() && self.verbosity().show_notices() {
            self.emit(format!("{} {}", "-->".dimmed(), message));
        }
    }

    /// Show a per-attempt trace line
    pub fn show_trace(&self, message: &str) {
        if self.shows_normal() {
            self.emit(format!("{} {}", "***".dimmed(), message.dimmed()));
        }
    }

    /// Show a warning message
    pub fn show_warning(&self, message: &str) {
        if self.shows_normal() {
            self.emit(format!("{} {}", "!!!".yellow().bold(), message.yellow()));
        }
    }

    /// Show an error message
    pub fn show_error(&self, message: &str) {
        match self {
            Self::Silent => {}
            Self::Console { .. } => eprintln!("{} {}", "Error:".red().bold(), message),
            Self::Progress { bar, .. } => {
                bar.suspend(|| eprintln!("{} {}", "Error:".red().bold(), message))
            }
        }
    }

    /// Show a success message (shown even when quiet)
    pub fn show_success(&self, message: &str) {
        if !self.is_silent() {
            self.emit(format!("{} {}", ">>>".green().bold(), message.green()));
        }
    }

    /// Show the control parameters a run starts with
    pub fn show_parameters(&self, config: &RunConfig) {
        if !self.shows_normal() {
            return;
        }

        self.emit(format!("{}", "Control parameters:".bold()));
        for (name, value) in config.parameters() {
            self.emit(format!("  {:<26} {}", name, value));
        }
    }

    /// Show periodic progress
    pub fn show_progress(&self, completed: usize, total: usize, elapsed: Duration) {
        let fraction = if total == 0 {
            1.0
        } else {
            completed as f64 / total as f64
        };

        match self {
            Self::Silent => {}
            Self::Console { verbosity } => {
                if *verbosity != Verbosity::Quiet {
                    println!(
                        "{} progress {:.1}% ({}/{}), elapsed {:.3} s",
                        "*".cyan(),
                        fraction * 100.0,
                        completed,
                        total,
                        elapsed.as_secs_f64()
                    );
                }
            }
            Self::Progress { bar, .. } => {
                bar.set_position(completed as u64);
                bar.set_message(format!("{:.1}%", fraction * 100.0));
            }
        }
    }

    /// Prepare for a run of `total` increments
    pub fn begin_run(&self, total: usize) {
        if let Self::Progress { bar, .. } = self {
            bar.reset();
            bar.set_length(total as u64);
            bar.enable_steady_tick(Duration::from_millis(100));
        }
    }

    /// Record a completed increment
    pub fn increment_completed(&self, completed: usize) {
        if let Self::Progress { bar, .. } = self {
            bar.set_position(completed as u64);
        }
    }

    /// Close out the run display
    pub fn end_run(&self) {
        if let Self::Progress { bar, .. } = self {
            bar.finish_and_clear();
        }
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::Silent
    }
}
