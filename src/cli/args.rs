//! Command-line argument parsing for smart-analyze
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// smart-analyze - Adaptive convergence control for incremental nonlinear analyses
#[derive(Parser, Debug)]
#[command(name = "smart-analyze")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(
    about = "Drive incremental nonlinear analyses through step bisection and solver escalation",
    long_about = None
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the final result)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Plain console output instead of a progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the increments a displacement protocol is split into
    Plan {
        /// Largest increment magnitude
        #[arg(long)]
        max_step: f64,

        /// Target displacements, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        targets: Vec<f64>,
    },

    /// Run the driver against a recorded solver script
    Replay {
        /// JSON script of attempt results
        #[arg(long)]
        script: PathBuf,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        #[command(subcommand)]
        analysis: ReplayAnalysis,
    },

    /// Display current configuration
    Config,
}

/// Analysis replayed by `replay`
#[derive(Subcommand, Debug)]
pub enum ReplayAnalysis {
    /// Time history analysis
    Transient {
        /// Time step
        #[arg(long)]
        dt: f64,

        /// Number of time steps
        #[arg(long)]
        npts: usize,
    },

    /// Displacement-controlled loading
    Static {
        /// Controlled node
        #[arg(long)]
        node: u32,

        /// Controlled degree of freedom
        #[arg(long)]
        dof: u32,

        /// Largest increment magnitude
        #[arg(long)]
        max_step: f64,

        /// Target displacements, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        targets: Vec<f64>,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity_or(Verbosity::Normal)
    }

    /// Verbosity from flags, `default` when neither -q nor -v was given
    pub fn verbosity_or(&self, default: Verbosity) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => default,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show reconfiguration notices and the run summary
    pub fn show_notices(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Check if should trace every attempt
    pub fn show_traces(&self) -> bool {
        matches!(self, Verbosity::VeryVerbose)
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(Verbosity::Quiet),
            "normal" => Ok(Verbosity::Normal),
            "verbose" => Ok(Verbosity::Verbose),
            "very_verbose" => Ok(Verbosity::VeryVerbose),
            other => Err(format!("Invalid verbosity level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_quiet() {
        let args = parse(&["smart-analyze", "-q", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_normal() {
        let args = parse(&["smart-analyze", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Normal);
        assert_eq!(args.verbosity_or(Verbosity::Verbose), Verbosity::Verbose);
    }

    #[test]
    fn test_verbosity_very_verbose() {
        let args = parse(&["smart-analyze", "-vv", "config"]);
        assert_eq!(args.verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_plan_targets_with_negatives() {
        let args = parse(&[
            "smart-analyze",
            "plan",
            "--max-step",
            "0.5",
            "--targets",
            "1,-1,1,-1,0",
        ]);
        match args.command {
            Commands::Plan { max_step, targets } => {
                assert_eq!(max_step, 0.5);
                assert_eq!(targets, vec![1.0, -1.0, 1.0, -1.0, 0.0]);
            }
            other => panic!("expected plan, got {:?}", other),
        }
    }

    #[test]
    fn test_replay_static() {
        let args = parse(&[
            "smart-analyze",
            "replay",
            "--script",
            "trace.json",
            "--json",
            "static",
            "--node",
            "3",
            "--dof",
            "1",
            "--max-step",
            "0.1",
            "--targets",
            "0.5,-0.5",
        ]);
        match args.command {
            Commands::Replay {
                script,
                json,
                analysis: ReplayAnalysis::Static { node, dof, targets, .. },
            } => {
                assert_eq!(script, PathBuf::from("trace.json"));
                assert!(json);
                assert_eq!((node, dof), (3, 1));
                assert_eq!(targets, vec![0.5, -0.5]);
            }
            other => panic!("expected static replay, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Args::try_parse_from(["smart-analyze"]).is_err());
    }

    #[test]
    fn test_verbosity_from_str() {
        assert_eq!("very_verbose".parse::<Verbosity>(), Ok(Verbosity::VeryVerbose));
        assert!("loud".parse::<Verbosity>().is_err());
        for level in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::VeryVerbose,
        ] {
            assert_eq!(level.as_str().parse::<Verbosity>(), Ok(level));
        }
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());

        assert!(!Verbosity::Normal.show_notices());
        assert!(Verbosity::Verbose.show_notices());

        assert!(!Verbosity::Verbose.show_traces());
        assert!(Verbosity::VeryVerbose.show_traces());
    }
}
