//! smart-analyze - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use smart_analyze::{
    cli::{Args, Commands, Config, ReplayAnalysis, Verbosity},
    planning::plan_static,
    solver::{DisplacementControl, ScriptFile, ScriptedSolver},
    telemetry::{TelemetryCollector, TelemetryDisplay},
    DisplayMode, RunReport, SmartAnalyzer,
};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    if !config.display.color {
        colored::control::set_override(false);
    }

    match &args.command {
        Commands::Plan { max_step, targets } => {
            show_plan(*max_step, targets)?;
        }
        Commands::Replay {
            script,
            json,
            analysis,
        } => {
            let report = replay(&args, &config, script, analysis)?;
            if *json {
                println!("{}", report.to_json()?);
            }
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Config => {
            show_config(&args, &config)?;
        }
    }

    Ok(())
}

fn show_plan(max_step: f64, targets: &[f64]) -> Result<()> {
    let plan = plan_static(targets, max_step)?;

    println!("{}", "Loading protocol".bold());
    println!("  Initial step: {}", plan.initial_step);
    println!("  Increments:   {}", plan.len());
    println!("  Distance:     {}", plan.total_distance());
    println!();

    for (i, leg) in plan.legs.iter().enumerate() {
        println!("  Leg {}: {} -> {}", i + 1, leg.from, leg.to);
    }
    println!();

    for (i, increment) in plan.increments.iter().enumerate() {
        println!("  {:>4}  {:+.6}", i + 1, increment);
    }

    Ok(())
}

fn replay(
    args: &Args,
    config: &Config,
    script: &Path,
    analysis: &ReplayAnalysis,
) -> Result<RunReport> {
    let script_file = ScriptFile::load(script)
        .with_context(|| format!("Failed to load script {}", script.display()))?;

    let verbosity = args.verbosity_or(config.verbosity());
    let display = if config.display.progress_bar && !args.no_progress && verbosity.show_progress() {
        DisplayMode::progress(verbosity)
    } else {
        DisplayMode::console(verbosity)
    };

    let telemetry = TelemetryCollector::new();
    let mut analyzer = SmartAnalyzer::new(ScriptedSolver::from_script(script_file))
        .with_display(display)
        .with_telemetry(telemetry.clone());

    let overrides = Some(&config.control);
    let report = match analysis {
        ReplayAnalysis::Transient { dt, npts } => analyzer.run_transient(*dt, *npts, overrides)?,
        ReplayAnalysis::Static {
            node,
            dof,
            max_step,
            targets,
        } => analyzer.run_static(
            DisplacementControl::new(*node, *dof),
            *max_step,
            targets,
            overrides,
        )?,
    };

    TelemetryDisplay::new(telemetry, verbosity).display_summary();
    Ok(report)
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    println!("{}", "smart-analyze configuration".bold());
    match &args.config {
        Some(path) => println!("# file: {}", path.display()),
        None => match Config::default_path() {
            Some(path) if path.exists() => println!("# file: {}", path.display()),
            _ => println!("# built-in defaults"),
        },
    }
    println!();
    print!("{}", config.to_toml()?);

    if args.verbosity_or(config.verbosity()) != Verbosity::Quiet {
        println!();
        println!("{}", "Effective transient parameters (dt = 1):".bold());
        let run = smart_analyze::control::RunConfig::transient(1.0)
            .with_overrides(Some(&config.control));
        for (name, value) in run.parameters() {
            println!("  {:<26} {}", name, value);
        }
    }

    Ok(())
}
