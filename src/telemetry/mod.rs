//! Telemetry system for smart-analyze
//!
//! Collects configuration and escalation events during a run and keeps
//! counters for the run summary.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Telemetry event types
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    // Solver configuration
    AlgorithmSelected {
        code: i32,
        timestamp: Instant,
    },
    TestConfigured {
        tolerance: f64,
        max_iterations: u32,
        timestamp: Instant,
    },
    IncrementConfigured {
        step: f64,
        timestamp: Instant,
    },

    // Attempts
    StepAttempted {
        step: f64,
        converged: bool,
        timestamp: Instant,
    },

    // Escalation ladder
    IterationsExpanded {
        step: f64,
        max_iterations: u32,
        timestamp: Instant,
    },
    AlgorithmSwitched {
        step: f64,
        algorithm_index: usize,
        timestamp: Instant,
    },
    ToleranceLoosened {
        step: f64,
        tolerance: f64,
        timestamp: Instant,
    },
    StepBisected {
        step: f64,
        first: f64,
        rest: f64,
        timestamp: Instant,
    },
    RecoveryExhausted {
        step: f64,
        timestamp: Instant,
    },

    // Run progress
    IncrementCompleted {
        index: usize,
        recovered: bool,
        timestamp: Instant,
    },
    RunFinished {
        success: bool,
        duration_ms: u64,
        timestamp: Instant,
    },
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEvent::AlgorithmSelected { code, .. } => write!(f, "algorithm {}", code),
            TelemetryEvent::TestConfigured {
                tolerance,
                max_iterations,
                ..
            } => write!(f, "test tol {:e}, {} iterations", tolerance, max_iterations),
            TelemetryEvent::IncrementConfigured { step, .. } => write!(f, "increment {}", step),
            TelemetryEvent::StepAttempted {
                step, converged, ..
            } => {
                let result = if *converged { "converged" } else { "failed" };
                write!(f, "step {} {}", step, result)
            }
            TelemetryEvent::IterationsExpanded {
                step,
                max_iterations,
                ..
            } => write!(f, "step {}: {} iterations", step, max_iterations),
            TelemetryEvent::AlgorithmSwitched {
                step,
                algorithm_index,
                ..
            } => write!(f, "step {}: algorithm #{}", step, algorithm_index),
            TelemetryEvent::ToleranceLoosened {
                step, tolerance, ..
            } => write!(f, "step {}: tolerance {:e}", step, tolerance),
            TelemetryEvent::StepBisected {
                step, first, rest, ..
            } => write!(f, "step {} split into {} + {}", step, first, rest),
            TelemetryEvent::RecoveryExhausted { step, .. } => {
                write!(f, "step {}: recovery exhausted", step)
            }
            TelemetryEvent::IncrementCompleted {
                index, recovered, ..
            } => {
                let how = if *recovered { "recovered" } else { "converged" };
                write!(f, "increment #{} {}", index, how)
            }
            TelemetryEvent::RunFinished {
                success,
                duration_ms,
                ..
            } => {
                let how = if *success { "succeeded" } else { "failed" };
                write!(f, "run {} in {} ms", how, duration_ms)
            }
        }
    }
}

/// Events listed at the end of a traced run summary
const RECENT_EVENTS_SHOWN: usize = 10;

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryStats {
    pub attempts: usize,
    pub converged_attempts: usize,
    pub failed_attempts: usize,
    pub reconfigurations: usize,
    pub iteration_expansions: usize,
    pub algorithm_switches: usize,
    pub tolerance_loosenings: usize,
    pub bisections: usize,
    pub increments_completed: usize,
    pub increments_recovered: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        // Update stats
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::AlgorithmSelected { .. }
                | TelemetryEvent::TestConfigured { .. }
                | TelemetryEvent::IncrementConfigured { .. } => {
                    stats.reconfigurations += 1;
                }
                TelemetryEvent::StepAttempted { converged, .. } => {
                    stats.attempts += 1;
                    if *converged {
                        stats.converged_attempts += 1;
                    } else {
                        stats.failed_attempts += 1;
                    }
                }
                TelemetryEvent::IterationsExpanded { .. } => {
                    stats.iteration_expansions += 1;
                }
                TelemetryEvent::AlgorithmSwitched { .. } => {
                    stats.algorithm_switches += 1;
                }
                TelemetryEvent::ToleranceLoosened { .. } => {
                    stats.tolerance_loosenings += 1;
                }
                TelemetryEvent::StepBisected { .. } => {
                    stats.bisections += 1;
                }
                TelemetryEvent::IncrementCompleted { recovered, .. } => {
                    stats.increments_completed += 1;
                    if *recovered {
                        stats.increments_recovered += 1;
                    }
                }
                TelemetryEvent::RecoveryExhausted { .. } | TelemetryEvent::RunFinished { .. } => {}
            }
        }

        // Store event
        lock(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Names of the escalation rungs taken, in order
    pub fn escalation_trail(&self) -> Vec<&'static str> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TelemetryEvent::IterationsExpanded { .. } => Some("add_test_iterations"),
                TelemetryEvent::AlgorithmSwitched { .. } => Some("switch_algorithm"),
                TelemetryEvent::ToleranceLoosened { .. } => Some("loosen_tolerance"),
                TelemetryEvent::StepBisected { .. } => Some("bisect"),
                TelemetryEvent::RecoveryExhausted { .. } => Some("give_up"),
                _ => None,
            })
            .collect()
    }

    /// Fraction of attempts that converged
    pub fn attempt_success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        if stats.attempts == 0 {
            1.0
        } else {
            stats.converged_attempts as f64 / stats.attempts as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Run summary display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Summary lines, without printing
    pub fn summary_lines(&self) -> Vec<String> {
        let stats = self.collector.get_stats();
        vec![
            format!("Attempts:          {}", stats.attempts),
            format!("Success rate:      {:.1}%", self.collector.attempt_success_rate() * 100.0),
            format!(
                "Increments:        {} ({} recovered)",
                stats.increments_completed, stats.increments_recovered
            ),
            format!("Reconfigurations:  {}", stats.reconfigurations),
            format!("Iteration growths: {}", stats.iteration_expansions),
            format!("Algorithm changes: {}", stats.algorithm_switches),
            format!("Tolerance loosens: {}", stats.tolerance_loosenings),
            format!("Bisections:        {}", stats.bisections),
            format!("Events recorded:   {}", self.collector.event_count()),
        ]
    }

    /// The last `n` events, oldest first
    pub fn recent_lines(&self, n: usize) -> Vec<String> {
        self.collector
            .recent_events(n)
            .iter()
            .map(|event| format!("  {}", event))
            .collect()
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.should_show_summary() {
            return;
        }

        println!("\nRun Summary");
        println!("─────────────────────────────────────");
        println!("Duration:          {:?}", self.collector.elapsed());
        for line in self.summary_lines() {
            println!("{}", line);
        }
        if self.verbosity.show_traces() {
            println!("\nLast events");
            for line in self.recent_lines(RECENT_EVENTS_SHOWN) {
                println!("{}", line);
            }
        }
        println!();
    }

    /// Check if the summary should be shown
    pub fn should_show_summary(&self) -> bool {
        self.verbosity.show_notices()
    }
}
