//! Run result reporting

use crate::control::AnalysisKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every planned increment was applied
    Succeeded,

    /// Recovery options exhausted at the minimum step
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Succeeded => write!(f, "succeeded"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Report returned by every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub kind: AnalysisKind,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub completed_increments: usize,
    pub total_increments: usize,

    /// Solver attempts, including every escalation and sub-increment
    pub attempts: usize,
}

impl RunReport {
    /// Check if the run applied the whole protocol
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }

    /// One-line summary printed at the end of a run
    pub fn summary(&self) -> String {
        match self.outcome {
            RunOutcome::Succeeded => format!(
                "{} analysis completed: {} increments in {:.3} s",
                self.kind,
                self.total_increments,
                self.elapsed.as_secs_f64()
            ),
            RunOutcome::Failed => format!(
                "{} analysis failed after {}/{} increments in {:.3} s: all recovery options exhausted at minimum step",
                self.kind,
                self.completed_increments,
                self.total_increments,
                self.elapsed.as_secs_f64()
            ),
        }
    }

    /// Render the report as pretty JSON
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: RunOutcome) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            kind: AnalysisKind::Static,
            outcome,
            started_at: Utc::now(),
            elapsed: Duration::from_millis(1500),
            completed_increments: 3,
            total_increments: 16,
            attempts: 9,
        }
    }

    #[test]
    fn test_failure_summary() {
        let report = report(RunOutcome::Failed);
        assert!(!report.is_success());
        let summary = report.summary();
        assert!(summary.contains("3/16"));
        assert!(summary.contains("minimum step"));
    }

    #[test]
    fn test_report_json() {
        let report = report(RunOutcome::Succeeded);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"Succeeded\""));

        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
