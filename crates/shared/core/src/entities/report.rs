use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{Outcome, OutcomeStatus};
use crate::values::Timestamp;

/// What a report was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    Trade,
    Query,
}

/// Per-status counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}

/// Complete result of one batch.
///
/// Holds exactly one outcome per attempted target per instruction, ordered
/// by (instruction index, target index) regardless of completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub batch_id: Uuid,
    pub kind: ReportKind,
    pub outcomes: Vec<Outcome>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub elapsed_ms: u64,
}

impl ExecutionReport {
    pub fn new(kind: ReportKind, outcomes: Vec<Outcome>, started_at: Timestamp) -> Self {
        let finished_at = Utc::now();
        let elapsed_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            batch_id: Uuid::new_v4(),
            kind,
            outcomes,
            started_at,
            finished_at,
            elapsed_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        self.outcomes
            .iter()
            .fold(ReportSummary::default(), |mut acc, o| {
                match o.status {
                    OutcomeStatus::Success => acc.succeeded += 1,
                    OutcomeStatus::Failure => acc.failed += 1,
                    OutcomeStatus::Skipped => acc.skipped += 1,
                }
                acc
            })
    }

    /// Outcomes for one target, in instruction order
    pub fn for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Outcome> + 'a {
        self.outcomes.iter().filter(move |o| o.target_name == target)
    }

    pub fn any_success(&self) -> bool {
        self.outcomes.iter().any(Outcome::is_success)
    }

    /// Every non-skipped outcome succeeded (and at least one was attempted)
    pub fn all_succeeded(&self) -> bool {
        let mut attempted = self.outcomes.iter().filter(|o| !o.is_skipped()).peekable();
        attempted.peek().is_some() && attempted.all(Outcome::is_success)
    }

    /// One `<status> <target>: <detail>` line per outcome
    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Instruction;

    fn sample() -> ExecutionReport {
        let ins = Instruction::buy(10, "TSLA").unwrap();
        ExecutionReport::new(
            ReportKind::Trade,
            vec![
                Outcome::success("A", Some(ins.clone()), "filled", None, 1),
                Outcome::skipped("B", Some(ins.clone()), "no credentials"),
                Outcome::failure("C", Some(ins), "rejected", 1),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_summary_counts() {
        let report = sample();
        assert_eq!(
            report.summary(),
            ReportSummary {
                succeeded: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert!(report.any_success());
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_lines_follow_report_order() {
        let lines = sample().lines();
        assert_eq!(lines[0], "SUCCESS A: filled");
        assert_eq!(lines[1], "SKIPPED B: no credentials");
        assert_eq!(lines[2], "FAILURE C: rejected");
    }

    #[test]
    fn test_all_skipped_is_not_all_succeeded() {
        let report = ExecutionReport::new(
            ReportKind::Query,
            vec![Outcome::skipped("B", None, "no credentials")],
            Utc::now(),
        );
        assert!(!report.all_succeeded());
    }
}
