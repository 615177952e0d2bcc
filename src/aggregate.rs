//! Combining per-(scope, linter) results into one verdict.

use crate::finding::Finding;
use crate::scope::Scope;
use serde::Serialize;
use std::ops::ControlFlow;

/// Outcome of running one linter against one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub scope: Scope,
    pub linter: String,
    pub exit_code: Option<i32>,
    /// Raw combined output of the linter.
    pub output: String,
    pub findings: Vec<Finding>,
}

impl RunResult {
    pub fn is_failure(&self) -> bool {
        self.exit_code != Some(0) || !self.findings.is_empty()
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Clean,
    Failed,
}

/// A (scope, linter) pair that reported findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRun {
    pub scope: String,
    pub linter: String,
    pub exit_code: Option<i32>,
}

/// Final verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub outcome: Outcome,
    /// Findings in the order scopes and linters were evaluated.
    pub findings: Vec<Finding>,
    pub failed: Vec<FailedRun>,
    /// Number of (scope, linter) pairs that ran.
    pub checked: usize,
}

impl Report {
    pub fn clean() -> Self {
        Self {
            outcome: Outcome::Clean,
            findings: Vec::new(),
            failed: Vec::new(),
            checked: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Clean
    }
}

/// Collects results as they arrive and decides when to stop.
#[derive(Debug)]
pub struct Aggregator {
    fail_fast: bool,
    report: Report,
}

impl Aggregator {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            report: Report::clean(),
        }
    }

    /// Record a result. Breaks when the run should stop.
    pub fn record(&mut self, result: RunResult) -> ControlFlow<()> {
        self.report.checked += 1;
        if !result.is_failure() {
            return ControlFlow::Continue(());
        }

        log::debug!(
            "[codenanny] {} failed on {} with {} finding(s)",
            result.linter,
            result.scope,
            result.findings.len()
        );
        self.report.outcome = Outcome::Failed;
        self.report.failed.push(FailedRun {
            scope: result.scope.as_str().to_string(),
            linter: result.linter,
            exit_code: result.exit_code,
        });
        self.report.findings.extend(result.findings);

        if self.fail_fast {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    pub fn finish(self) -> Report {
        self.report
    }
}

/// Verdict and ordered findings for a finished set of results.
pub fn aggregate(results: impl IntoIterator<Item = RunResult>) -> (bool, Vec<Finding>) {
    let mut aggregator = Aggregator::new(false);
    for result in results {
        let _ = aggregator.record(result);
    }
    let report = aggregator.finish();
    (report.is_ok(), report.findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean(scope: &str, linter: &str) -> RunResult {
        RunResult {
            scope: Scope::Package(scope.to_string()),
            linter: linter.to_string(),
            exit_code: Some(0),
            output: String::new(),
            findings: Vec::new(),
        }
    }

    fn failing(scope: &str, linter: &str, line: usize) -> RunResult {
        RunResult {
            scope: Scope::Package(scope.to_string()),
            linter: linter.to_string(),
            exit_code: Some(1),
            output: format!("x.go:{line}: bad"),
            findings: vec![Finding::new(linter, "x.go", line, "bad")],
        }
    }

    #[test]
    fn test_all_clean() {
        let (ok, findings) = aggregate(vec![clean("a", "errcheck"), clean("b", "errcheck")]);
        assert!(ok);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_empty_results() {
        let (ok, findings) = aggregate(Vec::new());
        assert!(ok);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_preserves_evaluation_order() {
        let (ok, findings) = aggregate(vec![
            failing("b", "vet", 9),
            clean("a", "errcheck"),
            failing("a", "errcheck", 2),
        ]);
        assert!(!ok);
        let lines: Vec<_> = findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![Some(9), Some(2)]);
    }

    #[test]
    fn test_fail_fast_breaks() {
        let mut aggregator = Aggregator::new(true);
        assert_eq!(aggregator.record(clean("a", "errcheck")), ControlFlow::Continue(()));
        assert_eq!(aggregator.record(failing("a", "vet", 1)), ControlFlow::Break(()));

        let report = aggregator.finish();
        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.checked, 2);
        assert_eq!(
            report.failed,
            vec![FailedRun {
                scope: "a".to_string(),
                linter: "vet".to_string(),
                exit_code: Some(1),
            }]
        );
    }

    #[test]
    fn test_zero_exit_with_findings_is_failure() {
        let mut result = failing("a", "gofmt", 1);
        result.exit_code = Some(0);
        assert!(result.is_failure());
        assert!(!clean("a", "gofmt").is_failure());
    }
}
