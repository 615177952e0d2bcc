//! Default text output formatter with colors

use crate::aggregate::Report;
use crate::finding::Finding;
use crate::output::OutputFormatter;
use colored::*;

/// Default human-readable formatter with colors
pub struct TextFormatter {
    use_colors: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    fn format_finding(&self, finding: &Finding) -> String {
        if !self.use_colors {
            return finding.to_string();
        }

        let mut location = finding.path.blue().underline().to_string();
        if let Some(line) = finding.line {
            location.push_str(&format!(":{}", line.to_string().cyan()));
            if let Some(col) = finding.column {
                location.push_str(&format!(":{}", col.to_string().cyan()));
            }
        }
        format!("{location}: {} {}", finding.message, format!("({})", finding.linter).yellow())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_report(&self, report: &Report) -> String {
        let mut output = String::new();

        for finding in &report.findings {
            output.push_str(&self.format_finding(finding));
            output.push('\n');
        }

        // Remove trailing newline
        if output.ends_with('\n') {
            output.pop();
        }

        output
    }

    fn format_summary(&self, report: &Report) -> Option<String> {
        let summary = if report.is_ok() {
            format!("No issues found ({} check(s) run)", report.checked)
        } else {
            let failed: Vec<String> = report
                .failed
                .iter()
                .map(|run| format!("{} on {}", run.linter, run.scope))
                .collect();
            format!(
                "Found {} issue(s) from {}",
                report.findings.len(),
                failed.join(", ")
            )
        };

        Some(if !self.use_colors {
            summary
        } else if report.is_ok() {
            summary.green().bold().to_string()
        } else {
            summary.red().bold().to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{FailedRun, Outcome};

    fn failed_report() -> Report {
        Report {
            outcome: Outcome::Failed,
            findings: vec![
                Finding::new("goimports", "main.go", 12, "not formatted"),
                Finding::new("errcheck", "pkg/a/a.go", 3, "unchecked error").with_column(7),
            ],
            failed: vec![
                FailedRun {
                    scope: ".".to_string(),
                    linter: "goimports".to_string(),
                    exit_code: Some(1),
                },
                FailedRun {
                    scope: "pkg/a".to_string(),
                    linter: "errcheck".to_string(),
                    exit_code: Some(1),
                },
            ],
            checked: 3,
        }
    }

    #[test]
    fn test_format_without_colors() {
        let formatter = TextFormatter::without_colors();
        assert_eq!(
            formatter.format_report(&failed_report()),
            "main.go:12: not formatted (goimports)\npkg/a/a.go:3:7: unchecked error (errcheck)"
        );
    }

    #[test]
    fn test_clean_report_is_empty() {
        let formatter = TextFormatter::without_colors();
        let report = Report::clean();
        assert_eq!(formatter.format_report(&report), "");
        assert_eq!(
            formatter.format_summary(&report).as_deref(),
            Some("No issues found (0 check(s) run)")
        );
    }

    #[test]
    fn test_failed_summary() {
        let formatter = TextFormatter::without_colors();
        assert_eq!(
            formatter.format_summary(&failed_report()).as_deref(),
            Some("Found 2 issue(s) from goimports on ., errcheck on pkg/a")
        );
    }

    #[test]
    fn test_colored_keeps_message() {
        let formatter = TextFormatter::new();
        let output = formatter.format_report(&failed_report());
        assert!(output.contains("not formatted"));
        assert!(output.contains("unchecked error"));
    }
}
