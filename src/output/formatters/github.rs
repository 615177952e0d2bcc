//! GitHub Actions annotation formatter

use crate::aggregate::Report;
use crate::output::OutputFormatter;

/// GitHub Actions workflow command formatter
#[derive(Default)]
pub struct GitHubFormatter;

impl GitHubFormatter {
    pub fn new() -> Self {
        Self
    }
}

/// Escape a workflow command property value
fn escape_property(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace(':', "%3A")
        .replace(',', "%2C")
}

/// Escape a workflow command message
fn escape_data(value: &str) -> String {
    value.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

impl OutputFormatter for GitHubFormatter {
    fn format_report(&self, report: &Report) -> String {
        let mut output = String::new();

        for finding in &report.findings {
            output.push_str(&format!("::error file={}", escape_property(&finding.path)));
            if let Some(line) = finding.line {
                output.push_str(&format!(",line={line}"));
                if let Some(col) = finding.column {
                    output.push_str(&format!(",col={col}"));
                }
            }
            output.push_str(&format!(
                ",title={}::{}\n",
                escape_property(&finding.linter),
                escape_data(&finding.message)
            ));
        }

        if output.ends_with('\n') {
            output.pop();
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Outcome;
    use crate::finding::Finding;

    #[test]
    fn test_annotations() {
        let report = Report {
            outcome: Outcome::Failed,
            findings: vec![
                Finding::new("errcheck", "pkg/a/a.go", 3, "unchecked error").with_column(7),
                Finding {
                    linter: "gofmt".to_string(),
                    path: "main.go".to_string(),
                    line: None,
                    column: None,
                    message: "file is not gofmt-ed with -s".to_string(),
                },
            ],
            failed: Vec::new(),
            checked: 2,
        };

        assert_eq!(
            GitHubFormatter::new().format_report(&report),
            "::error file=pkg/a/a.go,line=3,col=7,title=errcheck::unchecked error\n\
             ::error file=main.go,title=gofmt::file is not gofmt-ed with -s"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
        assert_eq!(escape_data("50%\nmore"), "50%25%0Amore");
    }
}
