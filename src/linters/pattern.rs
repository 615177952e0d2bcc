//! Typed output patterns for turning raw linter output into findings.
//!
//! A pattern is a multi-line regular expression with named capture groups.
//! `path` is required; `line`, `col` and `message` are optional. Two shorthands
//! cover the common `file.go:line[:col]: message` output shape:
//!
//! - `PATH:LINE:COL:MESSAGE`
//! - `PATH:LINE:MESSAGE`

use crate::finding::Finding;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

const PATH_LINE_COL_MESSAGE: &str = r"^(?P<path>.*?\.go):(?P<line>\d+):(?P<col>\d+):\s*(?P<message>.*)$";
const PATH_LINE_MESSAGE: &str = r"^(?P<path>.*?\.go):(?P<line>\d+):\s*(?P<message>.*)$";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid output pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("output pattern '{0}' has no named 'path' group")]
    MissingPath(String),
}

/// Compiled output pattern of a linter.
#[derive(Debug, Clone)]
pub struct OutputPattern {
    source: String,
    regex: Regex,
}

impl OutputPattern {
    /// Compile a pattern, expanding the `PATH:...` shorthands.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let expanded = match pattern.trim() {
            "PATH:LINE:COL:MESSAGE" => PATH_LINE_COL_MESSAGE,
            "PATH:LINE:MESSAGE" => PATH_LINE_MESSAGE,
            other => other,
        };

        let regex = RegexBuilder::new(expanded)
            .multi_line(true)
            .crlf(true)
            .build()
            .map_err(|source| PatternError::Invalid {
                pattern: pattern.to_string(),
                source,
            })?;

        if !regex.capture_names().flatten().any(|name| name == "path") {
            return Err(PatternError::MissingPath(pattern.to_string()));
        }

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as it was declared.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Extract findings from combined linter output, in output order.
    ///
    /// `fallback_message` is used when the pattern has no `message` group or the
    /// captured message is empty.
    pub fn findings(&self, linter: &str, output: &str, fallback_message: Option<&str>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for caps in self.regex.captures_iter(output) {
            let Some(path) = caps.name("path").map(|m| m.as_str().trim()) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }

            let line = caps.name("line").and_then(|m| m.as_str().parse::<usize>().ok());
            let column = caps.name("col").and_then(|m| m.as_str().parse::<usize>().ok());
            let message = caps
                .name("message")
                .map(|m| m.as_str().trim())
                .filter(|m| !m.is_empty())
                .or(fallback_message)
                .unwrap_or("issue reported");

            findings.push(Finding {
                linter: linter.to_string(),
                path: path.to_string(),
                line,
                column,
                message: message.to_string(),
            });
        }

        findings
    }
}
