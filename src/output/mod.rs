//! Output formatting for run reports.

use crate::aggregate::Report;
use std::io::{self, Write};
use std::str::FromStr;

pub mod formatters;

pub use formatters::*;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format the findings of a finished run
    fn format_report(&self, report: &Report) -> String;

    /// One-line summary printed after the findings
    fn format_summary(&self, _report: &Report) -> Option<String> {
        None
    }
}

/// Available output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable `path:line[:col]: message (linter)` lines
    Text,
    /// JSON document with outcome and findings
    Json,
    /// GitHub Actions annotation format
    GitHub,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "github" => Ok(OutputFormat::GitHub),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl OutputFormat {
    /// Create a formatter instance for this format
    pub fn create_formatter(&self, use_colors: bool) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Text if use_colors => Box::new(TextFormatter::new()),
            OutputFormat::Text => Box::new(TextFormatter::without_colors()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::GitHub => Box::new(GitHubFormatter::new()),
        }
    }
}

/// Output writer that handles stdout/stderr routing
pub struct OutputWriter {
    quiet: bool,
}

impl OutputWriter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Write findings to stdout, even in quiet mode
    pub fn write_report(&self, content: &str) -> io::Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{content}")?;
        stdout.flush()
    }

    /// Write a status line to stderr unless quiet
    pub fn write_status(&self, content: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(io::stderr(), "{content}")
    }

    /// Write an error line to stderr (always)
    pub fn write_error(&self, content: &str) -> io::Result<()> {
        writeln!(io::stderr(), "{content}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("github".parse::<OutputFormat>(), Ok(OutputFormat::GitHub));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
