//! Structured diagnostics extracted from linter output.

use serde::Serialize;
use std::fmt;

/// One diagnostic reported by an external linter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Id of the linter that produced this finding.
    pub linter: String,
    /// File the diagnostic points at, as printed by the linter.
    pub path: String,
    /// 1-indexed line, absent for file-level findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-indexed column, if the linter reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
}

impl Finding {
    pub fn new(linter: impl Into<String>, path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            linter: linter.into(),
            path: path.into(),
            line: Some(line),
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(col) = self.column {
                write!(f, ":{col}")?;
            }
        }
        write!(f, ": {} ({})", self.message, self.linter)
    }
}
