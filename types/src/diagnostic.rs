//! Structured findings reported by the aggregator.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Classify the severity token of an aggregator line.
    ///
    /// Only the literal `warning` downgrades; every other token (including
    /// `error` and anything unrecognised) is reported as an error so that an
    /// unexpected sub-linter label never hides a finding.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "warning" => Self::Warning,
            _ => Self::Error,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single finding from the aggregator.
///
/// Fields are private; after construction a diagnostic is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Path as reported by the aggregator (usually relative to its working directory).
    file: PathBuf,
    /// 1-indexed line number.
    line: u32,
    /// 1-indexed column, absent when the sub-linter did not report one.
    column: Option<u32>,
    severity: Severity,
    message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        file: impl Into<PathBuf>,
        line: u32,
        column: Option<u32>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            severity,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 1-indexed line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-indexed column.
    #[must_use]
    pub fn column(&self) -> Option<u32> {
        self.column
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Formats as `path:line:col: severity: message`, omitting the column when absent.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)?;
        if let Some(col) = self.column {
            write!(f, ":{col}")?;
        }
        write!(f, ": {}: {}", self.severity, self.message)
    }
}
