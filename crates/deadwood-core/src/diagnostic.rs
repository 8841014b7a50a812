//! Diagnostic reporting for analysis results
//!
//! Per-file problems never abort a module; they are collected as
//! diagnostics on the module result instead.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The file could not be read, parsed or analyzed and contributes no facts.
    ParseFailure,
    /// An extractor reported a fact with a malformed symbol; the fact was dropped.
    MalformedFact,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseFailure => "parse-failure",
            DiagnosticKind::MalformedFact => "malformed-fact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        message: impl Into<String>,
        module: &str,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            module: module.to_string(),
            file: None,
            line: None,
        }
    }

    pub fn parse_failure(module: &str, file: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::ParseFailure, Severity::Error, message, module)
            .with_file(file)
    }

    pub fn malformed_fact(module: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::MalformedFact, Severity::Warning, message, module)
    }

    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = Some(file.to_path_buf());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.module, self.kind.as_str())?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: ", file.display(), line)?,
            (Some(file), None) => write!(f, "{}: ", file.display())?,
            _ => {}
        }
        f.write_str(&self.message)
    }
}
