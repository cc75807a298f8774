//! Shared data models for diagnostics, analyzer specs and check reports.

pub mod analyzer;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a single diagnostic.
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Map a severity token captured from analyzer output.
    ///
    /// Anything mentioning `error` or `fatal` (e.g. `Parse error`,
    /// `Fatal error`, `ERROR`) is an error; every other token is a warning.
    pub fn from_token(token: &str) -> Self {
        let t = token.to_ascii_lowercase();
        if t.contains("error") || t.contains("fatal") {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// Zero-based line/column location.
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
/// One reported issue. Built by parsers only and never mutated afterwards.
pub struct Diagnostic {
    message: String,
    position: Position,
    severity: Severity,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, position: Position, severity: Severity) -> Self {
        Self {
            message: message.into(),
            position,
            severity,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Payload returned to the editor by an inspection provider.
pub struct InspectionReport {
    pub errors: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
/// Diagnostics (or failure) of one analyzer for one file.
pub struct AnalyzerReport {
    pub analyzer: String,
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
/// All analyzer reports collected for one file.
pub struct FileReport {
    pub file: String,
    pub analyzers: Vec<AnalyzerReport>,
}

#[derive(Debug, Default, Clone, Serialize)]
/// Aggregated counts used by printers and the exit code.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub failures: usize,
    pub files: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Result of a `check` run over one or more files.
pub struct CheckResult {
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl CheckResult {
    /// Build a result and compute its summary from the file reports.
    pub fn from_files(files: Vec<FileReport>) -> Self {
        let mut summary = Summary {
            files: files.len(),
            ..Summary::default()
        };
        for report in files.iter().flat_map(|f| f.analyzers.iter()) {
            if report.failure.is_some() {
                summary.failures += 1;
            }
            for d in &report.diagnostics {
                match d.severity() {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                }
            }
        }
        Self { files, summary }
    }
}
