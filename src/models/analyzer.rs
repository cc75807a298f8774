//! Analyzer schema: how to invoke one external tool and how to read its output.
//!
//! Key components:
//! - `args`: argument template. Whole-argument placeholders are `{file}` and
//!   `{options}`; `{vendor}` may appear inside any argument.
//! - `options` + `option_prefix`: ordered option list (rulesets, standards)
//!   rendered as one `prefix + a,b,c` argument, or omitted when empty.
//! - `exit_codes`: statuses whose output still carries diagnostics.
//! - `rules`: regex rules turning output lines into diagnostics.

use super::Severity;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
/// Invocation and parsing description of one analyzer.
pub struct AnalyzerSpec {
    pub id: String,
    /// Display name shown by inspection providers.
    pub name: String,
    /// Program to execute; `None` means the configured interpreter.
    #[serde(default)]
    pub program: Option<String>,
    pub args: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub option_prefix: String,
    #[serde(default = "default_exit_codes")]
    pub exit_codes: Vec<i32>,
    #[serde(default)]
    pub rules: Vec<ParseRule>,
}

#[derive(Debug, Clone, Deserialize)]
/// One output-matching rule.
///
/// Named groups: `line` (1-based, required), `column` (1-based),
/// `severity` and `message`. `message` is an expansion template such as
/// `"Duplicate code on lines ${line}-${end}"`; when absent the `message`
/// group is used verbatim.
pub struct ParseRule {
    pub pattern: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

fn default_enabled() -> bool {
    true
}

fn default_exit_codes() -> Vec<i32> {
    vec![0]
}

impl ParseRule {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            message: None,
            severity: None,
        }
    }

    pub fn message(mut self, template: &str) -> Self {
        self.message = Some(template.to_string());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}
