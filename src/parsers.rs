//! Diagnostic parsers and the per-analyzer parser registry.
//!
//! Parsing is pure and line oriented. Lines that match no rule, or whose
//! captures are unusable, are skipped; one bad line never aborts a parse.
//! Identical diagnostics reported twice by one run (e.g. `php -l` printing
//! the same error on stdout and stderr) are collapsed to the first one.

use crate::error::{Error, Result};
use crate::models::analyzer::{AnalyzerSpec, ParseRule};
use crate::models::{Diagnostic, Position, Severity};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{trace, warn};

/// Turns raw analyzer output into diagnostics.
pub trait DiagnosticParser: Send + Sync {
    fn parse(&self, raw: &str) -> Vec<Diagnostic>;
}

struct CompiledRule {
    regex: Regex,
    message: String,
    severity: Option<Severity>,
}

/// Parser driven by an ordered list of regex rules; first match wins.
pub struct RegexParser {
    rules: Vec<CompiledRule>,
}

impl RegexParser {
    /// Compile `rules` for `analyzer`. Every pattern needs a `line` group.
    pub fn new(analyzer: &str, rules: &[ParseRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&rule.pattern).map_err(|source| Error::InvalidPattern {
                analyzer: analyzer.to_string(),
                source,
            })?;
            if !regex.capture_names().flatten().any(|n| n == "line") {
                return Err(Error::InvalidRule {
                    analyzer: analyzer.to_string(),
                    reason: format!("pattern `{}` has no `line` group", rule.pattern),
                });
            }
            compiled.push(CompiledRule {
                regex,
                message: rule.message.clone().unwrap_or_else(|| "$message".into()),
                severity: rule.severity,
            });
        }
        Ok(Self { rules: compiled })
    }

    fn parse_line(&self, line: &str) -> Option<Diagnostic> {
        let (rule, caps) = self
            .rules
            .iter()
            .find_map(|r| r.regex.captures(line).map(|c| (r, c)))?;
        let line_no: u32 = caps.name("line")?.as_str().parse().ok()?;
        let column: u32 = caps
            .name("column")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1);
        let severity = caps
            .name("severity")
            .map(|m| Severity::from_token(m.as_str()))
            .or(rule.severity)
            .unwrap_or(Severity::Warning);
        let mut message = String::new();
        caps.expand(&rule.message, &mut message);
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        Some(Diagnostic::new(
            message,
            Position {
                line: line_no.saturating_sub(1),
                column: column.saturating_sub(1),
            },
            severity,
        ))
    }
}

impl DiagnosticParser for RegexParser {
    fn parse(&self, raw: &str) -> Vec<Diagnostic> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for line in raw.lines() {
            match self.parse_line(line) {
                Some(d) => {
                    if seen.insert(d.clone()) {
                        out.push(d);
                    }
                }
                None => {
                    if !line.trim().is_empty() {
                        trace!(line, "Skipping unmatched output line");
                    }
                }
            }
        }
        out
    }
}

/// Parsers keyed by analyzer id.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Box<dyn DiagnosticParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one `RegexParser` per analyzer spec.
    pub fn from_specs(specs: &[AnalyzerSpec]) -> Result<Self> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(&spec.id, Box::new(RegexParser::new(&spec.id, &spec.rules)?))?;
        }
        Ok(registry)
    }

    /// Register the parser for `id`; each analyzer gets exactly one.
    pub fn register(&mut self, id: &str, parser: Box<dyn DiagnosticParser>) -> Result<()> {
        if self.parsers.contains_key(id) {
            return Err(Error::DuplicateAnalyzer(id.to_string()));
        }
        self.parsers.insert(id.to_string(), parser);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&dyn DiagnosticParser> {
        self.parsers
            .get(id)
            .map(|p| p.as_ref())
            .ok_or_else(|| Error::UnknownAnalyzer(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parsers.contains_key(id)
    }

    /// Parse `raw` with the parser for `id`; unknown ids yield nothing.
    pub fn parse(&self, id: &str, raw: &str) -> Vec<Diagnostic> {
        match self.get(id) {
            Ok(parser) => parser.parse(raw),
            Err(e) => {
                warn!(analyzer = %id, error = %e, "Dropping output of unregistered analyzer");
                Vec::new()
            }
        }
    }
}
