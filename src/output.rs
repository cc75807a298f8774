//! Output rendering for check reports, commands and session queries.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-analyzer diagnostics and a top-level summary.

use crate::command::{CommandLine, Platform};
use crate::models::{CheckResult, Diagnostic, InspectionReport, Severity};
use crate::utils::use_colors;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

/// Print check results in the requested format.
pub fn print_check(res: &CheckResult, output: &str) {
    match output {
        "json" => println!("{}", to_pretty(&compose_check_json(res))),
        _ => {
            let color = use_colors(output);
            for file in &res.files {
                for report in &file.analyzers {
                    if let Some(reason) = &report.failure {
                        let tag = if color {
                            "⟦failed⟧".magenta().bold().to_string()
                        } else {
                            "⟦failed⟧".to_string()
                        };
                        println!("{} {} ❲{}❳ — {}", tag, file.file, report.analyzer, reason);
                        continue;
                    }
                    for d in &report.diagnostics {
                        println!("{}", human_line(&file.file, &report.analyzer, d, color));
                    }
                }
            }
            let summary = format!(
                "— Summary — errors={} warnings={} failures={} files={}",
                res.summary.errors, res.summary.warnings, res.summary.failures, res.summary.files
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

fn human_line(file: &str, analyzer: &str, d: &Diagnostic, color: bool) -> String {
    let (sev, icon) = match (d.severity(), color) {
        (Severity::Error, true) => ("⟦error⟧".red().bold().to_string(), "✖".red().to_string()),
        (Severity::Warning, true) => ("⟦warn⟧".yellow().bold().to_string(), "▲".yellow().to_string()),
        (Severity::Error, false) => ("⟦error⟧".to_string(), "✖".to_string()),
        (Severity::Warning, false) => ("⟦warn⟧".to_string(), "▲".to_string()),
    };
    // Editors count from 1.
    let location = format!("{}:{}:{}", file, d.position().line + 1, d.position().column + 1);
    let location = if color {
        location.bold().to_string()
    } else {
        location
    };
    format!("{} {} {} ❲{}❳ — {}", icon, sev, location, analyzer, d.message())
}

/// Print materialized commands, one per analyzer.
pub fn print_commands(commands: &[(String, CommandLine)], output: &str) {
    match output {
        "json" => println!("{}", to_pretty(&compose_commands_json(commands))),
        _ => {
            let color = use_colors(output);
            for (id, cmd) in commands {
                let id = if color {
                    id.cyan().bold().to_string()
                } else {
                    id.clone()
                };
                println!("{} {}", id, cmd.render(Platform::host()));
            }
        }
    }
}

/// Print one provider's report as a single JSON line.
pub fn print_inspection(analyzer: &str, report: &InspectionReport) {
    let line = json!({"analyzer": analyzer, "errors": report.errors});
    println!("{}", line);
}

fn to_pretty(v: &JsonVal) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Compose check JSON object (pure) for testing/snapshot purposes.
pub fn compose_check_json(res: &CheckResult) -> JsonVal {
    serde_json::to_value(res).unwrap_or(JsonVal::Null)
}

/// Compose commands JSON object (pure) for testing/snapshot purposes.
pub fn compose_commands_json(commands: &[(String, CommandLine)]) -> JsonVal {
    let items: Vec<_> = commands
        .iter()
        .map(|(id, cmd)| {
            json!({
                "analyzer": id,
                "program": cmd.program(),
                "args": cmd.arguments(),
                "shell": cmd.render(Platform::host()),
            })
        })
        .collect();
    json!({"commands": items})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyzerReport, FileReport, Position};

    fn result() -> CheckResult {
        CheckResult::from_files(vec![FileReport {
            file: "src/a.php".into(),
            analyzers: vec![
                AnalyzerReport {
                    analyzer: "phpcs".into(),
                    name: "PHP CodeSniffer".into(),
                    diagnostics: vec![Diagnostic::new(
                        "Missing doc comment",
                        Position { line: 2, column: 0 },
                        Severity::Error,
                    )],
                    failure: None,
                },
                AnalyzerReport {
                    analyzer: "phpmd".into(),
                    name: "PHP Mess Detector".into(),
                    diagnostics: vec![],
                    failure: Some("failed to spawn `php`".into()),
                },
            ],
        }])
    }

    #[test]
    fn test_compose_check_json_shape() {
        let out = compose_check_json(&result());
        assert_eq!(out["summary"]["errors"], 1);
        assert_eq!(out["summary"]["failures"], 1);
        let phpcs = &out["files"][0]["analyzers"][0];
        assert_eq!(phpcs["diagnostics"][0]["severity"], "error");
        assert_eq!(phpcs["diagnostics"][0]["position"]["line"], 2);
        assert!(phpcs.get("failure").is_none());
        assert_eq!(out["files"][0]["analyzers"][1]["failure"], "failed to spawn `php`");
    }

    #[test]
    fn test_human_line_is_one_based() {
        let d = Diagnostic::new("boom", Position { line: 4, column: 1 }, Severity::Warning);
        let line = human_line("a.php", "phpmd", &d, false);
        assert_eq!(line, "▲ ⟦warn⟧ a.php:5:2 ❲phpmd❳ — boom");
    }

    #[test]
    fn test_compose_commands_json() {
        let cmds = vec![(
            "phpl".to_string(),
            CommandLine::new("php").args(["-l", "/src/a.php"]),
        )];
        let out = compose_commands_json(&cmds);
        assert_eq!(out["commands"][0]["analyzer"], "phpl");
        assert_eq!(out["commands"][0]["args"][1], "/src/a.php");
        assert_eq!(out["commands"][0]["shell"], "php -l /src/a.php");
    }
}
