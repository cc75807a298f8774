//! One-shot check runner used by the `check` subcommand.
//!
//! Files are analyzed one after another; each file's analyzers still run
//! concurrently. Reports are built from the run outcomes so a failed
//! analyzer shows up as a failure rather than as the previous file's
//! diagnostics.

use crate::coordinator::RunOutcome;
use crate::models::{AnalyzerReport, CheckResult, FileReport};
use crate::session::Session;
use glob::glob;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Expand file arguments. Patterns with glob metacharacters are expanded
/// (sorted, files only); other arguments are taken as-is if they exist.
/// Returns the matched files, each once in first-seen order, and the
/// arguments that matched nothing.
pub fn expand_patterns(base: &Path, patterns: &[String]) -> (Vec<PathBuf>, Vec<String>) {
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    let mut unmatched = Vec::new();
    for pat in patterns {
        let abs = base.join(pat);
        let mut found = Vec::new();
        if pat.contains(['*', '?', '[']) {
            match glob(&abs.to_string_lossy()) {
                Ok(paths) => {
                    found.extend(paths.flatten().filter(|p| p.is_file()));
                    found.sort();
                }
                Err(e) => warn!(pattern = %pat, error = %e, "Invalid glob pattern"),
            }
        } else if abs.is_file() {
            found.push(abs);
        }
        if found.is_empty() {
            unmatched.push(pat.clone());
        }
        for file in found {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }
    (files, unmatched)
}

/// Analyze `files` in order and collect one report per file.
///
/// `display_root` only affects how file names are printed.
pub async fn run_check(session: &Session, files: &[PathBuf], display_root: &Path) -> CheckResult {
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let path = file.to_string_lossy().to_string();
        debug!(file = %path, "Checking");
        let outcomes = session.coordinator().analyze(&path).wait().await;
        let analyzers = outcomes
            .into_iter()
            .map(|(id, outcome)| {
                let name = session
                    .provider(&id)
                    .map(|p| p.name().to_string())
                    .unwrap_or_else(|| id.clone());
                let (diagnostics, failure) = match outcome {
                    RunOutcome::Failed(reason) => (Vec::new(), Some(reason)),
                    RunOutcome::Updated(_) | RunOutcome::Superseded => {
                        (session.coordinator().diagnostics(&id).to_vec(), None)
                    }
                };
                AnalyzerReport {
                    analyzer: id,
                    name,
                    diagnostics,
                    failure,
                }
            })
            .collect();
        reports.push(FileReport {
            file: display_path(file, display_root),
            analyzers,
        });
    }
    CheckResult::from_files(reports)
}

/// Path relative to `root` when possible.
pub fn display_path(file: &Path, root: &Path) -> String {
    pathdiff::diff_paths(file, root)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| file.to_path_buf())
        .to_string_lossy()
        .to_string()
}
