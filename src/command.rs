//! Structured command lines and template materialization.
//!
//! Analyzers are executed from an argument vector, never through a shell.
//! Host-specific path escaping is only applied when a command is rendered
//! as a single string for logs and the `commands` subcommand.

use crate::models::analyzer::AnalyzerSpec;
use std::fmt;

/// Shell quoting convention of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Paths are wrapped in double quotes.
    Windows,
    /// Each space is escaped with a backslash.
    Unix,
}

impl Platform {
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Escape a path for the host shell.
pub fn normalize_path(path: &str, platform: Platform) -> String {
    match platform {
        Platform::Windows => format!("\"{}\"", path),
        Platform::Unix => path.replace(' ', "\\ "),
    }
}

/// Program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Render as one shell string, escaping words that contain spaces.
    pub fn render(&self, platform: Platform) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|w| {
                if w.contains(' ') {
                    normalize_path(w, platform)
                } else {
                    w.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Platform::host()))
    }
}

/// Values substituted into argument templates.
pub struct TemplateContext<'a> {
    pub interpreter: &'a str,
    pub vendor: &'a str,
    pub file: &'a str,
}

/// Build the command line for one analyzer and file.
///
/// `{file}` and `{options}` must be whole arguments. An empty option list
/// drops the `{options}` argument entirely.
pub fn materialize(spec: &AnalyzerSpec, ctx: &TemplateContext<'_>) -> CommandLine {
    let program = spec
        .program
        .as_deref()
        .unwrap_or(ctx.interpreter)
        .replace("{vendor}", ctx.vendor);
    let mut cmd = CommandLine::new(program);
    for arg in &spec.args {
        match arg.as_str() {
            "{file}" => cmd = cmd.arg(ctx.file),
            "{options}" => {
                if let Some(joined) = join_options(&spec.options, &spec.option_prefix) {
                    cmd = cmd.arg(joined);
                }
            }
            other => cmd = cmd.arg(other.replace("{vendor}", ctx.vendor)),
        }
    }
    cmd
}

/// Join an option list into `prefix + a,b`, or `None` when empty.
pub fn join_options(values: &[String], prefix: &str) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    Some(format!("{}{}", prefix, values.join(",")))
}
