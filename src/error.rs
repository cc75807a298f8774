//! Error types shared by the runner, parsers, coordinator and config loader.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while probing, configuring or running analyzers.
#[derive(Debug, Error)]
pub enum Error {
    /// Base interpreter missing or unrecognized; the whole subsystem stays off.
    #[error("interpreter `{interpreter}` is not available: {reason}")]
    ToolUnavailable { interpreter: String, reason: String },

    /// Analyzer process could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Analyzer exited with a status outside its accepted set.
    #[error("`{program}` exited with unexpected status {code}")]
    UnexpectedExit { program: String, code: i32 },

    /// Analyzer was killed before reporting an exit status.
    #[error("`{program}` was terminated by a signal")]
    Terminated { program: String },

    /// Analyzer did not finish within the configured timeout.
    #[error("`{program}` timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// A dispatch or lookup references an id with no registered parser.
    #[error("no parser registered for analyzer `{0}`")]
    UnknownAnalyzer(String),

    #[error("analyzer `{0}` is registered more than once")]
    DuplicateAnalyzer(String),

    #[error("invalid output rule for analyzer `{analyzer}`: {reason}")]
    InvalidRule { analyzer: String, reason: String },

    #[error("invalid output pattern for analyzer `{analyzer}`: {source}")]
    InvalidPattern {
        analyzer: String,
        #[source]
        source: regex::Error,
    },

    /// Config file could not be read or does not describe valid analyzers.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
