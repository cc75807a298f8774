//! Process runner: executes one command and captures its combined output.
//!
//! The runner is stateless and knows nothing about analyzers. Concurrent
//! calls run in parallel; nothing is queued or retried.

use crate::command::CommandLine;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Text captured from a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    /// stdout followed by stderr.
    pub text: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl Captured {
    pub fn new(text: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            text: text.into(),
            exit_code,
        }
    }

    /// Keep the text when the exit status is one of `accepted`.
    pub fn accept(self, program: &str, accepted: &[i32]) -> Result<String> {
        match self.exit_code {
            Some(code) if accepted.contains(&code) => Ok(self.text),
            Some(code) => Err(Error::UnexpectedExit {
                program: program.to_string(),
                code,
            }),
            None => Err(Error::Terminated {
                program: program.to_string(),
            }),
        }
    }
}

/// Executes external commands.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<Captured>;
}

/// Runner backed by `tokio::process`.
#[derive(Debug, Default, Clone)]
pub struct TokioRunner {
    timeout: Option<Duration>,
}

impl TokioRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill and fail runs that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(&self, command: &CommandLine) -> Result<Captured> {
        debug!(
            program = %command.program(),
            args = ?command.arguments(),
            "Spawning process"
        );
        let program = command.program().to_string();
        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd.spawn().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::Timeout {
                    program: program.clone(),
                    seconds: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(
            program = %program,
            status = ?output.status.code(),
            bytes = text.len(),
            "Process finished"
        );
        Ok(Captured::new(text, output.status.code()))
    }
}
