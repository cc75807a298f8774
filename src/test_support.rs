//! Scripted process runner used by unit tests.

use crate::command::CommandLine;
use crate::error::{Error, Result};
use crate::runner::{Captured, ProcessRunner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

#[derive(Clone)]
pub enum Script {
    Output { text: String, code: i32 },
    SpawnFailure,
}

/// Answers by `"program file"` first, then by program name. Each key can
/// queue several replies.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<HashMap<String, Vec<(Script, Duration)>>>,
    calls: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `text` and exit `code`. The last queued reply repeats.
    pub fn output(self, program: &str, text: &str, code: i32) -> Self {
        self.push(
            program,
            Script::Output {
                text: text.to_string(),
                code,
            },
            Duration::ZERO,
        )
    }

    pub fn delayed(self, program: &str, text: &str, delay: Duration) -> Self {
        self.push(
            program,
            Script::Output {
                text: text.to_string(),
                code: 0,
            },
            delay,
        )
    }

    /// Like `delayed`, but only for runs whose last argument is `file`.
    pub fn delayed_on(self, program: &str, file: &str, text: &str, delay: Duration) -> Self {
        self.delayed(&format!("{} {}", program, file), text, delay)
    }

    pub fn spawn_failure(self, program: &str) -> Self {
        self.push(program, Script::SpawnFailure, Duration::ZERO)
    }

    fn push(self, program: &str, script: Script, delay: Duration) -> Self {
        self.replies
            .lock()
            .entry(program.to_string())
            .or_default()
            .push((script, delay));
        self
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().clone()
    }

    fn next_reply(&self, program: &str) -> Option<(Script, Duration)> {
        let mut replies = self.replies.lock();
        let queue = replies.get_mut(program)?;
        if queue.len() > 1 {
            Some(queue.remove(0))
        } else {
            queue.first().cloned()
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> Result<Captured> {
        self.calls.lock().push(command.clone());
        let keyed = command
            .arguments()
            .last()
            .map(|file| format!("{} {}", command.program(), file));
        let reply = keyed
            .and_then(|k| self.next_reply(&k))
            .or_else(|| self.next_reply(command.program()));
        match reply {
            Some((Script::Output { text, code }, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(Captured::new(text, Some(code)))
            }
            Some((Script::SpawnFailure, _)) | None => Err(Error::Spawn {
                program: command.program().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}
