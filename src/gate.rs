//! Availability gate: one-time probe for the base interpreter.
//!
//! A successful probe hands out the `Available` token; a `Coordinator` can
//! only be built from that token, so nothing is wired up when the
//! interpreter is missing.

use crate::command::CommandLine;
use crate::error::{Error, Result};
use crate::runner::ProcessRunner;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// How to probe the interpreter.
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Text that must appear in the captured output.
    pub marker: String,
}

impl ProbeSpec {
    /// `<interpreter> -v`, expecting the `PHP` banner.
    pub fn for_interpreter(interpreter: &str) -> Self {
        Self {
            program: interpreter.to_string(),
            args: vec!["-v".to_string()],
            marker: "PHP".to_string(),
        }
    }
}

/// Proof that the interpreter was found.
#[derive(Debug, Clone, Copy)]
pub struct Available {
    _private: (),
}

/// Caches the probe outcome for the lifetime of the gate.
pub struct AvailabilityGate {
    spec: ProbeSpec,
    state: OnceCell<Option<String>>,
}

impl AvailabilityGate {
    pub fn new(spec: ProbeSpec) -> Self {
        Self {
            spec,
            state: OnceCell::new(),
        }
    }

    /// Probe on first call; later calls reuse the cached answer.
    pub async fn check(&self, runner: &dyn ProcessRunner) -> Result<Available> {
        let failure = self
            .state
            .get_or_init(|| async { self.probe(runner).await })
            .await;
        match failure {
            None => Ok(Available { _private: () }),
            Some(reason) => Err(Error::ToolUnavailable {
                interpreter: self.spec.program.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Cached answer, if the probe already ran.
    pub fn is_available(&self) -> Option<bool> {
        self.state.get().map(|failure| failure.is_none())
    }

    async fn probe(&self, runner: &dyn ProcessRunner) -> Option<String> {
        let cmd = CommandLine::new(&self.spec.program).args(self.spec.args.iter().cloned());
        match runner.run(&cmd).await {
            Ok(out) if out.text.contains(&self.spec.marker) => {
                info!(interpreter = %self.spec.program, "Interpreter available");
                None
            }
            Ok(_) => {
                let reason = format!("output does not contain `{}`", self.spec.marker);
                warn!(interpreter = %self.spec.program, %reason, "Interpreter probe failed");
                Some(reason)
            }
            Err(e) => {
                warn!(interpreter = %self.spec.program, error = %e, "Interpreter probe failed");
                Some(e.to_string())
            }
        }
    }
}
