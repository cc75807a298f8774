//! Composition root: gate, coordinator, inspection providers and triggers.
//!
//! A `Session` only exists once the availability probe succeeded. Editor
//! events arrive as `Trigger`s on a channel; each one starts a full-file
//! analysis. Providers answer synchronously from the result store.

use crate::coordinator::{AnalysisHandle, Coordinator, CoordinatorSettings};
use crate::error::Result;
use crate::gate::AvailabilityGate;
use crate::models::InspectionReport;
use crate::runner::ProcessRunner;
use crate::store::ResultStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Editor event that starts an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    DocumentSaved(String),
    ActiveDocumentChanged(String),
}

impl Trigger {
    pub fn path(&self) -> &str {
        match self {
            Trigger::DocumentSaved(p) | Trigger::ActiveDocumentChanged(p) => p,
        }
    }
}

/// One line of the stdin session protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Trigger(Trigger),
    /// Print one provider, or all of them.
    Query(Option<String>),
    Quit,
}

impl SessionCommand {
    /// Parse `save <path>`, `focus <path>`, `query [id]` or `quit`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((v, r)) => (v, r.trim()),
            None => (line, ""),
        };
        match (verb, rest.is_empty()) {
            ("save", false) => Some(SessionCommand::Trigger(Trigger::DocumentSaved(rest.to_string()))),
            ("focus", false) => Some(SessionCommand::Trigger(Trigger::ActiveDocumentChanged(
                rest.to_string(),
            ))),
            ("query", true) => Some(SessionCommand::Query(None)),
            ("query", false) => Some(SessionCommand::Query(Some(rest.to_string()))),
            ("quit", true) => Some(SessionCommand::Quit),
            _ => None,
        }
    }
}

/// Pull-based diagnostics source for one analyzer.
pub struct InspectionProvider {
    id: String,
    name: String,
    store: Arc<dyn ResultStore>,
}

impl InspectionProvider {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current slot contents; never waits for in-flight runs.
    pub fn scan_file(&self) -> InspectionReport {
        InspectionReport {
            errors: self.store.get(&self.id).to_vec(),
        }
    }
}

pub struct Session {
    coordinator: Arc<Coordinator>,
    providers: Vec<InspectionProvider>,
}

impl Session {
    /// Probe the interpreter and, if present, wire up the coordinator and
    /// one provider per enabled analyzer.
    pub async fn start(
        gate: &AvailabilityGate,
        settings: CoordinatorSettings,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self> {
        let available = gate.check(runner.as_ref()).await?;
        let coordinator = Coordinator::new(available, settings, runner, Arc::clone(&store))?;
        let providers: Vec<InspectionProvider> = coordinator
            .analyzers()
            .iter()
            .filter(|a| a.enabled)
            .map(|a| InspectionProvider {
                id: a.id.clone(),
                name: a.name.clone(),
                store: Arc::clone(&store),
            })
            .collect();
        info!(providers = providers.len(), "Inspection providers registered");
        Ok(Self {
            coordinator: Arc::new(coordinator),
            providers,
        })
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn providers(&self) -> &[InspectionProvider] {
        &self.providers
    }

    pub fn provider(&self, id: &str) -> Option<&InspectionProvider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Start an analysis for one trigger.
    pub fn handle(&self, trigger: &Trigger) -> AnalysisHandle {
        dispatch(&self.coordinator, trigger)
    }

    /// Consume triggers until the sender side is dropped.
    pub fn listen(&self, mut triggers: mpsc::Receiver<Trigger>) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            while let Some(trigger) = triggers.recv().await {
                // Completion is observed through the store.
                let _ = dispatch(&coordinator, &trigger);
            }
            debug!("Trigger channel closed");
        })
    }
}

fn dispatch(coordinator: &Coordinator, trigger: &Trigger) -> AnalysisHandle {
    debug!(?trigger, "Trigger received");
    coordinator.analyze(trigger.path())
}
