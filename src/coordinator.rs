//! Analysis coordinator: fans one file out to every enabled analyzer.
//!
//! `analyze` returns immediately. Each analyzer runs as its own task and
//! publishes into the result store as soon as it finishes; there is no
//! ordering between analyzers. Every call takes a new request sequence
//! number and a completion belonging to an older request than the one a
//! slot already holds is dropped. A failed run leaves its slot untouched.

use crate::command::{materialize, CommandLine, Platform, TemplateContext};
use crate::error::{Error, Result};
use crate::gate::Available;
use crate::models::analyzer::AnalyzerSpec;
use crate::models::Diagnostic;
use crate::parsers::ParserRegistry;
use crate::runner::ProcessRunner;
use crate::store::ResultStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Static inputs of a coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub interpreter: String,
    pub vendor: String,
    pub analyzers: Vec<AnalyzerSpec>,
}

/// What happened to one analyzer's slot for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Slot overwritten with this many diagnostics.
    Updated(usize),
    /// Slot already held a newer request's result.
    Superseded,
    /// Run failed; slot left as it was.
    Failed(String),
}

/// Completion handle of one `analyze` call. Dropping it does not cancel
/// anything.
pub struct AnalysisHandle {
    sequence: u64,
    tasks: Vec<(String, JoinHandle<RunOutcome>)>,
}

impl AnalysisHandle {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wait for every analyzer of this request, in dispatch order.
    pub async fn wait(self) -> Vec<(String, RunOutcome)> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (id, task) in self.tasks {
            let outcome = task
                .await
                .unwrap_or_else(|e| RunOutcome::Failed(format!("task aborted: {}", e)));
            outcomes.push((id, outcome));
        }
        outcomes
    }
}

pub struct Coordinator {
    settings: CoordinatorSettings,
    parsers: Arc<ParserRegistry>,
    runner: Arc<dyn ProcessRunner>,
    store: Arc<dyn ResultStore>,
    sequence: AtomicU64,
    platform: Platform,
}

impl Coordinator {
    /// Build a coordinator. Fails when two analyzers share an id or an
    /// output rule is invalid.
    pub fn new(
        available: Available,
        settings: CoordinatorSettings,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self> {
        let parsers = ParserRegistry::from_specs(&settings.analyzers)?;
        Self::with_parsers(available, settings, parsers, runner, store)
    }

    /// Build a coordinator with an explicit parser registry. Analyzer ids
    /// must be unique and each must have a registered parser.
    pub fn with_parsers(
        _available: Available,
        settings: CoordinatorSettings,
        parsers: ParserRegistry,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self> {
        {
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = settings.analyzers.iter().find(|a| !seen.insert(a.id.as_str())) {
                return Err(Error::DuplicateAnalyzer(dup.id.clone()));
            }
        }
        if let Some(missing) = settings.analyzers.iter().find(|a| !parsers.contains(&a.id)) {
            return Err(Error::UnknownAnalyzer(missing.id.clone()));
        }
        Ok(Self {
            settings,
            parsers: Arc::new(parsers),
            runner,
            store,
            sequence: AtomicU64::new(0),
            platform: Platform::host(),
        })
    }

    pub fn analyzers(&self) -> &[AnalyzerSpec] {
        &self.settings.analyzers
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Materialized command lines of the enabled analyzers for `file`.
    pub fn commands(&self, file: &str) -> Vec<(String, CommandLine)> {
        let ctx = TemplateContext {
            interpreter: &self.settings.interpreter,
            vendor: &self.settings.vendor,
            file,
        };
        self.settings
            .analyzers
            .iter()
            .filter(|a| a.enabled)
            .map(|a| (a.id.clone(), materialize(a, &ctx)))
            .collect()
    }

    /// Start analyzing `file` with every enabled analyzer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn analyze(&self, file: &str) -> AnalysisHandle {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(file, sequence, "Dispatching analyzers");
        let tasks = self
            .settings
            .analyzers
            .iter()
            .filter(|a| a.enabled)
            .zip(self.commands(file))
            .map(|(spec, (id, command))| {
                debug!(analyzer = %id, command = %command.render(self.platform), "Queued");
                let job = Job {
                    id: id.clone(),
                    sequence,
                    exit_codes: spec.exit_codes.clone(),
                    command,
                    parsers: Arc::clone(&self.parsers),
                    runner: Arc::clone(&self.runner),
                    store: Arc::clone(&self.store),
                };
                (id, tokio::spawn(job.run()))
            })
            .collect();
        AnalysisHandle { sequence, tasks }
    }

    /// Current diagnostics of one analyzer; never waits on running work.
    pub fn diagnostics(&self, analyzer: &str) -> Arc<[Diagnostic]> {
        self.store.get(analyzer)
    }
}

struct Job {
    id: String,
    sequence: u64,
    exit_codes: Vec<i32>,
    command: CommandLine,
    parsers: Arc<ParserRegistry>,
    runner: Arc<dyn ProcessRunner>,
    store: Arc<dyn ResultStore>,
}

impl Job {
    async fn run(self) -> RunOutcome {
        let text = match self
            .runner
            .run(&self.command)
            .await
            .and_then(|out| out.accept(self.command.program(), &self.exit_codes))
        {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    analyzer = %self.id,
                    sequence = self.sequence,
                    error = %e,
                    "Analyzer run failed; keeping previous diagnostics"
                );
                return RunOutcome::Failed(e.to_string());
            }
        };
        let diagnostics = self.parsers.parse(&self.id, &text);
        let count = diagnostics.len();
        if self.store.set_if_newer(&self.id, self.sequence, diagnostics) {
            debug!(analyzer = %self.id, sequence = self.sequence, count, "Published diagnostics");
            RunOutcome::Updated(count)
        } else {
            debug!(analyzer = %self.id, sequence = self.sequence, "Dropped superseded result");
            RunOutcome::Superseded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{AvailabilityGate, ProbeSpec};
    use crate::models::analyzer::ParseRule;
    use crate::store::MemoryStore;
    use crate::test_support::ScriptedRunner;
    use std::time::Duration;

    const RULE: &str = r"^(?P<line>\d+): (?P<message>.+)$";

    fn analyzer(id: &str, enabled: bool) -> AnalyzerSpec {
        AnalyzerSpec {
            id: id.into(),
            name: id.to_uppercase(),
            program: Some(id.into()),
            args: vec!["{options}".into(), "{file}".into()],
            enabled,
            options: vec![],
            option_prefix: "--rules=".into(),
            exit_codes: vec![0, 1],
            rules: vec![ParseRule::new(RULE)],
        }
    }

    async fn available() -> Available {
        let runner = ScriptedRunner::new().output("php", "PHP 8.3.0", 0);
        AvailabilityGate::new(ProbeSpec::for_interpreter("php"))
            .check(&runner)
            .await
            .unwrap()
    }

    async fn coordinator(
        analyzers: Vec<AnalyzerSpec>,
        runner: ScriptedRunner,
    ) -> (Coordinator, Arc<MemoryStore>, Arc<ScriptedRunner>) {
        let store = Arc::new(MemoryStore::new());
        let runner = Arc::new(runner);
        let settings = CoordinatorSettings {
            interpreter: "php".into(),
            vendor: "/vendor".into(),
            analyzers,
        };
        let c = Coordinator::new(available().await, settings, runner.clone(), store.clone()).unwrap();
        (c, store, runner)
    }

    #[tokio::test]
    async fn test_only_enabled_analyzers_fill_slots() {
        let runner = ScriptedRunner::new()
            .output("alpha", "3: alpha issue", 1)
            .output("beta", "5: beta issue", 0);
        let (c, store, runner) = coordinator(
            vec![analyzer("alpha", true), analyzer("beta", false)],
            runner,
        )
        .await;
        let outcomes = c.analyze("/src/a.php").wait().await;
        assert_eq!(outcomes, vec![("alpha".to_string(), RunOutcome::Updated(1))]);
        let snap = store.snapshot();
        assert_eq!(snap.keys().collect::<Vec<_>>(), vec!["alpha"]);
        assert_eq!(c.diagnostics("alpha")[0].position().line, 2);
        assert!(c.diagnostics("beta").is_empty());
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_slot_keeps_prior_value() {
        let runner = ScriptedRunner::new().output("alpha", "1: fresh", 0);
        let (c, store, _) = coordinator(
            vec![analyzer("alpha", true), analyzer("beta", false)],
            runner,
        )
        .await;
        store.set(
            "beta",
            vec![Diagnostic::new(
                "from earlier",
                crate::models::Position { line: 0, column: 0 },
                crate::models::Severity::Error,
            )],
        );
        c.analyze("/src/a.php").wait().await;
        assert_eq!(c.diagnostics("beta")[0].message(), "from earlier");
    }

    #[tokio::test]
    async fn test_repeated_runs_are_idempotent() {
        let runner = ScriptedRunner::new()
            .output("alpha", "1: one\n2: two", 0)
            .output("beta", "", 0);
        let (c, store, _) = coordinator(
            vec![analyzer("alpha", true), analyzer("beta", true)],
            runner,
        )
        .await;
        c.analyze("/src/a.php").wait().await;
        let first = store.snapshot();
        c.analyze("/src/a.php").wait().await;
        let second = store.snapshot();
        assert_eq!(first, second);
        assert_eq!(second["alpha"].len(), 2);
        assert!(second["beta"].is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_isolated() {
        let runner = ScriptedRunner::new()
            .spawn_failure("alpha")
            .output("beta", "7: beta issue", 0);
        let (c, store, _) = coordinator(
            vec![analyzer("alpha", true), analyzer("beta", true)],
            runner,
        )
        .await;
        store.set(
            "alpha",
            vec![Diagnostic::new(
                "last known good",
                crate::models::Position { line: 1, column: 0 },
                crate::models::Severity::Warning,
            )],
        );
        let outcomes = c.analyze("/src/a.php").wait().await;
        assert!(matches!(outcomes[0].1, RunOutcome::Failed(_)));
        assert_eq!(outcomes[1].1, RunOutcome::Updated(1));
        assert_eq!(c.diagnostics("alpha")[0].message(), "last known good");
        assert_eq!(c.diagnostics("beta")[0].message(), "beta issue");
    }

    #[tokio::test]
    async fn test_unexpected_exit_code_leaves_slot_stale() {
        let runner = ScriptedRunner::new().output("alpha", "1: crash dump", 139);
        let (c, store, _) = coordinator(vec![analyzer("alpha", true)], runner).await;
        let outcomes = c.analyze("/src/a.php").wait().await;
        assert!(matches!(outcomes[0].1, RunOutcome::Failed(_)));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_completion_of_older_request_is_dropped() {
        let runner = ScriptedRunner::new()
            .delayed_on("alpha", "/src/old.php", "1: stale result", Duration::from_secs(5))
            .delayed_on("alpha", "/src/new.php", "2: fresh result", Duration::from_millis(10));
        let (c, _, _) = coordinator(vec![analyzer("alpha", true)], runner).await;
        let old = c.analyze("/src/old.php");
        let new = c.analyze("/src/new.php");
        assert!(new.sequence() > old.sequence());
        assert_eq!(new.wait().await[0].1, RunOutcome::Updated(1));
        assert_eq!(old.wait().await[0].1, RunOutcome::Superseded);
        assert_eq!(c.diagnostics("alpha")[0].message(), "fresh result");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_do_not_block_on_inflight_runs() {
        let runner = ScriptedRunner::new()
            .delayed("alpha", "1: slow", Duration::from_secs(30))
            .output("beta", "1: quick", 0);
        let (c, _, _) = coordinator(
            vec![analyzer("alpha", true), analyzer("beta", true)],
            runner,
        )
        .await;
        let handle = c.analyze("/src/a.php");
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(c.diagnostics("alpha").is_empty());
        assert_eq!(c.diagnostics("beta").len(), 1);
        handle.wait().await;
        assert_eq!(c.diagnostics("alpha").len(), 1);
    }

    #[tokio::test]
    async fn test_commands_pass_options_and_file() {
        let mut a = analyzer("alpha", true);
        a.options = vec!["X".into(), "Y".into()];
        let (c, _, _) = coordinator(
            vec![a, analyzer("beta", true), analyzer("gamma", false)],
            ScriptedRunner::new(),
        )
        .await;
        let cmds = c.commands("/src/my file.php");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].1.arguments(), &["--rules=X,Y", "/src/my file.php"]);
        assert_eq!(cmds[1].1.arguments(), &["/src/my file.php"]);
    }

    #[tokio::test]
    async fn test_missing_parser_fails_at_construction() {
        let mut parsers = ParserRegistry::new();
        parsers
            .register(
                "alpha",
                Box::new(crate::parsers::RegexParser::new("alpha", &[ParseRule::new(RULE)]).unwrap()),
            )
            .unwrap();
        let settings = CoordinatorSettings {
            interpreter: "php".into(),
            vendor: "/vendor".into(),
            analyzers: vec![analyzer("alpha", true), analyzer("beta", true)],
        };
        let err = Coordinator::with_parsers(
            available().await,
            settings,
            parsers,
            Arc::new(ScriptedRunner::new()),
            Arc::new(MemoryStore::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::UnknownAnalyzer(id) if id == "beta"));
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let store = Arc::new(MemoryStore::new());
        let settings = CoordinatorSettings {
            interpreter: "php".into(),
            vendor: "/vendor".into(),
            analyzers: vec![analyzer("alpha", true), analyzer("alpha", false)],
        };
        let res = Coordinator::new(available().await, settings, Arc::new(ScriptedRunner::new()), store);
        assert!(matches!(res, Err(Error::DuplicateAnalyzer(_))));
    }
}
