//! phplint-tools CLI binary entry point.
//! Resolves configuration, starts a session and delegates to library modules.

use clap::Parser;
use phplint_tools::check::{expand_patterns, run_check};
use phplint_tools::cli::{Cli, Commands, CommonArgs};
use phplint_tools::command::{materialize, TemplateContext};
use phplint_tools::config::{self, CliOverrides, Effective};
use phplint_tools::error::Error;
use phplint_tools::gate::AvailabilityGate;
use phplint_tools::runner::TokioRunner;
use phplint_tools::session::{Session, SessionCommand};
use phplint_tools::store::MemoryStore;
use phplint_tools::{output, utils};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("PHPLINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Check { common, patterns } => check(&common, &patterns).await,
        Commands::Commands { common, file } => commands(&common, &file),
        Commands::Probe { common } => probe(&common).await,
        Commands::Session { common } => session(&common).await,
    }
}

fn fail(msg: impl std::fmt::Display) -> ExitCode {
    eprintln!("{} {}", utils::error_prefix(), msg);
    ExitCode::from(2)
}

fn resolve(common: &CommonArgs) -> Result<Effective, ExitCode> {
    let eff = config::resolve_effective(&CliOverrides {
        repo_root: common.repo_root.as_deref(),
        interpreter: common.interpreter.as_deref(),
        vendor: common.vendor.as_deref(),
        output: common.output.as_deref(),
        timeout_secs: common.timeout,
        only: common.only.as_deref(),
    })
    .map_err(fail)?;
    // Friendly note if no config was found
    if eff.config_path.is_none() && eff.output != "json" {
        eprintln!(
            "{} {}",
            utils::note_prefix(),
            "No phplint.toml found; using defaults."
        );
    }
    Ok(eff)
}

async fn start(eff: &Effective) -> Result<Session, ExitCode> {
    let runner = Arc::new(TokioRunner::new().with_timeout(eff.timeout));
    let gate = AvailabilityGate::new(eff.probe.clone());
    Session::start(
        &gate,
        eff.coordinator_settings(),
        runner,
        Arc::new(MemoryStore::new()),
    )
    .await
    .map_err(|e| match e {
        Error::ToolUnavailable { .. } => fail(format!("{} (analyzers disabled)", e)),
        other => fail(other),
    })
}

async fn check(common: &CommonArgs, patterns: &[String]) -> ExitCode {
    let eff = match resolve(common) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let cwd = match std::env::current_dir() {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let (files, unmatched) = expand_patterns(&cwd, patterns);
    for pat in &unmatched {
        eprintln!("{} {}", utils::note_prefix(), format!("No files match '{}'", pat));
    }
    if files.is_empty() {
        return fail("Nothing to check.");
    }
    let session = match start(&eff).await {
        Ok(s) => s,
        Err(code) => return code,
    };
    let result = run_check(&session, &files, &eff.repo_root).await;
    output::print_check(&result, &eff.output);
    if result.summary.errors > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn commands(common: &CommonArgs, file: &str) -> ExitCode {
    let eff = match resolve(common) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let ctx = TemplateContext {
        interpreter: &eff.interpreter,
        vendor: &eff.vendor,
        file,
    };
    let cmds: Vec<_> = eff
        .analyzers
        .iter()
        .filter(|a| a.enabled)
        .map(|a| (a.id.clone(), materialize(a, &ctx)))
        .collect();
    output::print_commands(&cmds, &eff.output);
    ExitCode::SUCCESS
}

async fn probe(common: &CommonArgs) -> ExitCode {
    let eff = match resolve(common) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let runner = TokioRunner::new().with_timeout(eff.timeout);
    let gate = AvailabilityGate::new(eff.probe.clone());
    match gate.check(&runner).await {
        Ok(_) => {
            println!(
                "{} {}",
                utils::info_prefix(),
                format!("{} is available", eff.interpreter)
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

async fn session(common: &CommonArgs) -> ExitCode {
    let eff = match resolve(common) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let session = match start(&eff).await {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (tx, rx) = mpsc::channel(64);
    let listener = session.listen(rx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                eprintln!("{} {}", utils::error_prefix(), e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match SessionCommand::parse(&line) {
            Some(SessionCommand::Trigger(trigger)) => {
                if tx.send(trigger).await.is_err() {
                    break;
                }
            }
            Some(SessionCommand::Query(id)) => query(&session, id.as_deref()),
            Some(SessionCommand::Quit) => break,
            None => eprintln!(
                "{} {}",
                utils::note_prefix(),
                format!("Ignoring unrecognized line: {}", line.trim())
            ),
        }
    }
    drop(tx);
    let _ = listener.await;
    ExitCode::SUCCESS
}

fn query(session: &Session, id: Option<&str>) {
    match id {
        Some(id) => match session.provider(id) {
            Some(p) => output::print_inspection(p.id(), &p.scan_file()),
            None => eprintln!(
                "{} {}",
                utils::note_prefix(),
                format!(
                    "No provider registered for '{}' (known: {})",
                    id,
                    session
                        .providers()
                        .iter()
                        .map(|p| p.id())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            ),
        },
        None => {
            for p in session.providers() {
                output::print_inspection(p.id(), &p.scan_file());
            }
        }
    }
}
