//! phplint-tools core library.
//!
//! This crate runs several PHP static analyzers against one file at a time,
//! concurrently, parses each tool's text output into diagnostics and keeps
//! the latest result per analyzer in a shared store.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `analyzers`: Built-in analyzer descriptions (php -l, phpcs, phpmd, phpcpd).
//! - `command`: Command templates and platform path escaping.
//! - `runner`: Process execution behind the `ProcessRunner` trait.
//! - `parsers`: Regex-driven output parsers and their registry.
//! - `store`: Latest diagnostics per analyzer.
//! - `gate`: One-time interpreter availability probe.
//! - `coordinator`: Concurrent dispatch of analyzers for a file.
//! - `session`: Editor triggers and per-analyzer inspection providers.
//! - `check`: One-shot analysis of file lists.
//! - `models`: Diagnostics, analyzer specs and report structs.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
pub mod analyzers;
pub mod check;
pub mod cli;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod models;
pub mod output;
pub mod parsers;
pub mod runner;
pub mod session;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
