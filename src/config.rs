//! Configuration discovery and effective settings resolution.
//!
//! Reads `phplint.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `interpreter`: `php`
//! - `vendor`: `<repo_root>/vendor`
//! - `output`: `human`
//! - `timeout_secs`: none
//! - `probe`: `<interpreter> -v`, marker `PHP`
//! - analyzers: the built-in phpcpd, phpcs, phpl and phpmd, all enabled
//!
//! `[analyzers.<id>]` tweaks a built-in analyzer (`enabled`, `options`, ...)
//! or, for an unknown id, declares a new one (`args` and `rules` required).
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::analyzers;
use crate::coordinator::CoordinatorSettings;
use crate::error::{Error, Result};
use crate::gate::ProbeSpec;
use crate::models::analyzer::{AnalyzerSpec, ParseRule};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILES: [&str; 3] = ["phplint.toml", "phplint.yaml", "phplint.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `phplint.toml|yaml`.
pub struct PhplintConfig {
    pub interpreter: Option<String>,
    pub vendor: Option<String>,
    pub output: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub probe: Option<ProbeCfg>,
    #[serde(default)]
    pub analyzers: Option<BTreeMap<String, AnalyzerCfg>>, // [analyzers.<id>]
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Interpreter probe override under `[probe]`.
pub struct ProbeCfg {
    pub args: Option<Vec<String>>,
    pub marker: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Per-analyzer section. Every field is optional for built-ins.
pub struct AnalyzerCfg {
    pub name: Option<String>,
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub enabled: Option<bool>,
    pub options: Option<Vec<String>>,
    pub option_prefix: Option<String>,
    pub exit_codes: Option<Vec<i32>>,
    pub rules: Option<Vec<ParseRule>>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub interpreter: String,
    pub vendor: String,
    pub output: String,
    pub timeout: Option<Duration>,
    pub probe: ProbeSpec,
    pub analyzers: Vec<AnalyzerSpec>,
}

impl Effective {
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            interpreter: self.interpreter.clone(),
            vendor: self.vendor.clone(),
            analyzers: self.analyzers.clone(),
        }
    }
}

/// CLI-level overrides; `None` falls through to the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides<'a> {
    pub repo_root: Option<&'a str>,
    pub interpreter: Option<&'a str>,
    pub vendor: Option<&'a str>,
    pub output: Option<&'a str>,
    pub timeout_secs: Option<u64>,
    /// Restrict the run to these analyzer ids.
    pub only: Option<&'a [String]>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `phplint.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Path of the config file under `root`, if any.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES.iter().map(|f| root.join(f)).find(|p| p.exists())
}

/// Load `PhplintConfig` from `phplint.toml` or `phplint.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, PhplintConfig)>> {
    let Some(path) = find_config(root) else {
        return Ok(None);
    };
    let s = fs::read_to_string(&path).map_err(|e| Error::Config {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let is_toml = path.extension().map_or(false, |e| e == "toml");
    let cfg = if is_toml {
        toml::from_str::<PhplintConfig>(&s).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<PhplintConfig>(&s).map_err(|e| e.to_string())
    }
    .map_err(|reason| Error::Config {
        path: path.clone(),
        reason,
    })?;
    Ok(Some((path, cfg)))
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides<'_>) -> Result<Effective> {
    let start = PathBuf::from(cli.repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let (config_path, cfg) = match load_config(&repo_root)? {
        Some((p, c)) => (Some(p), c),
        None => (None, PhplintConfig::default()),
    };
    let cfg_path = config_path.clone().unwrap_or_else(|| repo_root.clone());

    let interpreter = cli
        .interpreter
        .map(|s| s.to_string())
        .or(cfg.interpreter)
        .unwrap_or_else(|| "php".to_string());

    let vendor = cli
        .vendor
        .map(|s| s.to_string())
        .or(cfg.vendor)
        .map(|v| {
            let p = Path::new(&v);
            if p.is_absolute() {
                v
            } else {
                repo_root.join(p).to_string_lossy().to_string()
            }
        })
        .unwrap_or_else(|| repo_root.join("vendor").to_string_lossy().to_string());

    let output = cli
        .output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let timeout = cli
        .timeout_secs
        .or(cfg.timeout_secs)
        .filter(|s| *s > 0)
        .map(Duration::from_secs);

    let mut probe = ProbeSpec::for_interpreter(&interpreter);
    if let Some(p) = cfg.probe {
        if let Some(args) = p.args {
            probe.args = args;
        }
        if let Some(marker) = p.marker {
            probe.marker = marker;
        }
    }

    let mut specs = merge_analyzers(cfg.analyzers.unwrap_or_default(), &cfg_path)?;
    if let Some(only) = cli.only {
        if let Some(unknown) = only.iter().find(|id| !specs.iter().any(|a| &a.id == *id)) {
            return Err(Error::UnknownAnalyzer(unknown.clone()));
        }
        for spec in specs.iter_mut() {
            spec.enabled = only.contains(&spec.id);
        }
    }

    Ok(Effective {
        repo_root,
        config_path,
        interpreter,
        vendor,
        output,
        timeout,
        probe,
        analyzers: specs,
    })
}

/// Apply `[analyzers.<id>]` sections on top of the built-ins.
fn merge_analyzers(sections: BTreeMap<String, AnalyzerCfg>, cfg_path: &Path) -> Result<Vec<AnalyzerSpec>> {
    let mut specs = analyzers::builtin();
    for (id, section) in sections {
        match specs.iter_mut().find(|a| a.id == id) {
            Some(spec) => apply_overrides(spec, section),
            None => specs.push(custom_analyzer(id, section, cfg_path)?),
        }
    }
    Ok(specs)
}

fn apply_overrides(spec: &mut AnalyzerSpec, cfg: AnalyzerCfg) {
    if let Some(v) = cfg.name {
        spec.name = v;
    }
    if cfg.program.is_some() {
        spec.program = cfg.program;
    }
    if let Some(v) = cfg.args {
        spec.args = v;
    }
    if let Some(v) = cfg.enabled {
        spec.enabled = v;
    }
    if let Some(v) = cfg.options {
        spec.options = v;
    }
    if let Some(v) = cfg.option_prefix {
        spec.option_prefix = v;
    }
    if let Some(v) = cfg.exit_codes {
        spec.exit_codes = v;
    }
    if let Some(v) = cfg.rules {
        spec.rules = v;
    }
}

fn custom_analyzer(id: String, cfg: AnalyzerCfg, cfg_path: &Path) -> Result<AnalyzerSpec> {
    let missing = |field: &str| Error::Config {
        path: cfg_path.to_path_buf(),
        reason: format!("analyzer `{}` is not built in and needs `{}`", id, field),
    };
    let args = cfg.args.ok_or_else(|| missing("args"))?;
    let rules = cfg.rules.ok_or_else(|| missing("rules"))?;
    Ok(AnalyzerSpec {
        name: cfg.name.unwrap_or_else(|| id.clone()),
        id,
        program: cfg.program,
        args,
        enabled: cfg.enabled.unwrap_or(true),
        options: cfg.options.unwrap_or_default(),
        option_prefix: cfg.option_prefix.unwrap_or_default(),
        exit_codes: cfg.exit_codes.unwrap_or_else(|| vec![0]),
        rules,
    })
}
