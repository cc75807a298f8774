//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "phplint-tools",
    version,
    about = "Run PHP analyzers side by side and merge their diagnostics",
    long_about = "phplint-tools runs php -l, PHP CodeSniffer, PHP Mess Detector and PHP Copy/Paste Detector against a file concurrently and reports one diagnostic list per analyzer.\n\nConfiguration precedence: CLI > phplint.toml > defaults.",
    after_help = "Examples:\n  phplint-tools check src/Controller.php\n  phplint-tools check 'src/**/*.php' --only phpl,phpcs --output json\n  phplint-tools commands src/Controller.php\n  phplint-tools session < triggers.txt",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Default)]
/// Options shared by every subcommand that resolves configuration.
pub struct CommonArgs {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "PHP interpreter to run analyzers with (default: php)")]
    pub interpreter: Option<String>,
    #[arg(long, help = "Directory holding phpcs/phpmd/phpcpd phars (default: <root>/vendor)")]
    pub vendor: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Kill analyzers running longer than this many seconds (0 = never)")]
    pub timeout: Option<u64>,
    #[arg(long, value_delimiter = ',', help = "Only run these analyzer ids (comma separated)")]
    pub only: Option<Vec<String>>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current phplint-tools version.")]
    Version,
    /// Analyze files once and print diagnostics
    #[command(
        about = "Analyze files",
        long_about = "Run every enabled analyzer against each file (glob patterns allowed) and print the diagnostics. Exits 1 when any error-severity diagnostic is found.",
        after_help = "Examples:\n  phplint-tools check src/a.php\n  phplint-tools check 'src/**/*.php' --output json"
    )]
    Check {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(required = true, help = "Files or glob patterns")]
        patterns: Vec<String>,
    },
    /// Print analyzer command lines without running them
    #[command(
        about = "Show analyzer commands",
        long_about = "Materialize the command line of each enabled analyzer for a file, escaped for the host shell."
    )]
    Commands {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(help = "File to build commands for")]
        file: String,
    },
    /// Probe the PHP interpreter
    #[command(
        about = "Probe interpreter",
        long_about = "Run the interpreter version probe and report whether analyzers can be used."
    )]
    Probe {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Editor session driven by trigger lines on stdin
    #[command(
        about = "Run an editor session",
        long_about = "Read trigger lines from stdin: `save <path>` and `focus <path>` start an analysis, `query [id]` prints current diagnostics as JSON lines, `quit` ends the session.",
        after_help = "Examples:\n  printf 'save src/a.php\\nquery\\n' | phplint-tools session"
    )]
    Session {
        #[command(flatten)]
        common: CommonArgs,
    },
}
