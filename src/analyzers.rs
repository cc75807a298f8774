//! Built-in analyzer definitions for the PHP toolchain.
//!
//! Each entry runs through the configured interpreter. Phar entrypoints live
//! under the `{vendor}` directory. Output grammars assume the report formats
//! selected in the argument templates (`--report=emacs` for phpcs, `text`
//! for phpmd).

use crate::models::analyzer::{AnalyzerSpec, ParseRule};
use crate::models::Severity;

pub const PHPCPD: &str = "phpcpd";
pub const PHPCS: &str = "phpcs";
pub const PHPL: &str = "phpl";
pub const PHPMD: &str = "phpmd";

/// Default analyzers in registration order.
pub fn builtin() -> Vec<AnalyzerSpec> {
    vec![phpcpd(), phpcs(), phpl(), phpmd()]
}

/// Look up one built-in analyzer by id.
pub fn builtin_by_id(id: &str) -> Option<AnalyzerSpec> {
    builtin().into_iter().find(|a| a.id == id)
}

fn spec(id: &str, name: &str, args: &[&str], exit_codes: &[i32], rules: Vec<ParseRule>) -> AnalyzerSpec {
    AnalyzerSpec {
        id: id.to_string(),
        name: name.to_string(),
        program: None,
        args: args.iter().map(|s| s.to_string()).collect(),
        enabled: true,
        options: Vec::new(),
        option_prefix: String::new(),
        exit_codes: exit_codes.to_vec(),
        rules,
    }
}

fn phpcpd() -> AnalyzerSpec {
    // "  - /src/a.php:10-22 (12 lines)" followed by "    /src/a.php:30-42"
    spec(
        PHPCPD,
        "PHP Copy/Paste Detector",
        &["{vendor}/phpcpd/phpcpd.phar", "{file}"],
        &[0, 1],
        vec![ParseRule::new(r"^\s+(?:-\s+)?(?P<file>.+?):(?P<line>\d+)-(?P<end>\d+)")
            .message("Duplicated code on lines ${line}-${end}")
            .severity(Severity::Warning)],
    )
}

fn phpcs() -> AnalyzerSpec {
    let mut s = spec(
        PHPCS,
        "PHP CodeSniffer",
        &["{vendor}/phpcs/phpcs.phar", "--report=emacs", "{options}", "{file}"],
        &[0, 1, 2],
        vec![ParseRule::new(
            r"^(?P<file>.+?):(?P<line>\d+):(?P<column>\d+): (?P<severity>error|warning) - (?P<message>.+)$",
        )],
    );
    s.option_prefix = "--standard=".to_string();
    s
}

fn phpl() -> AnalyzerSpec {
    spec(
        PHPL,
        "PHP Lint",
        &["-d", "display_errors=1", "-d", "error_reporting=-1", "-l", "{file}"],
        &[0, 255],
        vec![ParseRule::new(
            r"^(?:PHP )?(?P<severity>Parse error|Fatal error|Warning|Deprecated|Notice):\s*(?P<message>.+) in .+? on line (?P<line>\d+)\s*$",
        )],
    )
}

fn phpmd() -> AnalyzerSpec {
    spec(
        PHPMD,
        "PHP Mess Detector",
        &["{vendor}/phpmd/phpmd.phar", "{file}", "text", "{options}"],
        &[0, 1, 2],
        vec![ParseRule::new(r"^(?P<file>.+?):(?P<line>\d+)\s+(?P<message>.+)$")
            .severity(Severity::Warning)],
    )
}
