//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "astsec",
    version,
    about = "AST-level security linter for JavaScript and TypeScript"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    pub format: String,

    /// Path to a config file (defaults to ./astsec.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a file or directory for security issues
    Scan {
        /// File or directory to scan
        path: PathBuf,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop findings below this severity
        #[arg(long, default_value = "info")]
        min_severity: String,

        /// Exit non-zero when a finding at or above this severity exists
        #[arg(long)]
        fail_on: Option<String>,

        /// Disable a rule by id (repeatable)
        #[arg(long = "disable", value_name = "RULE_ID")]
        disabled_rules: Vec<String>,

        /// Additional file extension to scan, without dot (repeatable)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,
    },

    /// List the built-in rules
    Rules {
        /// Print rules as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init {
        /// Where to write the config
        #[arg(short, long, default_value = "astsec.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_args() {
        let cli = Cli::parse_from([
            "astsec",
            "scan",
            "src",
            "--fail-on",
            "high",
            "--disable",
            "detect-non-literal-regexp",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Scan {
                path,
                fail_on,
                disabled_rules,
                ..
            } => {
                assert_eq!(path, PathBuf::from("src"));
                assert_eq!(fail_on.as_deref(), Some("high"));
                assert_eq!(disabled_rules, vec!["detect-non-literal-regexp"]);
            }
            _ => panic!("expected scan command"),
        }
    }
}
