//! CLI entry point for the astsec linter.

use anyhow::Result;
use astsec::{
    cli::{Cli, Commands},
    config::{generate_default_config, Config},
    reporters::{report, OutputFormat},
    RuleSet, Scanner, Severity,
};
use clap::Parser;
use colored::Colorize;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // Load config file if specified, otherwise use defaults
    let base_config = if let Some(ref config_path) = cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()
    };

    match cli.command {
        Commands::Scan {
            path,
            output,
            min_severity,
            fail_on,
            disabled_rules,
            extensions,
        } => {
            let min_severity: Severity =
                min_severity.parse().map_err(|e| anyhow::anyhow!("{}", e))?;
            let fail_on: Option<Severity> = fail_on
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            let format: OutputFormat = cli.format.parse().map_err(|e| anyhow::anyhow!("{}", e))?;

            // CLI flags stack on top of the config file.
            let mut config = base_config;
            for rule_id in disabled_rules {
                if !config.disabled_rules.contains(&rule_id) {
                    config.disabled_rules.push(rule_id);
                }
            }
            for ext in extensions {
                let ext = ext.trim_start_matches('.').to_string();
                if !config.extensions.contains(&ext) {
                    config.extensions.push(ext);
                }
            }

            let scanner = Scanner::new(config)?.with_min_severity(min_severity);
            let scan_report = scanner.scan_path(&path)?;

            if let Some(output_path) = output {
                let mut file = std::fs::File::create(&output_path)?;
                report(&scan_report, format, &mut file)?;
                eprintln!("Report written to: {}", output_path.display());
            } else {
                let mut stdout = io::stdout().lock();
                report(&scan_report, format, &mut stdout)?;
            }

            if let Some(fail_severity) = fail_on {
                if let Some(max_severity) = scan_report.max_severity() {
                    if max_severity >= fail_severity {
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Rules { json } => {
            let rules = RuleSet::builtin();

            if json {
                let entries: Vec<_> = rules
                    .all()
                    .iter()
                    .map(|rule| {
                        serde_json::json!({
                            "id": rule.id(),
                            "title": rule.title(),
                            "severity": rule.severity(),
                            "category": rule.category(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("{}", "Available Rules".bold().underline());
                println!();
                for rule in rules.all() {
                    let severity = match rule.severity() {
                        Severity::Critical => rule.severity().to_string().bright_red(),
                        Severity::High => rule.severity().to_string().red(),
                        Severity::Medium => rule.severity().to_string().yellow(),
                        Severity::Low => rule.severity().to_string().blue(),
                        Severity::Info => rule.severity().to_string().white(),
                    };
                    println!(
                        "  {} [{}] - {}",
                        rule.id().bright_cyan(),
                        severity,
                        rule.title()
                    );
                }
                println!();
                println!("Total: {} rules", rules.all().len());
            }
        }

        Commands::Init { output } => {
            if output.exists() {
                eprintln!(
                    "{}",
                    format!("Config file already exists: {}", output.display()).yellow()
                );
                std::process::exit(1);
            }
            std::fs::write(&output, generate_default_config())?;
            println!(
                "{}",
                format!("Created config file: {}", output.display()).green()
            );
        }
    }

    Ok(())
}
