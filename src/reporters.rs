//! Rendering scan reports as colored text or JSON.

use crate::scanner::ScanReport;
use crate::types::Severity;
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Write a scan report to `out` in the requested format.
pub fn report(scan: &ScanReport, format: OutputFormat, out: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Text => write_text(scan, out),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, scan)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            writeln!(out)
        }
    }
}

fn write_text(scan: &ScanReport, out: &mut dyn Write) -> io::Result<()> {
    if scan.findings.is_empty() {
        writeln!(out, "{}", "No issues found.".green())?;
        writeln!(
            out,
            "Scanned {} files ({} skipped).",
            scan.files_scanned, scan.files_skipped
        )?;
        return Ok(());
    }

    // Findings arrive sorted by file then position.
    let mut current_file: Option<&Path> = None;
    for finding in &scan.findings {
        let file = finding.location.file.as_path();
        if current_file != Some(file) {
            if current_file.is_some() {
                writeln!(out)?;
            }
            writeln!(out, "{}", file.display().to_string().bold())?;
            current_file = Some(file);
        }

        let severity = colorize_severity(finding.severity);
        let position = match finding.location.start_column {
            Some(col) => format!("{}:{}", finding.location.start_line, col),
            None => finding.location.start_line.to_string(),
        };
        writeln!(
            out,
            "  {} [{}] {} {}",
            position.dimmed(),
            severity,
            finding.rule_id.bright_cyan(),
            finding.message
        )?;
        if let Some(ref remediation) = finding.remediation {
            writeln!(out, "      {} {}", "fix:".dimmed(), remediation.dimmed())?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} findings across {} files ({} skipped).",
        scan.findings.len().to_string().bold(),
        scan.files_scanned,
        scan.files_skipped
    )
}

fn colorize_severity(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Critical => severity.to_string().bright_red(),
        Severity::High => severity.to_string().red(),
        Severity::Medium => severity.to_string().yellow(),
        Severity::Low => severity.to_string().blue(),
        Severity::Info => severity.to_string().white(),
    }
}
