//! Directory walking and scan orchestration.

use crate::config::Config;
use crate::engine;
use crate::error::{Error, Result};
use crate::rules::RuleSet;
use crate::types::{Finding, Severity};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Aggregate result of a scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub findings: Vec<Finding>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

impl ScanReport {
    /// The most severe finding, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// Walks a path and runs the rule engine over every matching file.
pub struct Scanner {
    config: Config,
    rules: RuleSet,
    excludes: GlobSet,
    min_severity: Severity,
}

impl Scanner {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::Config(format!("bad exclude pattern {:?}: {}", pattern, e)))?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        let rules = RuleSet::builtin_without(&config.disabled_rules);

        Ok(Self {
            config,
            rules,
            excludes,
            min_severity: Severity::Info,
        })
    }

    /// Drop findings below this severity.
    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    /// Scan a single file or a directory tree.
    pub fn scan_path(&self, path: &Path) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        if path.is_file() {
            self.scan_file(path, &mut report);
        } else {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_entry(|e| self.should_descend(e))
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable directory entry");
                        continue;
                    }
                };
                if entry.file_type().is_file() && self.should_scan(entry.path()) {
                    self.scan_file(entry.path(), &mut report);
                }
            }
        }

        report.findings.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.start_line.cmp(&b.location.start_line))
                .then(a.location.start_column.cmp(&b.location.start_column))
        });
        info!(
            files = report.files_scanned,
            findings = report.findings.len(),
            "scan complete"
        );
        Ok(report)
    }

    fn should_descend(&self, entry: &walkdir::DirEntry) -> bool {
        if self.config.skip_node_modules
            && entry.file_type().is_dir()
            && entry.file_name() == "node_modules"
        {
            debug!(dir = %entry.path().display(), "skipping node_modules");
            return false;
        }
        true
    }

    fn should_scan(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self
            .config
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
        {
            return false;
        }
        !self.excludes.is_match(path)
    }

    fn scan_file(&self, path: &Path, report: &mut ScanReport) {
        if let Ok(meta) = std::fs::metadata(path) {
            if meta.len() > self.config.max_file_size {
                debug!(file = %path.display(), size = meta.len(), "skipping oversized file");
                report.files_skipped += 1;
                return;
            }
        }
        match engine::analyze_file(path, &self.rules) {
            Ok(findings) => {
                report.files_scanned += 1;
                report
                    .findings
                    .extend(findings.into_iter().filter(|f| f.severity >= self.min_severity));
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to analyze file");
                report.files_skipped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, contents: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_scan_directory() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/app.js", "require(moduleName);");
        write(&dir, "src/safe.js", "require('lodash');");
        write(&dir, "README.md", "# not javascript");

        let scanner = Scanner::new(Config::default()).unwrap();
        let report = scanner.scan_path(dir.path()).unwrap();

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].rule_id, "detect-non-literal-require");
    }

    #[test]
    fn test_scan_single_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app.js", "new RegExp(input);");

        let scanner = Scanner::new(Config::default()).unwrap();
        let report = scanner.scan_path(&dir.path().join("app.js")).unwrap();

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.max_severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_node_modules_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "node_modules/pkg/index.js", "require(moduleName);");

        let scanner = Scanner::new(Config::default()).unwrap();
        let report = scanner.scan_path(dir.path()).unwrap();

        assert_eq!(report.files_scanned, 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_exclude_globs() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dist/bundle.js", "require(moduleName);");
        write(&dir, "src/app.js", "require(moduleName);");

        let config = Config {
            exclude: vec!["**/dist/**".to_string()],
            ..Config::default()
        };
        let scanner = Scanner::new(config).unwrap();
        let report = scanner.scan_path(dir.path()).unwrap();

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn test_disabled_rule_not_run() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app.js", "new RegExp(input);");

        let config = Config {
            disabled_rules: vec!["detect-non-literal-regexp".to_string()],
            ..Config::default()
        };
        let scanner = Scanner::new(config).unwrap();
        let report = scanner.scan_path(dir.path()).unwrap();

        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_min_severity_filter() {
        let dir = TempDir::new().unwrap();
        // regexp is medium, require is high
        write(&dir, "app.js", "new RegExp(input); require(moduleName);");

        let scanner = Scanner::new(Config::default())
            .unwrap()
            .with_min_severity(Severity::High);
        let report = scanner.scan_path(dir.path()).unwrap();

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].rule_id, "detect-non-literal-require");
    }

    #[test]
    fn test_oversized_file_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app.js", "require(moduleName);");

        let config = Config {
            max_file_size: 4,
            ..Config::default()
        };
        let scanner = Scanner::new(config).unwrap();
        let report = scanner.scan_path(dir.path()).unwrap();

        assert_eq!(report.files_scanned, 0);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn test_bad_exclude_pattern_rejected() {
        let config = Config {
            exclude: vec!["{broken".to_string()],
            ..Config::default()
        };
        assert!(matches!(Scanner::new(config), Err(Error::Config(_))));
    }
}
