//! Configuration loaded from `astsec.toml`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "astsec.toml";

const DEFAULT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

/// Scanner configuration. Every field has a sensible default, so a config
/// file only needs the keys it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rule ids to disable.
    pub disabled_rules: Vec<String>,
    /// File extensions (without dot) to scan.
    pub extensions: Vec<String>,
    /// Glob patterns for paths to skip.
    pub exclude: Vec<String>,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Skip `node_modules` directories entirely.
    pub skip_node_modules: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            max_file_size: 2 * 1024 * 1024,
            skip_node_modules: true,
        }
    }
}

impl Config {
    /// Load a config file, failing on unreadable or invalid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load `astsec.toml` from the working directory if present, otherwise
    /// fall back to defaults. An unreadable file is reported but not fatal.
    pub fn load_default() -> Self {
        let candidate = Path::new(DEFAULT_CONFIG_FILE);
        if !candidate.exists() {
            return Self::default();
        }
        match Self::load(candidate) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "ignoring invalid config file");
                Self::default()
            }
        }
    }
}

/// Template written by `astsec init`.
pub fn generate_default_config() -> String {
    r#"# astsec configuration

# Rule ids to disable.
disabled_rules = []

# File extensions (without dot) to scan.
extensions = ["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"]

# Glob patterns for paths to skip.
exclude = ["**/dist/**", "**/*.min.js"]

# Files larger than this many bytes are skipped.
max_file_size = 2097152

# Skip node_modules directories entirely.
skip_node_modules = true
"#
    .to_string()
}
