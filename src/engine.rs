//! Per-file analysis: parse, lower, build scopes, run rules.

use crate::ast::{self, Language};
use crate::error::{Error, Result};
use crate::rules::{RuleContext, RuleSet};
use crate::scope::ScopeTree;
use crate::types::Finding;
use std::path::Path;
use tracing::debug;

/// Read and analyze a single file, returning its findings.
pub fn analyze_file(path: &Path, rules: &RuleSet) -> Result<Vec<Finding>> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    analyze_source(path, &source, rules)
}

/// Analyze source text as if it lived at `path` (the extension selects the
/// grammar). Findings come back in source order.
pub fn analyze_source(path: &Path, source: &str, rules: &RuleSet) -> Result<Vec<Finding>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let language =
        Language::from_extension(ext).ok_or_else(|| Error::UnsupportedLanguage(ext.to_string()))?;

    let ast = ast::parse(source, language)?;
    let scopes = ScopeTree::build(&ast);
    let cx = RuleContext::new(&ast, &scopes, path);

    let mut nodes: Vec<_> = ast.node_ids().collect();
    nodes.sort_by_key(|id| ast.span(*id).start_byte);

    let mut findings = Vec::new();
    for node in nodes {
        for rule in rules.for_kind(ast.kind(node)) {
            findings.extend(rule.check(&cx, node));
        }
    }

    debug!(
        file = %path.display(),
        findings = findings.len(),
        "analyzed file"
    );
    Ok(findings)
}
