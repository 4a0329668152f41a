//! astsec: an AST-level security linter for JavaScript and TypeScript.
//!
//! Sources are parsed with tree-sitter, lowered into a typed arena AST, and
//! annotated with a scope tree. On top of that sit two analyses every rule
//! shares: resolving an expression back to the `require()`/`import` it came
//! from, and deciding whether an expression is static (free of runtime
//! input). The rules themselves are thin consumers of those analyses.

pub mod analysis;
pub mod ast;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod reporters;
pub mod rules;
pub mod scanner;
pub mod scope;
pub mod types;

pub use analysis::{import_access_path, is_static_expression, AccessPath, StaticCache};
pub use ast::{parse, Ast, Language, NodeId, NodeKind};
pub use config::Config;
pub use engine::{analyze_file, analyze_source};
pub use error::{Error, Result};
pub use rules::{Rule, RuleContext, RuleSet};
pub use scanner::{ScanReport, Scanner};
pub use scope::{ScopeId, ScopeTree, Variable};
pub use types::{Finding, FindingCategory, Location, Severity};
