//! Security rules and the context they run against.
//!
//! Each rule is a stateless visitor: the engine offers it every node whose
//! kind it declares interest in, and the rule asks the analysis core about
//! import origins and argument staticness before deciding to report.

mod child_process;
mod non_literal_fs_filename;
mod non_literal_regexp;
mod non_literal_require;

pub use child_process::ChildProcessRule;
pub use non_literal_fs_filename::NonLiteralFsFilenameRule;
pub use non_literal_regexp::NonLiteralRegexpRule;
pub use non_literal_require::NonLiteralRequireRule;

use crate::analysis::{import_access_path, is_static_expression, AccessPath, StaticCache};
use crate::ast::{Ast, NodeId, NodeKind};
use crate::scope::ScopeTree;
use crate::types::{Finding, FindingCategory, Location, Severity};
use std::cell::RefCell;
use std::path::Path;

/// Per-file context handed to rules: the AST, its scopes, and the
/// session-scoped staticness cache.
pub struct RuleContext<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTree,
    path: &'a Path,
    cache: RefCell<StaticCache>,
}

impl<'a> RuleContext<'a> {
    pub fn new(ast: &'a Ast, scopes: &'a ScopeTree, path: &'a Path) -> Self {
        Self {
            ast,
            scopes,
            path,
            cache: RefCell::new(StaticCache::new()),
        }
    }

    pub fn ast(&self) -> &Ast {
        self.ast
    }

    pub fn file(&self) -> &Path {
        self.path
    }

    /// Whether the expression is provably free of runtime input.
    pub fn is_static(&self, node: NodeId) -> bool {
        let mut cache = self.cache.borrow_mut();
        is_static_expression(
            self.ast,
            self.scopes,
            &mut cache,
            node,
            self.scopes.scope_of(node),
        )
    }

    /// Resolve an expression back to one of the given packages.
    pub fn access_path(&self, node: NodeId, package_names: &[&str]) -> Option<AccessPath> {
        import_access_path(
            self.ast,
            self.scopes,
            node,
            self.scopes.scope_of(node),
            package_names,
        )
    }

    pub fn parent_kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.ast.parent(node).map(|parent| self.ast.kind(parent))
    }

    pub fn location(&self, node: NodeId) -> Location {
        let span = self.ast.span(node);
        Location::new(
            self.path.to_path_buf(),
            span.start_row + 1,
            span.end_row + 1,
        )
        .with_columns(span.start_col + 1, span.end_col + 1)
    }

    pub fn snippet(&self, node: NodeId) -> String {
        self.ast.text(node).to_string()
    }
}

/// A security rule driven by the analysis core.
pub trait Rule: Send + Sync {
    /// Unique rule id, used in reports and for disabling.
    fn id(&self) -> &'static str;

    /// Human-readable title for findings from this rule.
    fn title(&self) -> &'static str;

    fn severity(&self) -> Severity;

    fn category(&self) -> FindingCategory;

    /// Whether this rule wants to see nodes of the given kind.
    fn handles(&self, kind: &NodeKind) -> bool;

    /// Inspect one node and return any findings.
    fn check(&self, cx: &RuleContext, node: NodeId) -> Vec<Finding>;
}

/// The registered rules, minus any disabled by configuration.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// All built-in rules.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                Box::new(ChildProcessRule::new()),
                Box::new(NonLiteralFsFilenameRule::new()),
                Box::new(NonLiteralRequireRule::new()),
                Box::new(NonLiteralRegexpRule::new()),
            ],
        }
    }

    /// Built-in rules with the given ids removed.
    pub fn builtin_without(disabled: &[String]) -> Self {
        let mut set = Self::builtin();
        set.rules
            .retain(|rule| !disabled.iter().any(|id| id == rule.id()));
        set
    }

    pub fn all(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Rules interested in a node kind.
    pub fn for_kind<'s>(&'s self, kind: &'s NodeKind) -> impl Iterator<Item = &'s dyn Rule> + 's {
        self.rules
            .iter()
            .filter(move |rule| rule.handles(kind))
            .map(|rule| rule.as_ref())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}
