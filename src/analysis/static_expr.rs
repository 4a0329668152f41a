//! Static expression evaluation: is an expression's value guaranteed to be
//! independent of untrusted runtime input?
//!
//! "Static" covers literals, template literals with static interpolations,
//! concatenations of static operands, read-only single-assignment variables
//! with static initializers, the CJS module globals, and a closed allow-list
//! of pure path/url construction calls. Everything else, including anything
//! ambiguous, is non-static. Expanding or narrowing the allow-list is a
//! security/usability tradeoff, not an implementation detail.

use super::access_path::import_access_path;
use crate::ast::{Ast, NodeId, NodeKind};
use crate::scope::{Definition, ScopeId, ScopeTree};
use std::collections::{HashMap, HashSet};

const PATH_PACKAGE_NAMES: &[&str] = &["path", "node:path", "path/posix", "node:path/posix"];
const URL_PACKAGE_NAMES: &[&str] = &["url", "node:url"];
const PATH_CONSTRUCTION_METHOD_NAMES: &[&str] = &[
    "basename",
    "dirname",
    "extname",
    "join",
    "normalize",
    "relative",
    "resolve",
    "toNamespacedPath",
];
const PATH_STATIC_MEMBER_NAMES: &[&str] = &["delimiter", "sep"];

/// Memoized staticness results, keyed by node identity. Owned by one
/// analysis session; ids are only ever valid for that session's arena.
#[derive(Debug, Default)]
pub struct StaticCache {
    results: HashMap<NodeId, bool>,
}

impl StaticCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Check whether the given expression is static.
pub fn is_static_expression(
    ast: &Ast,
    scopes: &ScopeTree,
    cache: &mut StaticCache,
    node: NodeId,
    scope: ScopeId,
) -> bool {
    let mut evaluator = Evaluator {
        ast,
        scopes,
        cache,
        scope,
        tracked: HashSet::new(),
    };
    evaluator.is_static(node)
}

struct Evaluator<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTree,
    cache: &'a mut StaticCache,
    scope: ScopeId,
    tracked: HashSet<NodeId>,
}

impl<'a> Evaluator<'a> {
    fn is_static(&mut self, node: NodeId) -> bool {
        if matches!(self.ast.kind(node), NodeKind::SpreadElement { .. }) {
            // Unknown arity and content.
            return false;
        }
        if let Some(result) = self.cache.results.get(&node) {
            return *result;
        }
        let result = self.is_static_uncached(node);
        self.cache.results.insert(node, result);
        result
    }

    fn is_static_uncached(&mut self, node: NodeId) -> bool {
        if !self.tracked.insert(node) {
            // Guard cycles through self-referential bindings.
            return false;
        }

        match self.ast.kind(node) {
            NodeKind::Literal { .. } => return true,

            NodeKind::TemplateLiteral { expressions } => {
                // Static iff all interpolations are static; the fixed string
                // segments are always trusted.
                let expressions = expressions.clone();
                return expressions.into_iter().all(|expr| self.is_static(expr));
            }

            NodeKind::BinaryExpression { left, right, .. }
                if !matches!(self.ast.kind(*left), NodeKind::PrivateIdentifier { .. }) =>
            {
                let (left, right) = (*left, *right);
                return self.is_static(left) && self.is_static(right);
            }

            NodeKind::Identifier { name } => {
                match self.scopes.find_variable(self.scope, name) {
                    Some(variable) => {
                        if variable.defs.is_empty() {
                            if name == "__dirname" || name == "__filename" {
                                // CJS module globals.
                                return true;
                            }
                        } else if variable.defs.len() == 1 {
                            if let Definition::Variable {
                                declarator,
                                name: def_name,
                            } = variable.defs[0]
                            {
                                if let NodeKind::VariableDeclarator {
                                    init: Some(init), ..
                                } = self.ast.kind(declarator)
                                {
                                    let never_reassigned = variable
                                        .references
                                        .iter()
                                        .all(|r| r.read_only || r.identifier == def_name);
                                    if never_reassigned {
                                        let init = *init;
                                        return self.is_static(init);
                                    }
                                }
                            }
                        }
                        // Reassigned, multiply defined, or shadowed by a
                        // non-variable binding: fall through.
                    }
                    None => return false,
                }
            }

            _ => {}
        }

        self.is_static_path(node)
            || self.is_static_file_url_to_path(node)
            || self.is_static_import_meta_url(node)
            || self.is_static_require_resolve(node)
            || self.is_static_cwd(node)
    }

    /// `path.join(...)` and friends, or `path.sep`/`path.delimiter`, reached
    /// through a resolved import of a path module.
    fn is_static_path(&mut self, node: NodeId) -> bool {
        let query = match self.ast.kind(node) {
            NodeKind::CallExpression { callee, .. } => *callee,
            _ => node,
        };
        let Some(info) = import_access_path(
            self.ast,
            self.scopes,
            query,
            self.scope,
            PATH_PACKAGE_NAMES,
        ) else {
            return false;
        };
        let name = if info.path.len() == 1 {
            &info.path[0]
        } else if info.path.len() == 2 && info.path[0] == "posix" {
            // e.g. `import { posix as path } from 'path'`.
            &info.path[1]
        } else {
            return false;
        };

        if let NodeKind::CallExpression { arguments, .. } = self.ast.kind(node) {
            if !PATH_CONSTRUCTION_METHOD_NAMES.contains(&name.as_str()) {
                return false;
            }
            let arguments = arguments.clone();
            return !arguments.is_empty()
                && arguments.into_iter().all(|arg| self.is_static(arg));
        }

        PATH_STATIC_MEMBER_NAMES.contains(&name.as_str())
    }

    /// `fileURLToPath(...)` resolved from a url module, with static
    /// arguments.
    fn is_static_file_url_to_path(&mut self, node: NodeId) -> bool {
        let NodeKind::CallExpression { callee, arguments } = self.ast.kind(node) else {
            return false;
        };
        let (callee, arguments) = (*callee, arguments.clone());
        let Some(info) = import_access_path(
            self.ast,
            self.scopes,
            callee,
            self.scope,
            URL_PACKAGE_NAMES,
        ) else {
            return false;
        };
        if info.path.len() != 1 || info.path[0] != "fileURLToPath" {
            return false;
        }
        !arguments.is_empty() && arguments.into_iter().all(|arg| self.is_static(arg))
    }

    /// The `import.meta.url` member pattern.
    fn is_static_import_meta_url(&self, node: NodeId) -> bool {
        let NodeKind::MemberExpression {
            object,
            property,
            computed: false,
        } = self.ast.kind(node)
        else {
            return false;
        };
        self.ast.identifier_name(*property) == Some("url")
            && matches!(
                self.ast.kind(*object),
                NodeKind::MetaProperty { meta, property }
                    if meta == "import" && property == "meta"
            )
    }

    /// `require.resolve(...)` where `require` is the unbound global, with
    /// static arguments.
    fn is_static_require_resolve(&mut self, node: NodeId) -> bool {
        let NodeKind::CallExpression { callee, arguments } = self.ast.kind(node) else {
            return false;
        };
        let arguments = arguments.clone();
        if !self.is_unbound_global_member(*callee, "require", "resolve") {
            return false;
        }
        !arguments.is_empty() && arguments.into_iter().all(|arg| self.is_static(arg))
    }

    /// `process.cwd()` where `process` is the unbound global.
    fn is_static_cwd(&mut self, node: NodeId) -> bool {
        let NodeKind::CallExpression { callee, .. } = self.ast.kind(node) else {
            return false;
        };
        self.is_unbound_global_member(*callee, "process", "cwd")
    }

    /// `object.property` where `object` resolves to a variable with zero
    /// definitions (a true global, never shadowed).
    fn is_unbound_global_member(&self, callee: NodeId, object: &str, property: &str) -> bool {
        let NodeKind::MemberExpression {
            object: object_node,
            property: property_node,
            computed: false,
        } = self.ast.kind(callee)
        else {
            return false;
        };
        if self.ast.identifier_name(*property_node) != Some(property)
            || self.ast.identifier_name(*object_node) != Some(object)
        {
            return false;
        }
        match self.scopes.find_variable(self.scope, object) {
            Some(variable) => variable.defs.is_empty(),
            None => false,
        }
    }
}
