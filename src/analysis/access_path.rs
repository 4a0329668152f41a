//! Symbolic resolution of an expression back to an originating
//! `require()` call or `import` declaration.
//!
//! Given `var x = require('pkg'); x.method(1)`, resolving the `x.method`
//! member yields package `pkg` and access path `["method"]`. Resolution
//! follows declaration-time initializer chains only; reassignment and
//! computed access make an expression unresolvable.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::scope::{Definition, ScopeId, ScopeTree};
use std::collections::HashSet;

/// Resolution result: the property path taken from a package's imported
/// value to the inspected expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPath {
    /// Property names traversed from the bare import/require value. Empty
    /// means the expression is the imported value itself.
    pub path: Vec<String>,
    /// True when the chain starts at a default import.
    pub default_import: bool,
    /// The literal module name passed to `require`/`import ... from`.
    pub package_name: String,
    /// The originating `require()` call or `ImportDeclaration`.
    pub node: NodeId,
}

/// Resolve `node` to a package in `package_names` and the property path
/// taken from its import. Returns `None` whenever the chain cannot be
/// established with certainty.
pub fn import_access_path(
    ast: &Ast,
    scopes: &ScopeTree,
    node: NodeId,
    scope: ScopeId,
    package_names: &[&str],
) -> Option<AccessPath> {
    let mut resolver = Resolver {
        ast,
        scopes,
        scope,
        package_names,
        tracked: HashSet::new(),
    };
    resolver.resolve(node)
}

struct Resolver<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTree,
    scope: ScopeId,
    package_names: &'a [&'a str],
    tracked: HashSet<NodeId>,
}

impl<'a> Resolver<'a> {
    fn resolve(&mut self, node: NodeId) -> Option<AccessPath> {
        if !self.tracked.insert(node) {
            // Guard cycles through self-referential bindings.
            return None;
        }

        match self.ast.kind(node) {
            NodeKind::Identifier { name } => self.resolve_identifier(name),

            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                if *computed {
                    // Bracket access defeats static resolution.
                    return None;
                }
                let mut nesting = self.resolve(*object)?;
                if let Some(prop_name) = self.ast.identifier_name(*property) {
                    nesting.path.push(prop_name.to_string());
                }
                Some(nesting)
            }

            NodeKind::CallExpression { callee, arguments } => {
                // `require('pkg')`, possibly used directly as
                // `require('pkg').method(c)` or `require('pkg')(c)`.
                if self.ast.identifier_name(*callee) != Some("require") {
                    return None;
                }
                let first = arguments.first()?;
                let package = self.ast.string_literal(*first)?;
                if !self.package_names.contains(&package) {
                    return None;
                }
                Some(AccessPath {
                    path: Vec::new(),
                    default_import: false,
                    package_name: package.to_string(),
                    node,
                })
            }

            _ => None,
        }
    }

    fn resolve_identifier(&mut self, name: &str) -> Option<AccessPath> {
        let variable = self.scopes.find_variable(self.scope, name)?;

        // `var something = ...` with an initializer.
        let decl = variable.defs.iter().find_map(|def| match def {
            Definition::Variable { declarator, .. } => match self.ast.kind(*declarator) {
                NodeKind::VariableDeclarator {
                    id,
                    init: Some(init),
                } => Some((*id, *init)),
                _ => None,
            },
            _ => None,
        });
        if let Some((id, init)) = decl {
            let prop_name = match self.ast.kind(id) {
                NodeKind::Identifier { .. } => None,
                NodeKind::ObjectPattern { properties } => {
                    // The property that binds exactly this name, via a plain
                    // identifier key.
                    let property = properties.iter().find(|prop| {
                        matches!(
                            self.ast.kind(**prop),
                            NodeKind::PatternProperty { value, .. }
                                if self.ast.identifier_name(*value) == Some(name)
                        )
                    })?;
                    let NodeKind::PatternProperty { key, computed, .. } = self.ast.kind(*property)
                    else {
                        return None;
                    };
                    if *computed {
                        return None;
                    }
                    Some(self.ast.identifier_name(*key)?.to_string())
                }
                // Unknown binding-pattern shape.
                _ => return None,
            };
            let mut nesting = self.resolve(init)?;
            if let Some(prop) = prop_name {
                nesting.path.push(prop);
            }
            return Some(nesting);
        }

        // `import something from ...` and friends.
        let import = variable.defs.iter().find_map(|def| match def {
            Definition::ImportBinding {
                specifier,
                declaration,
            } => {
                let NodeKind::ImportDeclaration { source, .. } = self.ast.kind(*declaration)
                else {
                    return None;
                };
                let package = self.ast.string_literal(*source)?;
                if !self.package_names.contains(&package) {
                    return None;
                }
                Some((*specifier, *declaration, package.to_string()))
            }
            _ => None,
        });
        if let Some((specifier, declaration, package_name)) = import {
            let (path, default_import) = match self.ast.kind(specifier) {
                NodeKind::ImportSpecifier { imported, .. } => {
                    let imported_name = self.ast.identifier_name(*imported)?;
                    (vec![imported_name.to_string()], false)
                }
                NodeKind::ImportDefaultSpecifier { .. } => (Vec::new(), true),
                NodeKind::ImportNamespaceSpecifier { .. } => (Vec::new(), false),
                _ => return None,
            };
            return Some(AccessPath {
                path,
                default_import,
                package_name,
                node: declaration,
            });
        }

        None
    }
}
