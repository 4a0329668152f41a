//! Scope construction: two passes over the AST.
//!
//! Pass one creates scopes and collects bindings (declarations hoist, so
//! references cannot be resolved until every binding is known). Pass two
//! resolves identifier references and tags them read-only or write.

use super::{
    Definition, Reference, Scope, ScopeId, ScopeKind, ScopeTree, Variable, VariableId,
};
use crate::ast::{Ast, DeclKind, NodeId, NodeKind};
use std::collections::HashMap;

/// Node.js globals, seeded with zero definitions so the
/// evaluator's unbound-global checks (`__dirname`, `require.resolve`,
/// `process.cwd`) see them as declared-but-undefined names.
const RUNTIME_GLOBALS: &[&str] = &[
    "__dirname",
    "__filename",
    "require",
    "process",
    "module",
    "exports",
    "console",
    "Buffer",
    "global",
    "globalThis",
    "URL",
];

pub(super) fn build(ast: &Ast) -> ScopeTree {
    let mut builder = Builder {
        ast,
        scopes: Vec::new(),
        variables: Vec::new(),
        node_scopes: vec![ScopeId::new(0); ast.len()],
    };

    let global = builder.new_scope(ScopeKind::Global, None);
    for name in RUNTIME_GLOBALS {
        builder.declare(global, name);
    }
    let module = builder.new_scope(ScopeKind::Module, Some(global));

    builder.collect(ast.root(), module);
    builder.resolve(ast.root());

    ScopeTree {
        scopes: builder.scopes,
        variables: builder.variables,
        node_scopes: builder.node_scopes,
    }
}

struct Builder<'a> {
    ast: &'a Ast,
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    node_scopes: Vec<ScopeId>,
}

impl<'a> Builder<'a> {
    fn new_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent,
            bindings: HashMap::new(),
        });
        id
    }

    /// Get or create the variable bound to `name` in `scope`.
    fn declare(&mut self, scope: ScopeId, name: &str) -> VariableId {
        if let Some(existing) = self.scopes[scope.index()].bindings.get(name) {
            return *existing;
        }
        let var_id = VariableId::new(self.variables.len());
        self.variables.push(Variable {
            name: name.to_string(),
            defs: Vec::new(),
            references: Vec::new(),
        });
        self.scopes[scope.index()]
            .bindings
            .insert(name.to_string(), var_id);
        var_id
    }

    fn bind(&mut self, scope: ScopeId, name_node: NodeId, def: Definition) {
        if let Some(name) = self.ast.identifier_name(name_node) {
            let name = name.to_string();
            let var_id = self.declare(scope, &name);
            self.variables[var_id.index()].defs.push(def);
        }
    }

    /// The scope `var` declarations hoist to.
    fn hoist_target(&self, from: ScopeId) -> ScopeId {
        let mut current = from;
        loop {
            let scope = &self.scopes[current.index()];
            match scope.kind {
                ScopeKind::Function | ScopeKind::Module | ScopeKind::Global => return current,
                ScopeKind::Block => match scope.parent {
                    Some(parent) => current = parent,
                    None => return current,
                },
            }
        }
    }

    /// Binding identifiers introduced by a declaration pattern. Patterns the
    /// lowering did not model (defaults, rest) contribute nothing, which
    /// keeps their names unresolvable and the analysis conservative.
    fn pattern_bindings(&self, pattern: NodeId, out: &mut Vec<NodeId>) {
        match self.ast.kind(pattern) {
            NodeKind::Identifier { .. } => out.push(pattern),
            NodeKind::ObjectPattern { properties } => {
                for prop in properties {
                    if let NodeKind::PatternProperty { value, .. } = self.ast.kind(*prop) {
                        self.pattern_bindings(*value, out);
                    }
                }
            }
            NodeKind::ArrayPattern { elements } => {
                for element in elements {
                    self.pattern_bindings(*element, out);
                }
            }
            _ => {}
        }
    }

    // ---- pass one: scopes and bindings ----

    fn collect(&mut self, node: NodeId, scope: ScopeId) {
        self.node_scopes[node.index()] = scope;

        match self.ast.kind(node) {
            NodeKind::Function {
                name,
                params,
                body,
                is_declaration,
            } => {
                let (name, params, body, is_declaration) =
                    (*name, params.clone(), *body, *is_declaration);
                if is_declaration {
                    if let Some(name_node) = name {
                        self.node_scopes[name_node.index()] = scope;
                        self.bind(scope, name_node, Definition::Function { name: name_node });
                    }
                }
                let fn_scope = self.new_scope(ScopeKind::Function, Some(scope));
                if !is_declaration {
                    if let Some(name_node) = name {
                        // A function expression's name binds inside its own
                        // scope only.
                        self.node_scopes[name_node.index()] = fn_scope;
                        self.bind(fn_scope, name_node, Definition::Function { name: name_node });
                    }
                }
                for param in params {
                    let mut bindings = Vec::new();
                    self.pattern_bindings(param, &mut bindings);
                    for ident in bindings {
                        self.bind(fn_scope, ident, Definition::Parameter { name: ident });
                    }
                    self.collect(param, fn_scope);
                }
                self.collect(body, fn_scope);
            }

            NodeKind::BlockStatement { body } => {
                let body = body.clone();
                let block = self.new_scope(ScopeKind::Block, Some(scope));
                for stmt in body {
                    self.collect(stmt, block);
                }
            }

            NodeKind::CatchClause { param, body } => {
                let (param, body) = (*param, *body);
                let catch_scope = self.new_scope(ScopeKind::Block, Some(scope));
                if let Some(param_node) = param {
                    let mut bindings = Vec::new();
                    self.pattern_bindings(param_node, &mut bindings);
                    for ident in bindings {
                        self.bind(catch_scope, ident, Definition::CatchParam { name: ident });
                    }
                    self.collect(param_node, catch_scope);
                }
                self.collect(body, catch_scope);
            }

            NodeKind::VariableDeclaration { kind, declarations } => {
                let (kind, declarations) = (*kind, declarations.clone());
                let target = match kind {
                    DeclKind::Var => self.hoist_target(scope),
                    DeclKind::Let | DeclKind::Const => scope,
                };
                for declarator in declarations {
                    if let NodeKind::VariableDeclarator { id, .. } = self.ast.kind(declarator) {
                        let mut bindings = Vec::new();
                        self.pattern_bindings(*id, &mut bindings);
                        for ident in bindings {
                            self.bind(
                                target,
                                ident,
                                Definition::Variable {
                                    declarator,
                                    name: ident,
                                },
                            );
                        }
                    }
                    self.collect(declarator, scope);
                }
            }

            NodeKind::ImportDeclaration { specifiers, .. } => {
                let specifiers = specifiers.clone();
                for specifier in &specifiers {
                    let local = match self.ast.kind(*specifier) {
                        NodeKind::ImportSpecifier { local, .. }
                        | NodeKind::ImportDefaultSpecifier { local }
                        | NodeKind::ImportNamespaceSpecifier { local } => *local,
                        _ => continue,
                    };
                    self.bind(
                        scope,
                        local,
                        Definition::ImportBinding {
                            specifier: *specifier,
                            declaration: node,
                        },
                    );
                }
                for child in self.ast.kind(node).children() {
                    self.collect(child, scope);
                }
            }

            _ => {
                for child in self.ast.kind(node).children() {
                    self.collect(child, scope);
                }
            }
        }
    }

    // ---- pass two: references ----

    fn resolve(&mut self, node: NodeId) {
        match self.ast.kind(node) {
            NodeKind::Identifier { name } => {
                let name = name.clone();
                self.reference(node, &name, true);
            }

            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let (object, property, computed) = (*object, *property, *computed);
                self.resolve(object);
                if computed {
                    self.resolve(property);
                }
            }

            NodeKind::ObjectProperty {
                key,
                value,
                computed,
            }
            | NodeKind::PatternProperty {
                key,
                value,
                computed,
            } => {
                let (key, value, computed) = (*key, *value, *computed);
                if computed {
                    self.resolve(key);
                }
                self.resolve(value);
            }

            NodeKind::VariableDeclarator { id, init } => {
                let (id, init) = (*id, *init);
                if let Some(init) = init {
                    let mut bindings = Vec::new();
                    self.pattern_bindings(id, &mut bindings);
                    for ident in bindings {
                        if let Some(name) = self.ast.identifier_name(ident) {
                            let name = name.to_string();
                            self.reference(ident, &name, false);
                        }
                    }
                    self.resolve_pattern_keys(id);
                    self.resolve(init);
                }
            }

            NodeKind::AssignmentExpression { left, right, .. } => {
                let (left, right) = (*left, *right);
                self.resolve_write_target(left);
                self.resolve(right);
            }

            NodeKind::UpdateExpression { argument } => {
                let argument = *argument;
                self.resolve_write_target(argument);
            }

            NodeKind::Function {
                name: _,
                params,
                body,
                ..
            } => {
                let (params, body) = (params.clone(), *body);
                for param in params {
                    self.resolve_param(param);
                }
                self.resolve(body);
            }

            NodeKind::CatchClause { param, body } => {
                let (param, body) = (*param, *body);
                if let Some(param) = param {
                    self.resolve_param(param);
                }
                self.resolve(body);
            }

            NodeKind::ImportDeclaration { .. }
            | NodeKind::Literal { .. }
            | NodeKind::PrivateIdentifier { .. }
            | NodeKind::MetaProperty { .. } => {}

            _ => {
                for child in self.ast.kind(node).children() {
                    self.resolve(child);
                }
            }
        }
    }

    /// Computed keys inside a binding pattern are ordinary reads.
    fn resolve_pattern_keys(&mut self, pattern: NodeId) {
        match self.ast.kind(pattern) {
            NodeKind::ObjectPattern { properties } => {
                for prop in properties.clone() {
                    if let NodeKind::PatternProperty {
                        key,
                        value,
                        computed,
                    } = self.ast.kind(prop)
                    {
                        let (key, value) = (*key, *value);
                        if *computed {
                            self.resolve(key);
                        }
                        self.resolve_pattern_keys(value);
                    }
                }
            }
            NodeKind::ArrayPattern { elements } => {
                for element in elements.clone() {
                    self.resolve_pattern_keys(element);
                }
            }
            _ => {}
        }
    }

    /// The left-hand side of an assignment: identifiers become write
    /// references, anything else is traversed with its identifiers written.
    fn resolve_write_target(&mut self, target: NodeId) {
        match self.ast.kind(target) {
            NodeKind::Identifier { name } => {
                let name = name.clone();
                self.reference(target, &name, false);
            }
            NodeKind::ObjectPattern { .. } | NodeKind::ArrayPattern { .. } => {
                let mut bindings = Vec::new();
                self.pattern_bindings(target, &mut bindings);
                for ident in bindings {
                    if let Some(name) = self.ast.identifier_name(ident) {
                        let name = name.to_string();
                        self.reference(ident, &name, false);
                    }
                }
                self.resolve_pattern_keys(target);
            }
            _ => self.resolve(target),
        }
    }

    /// Parameters: binding identifiers are skipped, everything else (computed
    /// keys, defaults lowered as opaque nodes) is traversed normally.
    fn resolve_param(&mut self, param: NodeId) {
        match self.ast.kind(param) {
            NodeKind::Identifier { .. } => {}
            NodeKind::ObjectPattern { properties } => {
                for prop in properties.clone() {
                    if let NodeKind::PatternProperty {
                        key,
                        value,
                        computed,
                    } = self.ast.kind(prop)
                    {
                        let (key, value) = (*key, *value);
                        if *computed {
                            self.resolve(key);
                        }
                        self.resolve_param(value);
                    }
                }
            }
            NodeKind::ArrayPattern { elements } => {
                for element in elements.clone() {
                    self.resolve_param(element);
                }
            }
            _ => {
                for child in self.ast.kind(param).children() {
                    self.resolve(child);
                }
            }
        }
    }

    fn reference(&mut self, identifier: NodeId, name: &str, read_only: bool) {
        let mut current = Some(self.node_scopes[identifier.index()]);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.index()];
            if let Some(var_id) = scope.bindings.get(name) {
                self.variables[var_id.index()]
                    .references
                    .push(Reference {
                        identifier,
                        read_only,
                    });
                return;
            }
            current = scope.parent;
        }
        // Unresolved references are dropped; the evaluator treats the name
        // as unknown.
    }
}
