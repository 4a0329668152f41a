//! Lexical scope model: scopes, variables, definitions, references.
//!
//! Mirrors the shape the analysis layer needs: each variable knows the
//! syntactic constructs that introduced it (`defs`) and every identifier that
//! reads or writes it (`references`). The analysis only ever reads this
//! structure; it is built once per file and never mutated afterwards.

mod builder;

use crate::ast::{Ast, NodeId};
use std::collections::HashMap;

/// Handle to a scope in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn new(index: usize) -> Self {
        ScopeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a variable in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(u32);

impl VariableId {
    fn new(index: usize) -> Self {
        VariableId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Implicit outermost scope holding the seeded runtime globals.
    Global,
    /// Top level of the analyzed file.
    Module,
    Function,
    Block,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    bindings: HashMap<String, VariableId>,
}

/// A syntactic construct that introduced a binding. Only `Variable` and
/// `ImportBinding` participate in import resolution; the rest exist so
/// shadowing bindings (parameters, function names, catch params) are visible
/// to the evaluator and disqualify staticness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    /// `var x = ...` (or a destructuring binding inside one). `declarator`
    /// is the `VariableDeclarator` node; `name` the binding identifier.
    Variable { declarator: NodeId, name: NodeId },
    /// An import specifier; `declaration` is the enclosing
    /// `ImportDeclaration`.
    ImportBinding {
        specifier: NodeId,
        declaration: NodeId,
    },
    Parameter { name: NodeId },
    Function { name: NodeId },
    CatchParam { name: NodeId },
}

/// One identifier occurrence that resolved to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub identifier: NodeId,
    pub read_only: bool,
}

/// A named binding with its definitions and references.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub defs: Vec<Definition>,
    pub references: Vec<Reference>,
}

/// The scope tree for one file, plus a per-node enclosing-scope map.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    node_scopes: Vec<ScopeId>,
}

impl ScopeTree {
    /// Build the scope tree for an AST.
    pub fn build(ast: &Ast) -> ScopeTree {
        builder::build(ast)
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId::new(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    /// The innermost scope enclosing a node.
    pub fn scope_of(&self, node: NodeId) -> ScopeId {
        self.node_scopes[node.index()]
    }

    /// Find the variable a name resolves to, walking enclosing scopes
    /// outward from `scope`. Returns `None` for undeclared names.
    pub fn find_variable(&self, scope: ScopeId, name: &str) -> Option<&Variable> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            if let Some(var_id) = scope.bindings.get(name) {
                return Some(&self.variables[var_id.index()]);
            }
            current = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, Language, NodeKind};

    fn setup(source: &str) -> (Ast, ScopeTree) {
        let ast = parse(source, Language::JavaScript).unwrap();
        let scopes = ScopeTree::build(&ast);
        (ast, scopes)
    }

    fn ident_in_call<'a>(ast: &'a Ast, name: &str) -> NodeId {
        // The identifier used as a call argument, not a binding position.
        ast.node_ids()
            .filter(|id| ast.identifier_name(*id) == Some(name))
            .find(|id| {
                matches!(
                    ast.parent(*id).map(|p| ast.kind(p)),
                    Some(NodeKind::CallExpression { .. })
                )
            })
            .unwrap()
    }

    #[test]
    fn test_find_variable_walks_outward() {
        let (ast, scopes) = setup("var a = 1; function f() { use(a); }");
        let use_site = ident_in_call(&ast, "a");
        let variable = scopes
            .find_variable(scopes.scope_of(use_site), "a")
            .unwrap();
        assert_eq!(variable.name, "a");
        assert_eq!(variable.defs.len(), 1);
    }

    #[test]
    fn test_undeclared_name_is_none() {
        let (ast, scopes) = setup("use(mystery);");
        let use_site = ident_in_call(&ast, "mystery");
        assert!(scopes
            .find_variable(scopes.scope_of(use_site), "mystery")
            .is_none());
    }

    #[test]
    fn test_node_globals_have_zero_defs() {
        let (_ast, scopes) = setup("use(1);");
        for name in ["__dirname", "__filename", "require", "process"] {
            let variable = scopes.find_variable(scopes.global_scope(), name).unwrap();
            assert!(variable.defs.is_empty(), "{} should have no defs", name);
        }
    }

    #[test]
    fn test_parameter_shadows_global() {
        let (ast, scopes) = setup("function f(__dirname) { use(__dirname); }");
        let use_site = ident_in_call(&ast, "__dirname");
        let variable = scopes
            .find_variable(scopes.scope_of(use_site), "__dirname")
            .unwrap();
        assert_eq!(variable.defs.len(), 1);
        assert!(matches!(variable.defs[0], Definition::Parameter { .. }));
    }

    #[test]
    fn test_redeclaration_accumulates_defs() {
        let (ast, scopes) = setup("var a = 'x'; var a = 'y'; use(a);");
        let use_site = ident_in_call(&ast, "a");
        let variable = scopes
            .find_variable(scopes.scope_of(use_site), "a")
            .unwrap();
        assert_eq!(variable.defs.len(), 2);
    }

    #[test]
    fn test_reassignment_recorded_as_write_reference() {
        let (ast, scopes) = setup("var a = 'x'; a = 'y'; use(a);");
        let use_site = ident_in_call(&ast, "a");
        let variable = scopes
            .find_variable(scopes.scope_of(use_site), "a")
            .unwrap();
        let writes = variable
            .references
            .iter()
            .filter(|r| !r.read_only)
            .count();
        // One write for the declarator, one for the reassignment.
        assert_eq!(writes, 2);
    }

    #[test]
    fn test_import_binding_definition() {
        let (ast, scopes) = setup("import { exec } from 'child_process'; exec(cmd);");
        let use_site = ast
            .node_ids()
            .filter(|id| ast.identifier_name(*id) == Some("exec"))
            .last()
            .unwrap();
        let variable = scopes
            .find_variable(scopes.scope_of(use_site), "exec")
            .unwrap();
        assert!(matches!(
            variable.defs[0],
            Definition::ImportBinding { .. }
        ));
    }

    #[test]
    fn test_var_hoists_out_of_block() {
        let (ast, scopes) = setup("{ var a = 1; } use(a);");
        let use_site = ident_in_call(&ast, "a");
        assert!(scopes
            .find_variable(scopes.scope_of(use_site), "a")
            .is_some());
    }

    #[test]
    fn test_let_stays_in_block() {
        let (ast, scopes) = setup("{ let a = 1; } use(a);");
        let use_site = ident_in_call(&ast, "a");
        assert!(scopes
            .find_variable(scopes.scope_of(use_site), "a")
            .is_none());
    }
}
