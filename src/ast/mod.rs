//! Typed, arena-allocated AST for JavaScript and TypeScript sources.
//!
//! Nodes live in a flat arena owned by [`Ast`] and are addressed by copyable
//! [`NodeId`] handles. Node identity (the id) is what the analysis layer keys
//! its caches and cycle guards on, so an arena is never shared between parse
//! sessions. The node grammar is a closed union: anything the lowering pass
//! does not model precisely becomes [`NodeKind::Other`], which still carries
//! its children so traversal and scope building stay total.

mod lower;

pub use lower::{parse, Language};

use std::fmt;

/// Handle to a node in an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte and line/column extent of a node. Rows and columns are 0-based;
/// reporting converts to 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

/// Literal values. Only string literals carry their decoded value; the
/// analysis never needs numeric or regex payloads, just the literal-ness.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number,
    Boolean(bool),
    Null,
    Regex,
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Declaration keyword of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

/// The closed node-kind union.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },
    Identifier {
        name: String,
    },
    PrivateIdentifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
    },
    TemplateLiteral {
        expressions: Vec<NodeId>,
    },
    BinaryExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    SpreadElement {
        argument: NodeId,
    },
    /// `import.meta` and friends.
    MetaProperty {
        meta: String,
        property: String,
    },
    AssignmentExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    UpdateExpression {
        argument: NodeId,
    },
    VariableDeclaration {
        kind: DeclKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    ObjectPattern {
        properties: Vec<NodeId>,
    },
    /// One `key: value` (or shorthand, where key and value are the same
    /// node) entry of an object pattern.
    PatternProperty {
        key: NodeId,
        value: NodeId,
        computed: bool,
    },
    ArrayPattern {
        elements: Vec<NodeId>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    ObjectProperty {
        key: NodeId,
        value: NodeId,
        computed: bool,
    },
    ImportDeclaration {
        specifiers: Vec<NodeId>,
        source: NodeId,
    },
    /// `import { imported as local }`.
    ImportSpecifier {
        imported: NodeId,
        local: NodeId,
    },
    /// `import local from ...`.
    ImportDefaultSpecifier {
        local: NodeId,
    },
    /// `import * as local from ...`.
    ImportNamespaceSpecifier {
        local: NodeId,
    },
    /// Any function-like scope host: declarations, expressions, arrows,
    /// methods.
    Function {
        name: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        is_declaration: bool,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    CatchClause {
        param: Option<NodeId>,
        body: NodeId,
    },
    /// Grammar constructs the analysis has no special knowledge of. Children
    /// are preserved for traversal.
    Other {
        grammar_kind: String,
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Child nodes in source order. Drives parent fixup and traversal.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Program { body } => body.clone(),
            NodeKind::Identifier { .. }
            | NodeKind::PrivateIdentifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::MetaProperty { .. } => Vec::new(),
            NodeKind::TemplateLiteral { expressions } => expressions.clone(),
            NodeKind::BinaryExpression { left, right, .. } => vec![*left, *right],
            NodeKind::MemberExpression {
                object, property, ..
            } => vec![*object, *property],
            NodeKind::CallExpression { callee, arguments }
            | NodeKind::NewExpression { callee, arguments } => {
                let mut v = vec![*callee];
                v.extend(arguments.iter().copied());
                v
            }
            NodeKind::SpreadElement { argument } => vec![*argument],
            NodeKind::AssignmentExpression { left, right, .. } => vec![*left, *right],
            NodeKind::UpdateExpression { argument } => vec![*argument],
            NodeKind::VariableDeclaration { declarations, .. } => declarations.clone(),
            NodeKind::VariableDeclarator { id, init } => {
                let mut v = vec![*id];
                v.extend(init.iter().copied());
                v
            }
            NodeKind::ObjectPattern { properties } => properties.clone(),
            NodeKind::PatternProperty { key, value, .. } => {
                if key == value {
                    vec![*key]
                } else {
                    vec![*key, *value]
                }
            }
            NodeKind::ArrayPattern { elements } => elements.clone(),
            NodeKind::ObjectExpression { properties } => properties.clone(),
            NodeKind::ObjectProperty { key, value, .. } => vec![*key, *value],
            NodeKind::ImportDeclaration { specifiers, source } => {
                let mut v = specifiers.clone();
                v.push(*source);
                v
            }
            NodeKind::ImportSpecifier { imported, local } => {
                if imported == local {
                    vec![*imported]
                } else {
                    vec![*imported, *local]
                }
            }
            NodeKind::ImportDefaultSpecifier { local }
            | NodeKind::ImportNamespaceSpecifier { local } => vec![*local],
            NodeKind::Function {
                name, params, body, ..
            } => {
                let mut v: Vec<NodeId> = name.iter().copied().collect();
                v.extend(params.iter().copied());
                v.push(*body);
                v
            }
            NodeKind::BlockStatement { body } => body.clone(),
            NodeKind::CatchClause { param, body } => {
                let mut v: Vec<NodeId> = param.iter().copied().collect();
                v.push(*body);
                v
            }
            NodeKind::Other { children, .. } => children.clone(),
        }
    }
}

/// A single node: its kind, extent, and parent link.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// An arena-allocated AST for one source file.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    source: String,
}

impl Ast {
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId, source: String) -> Self {
        let mut ast = Ast {
            nodes,
            root,
            source,
        };
        ast.fix_parents();
        ast
    }

    fn fix_parents(&mut self) {
        let mut assignments = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            for child in node.kind.children() {
                assignments.push((child, NodeId::new(index)));
            }
        }
        for (child, parent) in assignments {
            self.nodes[child.index()].parent = Some(parent);
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Source text covered by the node.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.source
            .get(span.start_byte..span.end_byte)
            .unwrap_or("")
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// All node ids, in arena order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Identifier name, if the node is an identifier.
    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// String value, if the node is a string literal.
    pub fn string_literal(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Literal { value } => value.as_str(),
            _ => None,
        }
    }
}
