//! Lowering from tree-sitter concrete syntax trees to the typed arena AST.
//!
//! The pass is total: grammar constructs without a dedicated [`NodeKind`]
//! become `Other` nodes that keep their children, so scope building and rule
//! dispatch never lose sight of subtrees.

use super::{Ast, DeclKind, LiteralValue, Node, NodeId, NodeKind, Span};
use crate::error::{Error, Result};
use tree_sitter::{Node as TsNode, Parser};

/// Source language, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Language {
    /// Map a file extension (without dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            _ => None,
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Parse a source string into a typed AST.
pub fn parse(source: &str, language: Language) -> Result<Ast> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| Error::Parser(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Parser("tree-sitter returned no tree".to_string()))?;

    let mut lowerer = Lowerer {
        source,
        nodes: Vec::new(),
    };
    let root = lowerer.lower(tree.root_node());
    Ok(Ast::from_parts(lowerer.nodes, root, source.to_string()))
}

struct Lowerer<'a> {
    source: &'a str,
    nodes: Vec<Node>,
}

impl<'a> Lowerer<'a> {
    fn push(&mut self, kind: NodeKind, ts: TsNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span: span_of(ts),
            parent: None,
        });
        id
    }

    fn text(&self, ts: TsNode) -> &'a str {
        ts.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn field<'t>(&self, ts: TsNode<'t>, name: &str) -> Option<TsNode<'t>> {
        ts.child_by_field_name(name)
    }

    fn lower_field(&mut self, ts: TsNode, name: &str) -> Option<NodeId> {
        ts.child_by_field_name(name).map(|child| self.lower(child))
    }

    fn lower_children(&mut self, ts: TsNode) -> Vec<NodeId> {
        named_children(ts)
            .into_iter()
            .map(|child| self.lower(child))
            .collect()
    }

    fn lower(&mut self, ts: TsNode) -> NodeId {
        match ts.kind() {
            "program" => {
                let body = self.lower_children(ts);
                self.push(NodeKind::Program { body }, ts)
            }

            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "statement_identifier"
            | "undefined" => {
                let name = self.text(ts).to_string();
                self.push(NodeKind::Identifier { name }, ts)
            }

            "private_property_identifier" => {
                let name = self.text(ts).to_string();
                self.push(NodeKind::PrivateIdentifier { name }, ts)
            }

            "string" => {
                let value = self.decode_string(ts);
                self.push(
                    NodeKind::Literal {
                        value: LiteralValue::String(value),
                    },
                    ts,
                )
            }
            "number" => self.push(
                NodeKind::Literal {
                    value: LiteralValue::Number,
                },
                ts,
            ),
            "true" => self.push(
                NodeKind::Literal {
                    value: LiteralValue::Boolean(true),
                },
                ts,
            ),
            "false" => self.push(
                NodeKind::Literal {
                    value: LiteralValue::Boolean(false),
                },
                ts,
            ),
            "null" => self.push(
                NodeKind::Literal {
                    value: LiteralValue::Null,
                },
                ts,
            ),
            "regex" => self.push(
                NodeKind::Literal {
                    value: LiteralValue::Regex,
                },
                ts,
            ),

            "template_string" => {
                let expressions = named_children(ts)
                    .into_iter()
                    .filter(|child| child.kind() == "template_substitution")
                    .filter_map(|sub| named_children(sub).into_iter().next())
                    .map(|expr| self.lower(expr))
                    .collect();
                self.push(NodeKind::TemplateLiteral { expressions }, ts)
            }

            "binary_expression" => {
                let operator = self
                    .field(ts, "operator")
                    .map(|op| self.text(op).to_string())
                    .unwrap_or_default();
                match (self.lower_field(ts, "left"), self.lower_field(ts, "right")) {
                    (Some(left), Some(right)) => self.push(
                        NodeKind::BinaryExpression {
                            operator,
                            left,
                            right,
                        },
                        ts,
                    ),
                    _ => self.lower_other(ts),
                }
            }

            "member_expression" => {
                let object_ts = self.field(ts, "object");
                let property_ts = self.field(ts, "property");
                match (object_ts, property_ts) {
                    (Some(obj), Some(prop)) => {
                        let object = self.lower(obj);
                        let property = self.lower(prop);
                        self.push(
                            NodeKind::MemberExpression {
                                object,
                                property,
                                computed: false,
                            },
                            ts,
                        )
                    }
                    _ => self.lower_other(ts),
                }
            }

            // `import.meta` and `new.target` have their own CST kind; the
            // two halves are keywords, not identifiers.
            "meta_property" => {
                let text = self.text(ts);
                let mut parts = text.split('.');
                let meta = parts.next().unwrap_or("").trim().to_string();
                let property = parts.next().unwrap_or("").trim().to_string();
                self.push(NodeKind::MetaProperty { meta, property }, ts)
            }

            "subscript_expression" => {
                match (self.lower_field(ts, "object"), self.lower_field(ts, "index")) {
                    (Some(object), Some(property)) => self.push(
                        NodeKind::MemberExpression {
                            object,
                            property,
                            computed: true,
                        },
                        ts,
                    ),
                    _ => self.lower_other(ts),
                }
            }

            "call_expression" => {
                let Some(callee_ts) = self.field(ts, "function") else {
                    return self.lower_other(ts);
                };
                let callee = self.lower(callee_ts);
                let arguments = self.lower_arguments(ts);
                self.push(NodeKind::CallExpression { callee, arguments }, ts)
            }

            "new_expression" => {
                let Some(callee_ts) = self.field(ts, "constructor") else {
                    return self.lower_other(ts);
                };
                let callee = self.lower(callee_ts);
                let arguments = self.lower_arguments(ts);
                self.push(NodeKind::NewExpression { callee, arguments }, ts)
            }

            "spread_element" => {
                let Some(argument) = named_children(ts)
                    .into_iter()
                    .next()
                    .map(|child| self.lower(child))
                else {
                    return self.lower_other(ts);
                };
                self.push(NodeKind::SpreadElement { argument }, ts)
            }

            "assignment_expression" | "augmented_assignment_expression" => {
                let operator = self
                    .field(ts, "operator")
                    .map(|op| self.text(op).to_string())
                    .unwrap_or_else(|| "=".to_string());
                match (self.lower_field(ts, "left"), self.lower_field(ts, "right")) {
                    (Some(left), Some(right)) => self.push(
                        NodeKind::AssignmentExpression {
                            operator,
                            left,
                            right,
                        },
                        ts,
                    ),
                    _ => self.lower_other(ts),
                }
            }

            "update_expression" => match self.lower_field(ts, "argument") {
                Some(argument) => self.push(NodeKind::UpdateExpression { argument }, ts),
                None => self.lower_other(ts),
            },

            "variable_declaration" | "lexical_declaration" => {
                let kind = if ts.kind() == "variable_declaration" {
                    DeclKind::Var
                } else {
                    match self.field(ts, "kind").map(|k| self.text(k).to_string()) {
                        Some(k) if k == "const" => DeclKind::Const,
                        _ => DeclKind::Let,
                    }
                };
                let declarations = named_children(ts)
                    .into_iter()
                    .filter(|child| child.kind() == "variable_declarator")
                    .map(|child| self.lower(child))
                    .collect();
                self.push(NodeKind::VariableDeclaration { kind, declarations }, ts)
            }

            "variable_declarator" => {
                let Some(id) = self.lower_field(ts, "name") else {
                    return self.lower_other(ts);
                };
                let init = self.lower_field(ts, "value");
                self.push(NodeKind::VariableDeclarator { id, init }, ts)
            }

            "object_pattern" => {
                let properties = named_children(ts)
                    .into_iter()
                    .map(|child| self.lower_pattern_property(child))
                    .collect();
                self.push(NodeKind::ObjectPattern { properties }, ts)
            }

            "array_pattern" => {
                let elements = self.lower_children(ts);
                self.push(NodeKind::ArrayPattern { elements }, ts)
            }

            "object" => {
                let properties = named_children(ts)
                    .into_iter()
                    .map(|child| match child.kind() {
                        "pair" => self.lower_object_pair(child),
                        _ => self.lower(child),
                    })
                    .collect();
                self.push(NodeKind::ObjectExpression { properties }, ts)
            }

            "import_statement" => self.lower_import(ts),

            "function_declaration" | "generator_function_declaration" => {
                self.lower_function(ts, true)
            }
            "function_expression" | "function" | "generator_function" | "arrow_function"
            | "method_definition" => self.lower_function(ts, false),

            "statement_block" => {
                let body = self.lower_children(ts);
                self.push(NodeKind::BlockStatement { body }, ts)
            }

            "catch_clause" => {
                let param = self.lower_field(ts, "parameter");
                let Some(body) = self.lower_field(ts, "body") else {
                    return self.lower_other(ts);
                };
                self.push(NodeKind::CatchClause { param, body }, ts)
            }

            // Transparent wrappers: the analysis sees straight through them.
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" => match named_children(ts).into_iter().next() {
                Some(inner) => self.lower(inner),
                None => self.lower_other(ts),
            },

            _ => self.lower_other(ts),
        }
    }

    fn lower_other(&mut self, ts: TsNode) -> NodeId {
        let children = self.lower_children(ts);
        self.push(
            NodeKind::Other {
                grammar_kind: ts.kind().to_string(),
                children,
            },
            ts,
        )
    }

    /// Arguments of a call or new expression. A tagged template has the
    /// template string where the argument list would be.
    fn lower_arguments(&mut self, ts: TsNode) -> Vec<NodeId> {
        match self.field(ts, "arguments") {
            Some(args) if args.kind() == "arguments" => self.lower_children(args),
            Some(template) => vec![self.lower(template)],
            None => Vec::new(),
        }
    }

    fn lower_pattern_property(&mut self, ts: TsNode) -> NodeId {
        match ts.kind() {
            "pair_pattern" => {
                let (key_ts, value_ts) = match (self.field(ts, "key"), self.field(ts, "value")) {
                    (Some(k), Some(v)) => (k, v),
                    _ => return self.lower_other(ts),
                };
                let computed = key_ts.kind() == "computed_property_name";
                let key = if computed {
                    match named_children(key_ts).into_iter().next() {
                        Some(inner) => self.lower(inner),
                        None => self.lower_other(key_ts),
                    }
                } else {
                    self.lower(key_ts)
                };
                let value = self.lower(value_ts);
                self.push(
                    NodeKind::PatternProperty {
                        key,
                        value,
                        computed,
                    },
                    ts,
                )
            }
            "shorthand_property_identifier_pattern" => {
                let id = self.lower(ts);
                self.push(
                    NodeKind::PatternProperty {
                        key: id,
                        value: id,
                        computed: false,
                    },
                    ts,
                )
            }
            _ => self.lower(ts),
        }
    }

    fn lower_object_pair(&mut self, ts: TsNode) -> NodeId {
        let (key_ts, value_ts) = match (self.field(ts, "key"), self.field(ts, "value")) {
            (Some(k), Some(v)) => (k, v),
            _ => return self.lower_other(ts),
        };
        let computed = key_ts.kind() == "computed_property_name";
        let key = if computed {
            match named_children(key_ts).into_iter().next() {
                Some(inner) => self.lower(inner),
                None => self.lower_other(key_ts),
            }
        } else {
            self.lower(key_ts)
        };
        let value = self.lower(value_ts);
        self.push(
            NodeKind::ObjectProperty {
                key,
                value,
                computed,
            },
            ts,
        )
    }

    fn lower_import(&mut self, ts: TsNode) -> NodeId {
        let Some(source_ts) = self.field(ts, "source") else {
            return self.lower_other(ts);
        };
        let mut specifiers = Vec::new();
        for child in named_children(ts) {
            if child.kind() != "import_clause" {
                continue;
            }
            for clause_child in named_children(child) {
                match clause_child.kind() {
                    "identifier" => {
                        let local = self.lower(clause_child);
                        specifiers
                            .push(self.push(NodeKind::ImportDefaultSpecifier { local }, clause_child));
                    }
                    "namespace_import" => {
                        if let Some(local_ts) = named_children(clause_child).into_iter().next() {
                            let local = self.lower(local_ts);
                            specifiers.push(
                                self.push(NodeKind::ImportNamespaceSpecifier { local }, clause_child),
                            );
                        }
                    }
                    "named_imports" => {
                        for spec in named_children(clause_child) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name_ts) = self.field(spec, "name") else {
                                continue;
                            };
                            let imported = self.lower(name_ts);
                            let local = match self.field(spec, "alias") {
                                Some(alias_ts) => self.lower(alias_ts),
                                None => imported,
                            };
                            specifiers
                                .push(self.push(NodeKind::ImportSpecifier { imported, local }, spec));
                        }
                    }
                    _ => {}
                }
            }
        }
        let source = self.lower(source_ts);
        self.push(NodeKind::ImportDeclaration { specifiers, source }, ts)
    }

    fn lower_function(&mut self, ts: TsNode, is_declaration: bool) -> NodeId {
        let name = if ts.kind() == "method_definition" {
            // A method's key is a property name, not a binding.
            None
        } else {
            self.field(ts, "name")
                .filter(|n| n.kind() == "identifier")
                .map(|n| self.lower(n))
        };

        let mut params = Vec::new();
        if let Some(single) = self.field(ts, "parameter") {
            params.push(self.lower(single));
        } else if let Some(list) = self.field(ts, "parameters") {
            for param in named_children(list) {
                match param.kind() {
                    // TypeScript wraps parameters; the pattern is inside.
                    "required_parameter" | "optional_parameter" => {
                        if let Some(pattern) = self.field(param, "pattern") {
                            params.push(self.lower(pattern));
                        }
                    }
                    _ => params.push(self.lower(param)),
                }
            }
        }

        let Some(body) = self.lower_field(ts, "body") else {
            return self.lower_other(ts);
        };
        self.push(
            NodeKind::Function {
                name,
                params,
                body,
                is_declaration,
            },
            ts,
        )
    }

    fn decode_string(&self, ts: TsNode) -> String {
        let mut out = String::new();
        for child in named_children(ts) {
            match child.kind() {
                "string_fragment" => out.push_str(self.text(child)),
                "escape_sequence" => out.push_str(&decode_escape(self.text(child))),
                _ => {}
            }
        }
        out
    }
}

fn span_of(ts: TsNode) -> Span {
    let start = ts.start_position();
    let end = ts.end_position();
    Span {
        start_byte: ts.start_byte(),
        end_byte: ts.end_byte(),
        start_row: start.row,
        start_col: start.column,
        end_row: end.row,
        end_col: end.column,
    }
}

/// Named children, with comments filtered out.
fn named_children<'t>(ts: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = ts.walk();
    let children: Vec<TsNode<'t>> = ts
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

fn decode_escape(escape: &str) -> String {
    let Some(rest) = escape.strip_prefix('\\') else {
        return escape.to_string();
    };
    let mut chars = rest.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    match first {
        'n' => "\n".to_string(),
        't' => "\t".to_string(),
        'r' => "\r".to_string(),
        'b' => "\u{8}".to_string(),
        'f' => "\u{c}".to_string(),
        'v' => "\u{b}".to_string(),
        '0' => "\0".to_string(),
        'x' | 'u' => {
            let hex: String = chars.filter(|c| c.is_ascii_hexdigit()).collect();
            u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| rest.to_string())
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<'a>(ast: &'a Ast) -> Vec<&'a NodeKind> {
        ast.node_ids().map(|id| ast.kind(id)).collect()
    }

    #[test]
    fn test_lower_require_call() {
        let ast = parse("var x = require('pkg');", Language::JavaScript).unwrap();
        let call = ast
            .node_ids()
            .find(|id| matches!(ast.kind(*id), NodeKind::CallExpression { .. }))
            .unwrap();
        let NodeKind::CallExpression { callee, arguments } = ast.kind(call) else {
            unreachable!();
        };
        assert_eq!(ast.identifier_name(*callee), Some("require"));
        assert_eq!(ast.string_literal(arguments[0]), Some("pkg"));
    }

    #[test]
    fn test_lower_import_forms() {
        let ast = parse(
            "import d from 'a'; import * as ns from 'b'; import { x as y } from 'c';",
            Language::JavaScript,
        )
        .unwrap();
        let defaults = kinds(&ast)
            .iter()
            .filter(|k| matches!(k, NodeKind::ImportDefaultSpecifier { .. }))
            .count();
        let namespaces = kinds(&ast)
            .iter()
            .filter(|k| matches!(k, NodeKind::ImportNamespaceSpecifier { .. }))
            .count();
        let named = kinds(&ast)
            .iter()
            .filter(|k| matches!(k, NodeKind::ImportSpecifier { .. }))
            .count();
        assert_eq!((defaults, namespaces, named), (1, 1, 1));
    }

    #[test]
    fn test_lower_import_meta() {
        let ast = parse("const u = import.meta.url;", Language::JavaScript).unwrap();
        assert!(ast.node_ids().any(|id| matches!(
            ast.kind(id),
            NodeKind::MetaProperty { meta, property } if meta == "import" && property == "meta"
        )));
        // import.meta.url is an ordinary member read over the meta property.
        assert!(ast.node_ids().any(|id| matches!(
            ast.kind(id),
            NodeKind::MemberExpression { object, .. }
                if matches!(ast.kind(*object), NodeKind::MetaProperty { .. })
        )));
    }

    #[test]
    fn test_lower_new_target() {
        let ast = parse(
            "function f() { use(new.target); }",
            Language::JavaScript,
        )
        .unwrap();
        assert!(ast.node_ids().any(|id| matches!(
            ast.kind(id),
            NodeKind::MetaProperty { meta, property } if meta == "new" && property == "target"
        )));
    }

    #[test]
    fn test_lower_computed_member() {
        let ast = parse("a[b]; a.b;", Language::JavaScript).unwrap();
        let computed: Vec<bool> = ast
            .node_ids()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::MemberExpression { computed, .. } => Some(*computed),
                _ => None,
            })
            .collect();
        assert_eq!(computed, vec![true, false]);
    }

    #[test]
    fn test_lower_destructuring_pattern() {
        let ast = parse(
            "var { readFile: rf, plain } = require('fs');",
            Language::JavaScript,
        )
        .unwrap();
        let props: Vec<(Option<&str>, Option<&str>)> = ast
            .node_ids()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::PatternProperty { key, value, .. } => {
                    Some((ast.identifier_name(*key), ast.identifier_name(*value)))
                }
                _ => None,
            })
            .collect();
        assert!(props.contains(&(Some("readFile"), Some("rf"))));
        assert!(props.contains(&(Some("plain"), Some("plain"))));
    }

    #[test]
    fn test_lower_string_escapes() {
        let ast = parse(r#"var s = 'a\nb';"#, Language::JavaScript).unwrap();
        let lit = ast
            .node_ids()
            .find_map(|id| ast.string_literal(id))
            .unwrap();
        assert_eq!(lit, "a\nb");
    }

    #[test]
    fn test_lower_typescript_as_expression_is_transparent() {
        let ast = parse("const p = require('pkg' as string);", Language::TypeScript).unwrap();
        let call = ast
            .node_ids()
            .find(|id| matches!(ast.kind(*id), NodeKind::CallExpression { .. }))
            .unwrap();
        let NodeKind::CallExpression { arguments, .. } = ast.kind(call) else {
            unreachable!();
        };
        assert_eq!(ast.string_literal(arguments[0]), Some("pkg"));
    }

    #[test]
    fn test_unknown_constructs_become_other() {
        let ast = parse("class C { m() { return 1; } }", Language::JavaScript).unwrap();
        assert!(ast
            .node_ids()
            .any(|id| matches!(ast.kind(id), NodeKind::Other { .. })));
        // The method body is still reachable as a function node.
        assert!(ast
            .node_ids()
            .any(|id| matches!(ast.kind(id), NodeKind::Function { .. })));
    }
}
