//! Rule: detect instances of `child_process` and non-literal `exec()` calls.
//!
//! Reports bare `require('child_process')` results that are never bound, and
//! `exec()` calls (resolved through the import chain) whose command argument
//! is not statically determined.

use super::{Rule, RuleContext};
use crate::ast::{NodeId, NodeKind};
use crate::types::{Finding, FindingCategory, Severity};

const CHILD_PROCESS_PACKAGE_NAMES: &[&str] = &["child_process", "node:child_process"];

pub struct ChildProcessRule;

impl ChildProcessRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChildProcessRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ChildProcessRule {
    fn id(&self) -> &'static str {
        "detect-child-process"
    }

    fn title(&self) -> &'static str {
        "Instance of child_process or non-literal exec()"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::CommandInjection
    }

    fn handles(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::CallExpression { .. })
    }

    fn check(&self, cx: &RuleContext, node: NodeId) -> Vec<Finding> {
        let NodeKind::CallExpression { callee, arguments } = cx.ast().kind(node) else {
            return Vec::new();
        };

        if cx.ast().identifier_name(*callee) == Some("require") {
            return self.check_require(cx, node, arguments);
        }

        // Reports non-literal exec() calls.
        let Some(first) = arguments.first() else {
            return Vec::new();
        };
        let first_is_spread = matches!(cx.ast().kind(*first), NodeKind::SpreadElement { .. });
        if !first_is_spread && cx.is_static(*first) {
            return Vec::new();
        }
        let Some(info) = cx.access_path(*callee, CHILD_PROCESS_PACKAGE_NAMES) else {
            return Vec::new();
        };
        if info.path.len() != 1 || info.path[0] != "exec" {
            return Vec::new();
        }

        vec![Finding::new(
            self.id(),
            self.title(),
            "Found child_process.exec() with non Literal first argument",
            self.severity(),
            self.category(),
            cx.location(node),
            cx.snippet(node),
        )
        .with_remediation("Build the command from fixed strings, or use execFile with a fixed binary and vetted arguments.")
        .with_metadata("package", info.package_name)
        .with_metadata("function", "exec")]
    }
}

impl ChildProcessRule {
    /// `require('child_process')` whose result is used without being bound
    /// to anything inspectable.
    fn check_require(&self, cx: &RuleContext, node: NodeId, arguments: &[NodeId]) -> Vec<Finding> {
        let Some(package) = arguments
            .first()
            .and_then(|arg| cx.ast().string_literal(*arg))
        else {
            return Vec::new();
        };
        if !CHILD_PROCESS_PACKAGE_NAMES.contains(&package) {
            return Vec::new();
        }
        let bound = matches!(
            cx.parent_kind(node),
            Some(
                NodeKind::VariableDeclarator { .. }
                    | NodeKind::AssignmentExpression { .. }
                    | NodeKind::MemberExpression { .. }
            )
        );
        if bound {
            return Vec::new();
        }

        vec![Finding::new(
            self.id(),
            self.title(),
            format!("Found require(\"{}\")", package),
            self.severity(),
            self.category(),
            cx.location(node),
            cx.snippet(node),
        )
        .with_metadata("package", package.to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    #[test]
    fn test_literal_exec_is_valid() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "var child = require('child_process'); child.exec('ls');",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_unbound_require_reported() {
        let messages = run_rule(&ChildProcessRule::new(), "require('child_process');");
        assert_eq!(messages, vec!["Found require(\"child_process\")"]);
    }

    #[test]
    fn test_bound_require_not_reported() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "var child = require('child_process');",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_non_literal_exec_through_alias() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "var child = require('child_process'); child.exec(com);",
        );
        assert_eq!(
            messages,
            vec!["Found child_process.exec() with non Literal first argument"]
        );
    }

    #[test]
    fn test_destructured_exec() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "var { exec } = require('node:child_process'); exec(cmd);",
        );
        assert_eq!(
            messages,
            vec!["Found child_process.exec() with non Literal first argument"]
        );
    }

    #[test]
    fn test_renamed_import_exec() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "import { exec as run } from 'child_process'; run(input);",
        );
        assert_eq!(
            messages,
            vec!["Found child_process.exec() with non Literal first argument"]
        );
    }

    #[test]
    fn test_spread_argument_reported() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "import { exec } from 'child_process'; exec(...args);",
        );
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_static_path_join_argument_is_valid() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "var { exec } = require('child_process');
             var path = require('path');
             exec(path.join(__dirname, 'bin/tool'));",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_execfile_not_reported() {
        let messages = run_rule(
            &ChildProcessRule::new(),
            "var { execFile } = require('child_process'); execFile(cmd);",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_unrelated_call_not_reported() {
        let messages = run_rule(&ChildProcessRule::new(), "doWork(userInput);");
        assert!(messages.is_empty());
    }
}
