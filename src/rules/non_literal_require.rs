//! Rule: detect `require()` calls with a non-static module argument.

use super::{Rule, RuleContext};
use crate::ast::{NodeId, NodeKind};
use crate::types::{Finding, FindingCategory, Severity};

pub struct NonLiteralRequireRule;

impl NonLiteralRequireRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NonLiteralRequireRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NonLiteralRequireRule {
    fn id(&self) -> &'static str {
        "detect-non-literal-require"
    }

    fn title(&self) -> &'static str {
        "Non-literal require"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::CodeLoading
    }

    fn handles(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::CallExpression { .. })
    }

    fn check(&self, cx: &RuleContext, node: NodeId) -> Vec<Finding> {
        let NodeKind::CallExpression { callee, arguments } = cx.ast().kind(node) else {
            return Vec::new();
        };
        if cx.ast().identifier_name(*callee) != Some("require") {
            return Vec::new();
        }
        let Some(first) = arguments.first() else {
            return Vec::new();
        };
        // A spread hides the module name entirely; nothing to judge.
        if matches!(cx.ast().kind(*first), NodeKind::SpreadElement { .. }) {
            return Vec::new();
        }
        if cx.is_static(*first) {
            return Vec::new();
        }

        vec![Finding::new(
            self.id(),
            self.title(),
            "Found non-literal argument in require",
            self.severity(),
            self.category(),
            cx.location(node),
            cx.snippet(node),
        )
        .with_remediation(
            "Map user input to an allow-list of module names instead of requiring it directly.",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    #[test]
    fn test_literal_require_is_valid() {
        let messages = run_rule(&NonLiteralRequireRule::new(), "require('lodash');");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_template_literal_is_valid() {
        let messages = run_rule(&NonLiteralRequireRule::new(), "require(`lodash`);");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_dirname_concat_is_valid() {
        let messages = run_rule(
            &NonLiteralRequireRule::new(),
            "require(__dirname + '/lib/helper');",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_path_join_is_valid() {
        let messages = run_rule(
            &NonLiteralRequireRule::new(),
            "var path = require('path'); require(path.resolve(__dirname, 'helper'));",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_identifier_reported() {
        let messages = run_rule(&NonLiteralRequireRule::new(), "require(name);");
        assert_eq!(messages, vec!["Found non-literal argument in require"]);
    }

    #[test]
    fn test_dynamic_template_reported() {
        let messages = run_rule(
            &NonLiteralRequireRule::new(),
            "require(`./plugins/${name}`);",
        );
        assert_eq!(messages, vec!["Found non-literal argument in require"]);
    }

    #[test]
    fn test_const_literal_binding_is_valid() {
        let messages = run_rule(
            &NonLiteralRequireRule::new(),
            "const mod = 'lodash'; require(mod);",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_reassigned_binding_reported() {
        let messages = run_rule(
            &NonLiteralRequireRule::new(),
            "var mod = 'lodash'; mod = input; require(mod);",
        );
        assert_eq!(messages, vec!["Found non-literal argument in require"]);
    }

    #[test]
    fn test_spread_argument_ignored() {
        let messages = run_rule(&NonLiteralRequireRule::new(), "require(...mods);");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_zero_argument_require_ignored() {
        let messages = run_rule(&NonLiteralRequireRule::new(), "require();");
        assert!(messages.is_empty());
    }
}
