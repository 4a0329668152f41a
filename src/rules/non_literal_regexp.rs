//! Rule: detect `RegExp` constructed from a non-static pattern.
//!
//! Both `new RegExp(p)` and the bare call form `RegExp(p)` are checked,
//! since the two are equivalent at runtime.

use super::{Rule, RuleContext};
use crate::ast::{NodeId, NodeKind};
use crate::types::{Finding, FindingCategory, Severity};

pub struct NonLiteralRegexpRule;

impl NonLiteralRegexpRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NonLiteralRegexpRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NonLiteralRegexpRule {
    fn id(&self) -> &'static str {
        "detect-non-literal-regexp"
    }

    fn title(&self) -> &'static str {
        "Non-literal RegExp constructor"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::RegexDos
    }

    fn handles(&self, kind: &NodeKind) -> bool {
        matches!(
            kind,
            NodeKind::NewExpression { .. } | NodeKind::CallExpression { .. }
        )
    }

    fn check(&self, cx: &RuleContext, node: NodeId) -> Vec<Finding> {
        let (callee, arguments) = match cx.ast().kind(node) {
            NodeKind::NewExpression { callee, arguments } => (*callee, arguments),
            NodeKind::CallExpression { callee, arguments } => (*callee, arguments),
            _ => return Vec::new(),
        };
        if cx.ast().identifier_name(callee) != Some("RegExp") {
            return Vec::new();
        }
        let Some(first) = arguments.first() else {
            return Vec::new();
        };
        if !matches!(cx.ast().kind(*first), NodeKind::SpreadElement { .. }) && cx.is_static(*first)
        {
            return Vec::new();
        }

        vec![Finding::new(
            self.id(),
            self.title(),
            "Found non-literal argument to RegExp Constructor",
            self.severity(),
            self.category(),
            cx.location(node),
            cx.snippet(node),
        )
        .with_remediation(
            "Escape or validate the pattern, or use a regex engine with linear-time matching.",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    #[test]
    fn test_literal_pattern_is_valid() {
        let messages = run_rule(&NonLiteralRegexpRule::new(), "new RegExp('ab+c', 'i');");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_non_literal_new_reported() {
        let messages = run_rule(&NonLiteralRegexpRule::new(), "new RegExp(input, 'i');");
        assert_eq!(
            messages,
            vec!["Found non-literal argument to RegExp Constructor"]
        );
    }

    #[test]
    fn test_call_form_reported() {
        let messages = run_rule(&NonLiteralRegexpRule::new(), "RegExp(input);");
        assert_eq!(
            messages,
            vec!["Found non-literal argument to RegExp Constructor"]
        );
    }

    #[test]
    fn test_const_literal_binding_is_valid() {
        let messages = run_rule(
            &NonLiteralRegexpRule::new(),
            "const pattern = 'ab+c'; new RegExp(pattern);",
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn test_dynamic_template_reported() {
        let messages = run_rule(
            &NonLiteralRegexpRule::new(),
            "new RegExp(`^${prefix}`, 'i');",
        );
        assert_eq!(
            messages,
            vec!["Found non-literal argument to RegExp Constructor"]
        );
    }

    #[test]
    fn test_zero_argument_constructor_ignored() {
        let messages = run_rule(&NonLiteralRegexpRule::new(), "new RegExp();");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_unrelated_constructor_ignored() {
        let messages = run_rule(&NonLiteralRegexpRule::new(), "new Matcher(input);");
        assert!(messages.is_empty());
    }
}
