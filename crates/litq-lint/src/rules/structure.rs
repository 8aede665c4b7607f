//! Rules over the shape of the query tree.

use litq_query::{NodeId, NodeKind, OperatorKind, Platform, Query, Severity};

use super::GENERIC;
use crate::rule::{Check, Findings, Rule, RuleContext};

/// Scope of the implicit precedence rule: PubMed evaluates strictly left to
/// right, so unparenthesized mixes read differently there.
const PRECEDENCE_SCOPE: &[Platform] = &[Platform::All, Platform::PubMed];

/// Wildcard characters recognized by any platform.
const WILDCARDS: [char; 4] = ['*', '?', '$', '#'];

/// Tree structure rules.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "W0001",
            name: "duplicate-operand",
            severity: Severity::Warning,
            scope: GENERIC,
            message: "operand repeats an earlier sibling",
            fix_hint: "remove the repeated operand",
            example: "ai OR ml OR ai",
            corrected: "ai OR ml",
            check: Check::Tree(duplicate_operand),
        },
        Rule {
            code: "W0005",
            name: "nested-negation",
            severity: Severity::Warning,
            scope: GENERIC,
            message: "negation of a negation",
            fix_hint: "remove both NOTs, or restructure the exclusion",
            example: "a AND NOT (NOT b)",
            corrected: "a AND b",
            check: Check::Tree(nested_negation),
        },
        Rule {
            code: "W0007",
            name: "implicit-precedence",
            severity: Severity::Warning,
            scope: PRECEDENCE_SCOPE,
            message: "operators of different kinds are mixed without parentheses",
            fix_hint: "add parentheses to make the grouping explicit",
            example: "a AND b OR c",
            corrected: "(a AND b) OR c",
            check: Check::Tree(implicit_precedence),
        },
        Rule {
            code: "E0002",
            name: "leading-wildcard",
            severity: Severity::Error,
            scope: GENERIC,
            message: "term starts with a wildcard",
            fix_hint: "put at least one character before the wildcard",
            example: "*cancer",
            corrected: "cancer*",
            check: Check::Tree(leading_wildcard),
        },
    ]
}

/// W0001: an operand structurally equal to an earlier sibling.
fn duplicate_operand(ctx: &RuleContext<'_>, findings: &mut Findings) {
    let query = ctx.query;
    for id in query.preorder() {
        let children = query.node(id).children();
        for (i, child) in children.iter().enumerate() {
            if children[..i].iter().any(|prev| query.nodes_eq(*prev, *child)) {
                findings.push(query.node(*child).span);
            }
        }
    }
}

/// W0005: `NOT NOT x`.
fn nested_negation(ctx: &RuleContext<'_>, findings: &mut Findings) {
    let query = ctx.query;
    for id in query.preorder() {
        let node = query.node(id);
        let Some(op) = node.as_operator() else { continue };
        if op.kind != OperatorKind::Not {
            continue;
        }
        let negates_negation = op.children.iter().any(|child| {
            query
                .node(*child)
                .as_operator()
                .is_some_and(|inner| inner.kind == OperatorKind::Not)
        });
        if negates_negation {
            findings.push(node.span);
        }
    }
}

/// W0007: every node the parser flagged as crossing an operator boundary
/// without parentheses.
fn implicit_precedence(ctx: &RuleContext<'_>, findings: &mut Findings) {
    let query = ctx.query;
    for id in query.preorder() {
        let node = query.node(id);
        let Some(op) = node.as_operator() else { continue };
        if !op.implicit_precedence {
            continue;
        }
        let mixed = mixed_kinds(query, &op.children, op.kind);
        let detail = if mixed.is_empty() {
            format!("{} binds looser here", op.kind.keyword())
        } else {
            format!("{} inside {}", mixed.join(", "), op.kind.keyword())
        };
        findings.push_detail(node.span, detail);
    }
}

/// Keywords of unparenthesized operator children whose kind differs from
/// `parent`.
fn mixed_kinds(query: &Query, children: &[NodeId], parent: OperatorKind) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    for child in children {
        if let NodeKind::Operator(inner) = &query.node(*child).kind
            && !inner.explicit_parens
            && inner.kind.binary_op().is_some()
            && inner.kind.keyword() != parent.keyword()
            && !kinds.contains(&inner.kind.keyword())
        {
            kinds.push(inner.kind.keyword());
        }
    }
    kinds
}

/// E0002: `*cancer`.
fn leading_wildcard(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for (id, term) in ctx.query.terms() {
        if !term.exact && term.value.starts_with(WILDCARDS) {
            findings.push_detail(ctx.query.node(id).span, format!("'{}'", term.value));
        }
    }
}
