//! Rule definitions.

use std::{collections::BTreeSet, vec};

use litq_query::{Diagnostic, Platform, Query, Severity, Span, Token};

/// Signature of a rule check.
pub type CheckFn = fn(&RuleContext<'_>, &mut Findings);

/// How a rule inspects a query.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// Walks the token stream. Skipped for list-format input.
    Tokens(CheckFn),
    /// Walks the query tree. Skipped for empty queries.
    Tree(CheckFn),
    /// Raised by the parser during error recovery; the linter merges these
    /// instead of recomputing them.
    Parser,
}

/// A registered lint rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Unique code; the prefix encodes the severity (`F`, `E`, `W`).
    pub code: &'static str,
    /// Kebab-case name.
    pub name: &'static str,
    /// Default severity.
    pub severity: Severity,
    /// Platforms the rule applies to.
    pub scope: &'static [Platform],
    /// Message; findings may append a detail after a colon.
    pub message: &'static str,
    /// Suggested fix.
    pub fix_hint: &'static str,
    /// A query that triggers the rule.
    pub example: &'static str,
    /// The example, corrected.
    pub corrected: &'static str,
    /// The check to run.
    pub check: Check,
}

impl Rule {
    /// The declared scope as a set.
    pub fn scope_set(&self) -> BTreeSet<Platform> {
        self.scope.iter().copied().collect()
    }

    /// The message with an optional detail appended.
    pub fn message_with(&self, detail: Option<&str>) -> String {
        match detail {
            Some(detail) => format!("{}: {detail}", self.message),
            None => self.message.to_string(),
        }
    }

    /// Builds the diagnostic for one finding.
    pub fn diagnostic(
        &self,
        finding: Finding,
        severity: Severity,
        scope: &BTreeSet<Platform>,
    ) -> Diagnostic {
        let diagnostic = Diagnostic::new(
            self.code,
            severity,
            self.message_with(finding.detail.as_deref()),
        )
        .with_scope(finding.scope.unwrap_or_else(|| scope.clone()))
        .with_fix_hint(self.fix_hint);
        match finding.span {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        }
    }
}

/// What a check can see.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Tokens of a string query; empty for list input.
    pub tokens: &'a [Token],
    /// The parsed tree.
    pub query: &'a Query,
    /// Targeted platforms the rule is active for.
    pub platforms: &'a BTreeSet<Platform>,
}

/// A single rule match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finding {
    /// Where the problem is.
    pub span: Option<Span>,
    /// Detail appended to the rule message.
    pub detail: Option<String>,
    /// Narrower scope, when only some active platforms are affected.
    pub scope: Option<BTreeSet<Platform>>,
}

/// Findings collected by one check.
#[derive(Debug, Clone, Default)]
pub struct Findings(Vec<Finding>);

impl Findings {
    /// Records a finding at `span`.
    pub fn push(&mut self, span: Span) {
        self.0.push(Finding {
            span: Some(span),
            ..Finding::default()
        });
    }

    /// Records a finding at `span` with a message detail.
    pub fn push_detail(&mut self, span: Span, detail: impl Into<String>) {
        self.0.push(Finding {
            span: Some(span),
            detail: Some(detail.into()),
            scope: None,
        });
    }

    /// Records a finding that only affects `scope`.
    pub fn push_scoped(&mut self, span: Span, detail: impl Into<String>, scope: BTreeSet<Platform>) {
        self.0.push(Finding {
            span: Some(span),
            detail: Some(detail.into()),
            scope: Some(scope),
        });
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
