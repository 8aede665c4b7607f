//! Diagnostic values shared by the parser and the linter.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ParseSeverityError, platform::Platform, span::Span};

/// How serious a diagnostic is.
///
/// Ordered by rank: `Warning < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Style or portability problem; the query still runs.
    Warning,
    /// The query runs but a platform will reject or misread part of it.
    Error,
    /// The query cannot be parsed as written.
    Fatal,
}

impl Severity {
    /// Code prefix used by rules of this severity.
    pub const fn code_prefix(self) -> char {
        match self {
            Self::Warning => 'W',
            Self::Error => 'E',
            Self::Fatal => 'F',
        }
    }

    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseSeverityError {
                name: s.to_string(),
            }),
        }
    }
}

/// A single finding about a query.
///
/// Created by a lint rule or by the parser's recovery path and never mutated
/// afterwards; the `with_*` methods consume and return the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule code, e.g. `W0007`.
    code: String,
    /// Severity after platform overrides.
    severity: Severity,
    /// Human-readable message.
    message: String,
    /// Location in the original input, if the finding has one.
    span: Option<Span>,
    /// Platforms the finding applies to.
    scope: BTreeSet<Platform>,
    /// Suggested fix.
    fix_hint: Option<String>,
}

impl Diagnostic {
    /// Creates a diagnostic scoped to the generic profile.
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            span: None,
            scope: BTreeSet::from([Platform::All]),
            fix_hint: None,
        }
    }

    /// Attaches a source span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Replaces the scope.
    pub fn with_scope(mut self, scope: BTreeSet<Platform>) -> Self {
        self.scope = scope;
        self
    }

    /// Attaches a fix hint.
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Rule code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Severity.
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source span.
    pub const fn span(&self) -> Option<Span> {
        self.span
    }

    /// Platforms the finding applies to.
    pub const fn scope(&self) -> &BTreeSet<Platform> {
        &self.scope
    }

    /// Suggested fix.
    pub fn fix_hint(&self) -> Option<&str> {
        self.fix_hint.as_deref()
    }

    /// Whether the diagnostic is fatal.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {}..{}", span.start, span.end)?;
        }
        Ok(())
    }
}

/// Problems the parsers detect while building a tree.
///
/// All of them are fatal. Each variant carries the metadata the rule registry
/// publishes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParseIssue {
    /// `(` without a matching `)`.
    UnmatchedOpeningParenthesis,
    /// `)` without a matching `(`.
    UnmatchedClosingParenthesis,
    /// An operator with nothing to apply to.
    MissingOperand,
    /// `ti:` followed by neither a term nor a group.
    DanglingFieldQualifier,
    /// `()`.
    EmptyParentheses,
    /// Groups, negations or list records nested past [`MAX_DEPTH`].
    ///
    /// [`MAX_DEPTH`]: crate::MAX_DEPTH
    NestingTooDeep,
    /// `""` or a phrase of only whitespace.
    EmptyPhrase,
    /// A list record with the wrong shape.
    MalformedRecord,
    /// A list record naming an unknown operator.
    UnknownOperator,
    /// A list record with the wrong number of operands.
    InvalidOperandCount,
    /// A list reference that is out of range, cyclic, shared or unused.
    InvalidRecordReference,
    /// A list term containing a double quote, which query strings cannot
    /// express.
    QuoteInTerm,
    /// A list field name the query syntax cannot write as `field:`.
    InvalidFieldName,
}

impl ParseIssue {
    /// Every parser issue, in code order.
    pub const ALL: [Self; 13] = [
        Self::UnmatchedOpeningParenthesis,
        Self::UnmatchedClosingParenthesis,
        Self::MissingOperand,
        Self::DanglingFieldQualifier,
        Self::EmptyParentheses,
        Self::NestingTooDeep,
        Self::EmptyPhrase,
        Self::MalformedRecord,
        Self::UnknownOperator,
        Self::InvalidOperandCount,
        Self::InvalidRecordReference,
        Self::QuoteInTerm,
        Self::InvalidFieldName,
    ];

    /// Rule code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnmatchedOpeningParenthesis => "F1002",
            Self::UnmatchedClosingParenthesis => "F1003",
            Self::MissingOperand => "F1004",
            Self::DanglingFieldQualifier => "F1005",
            Self::EmptyParentheses => "F1006",
            Self::NestingTooDeep => "F1007",
            Self::EmptyPhrase => "F1008",
            Self::MalformedRecord => "F1010",
            Self::UnknownOperator => "F1011",
            Self::InvalidOperandCount => "F1012",
            Self::InvalidRecordReference => "F1013",
            Self::QuoteInTerm => "F1014",
            Self::InvalidFieldName => "F1015",
        }
    }

    /// Kebab-case rule name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnmatchedOpeningParenthesis => "unmatched-opening-parenthesis",
            Self::UnmatchedClosingParenthesis => "unmatched-closing-parenthesis",
            Self::MissingOperand => "missing-operand",
            Self::DanglingFieldQualifier => "dangling-field-qualifier",
            Self::EmptyParentheses => "empty-parentheses",
            Self::NestingTooDeep => "nesting-too-deep",
            Self::EmptyPhrase => "empty-phrase",
            Self::MalformedRecord => "malformed-record",
            Self::UnknownOperator => "unknown-operator",
            Self::InvalidOperandCount => "invalid-operand-count",
            Self::InvalidRecordReference => "invalid-record-reference",
            Self::QuoteInTerm => "quote-in-term",
            Self::InvalidFieldName => "invalid-field-name",
        }
    }

    /// Message used when no detail is available.
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnmatchedOpeningParenthesis => "opening parenthesis is never closed",
            Self::UnmatchedClosingParenthesis => "closing parenthesis has no matching opener",
            Self::MissingOperand => "operator is missing an operand",
            Self::DanglingFieldQualifier => "field qualifier is not followed by a term or group",
            Self::EmptyParentheses => "parentheses contain nothing",
            Self::NestingTooDeep => "query is nested too deeply",
            Self::EmptyPhrase => "phrase is empty",
            Self::MalformedRecord => "list record is malformed",
            Self::UnknownOperator => "list record uses an unknown operator",
            Self::InvalidOperandCount => "operator has the wrong number of operands",
            Self::InvalidRecordReference => "list record reference is invalid",
            Self::QuoteInTerm => "term contains a double quote",
            Self::InvalidFieldName => "field name is not a single word",
        }
    }

    /// Suggested fix.
    pub const fn fix_hint(self) -> &'static str {
        match self {
            Self::UnmatchedOpeningParenthesis => "add a closing parenthesis",
            Self::UnmatchedClosingParenthesis => "remove the parenthesis or add a matching '('",
            Self::MissingOperand => "add a term on both sides of the operator",
            Self::DanglingFieldQualifier => "put a term or parenthesized group after the field",
            Self::EmptyParentheses => "remove the parentheses or add terms inside them",
            Self::NestingTooDeep => "flatten the query or split it into separate searches",
            Self::EmptyPhrase => "remove the quotes or put words between them",
            Self::MalformedRecord => {
                "records need an operator and operands, leaves need a non-empty term"
            }
            Self::UnknownOperator => "use one of AND, OR, NOT or NEAR",
            Self::InvalidOperandCount => "AND, OR and NEAR need two operands, NOT exactly one",
            Self::InvalidRecordReference => "reference each record exactly once, without cycles",
            Self::QuoteInTerm => "remove the double quote from the term",
            Self::InvalidFieldName => "use a field name without spaces, colons, quotes or parentheses",
        }
    }

    /// A query that triggers the issue.
    pub const fn example(self) -> &'static str {
        match self {
            Self::UnmatchedOpeningParenthesis => "(a AND b OR c",
            Self::UnmatchedClosingParenthesis => "a AND b) OR c",
            Self::MissingOperand => "a AND",
            Self::DanglingFieldQualifier => "ti: AND b",
            Self::EmptyParentheses => "a AND ()",
            Self::NestingTooDeep => "NOT NOT NOT ... a",
            Self::EmptyPhrase => "a AND \"\"",
            Self::MalformedRecord => r#"[{"operator": "AND"}]"#,
            Self::UnknownOperator => r#"[{"operator": "XOR", "operands": ["a", "b"]}]"#,
            Self::InvalidOperandCount => r#"[{"operator": "AND", "operands": ["a"]}]"#,
            Self::InvalidRecordReference => r#"[{"operator": "AND", "operands": ["a", 7]}]"#,
            Self::QuoteInTerm => r#"[{"term": "say \"hi\"", "exact": true}]"#,
            Self::InvalidFieldName => r#"[{"term": "x", "field": "mesh terms"}]"#,
        }
    }

    /// The example, corrected.
    pub const fn corrected(self) -> &'static str {
        match self {
            Self::UnmatchedOpeningParenthesis => "(a AND b) OR c",
            Self::UnmatchedClosingParenthesis => "(a AND b) OR c",
            Self::MissingOperand => "a AND b",
            Self::DanglingFieldQualifier => "ti:a AND b",
            Self::EmptyParentheses => "a",
            Self::NestingTooDeep => "NOT a",
            Self::EmptyPhrase => "a",
            Self::MalformedRecord => r#"[{"operator": "AND", "operands": ["a", "b"]}]"#,
            Self::UnknownOperator => r#"[{"operator": "OR", "operands": ["a", "b"]}]"#,
            Self::InvalidOperandCount => r#"[{"operator": "AND", "operands": ["a", "b"]}]"#,
            Self::InvalidRecordReference => {
                r#"[{"operator": "AND", "operands": ["a", 1]}, {"operator": "OR", "operands": ["b", "c"]}]"#
            }
            Self::QuoteInTerm => r#"[{"term": "say hi", "exact": true}]"#,
            Self::InvalidFieldName => r#"[{"term": "x", "field": "mh"}]"#,
        }
    }

    /// Builds a diagnostic, appending `detail` to the message.
    pub fn diagnostic(self, span: Option<Span>, detail: Option<&str>) -> Diagnostic {
        let message = match detail {
            Some(detail) => format!("{}: {detail}", self.message()),
            None => self.message().to_string(),
        };
        let diagnostic =
            Diagnostic::new(self.code(), Severity::Fatal, message).with_fix_hint(self.fix_hint());
        match span {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ranks() {
        assert!(Severity::Fatal > Severity::Error);
        assert!(Severity::Error > Severity::Warning);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
        let err = "info".parse::<Severity>().unwrap_err();
        assert_eq!(err.name, "info");
    }

    #[test]
    fn parse_issue_codes_are_fatal_and_unique() {
        let mut codes: Vec<&str> = ParseIssue::ALL.iter().map(|i| i.code()).collect();
        assert!(codes.iter().all(|c| c.starts_with('F')));
        assert!(codes.is_sorted());
        codes.dedup();
        assert_eq!(codes.len(), ParseIssue::ALL.len());
    }

    #[test]
    fn diagnostic_with_detail() {
        let d = ParseIssue::MissingOperand.diagnostic(Some(Span::new(2, 5)), Some("'AND'"));
        assert_eq!(d.code(), "F1004");
        assert!(d.is_fatal());
        assert_eq!(d.message(), "operator is missing an operand: 'AND'");
        assert_eq!(d.scope(), &BTreeSet::from([Platform::All]));
        assert_eq!(d.to_string(), "fatal[F1004]: operator is missing an operand: 'AND' at 2..5");
    }

    #[test]
    fn serializes_severity_lowercase() {
        let d = Diagnostic::new("W0001", Severity::Warning, "duplicate operand");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["scope"][0], "all");
        assert!(json["span"].is_null());
    }
}
