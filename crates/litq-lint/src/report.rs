//! Ordered lint reports.

use std::{cmp::Reverse, collections::BTreeSet, fmt, slice};

use litq_query::{Diagnostic, Severity, Span};
use serde::{Deserialize, Serialize};

/// The diagnostics for one query, de-duplicated and in report order.
///
/// Order is by span start (diagnostics without a span first), then severity
/// with the most severe first, then code, then span end. Two diagnostics with
/// the same code and span are reported once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    /// Diagnostics in report order.
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Orders and de-duplicates `diagnostics`. The first of a duplicate pair
    /// is kept.
    pub fn new(diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        let mut seen = BTreeSet::new();
        let mut diagnostics: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|d| seen.insert((d.code().to_string(), d.span())))
            .collect();
        diagnostics.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        Self { diagnostics }
    }

    /// Diagnostics in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterates in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether the query is clean.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Whether any diagnostic is fatal.
    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    /// Whether any diagnostic is an error or worse.
    pub fn has_errors(&self) -> bool {
        self.max_severity()
            .is_some_and(|severity| severity >= Severity::Error)
    }

    /// Number of diagnostics with exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    /// The report restricted to diagnostics at `min` or above.
    pub fn at_least(&self, min: Severity) -> Self {
        Self {
            diagnostics: self
                .diagnostics
                .iter()
                .filter(|d| d.severity() >= min)
                .cloned()
                .collect(),
        }
    }

    /// The most severe diagnostic's severity.
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }

    /// Renders every diagnostic, pointing into `source` when the query came
    /// from a string.
    pub fn render(&self, source: Option<&str>) -> String {
        Rendered {
            report: self,
            source,
        }
        .to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Rendered {
            report: self,
            source: None,
        }
        .fmt(f)
    }
}

/// A report paired with the text it was produced from.
struct Rendered<'a> {
    /// The report.
    report: &'a Report,
    /// Query text, for caret lines.
    source: Option<&'a str>,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in self.report {
            writeln!(
                f,
                "{}[{}]: {}",
                diagnostic.severity(),
                diagnostic.code(),
                diagnostic.message()
            )?;
            if let (Some(source), Some(span)) = (self.source, diagnostic.span()) {
                let (offset, width) = caret(source, span);
                writeln!(f, "  {source}")?;
                writeln!(f, "  {}{}", " ".repeat(offset), "^".repeat(width))?;
            }
            if let Some(hint) = diagnostic.fix_hint() {
                writeln!(f, "hint: {hint}")?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Diagnostic;
    type IntoIter = slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// Sort key for report order.
fn sort_key(d: &Diagnostic) -> (Option<usize>, Reverse<Severity>, &str, Option<usize>) {
    (
        d.span().map(|s| s.start),
        Reverse(d.severity()),
        d.code(),
        d.span().map(|s| s.end),
    )
}

/// Column and width of the caret line, in characters. Spans outside the
/// source are clamped to its end.
fn caret(source: &str, span: Span) -> (usize, usize) {
    let column = |byte: usize| {
        let byte = byte.min(source.len());
        source
            .char_indices()
            .take_while(|(i, _)| *i < byte)
            .count()
    };
    let start = column(span.start);
    let end = column(span.end);
    (start, end.saturating_sub(start).max(1))
}
