//! Terminal styling, tree rendering and JSON serialization for CLI output.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use litq_lint::Report;
use litq_query::{Node, NodeKind, Query, Severity};
use serde::Serialize;

/// ANSI color codes for terminal output.
pub mod colors {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan text (for headers).
    pub const CYAN: &str = "\x1b[36m";
    /// Green text (for success).
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow text (for warnings).
    pub const YELLOW: &str = "\x1b[33m";
    /// Red text (for errors).
    pub const RED: &str = "\x1b[31m";
    /// Dim/gray text (for less important info).
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Wraps `text` in `codes` when stdout is a terminal.
fn paint(codes: &[&str], text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("{}{text}{}", codes.concat(), colors::RESET)
    } else {
        text.to_string()
    }
}

/// Formats a header with bold cyan styling.
pub fn header(text: &str) -> String {
    paint(&[colors::BOLD, colors::CYAN], text)
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    paint(&[colors::BOLD], text)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    paint(&[colors::DIM], text)
}

/// Formats text as a success message (green).
pub fn success(text: &str) -> String {
    paint(&[colors::GREEN], text)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    paint(&[colors::YELLOW], text)
}

/// Formats text as an error (red).
pub fn error(text: &str) -> String {
    paint(&[colors::RED], text)
}

/// Colors a severity name.
pub fn severity(severity: Severity) -> String {
    match severity {
        Severity::Warning => warning(severity.name()),
        Severity::Error | Severity::Fatal => error(severity.name()),
    }
}

/// Indents every line of `content` by four spaces.
pub fn indent_content(content: &str) -> String {
    content
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// One-line count of the diagnostics in `reports`, e.g. `1 error, 2 warnings`.
pub fn summary<'a>(reports: impl IntoIterator<Item = &'a Report>) -> String {
    let mut counts = [0usize; 3];
    for report in reports {
        counts[0] += report.count(Severity::Fatal);
        counts[1] += report.count(Severity::Error);
        counts[2] += report.count(Severity::Warning);
    }
    let parts: Vec<String> = [
        (counts[0], "fatal error"),
        (counts[1], "error"),
        (counts[2], "warning"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| plural(n, label))
    .collect();
    if parts.is_empty() {
        "no issues".to_string()
    } else {
        parts.join(", ")
    }
}

/// `n label`, with an `s` when `n` is not one.
fn plural(n: usize, label: &str) -> String {
    if n == 1 {
        format!("{n} {label}")
    } else {
        format!("{n} {label}s")
    }
}

/// Renders a query tree as a plain-text indented outline with source spans.
pub fn render_tree(query: &Query) -> String {
    let Some(root) = query.root() else {
        return "(empty)\n".to_string();
    };
    let mut out = String::new();
    let mut stack = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        let Some(node) = query.get(id) else { continue };
        out.push_str(&render_line(node, depth));
        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }
    out
}

/// One outline line for `node`.
fn render_line(node: &Node, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let span = format!("{}..{}", node.span.start, node.span.end);
    match &node.kind {
        NodeKind::Term(term) => {
            let value = if term.exact {
                format!("\"{}\"", term.value)
            } else {
                term.value.clone()
            };
            let field = term
                .field
                .as_deref()
                .map(|f| format!(" [{f}]"))
                .unwrap_or_default();
            format!("{indent}{value}{field} {span}\n")
        }
        NodeKind::Operator(op) => {
            let mut flags = Vec::new();
            if op.explicit_parens {
                flags.push("parens");
            }
            if op.implicit_precedence {
                flags.push("implicit precedence");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            format!("{indent}{}{flags} {span}\n", op.kind)
        }
    }
}
