//! Local record matching.
//!
//! Checks whether an in-memory bibliographic record satisfies a query, the
//! way retrieved records are screened before they are kept. Terms match whole
//! words case-insensitively; `*` and `$` match any word suffix, `?` and `#`
//! at most one character. NEAR is approximated as AND.
//!
//! Queries compile to a postfix program evaluated with a value stack, so
//! nesting depth is bounded only by memory.

use std::collections::BTreeMap;

use log::debug;
use regex::Regex;

use crate::qom::{NodeKind, OperatorKind, Query, Term};

/// A bibliographic record: field name (`title`, `abstract`, ...) to text.
pub type Record = BTreeMap<String, String>;

/// A query compiled for repeated matching.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Postfix program; empty for an empty query.
    program: Vec<Step>,
}

/// One instruction of a compiled query.
#[derive(Debug, Clone)]
enum Step {
    /// Push whether a leaf matches.
    Term {
        /// Whole-word pattern.
        pattern: Regex,
        /// Record fields to search.
        fields: Vec<String>,
    },
    /// Pop `n` values, push whether all were true.
    All(usize),
    /// Pop `n` values, push whether any was true.
    Any(usize),
    /// Pop one value, push its negation.
    Not,
    /// Push false (empty or uncompilable term).
    Never,
}

impl Matcher {
    /// Compiles `query`.
    pub fn new(query: &Query) -> Self {
        let mut program = Vec::new();
        // Post-order visits are already in postfix order.
        let compiled = query.fold(|_, node, children: Vec<()>| {
            program.push(match &node.kind {
                NodeKind::Term(term) => compile_term(term),
                NodeKind::Operator(op) => match op.kind {
                    OperatorKind::And | OperatorKind::Near { .. } => Step::All(children.len()),
                    OperatorKind::Or => Step::Any(children.len()),
                    OperatorKind::Not => Step::Not,
                },
            });
        });
        if compiled.is_none() {
            program.clear();
        }
        Self { program }
    }

    /// Whether `record` satisfies the query. Empty queries select nothing.
    pub fn selects(&self, record: &Record) -> bool {
        let mut values: Vec<bool> = Vec::new();
        for step in &self.program {
            let value = match step {
                Step::Term { pattern, fields } => fields
                    .iter()
                    .filter_map(|field| record.get(field))
                    .any(|text| pattern.is_match(text)),
                Step::All(n) => pop_n(&mut values, *n).iter().all(|v| *v),
                Step::Any(n) => pop_n(&mut values, *n).iter().any(|v| *v),
                Step::Not => !values.pop().unwrap_or(true),
                Step::Never => false,
            };
            values.push(value);
        }
        values.pop().unwrap_or(false)
    }
}

/// Removes the last `n` values.
fn pop_n(values: &mut Vec<bool>, n: usize) -> Vec<bool> {
    values.split_off(values.len().saturating_sub(n))
}

/// Compiles a leaf into a whole-word pattern.
fn compile_term(term: &Term) -> Step {
    let words: Vec<String> = term.value.split_whitespace().map(translate).collect();
    if words.is_empty() {
        return Step::Never;
    }

    let pattern = format!(
        r"(?i)(?:^|[^\p{{L}}\p{{N}}]){}(?:$|[^\p{{L}}\p{{N}}])",
        words.join(r"[\s\p{P}]+")
    );
    match Regex::new(&pattern) {
        Ok(pattern) => Step::Term {
            pattern,
            fields: record_fields(term.field.as_deref()),
        },
        Err(err) => {
            debug!("term '{}' did not compile: {err}", term.value);
            Step::Never
        }
    }
}

/// Translates a word into a regex fragment, expanding wildcards.
fn translate(word: &str) -> String {
    let mut fragment = String::new();
    for ch in word.chars() {
        match ch {
            '*' | '$' => fragment.push_str(r"[\p{L}\p{N}]*"),
            '?' | '#' => fragment.push_str(r"[\p{L}\p{N}]?"),
            _ => fragment.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
        }
    }
    fragment
}

/// Record fields searched for a canonical field qualifier.
fn record_fields(field: Option<&str>) -> Vec<String> {
    let lower = field.map(str::to_ascii_lowercase);
    let names: &[&str] = match lower.as_deref() {
        None | Some("tiab") => &["title", "abstract"],
        Some("ti") => &["title"],
        Some("ab") => &["abstract"],
        Some("au") => &["author"],
        Some("kw") => &["keywords"],
        Some("so") => &["journal"],
        Some(other) => return vec![other.to_string()],
    };
    names.iter().map(|name| (*name).to_string()).collect()
}
