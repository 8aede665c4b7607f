//! List-format parser.
//!
//! The list format describes a query as an array of linked records:
//!
//! ```json
//! [
//!   {"operator": "AND", "operands": [1, {"term": "ethics", "field": "ti"}]},
//!   {"operator": "OR", "operands": ["\"machine learning\"", "ai"]}
//! ]
//! ```
//!
//! Record 0 is the root. Operands are bare strings (quoted strings are exact
//! phrases), leaf objects, nested records, or integer references to another
//! top-level record. Every non-root record must be referenced exactly once.
//!
//! Nodes built here carry the synthetic span `{record, record + 1}` of the
//! top-level record they came from.
//!
//! Terms and field names must be writable in the query syntax: a term may
//! not contain a double quote, and a field name must be a single word.
//! Records nest, by reference or inline, at most [`MAX_DEPTH`] deep.

use std::slice;

use log::debug;
use serde_json::{Map, Value};

use crate::{
    diagnostic::{Diagnostic, ParseIssue},
    lexer::is_field_name,
    parser::{MAX_DEPTH, Parsed},
    qom::{Metadata, NodeId, NodeKind, OperatorKind, Origin, Query, Term},
    span::Span,
};

/// Builds a query tree from list-format records.
struct ListParser<'v> {
    /// Top-level records.
    records: &'v [Value],
    /// The tree under construction.
    query: Query,
    /// Structural diagnostics.
    diagnostics: Vec<Diagnostic>,
    /// Records on the current reference path, for cycle detection.
    visiting: Vec<bool>,
    /// Records already built.
    used: Vec<bool>,
    /// Current record nesting depth.
    nesting: usize,
    /// Whether some record was skipped for nesting too deeply.
    too_deep: bool,
}

impl<'v> ListParser<'v> {
    /// Creates a parser over `records`.
    fn new(records: &'v [Value]) -> Self {
        Self {
            records,
            query: Query::new(),
            diagnostics: Vec::new(),
            visiting: vec![false; records.len()],
            used: vec![false; records.len()],
            nesting: 0,
            too_deep: false,
        }
    }

    /// Builds the tree rooted at record 0 and checks that every record was
    /// reached.
    fn parse(mut self) -> Parsed {
        let root = if self.records.is_empty() {
            None
        } else {
            self.build_reference(0, 0)
        };
        self.query.set_root(root);

        // records below the depth limit were never reached
        let check_unused = !self.too_deep;
        for index in 1..self.records.len() {
            if check_unused && !self.used[index] {
                self.report(
                    ParseIssue::InvalidRecordReference,
                    index,
                    format!("record {index} is never referenced"),
                );
            }
        }

        debug!(
            "built {} list records into {} nodes, {} diagnostics",
            self.records.len(),
            self.query.preorder().len(),
            self.diagnostics.len()
        );

        Parsed {
            query: self.query,
            diagnostics: self.diagnostics,
            depth_balanced: true,
        }
    }

    /// Builds the top-level record `index`, referenced from record `from`.
    fn build_reference(&mut self, index: usize, from: usize) -> Option<NodeId> {
        if index >= self.records.len() {
            self.report(
                ParseIssue::InvalidRecordReference,
                from,
                format!("record {index} does not exist"),
            );
            return None;
        }
        if self.visiting[index] {
            self.report(
                ParseIssue::InvalidRecordReference,
                from,
                format!("record {index} refers back to itself"),
            );
            return None;
        }
        if self.used[index] {
            self.report(
                ParseIssue::InvalidRecordReference,
                from,
                format!("record {index} is referenced more than once"),
            );
            return None;
        }

        self.used[index] = true;
        self.visiting[index] = true;
        let records = self.records;
        let node = self.build_record(&records[index], index);
        self.visiting[index] = false;
        node
    }

    /// Builds a record object, either an operator record or a leaf.
    fn build_record(&mut self, value: &Value, index: usize) -> Option<NodeId> {
        if self.nesting >= MAX_DEPTH {
            if !self.too_deep {
                self.report(
                    ParseIssue::NestingTooDeep,
                    index,
                    format!("records nest more than {MAX_DEPTH} levels"),
                );
            }
            self.too_deep = true;
            return None;
        }
        self.nesting += 1;
        let node = self.build_record_at_depth(value, index);
        self.nesting -= 1;
        node
    }

    /// Builds a record once the depth check has passed.
    fn build_record_at_depth(&mut self, value: &Value, index: usize) -> Option<NodeId> {
        let Some(record) = value.as_object() else {
            self.report(
                ParseIssue::MalformedRecord,
                index,
                format!("record {index} is not an object"),
            );
            return None;
        };

        if record.contains_key("term") {
            return self.build_leaf(record, index);
        }

        let Some(name) = record.get("operator").and_then(Value::as_str) else {
            self.report(
                ParseIssue::MalformedRecord,
                index,
                format!("record {index} has no operator"),
            );
            return None;
        };
        let Some(mut kind) = OperatorKind::parse(name) else {
            self.report(ParseIssue::UnknownOperator, index, format!("'{name}'"));
            return None;
        };
        if let OperatorKind::Near { distance: None } = kind {
            let distance = record
                .get("distance")
                .and_then(Value::as_u64)
                .and_then(|d| u32::try_from(d).ok());
            kind = OperatorKind::Near { distance };
        }

        let Some(operands) = record.get("operands").and_then(Value::as_array) else {
            self.report(
                ParseIssue::MalformedRecord,
                index,
                format!("record {index} has no operand list"),
            );
            return None;
        };

        let children: Vec<NodeId> = operands
            .iter()
            .filter_map(|operand| self.build_operand(operand, index))
            .collect();

        self.finish_operator(kind, children, index, operands.len())
    }

    /// Builds one operand of record `index`.
    fn build_operand(&mut self, operand: &Value, index: usize) -> Option<NodeId> {
        match operand {
            Value::String(text) => self.build_string(text, index),
            Value::Number(number) => match number.as_u64().and_then(|n| usize::try_from(n).ok()) {
                Some(target) => self.build_reference(target, index),
                None => {
                    self.report(
                        ParseIssue::InvalidRecordReference,
                        index,
                        format!("'{number}' is not a record index"),
                    );
                    None
                }
            },
            Value::Object(_) => self.build_record(operand, index),
            _ => {
                self.report(
                    ParseIssue::MalformedRecord,
                    index,
                    format!("record {index} has an operand that is not a string, object or index"),
                );
                None
            }
        }
    }

    /// Builds a leaf from a bare string operand. Surrounding double quotes
    /// mark an exact phrase.
    fn build_string(&mut self, text: &str, index: usize) -> Option<NodeId> {
        let term = match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            Some(inner) => Term::phrase(inner),
            None => Term::new(text),
        };
        if term.value.trim().is_empty() {
            self.report(
                ParseIssue::MalformedRecord,
                index,
                format!("record {index} has an empty term"),
            );
            return None;
        }
        if term.value.contains('"') {
            self.report(ParseIssue::QuoteInTerm, index, format!("'{}'", term.value));
            return None;
        }
        Some(self.query.add_term(term, synthetic_span(index), Origin::List))
    }

    /// Builds a leaf object `{"term", "field"?, "exact"?}`.
    fn build_leaf(&mut self, record: &Map<String, Value>, index: usize) -> Option<NodeId> {
        let Some(text) = record.get("term").and_then(Value::as_str) else {
            self.report(
                ParseIssue::MalformedRecord,
                index,
                format!("record {index} has a term that is not a string"),
            );
            return None;
        };

        let field = match record.get("field") {
            None | Some(Value::Null) => None,
            Some(Value::String(field)) if is_field_name(field) => Some(field.clone()),
            Some(Value::String(field)) => {
                self.report(ParseIssue::InvalidFieldName, index, format!("'{field}'"));
                return None;
            }
            Some(_) => {
                self.report(
                    ParseIssue::MalformedRecord,
                    index,
                    format!("record {index} has a field that is not a string"),
                );
                return None;
            }
        };

        let id = self.build_string(text, index)?;
        let exact_flag = record.get("exact").and_then(Value::as_bool);
        if let Some(term) = self.term_mut(id) {
            term.field = field;
            if let Some(exact) = exact_flag {
                term.exact = exact;
            }
        }
        Some(id)
    }

    /// Mutable access to a freshly built leaf.
    fn term_mut(&mut self, id: NodeId) -> Option<&mut Term> {
        match &mut self.query.node_mut(id).kind {
            NodeKind::Term(term) => Some(term),
            NodeKind::Operator(_) => None,
        }
    }

    /// Checks operand counts and builds the operator node, recovering where
    /// the count is wrong.
    fn finish_operator(
        &mut self,
        kind: OperatorKind,
        mut children: Vec<NodeId>,
        index: usize,
        declared: usize,
    ) -> Option<NodeId> {
        if !kind.accepts_arity(declared) {
            self.report(
                ParseIssue::InvalidOperandCount,
                index,
                format!("{kind} in record {index} has {declared} operands"),
            );
        }

        let span = synthetic_span(index);
        match (kind, children.len()) {
            (_, 0) => None,
            (OperatorKind::Not, 1) => {
                Some(self.query.add_operator(kind, children, span, Origin::List))
            }
            // NOT over several operands reads as `first AND NOT rest...`
            (OperatorKind::Not, _) => {
                let first = children.remove(0);
                let mut conjuncts = vec![first];
                for child in children {
                    conjuncts.push(self.query.add_operator(
                        OperatorKind::Not,
                        vec![child],
                        span,
                        Origin::List,
                    ));
                }
                Some(
                    self.query
                        .add_operator(OperatorKind::And, conjuncts, span, Origin::List),
                )
            }
            (_, 1) => children.pop(),
            _ => Some(self.query.add_operator(kind, children, span, Origin::List)),
        }
    }

    /// Records a structural diagnostic against record `index`.
    fn report(&mut self, issue: ParseIssue, index: usize, detail: String) {
        self.diagnostics
            .push(issue.diagnostic(Some(synthetic_span(index)), Some(&detail)));
    }
}

/// The synthetic span of top-level record `index`.
const fn synthetic_span(index: usize) -> Span {
    Span::new(index, index + 1)
}

/// Parses list-format input.
///
/// Accepts a bare array of records, an object `{"records": [...], ...}`
/// whose other keys become metadata, or a single record object. Never fails:
/// structural problems become fatal diagnostics.
pub fn parse_list(value: &Value) -> Parsed {
    match value {
        Value::Array(records) => ListParser::new(records).parse(),
        Value::Object(object) => match object.get("records") {
            Some(Value::Array(records)) => {
                let mut parsed = ListParser::new(records).parse();
                let metadata: Metadata = object
                    .iter()
                    .filter(|(key, _)| key.as_str() != "records")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                parsed.query.set_metadata(metadata);
                parsed
            }
            Some(_) => malformed("'records' is not an array"),
            None => ListParser::new(slice::from_ref(value)).parse(),
        },
        _ => malformed("expected an array of records"),
    }
}

/// A parse result holding only a malformed-input diagnostic.
pub fn malformed(detail: &str) -> Parsed {
    Parsed {
        diagnostics: vec![ParseIssue::MalformedRecord.diagnostic(None, Some(detail))],
        depth_balanced: true,
        ..Parsed::default()
    }
}
