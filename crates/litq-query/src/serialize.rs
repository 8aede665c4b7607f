//! Canonical JSON interchange and query string rendering.
//!
//! The string shape is `{"search_string": "...", ..metadata}`. The list
//! shape is a bare array of records, or `{"records": [...], ..metadata}` when
//! the query carries metadata; operator nodes are numbered in pre-order and
//! leaves are written inline.
//!
//! Canonical rendering quotes any non-exact term the lexer would not read
//! back as a single bare word (keywords, values with spaces or parentheses).
//! Such terms come back as exact phrases, so that round trip is lossy.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use crate::{
    lexer::{TokenKind, tokenize},
    list::{malformed, parse_list},
    parser::{ParseOptions, Parsed, parse_str_with},
    platform::Platform,
    precedence::Precedence,
    qom::{Metadata, Node, NodeId, NodeKind, OperatorKind, Query, Term},
};

/// Proximity distance written for Scopus when the query gives none.
const SCOPUS_DEFAULT_DISTANCE: u32 = 15;

/// Proximity distance written for EBSCO when the query gives none.
const EBSCO_DEFAULT_DISTANCE: u32 = 5;

/// Interchange shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `{"search_string": "..."}`.
    String,
    /// Linked operator records.
    List,
}

/// Converts a query tree to canonical JSON.
pub fn to_json(query: &Query, shape: Shape) -> Value {
    match shape {
        Shape::String => {
            let mut object = metadata_object(query.metadata());
            object.insert(
                "search_string".to_string(),
                Value::String(to_query_string(query)),
            );
            Value::Object(object)
        }
        Shape::List => {
            let records = Value::Array(list_records(query));
            if query.metadata().is_empty() {
                records
            } else {
                let mut object = metadata_object(query.metadata());
                object.insert("records".to_string(), records);
                Value::Object(object)
            }
        }
    }
}

/// Reads canonical JSON in either shape, parsing strings with the default
/// precedence.
pub fn from_json(value: &Value) -> Parsed {
    from_json_with(value, &ParseOptions::default())
}

/// Reads canonical JSON in either shape.
pub fn from_json_with(value: &Value, options: &ParseOptions) -> Parsed {
    let Some(object) = value.as_object() else {
        return parse_list(value);
    };
    let Some(search) = object.get("search_string") else {
        return parse_list(value);
    };
    let Some(text) = search.as_str() else {
        return malformed("'search_string' is not a string");
    };

    let mut parsed = parse_str_with(text, options);
    let metadata: Metadata = object
        .iter()
        .filter(|(key, _)| key.as_str() != "search_string")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    parsed.query.set_metadata(metadata);
    parsed
}

/// Renders the canonical query string under the default precedence.
pub fn to_query_string(query: &Query) -> String {
    to_query_string_with(query, &Precedence::default())
}

/// Renders the canonical query string, adding parentheses where the author
/// wrote them or where leaving them out would change the meaning under
/// `precedence`.
pub fn to_query_string_with(query: &Query, precedence: &Precedence) -> String {
    Canonical { query, precedence }.render().unwrap_or_default()
}

/// Renders `query` in the surface syntax of `platform`, parenthesizing every
/// nested operator.
///
/// Platforms without proximity search get NEAR written as AND.
pub fn to_platform_string(query: &Query, platform: Platform) -> String {
    Native { query, platform }.render().unwrap_or_default()
}

/// Copies metadata into a JSON object.
fn metadata_object(metadata: &Metadata) -> Map<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Builds list-format records, numbering operators in pre-order.
fn list_records(query: &Query) -> Vec<Value> {
    let Some(root) = query.root() else {
        return Vec::new();
    };
    if let Some(term) = query.node(root).as_term() {
        return vec![leaf_json(term)];
    }

    let operators: Vec<NodeId> = query
        .preorder()
        .into_iter()
        .filter(|id| query.node(*id).as_operator().is_some())
        .collect();
    let ids: HashMap<NodeId, usize> = operators
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();

    operators
        .iter()
        .filter_map(|id| query.node(*id).as_operator())
        .map(|op| {
            let operands: Vec<Value> = op
                .children
                .iter()
                .map(|child| match &query.node(*child).kind {
                    NodeKind::Term(term) => leaf_json(term),
                    NodeKind::Operator(_) => json!(ids.get(child).copied().unwrap_or_default()),
                })
                .collect();
            let mut record = json!({
                "operator": op.kind.keyword(),
                "operands": operands,
            });
            if let OperatorKind::Near {
                distance: Some(distance),
            } = op.kind
            {
                record["distance"] = json!(distance);
            }
            record
        })
        .collect()
}

/// A leaf record.
fn leaf_json(term: &Term) -> Value {
    let mut leaf = json!({ "term": term.value });
    if let Some(field) = &term.field {
        leaf["field"] = json!(field);
    }
    if term.exact {
        leaf["exact"] = json!(true);
    }
    leaf
}

/// Quotes a term value unless it lexes back as the same bare word.
fn quote_value(term: &Term) -> String {
    let tokens = tokenize(&term.value);
    let bare = matches!(
        tokens.as_slice(),
        [word, eof] if word.kind == TokenKind::Term && word.text == term.value && eof.kind == TokenKind::Eof
    );
    if term.exact || !bare {
        format!("\"{}\"", term.value)
    } else {
        term.value.clone()
    }
}

/// Canonical syntax renderer.
struct Canonical<'q> {
    /// The tree.
    query: &'q Query,
    /// Binding used to decide where parentheses are needed.
    precedence: &'q Precedence,
}

impl Canonical<'_> {
    /// Renders the whole tree, None when it is empty.
    fn render(&self) -> Option<String> {
        self.query.fold(|_, node, parts: Vec<String>| match &node.kind {
            NodeKind::Term(term) => match &term.field {
                Some(field) => format!("{field}:{}", quote_value(term)),
                None => quote_value(term),
            },
            NodeKind::Operator(op) => {
                let parts: Vec<String> = op
                    .children
                    .iter()
                    .zip(parts)
                    .map(|(child, text)| {
                        if self.needs_parens(*child, op.kind) {
                            format!("({text})")
                        } else {
                            text
                        }
                    })
                    .collect();
                match op.kind {
                    OperatorKind::Not => format!("NOT {}", parts.join(" ")),
                    kind => parts.join(&format!(" {kind} ")),
                }
            }
        })
    }

    /// Whether the child at `id` must be parenthesized under `parent`.
    fn needs_parens(&self, id: NodeId, parent: OperatorKind) -> bool {
        let Some(op) = self.query.node(id).as_operator() else {
            return false;
        };
        if op.explicit_parens {
            return true;
        }
        // prefix NOT binds to the next operand only
        let Some(child) = op.kind.binary_op() else {
            return false;
        };
        match parent.binary_op() {
            Some(parent) => self.precedence.level(child) <= self.precedence.level(parent),
            None => true,
        }
    }
}

/// Platform syntax renderer.
struct Native<'q> {
    /// The tree.
    query: &'q Query,
    /// Target platform.
    platform: Platform,
}

/// A subtree rendered for a platform.
struct Rendered {
    /// Text without surrounding parentheses.
    text: String,
    /// Whether the subtree is an operator.
    operator: bool,
    /// For `NOT x`, the parenthesized rendering of `x`.
    negated: Option<String>,
}

impl Rendered {
    /// The text, parenthesized when the subtree is an operator.
    fn wrapped(self) -> String {
        if self.operator {
            format!("({})", self.text)
        } else {
            self.text
        }
    }
}

impl Native<'_> {
    /// Renders the whole tree, None when it is empty.
    fn render(&self) -> Option<String> {
        self.query
            .fold(|_, node, children| self.render_node(node, children))
            .map(|rendered| rendered.text)
    }

    /// Renders one node from its rendered children.
    fn render_node(&self, node: &Node, children: Vec<Rendered>) -> Rendered {
        let NodeKind::Operator(op) = &node.kind else {
            let text = node.as_term().map(|term| self.term(term)).unwrap_or_default();
            return Rendered {
                text,
                operator: false,
                negated: None,
            };
        };
        let mut negated = None;
        let text = match op.kind {
            OperatorKind::Not => {
                let parts: Vec<String> = children.into_iter().map(Rendered::wrapped).collect();
                if let [operand] = parts.as_slice() {
                    negated = Some(operand.clone());
                }
                format!("NOT {}", parts.join(" "))
            }
            OperatorKind::And => {
                let mut text = String::new();
                for (i, mut child) in children.into_iter().enumerate() {
                    match child.negated.take().filter(|_| i > 0) {
                        Some(inner) => text.push_str(&format!(" {} {inner}", self.and_not())),
                        None if i == 0 => text.push_str(&child.wrapped()),
                        None => text.push_str(&format!(" AND {}", child.wrapped())),
                    }
                }
                text
            }
            OperatorKind::Or | OperatorKind::Near { .. } => {
                let separator = format!(" {} ", self.keyword(op.kind));
                let parts: Vec<String> = children.into_iter().map(Rendered::wrapped).collect();
                parts.join(&separator)
            }
        };
        Rendered {
            text,
            operator: true,
            negated,
        }
    }

    /// The platform's spelling of `AND NOT`.
    const fn and_not(&self) -> &'static str {
        match self.platform {
            Platform::All | Platform::Scopus => "AND NOT",
            Platform::PubMed | Platform::WebOfScience | Platform::Ebsco => "NOT",
        }
    }

    /// The platform's spelling of a binary operator.
    fn keyword(&self, kind: OperatorKind) -> String {
        let OperatorKind::Near { distance } = kind else {
            return kind.keyword().to_string();
        };
        if !self.platform.syntax().proximity {
            return OperatorKind::And.keyword().to_string();
        }
        match (self.platform, distance) {
            (Platform::Scopus, d) => format!("W/{}", d.unwrap_or(SCOPUS_DEFAULT_DISTANCE)),
            (Platform::Ebsco, d) => format!("N{}", d.unwrap_or(EBSCO_DEFAULT_DISTANCE)),
            (_, Some(d)) => format!("NEAR/{d}"),
            (_, None) => "NEAR".to_string(),
        }
    }

    /// Renders a leaf with the platform's field tag.
    fn term(&self, term: &Term) -> String {
        let value = quote_value(term);
        let syntax = self.platform.syntax();
        let tag = match &term.field {
            Some(field) => match syntax.native_field(field) {
                Some(native) => Some(native),
                None => return format!("{field}:{value}"),
            },
            None => syntax.default_field,
        };
        let Some(tag) = tag else {
            return value;
        };
        match self.platform {
            Platform::All => format!("{tag}:{value}"),
            Platform::PubMed => format!("{value}[{tag}]"),
            Platform::WebOfScience => format!("{tag}=({value})"),
            Platform::Scopus => format!("{tag}({value})"),
            Platform::Ebsco => format!("{tag} {value}"),
        }
    }
}
