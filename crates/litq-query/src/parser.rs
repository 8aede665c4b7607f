//! Query parser.
//!
//! Parses a token stream into a [`Query`] using recursive descent over a
//! configurable precedence table, recovering from syntax errors so that one
//! pass reports every problem it can find.
//!
//! # Grammar
//!
//! ```text
//! query   → level(0) EOF
//! level(i)→ level(i+1) (OP_i level(i+1))*      for each of the 4 levels
//! level(4)→ unary
//! unary   → "NOT" unary | FIELD unary | primary
//! primary → TERM | PHRASE | "(" level(0) ")"
//! ```
//!
//! `OP_i` is the binary operator at level `i` of the [`Precedence`] table,
//! loosest first. At the AND level, two adjacent operands with no operator
//! between them are joined by an implicit AND.
//!
//! # Tree shape
//!
//! - `a NOT b` builds `AND(a, NOT(b))`; AND and infix NOT chains are
//!   flattened together.
//! - Same-kind chains are flattened: `a OR b OR c` is one OR node.
//! - When an unparenthesized operand was produced by a different operator
//!   kind, the resulting node is marked `implicit_precedence`.
//! - A field qualifier before a group applies to every leaf below it that
//!   has no field of its own.
//! - An empty phrase `""` is reported and dropped.
//!
//! # Nesting
//!
//! Groups, prefix NOTs and field qualifiers nest by recursion. Past
//! [`MAX_DEPTH`] levels the parser reports a fatal diagnostic and skips the
//! rest of that operand instead of descending further.

use std::mem;

use log::debug;

use crate::{
    diagnostic::{Diagnostic, ParseIssue},
    lexer::{Token, TokenKind, tokenize},
    platform::Platform,
    precedence::{BinaryOp, Precedence},
    qom::{NodeId, NodeKind, OperatorKind, Origin, Query, Term},
    span::Span,
};

/// Deepest nesting of groups, prefix negations, field qualifiers and list
/// records the parsers descend into.
pub const MAX_DEPTH: usize = 100;

/// Options controlling how a query string is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Operator binding, loosest first.
    pub precedence: Precedence,
}

impl ParseOptions {
    /// Options using the default precedence of `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            precedence: platform.syntax().precedence(),
        }
    }
}

/// The result of parsing: a best-effort tree and the problems found.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    /// The (possibly partial) query tree.
    pub query: Query,
    /// Fatal diagnostics from error recovery, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether every parenthesis was matched.
    pub depth_balanced: bool,
}

impl Parsed {
    /// Whether the parenthesis depth returned to zero at end of input.
    pub const fn is_complete(&self) -> bool {
        self.depth_balanced
    }

    /// Whether any parser diagnostic was raised.
    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }
}

/// A parsed operand and the binary operator that produced it, if it was
/// built by an unparenthesized binary chain.
#[derive(Debug, Clone, Copy)]
struct Operand {
    /// Node id in the arena.
    id: NodeId,
    /// Binary operator of the chain that built the node.
    infix: Option<BinaryOp>,
}

/// An operand in a binary chain, with the operator token before it.
#[derive(Debug, Clone, Copy)]
struct Link {
    /// Span of the operator before the operand; None for the first operand
    /// and for implicit AND.
    operator: Option<Span>,
    /// The operand.
    operand: Operand,
}

/// Recursive descent parser with error recovery.
struct Parser<'t> {
    /// Token stream to parse.
    tokens: &'t [Token],
    /// Current position in token stream.
    position: usize,
    /// Operator binding table.
    precedence: Precedence,
    /// The tree under construction.
    query: Query,
    /// Recovery diagnostics.
    diagnostics: Vec<Diagnostic>,
    /// Current parenthesis nesting depth.
    depth: usize,
    /// Current recursion depth of `parse_unary`.
    nesting: usize,
    /// Operands skipped for nesting past [`MAX_DEPTH`].
    truncated: usize,
    /// False once an unmatched parenthesis has been seen.
    balanced: bool,
}

impl<'t> Parser<'t> {
    /// Creates a new parser over a token stream.
    fn new(tokens: &'t [Token], options: &ParseOptions) -> Self {
        Self {
            tokens,
            position: 0,
            precedence: options.precedence,
            query: Query::new(),
            diagnostics: Vec::new(),
            depth: 0,
            nesting: 0,
            truncated: 0,
            balanced: true,
        }
    }

    /// Parses the whole token stream.
    fn parse(mut self) -> Parsed {
        let root = self.parse_level(0).map(|operand| operand.id);
        // drains any trailing unmatched ')'
        self.peek_kind();
        self.query.set_root(root);

        debug!(
            "parsed {} tokens into {} nodes, {} diagnostics",
            self.tokens.len(),
            self.query.preorder().len(),
            self.diagnostics.len()
        );

        Parsed {
            query: self.query,
            diagnostics: self.diagnostics,
            depth_balanced: self.balanced,
        }
    }

    /// Parses one precedence level: `level(i+1) (OP_i level(i+1))*`.
    fn parse_level(&mut self, level: usize) -> Option<Operand> {
        let Some(&op) = self.precedence.levels().get(level) else {
            return self.parse_unary();
        };

        let before = self.position;
        let first = self.parse_level(level + 1);
        // a failed first operand that already reported its own problem
        let mut left_reported = first.is_none() && self.position != before;

        let mut chain: Vec<Link> = first
            .map(|operand| Link {
                operator: None,
                operand,
            })
            .into_iter()
            .collect();
        let mut distance: Option<u32> = None;

        while let Some(operator) = self.next_operator(op) {
            let operator_span = operator.map(|token| token.span);

            if op == BinaryOp::Near {
                let next = operator.and_then(Token::proximity_distance);
                if chain.len() >= 2 && next != distance {
                    // a change of distance nests the chain so far
                    let nested = self.combine(op, mem::take(&mut chain), distance);
                    chain.push(Link {
                        operator: None,
                        operand: nested,
                    });
                }
                distance = next;
            }

            let mut reported = false;
            if chain.is_empty() && !left_reported {
                self.missing_operand(operator);
                reported = true;
            }
            left_reported = false;

            let before_rhs = self.position;
            match self.parse_level(level + 1) {
                Some(operand) => chain.push(Link {
                    operator: operator_span,
                    operand,
                }),
                None if self.position == before_rhs && !reported => {
                    self.missing_operand(operator);
                }
                None => {}
            }
        }

        match chain.len() {
            0 => None,
            1 => chain.pop().map(|link| link.operand),
            _ => Some(self.combine(op, chain, distance)),
        }
    }

    /// Consumes the operator of level `op` if one is next.
    ///
    /// Returns `Some(Some(token))` for an explicit operator, `Some(None)` for
    /// an implicit AND between adjacent operands, and None otherwise.
    fn next_operator(&mut self, op: BinaryOp) -> Option<Option<&'t Token>> {
        let kind = self.peek_kind();
        let explicit = match op {
            BinaryOp::Or => kind == TokenKind::Or,
            BinaryOp::And => kind == TokenKind::And,
            BinaryOp::Not => kind == TokenKind::Not,
            BinaryOp::Near => kind == TokenKind::ProximityOp,
        };
        if explicit {
            return Some(self.advance());
        }

        let adjacent = matches!(
            kind,
            TokenKind::Term | TokenKind::Phrase | TokenKind::LParen | TokenKind::FieldQualifier
        );
        (op == BinaryOp::And && adjacent).then_some(None)
    }

    /// Builds the node for a binary chain of at least two operands.
    fn combine(&mut self, op: BinaryOp, chain: Vec<Link>, distance: Option<u32>) -> Operand {
        let kind = match op {
            BinaryOp::Or => OperatorKind::Or,
            BinaryOp::And | BinaryOp::Not => OperatorKind::And,
            BinaryOp::Near => OperatorKind::Near { distance },
        };

        let mut span: Option<Span> = None;
        let mut children = Vec::with_capacity(chain.len());
        let mut implicit = false;

        for (i, link) in chain.into_iter().enumerate() {
            let mut operand = link.operand;
            if operand.infix.is_some_and(|inner| !same_family(inner, op)) {
                implicit = true;
            }

            if op == BinaryOp::Not && i > 0 {
                operand = self.negate(operand, link.operator);
            }

            let node_span = self.query.node(operand.id).span;
            span = Some(span.map_or(node_span, |s| s.cover(node_span)));

            match self.query.node(operand.id).as_operator() {
                Some(inner) if operand.infix.is_some() && inner.kind == kind => {
                    children.extend(inner.children.iter().copied());
                }
                _ => children.push(operand.id),
            }
        }

        let id = self
            .query
            .add_operator(kind, children, span.unwrap_or_default(), Origin::String);
        if implicit && let Some(node) = self.query.operator_mut(id) {
            node.implicit_precedence = true;
        }

        Operand {
            id,
            infix: Some(op),
        }
    }

    /// Wraps an operand in a NOT node.
    fn negate(&mut self, operand: Operand, operator: Option<Span>) -> Operand {
        let child_span = self.query.node(operand.id).span;
        let span = operator.map_or(child_span, |s| s.cover(child_span));
        let id = self
            .query
            .add_operator(OperatorKind::Not, vec![operand.id], span, Origin::String);
        Operand { id, infix: None }
    }

    /// Parses: unary → "NOT" unary | FIELD unary | primary
    fn parse_unary(&mut self) -> Option<Operand> {
        if !self.enter_recursion() {
            return None;
        }
        let operand = self.parse_unary_inner();
        self.exit_recursion();
        operand
    }

    /// The body of [`Self::parse_unary`], below the depth check.
    fn parse_unary_inner(&mut self) -> Option<Operand> {
        match self.peek_kind() {
            TokenKind::Not => {
                let token = self.advance();
                let before = self.position;
                let Some(operand) = self.parse_unary() else {
                    if self.position == before {
                        self.missing_operand(token);
                    }
                    return None;
                };
                let token_span = token.map_or_else(Span::default, |t| t.span);
                Some(self.negate(operand, Some(token_span)))
            }
            TokenKind::FieldQualifier => self.parse_field(),
            TokenKind::Term | TokenKind::Phrase => self.parse_term(),
            TokenKind::LParen => self.parse_group(),
            _ => None,
        }
    }

    /// Descends one nesting level, or reports the operand ahead and skips it
    /// once [`MAX_DEPTH`] is reached.
    fn enter_recursion(&mut self) -> bool {
        if self.nesting < MAX_DEPTH {
            self.nesting += 1;
            return true;
        }
        if starts_operand(self.peek_kind())
            && let Some(token) = self.tokens.get(self.position)
        {
            self.diagnostics.push(ParseIssue::NestingTooDeep.diagnostic(
                Some(token.span),
                Some(&format!("more than {MAX_DEPTH} levels")),
            ));
            self.skip_operand();
            self.truncated += 1;
        }
        false
    }

    /// Leaves a nesting level.
    fn exit_recursion(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    /// Consumes one operand without building it: any prefix NOTs and field
    /// qualifiers, then a term, a phrase or a whole parenthesized group.
    fn skip_operand(&mut self) {
        let mut open = 0usize;
        while let Some(token) = self.tokens.get(self.position) {
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::RParen | TokenKind::And | TokenKind::Or | TokenKind::ProximityOp
                    if open == 0 =>
                {
                    break;
                }
                TokenKind::LParen => open += 1,
                TokenKind::RParen => open -= 1,
                _ => {}
            }
            self.position += 1;
            let done = open == 0
                && matches!(
                    token.kind,
                    TokenKind::RParen | TokenKind::Term | TokenKind::Phrase
                );
            if done {
                return;
            }
        }
        if open > 0 {
            self.balanced = false;
        }
    }

    /// Parses a field qualifier and the operand it applies to.
    fn parse_field(&mut self) -> Option<Operand> {
        let token = self.advance()?;

        let applies = matches!(
            self.peek_kind(),
            TokenKind::Term
                | TokenKind::Phrase
                | TokenKind::LParen
                | TokenKind::FieldQualifier
                | TokenKind::Not
        );
        if !applies {
            self.diagnostics.push(
                ParseIssue::DanglingFieldQualifier
                    .diagnostic(Some(token.span), Some(&format!("'{}'", token.text))),
            );
            return None;
        }

        let operand = self.parse_unary()?;
        self.apply_field(operand.id, token.field_name());
        Some(operand)
    }

    /// Parses a TERM or PHRASE token into a leaf.
    ///
    /// Empty and blank phrases build nothing. A closed one is reported here;
    /// an unclosed one is already a lint finding.
    fn parse_term(&mut self) -> Option<Operand> {
        let token = self.advance()?;
        let term = if token.kind == TokenKind::Phrase {
            let content = token.phrase_content();
            if content.trim().is_empty() {
                if token.is_closed_phrase() {
                    self.diagnostics
                        .push(ParseIssue::EmptyPhrase.diagnostic(Some(token.span), None));
                }
                return None;
            }
            Term::phrase(content)
        } else {
            Term::new(token.text.as_str())
        };
        let id = self.query.add_term(term, token.span, Origin::String);
        Some(Operand { id, infix: None })
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    ///
    /// An unclosed group is closed at end of input.
    fn parse_group(&mut self) -> Option<Operand> {
        let open = self.advance()?.span;
        let truncated = self.truncated;
        self.depth += 1;
        let inner = self.parse_level(0);

        let close = if self.peek_kind() == TokenKind::RParen {
            self.advance().map(|token| token.span)
        } else {
            self.balanced = false;
            self.diagnostics
                .push(ParseIssue::UnmatchedOpeningParenthesis.diagnostic(Some(open), None));
            None
        };
        self.depth -= 1;

        let Some(inner) = inner else {
            // a truncated group is not empty; its limit is already reported
            if let Some(close) = close
                && self.truncated == truncated
            {
                self.diagnostics
                    .push(ParseIssue::EmptyParentheses.diagnostic(Some(open.cover(close)), None));
            }
            return None;
        };

        let inner_span = self.query.node(inner.id).span;
        let node = self.query.node_mut(inner.id);
        if let NodeKind::Operator(op) = &mut node.kind {
            op.explicit_parens = true;
            node.span = open.cover(close.unwrap_or(inner_span));
        }

        Some(Operand {
            id: inner.id,
            infix: None,
        })
    }

    /// Sets `field` on every leaf under `id` that has none.
    fn apply_field(&mut self, id: NodeId, field: &str) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match &mut self.query.node_mut(id).kind {
                NodeKind::Term(term) => {
                    if term.field.is_none() {
                        term.field = Some(field.to_string());
                    }
                }
                NodeKind::Operator(op) => stack.extend(op.children.iter().copied()),
            }
        }
    }

    /// Records a missing operand for `operator`. Implicit ANDs always have
    /// both operands, so a None operator is ignored.
    fn missing_operand(&mut self, operator: Option<&Token>) {
        if let Some(token) = operator {
            self.diagnostics.push(
                ParseIssue::MissingOperand
                    .diagnostic(Some(token.span), Some(&format!("'{}'", token.text))),
            );
        }
    }

    /// Returns the kind of the current token.
    ///
    /// Outside any group, a `)` has nothing to close: it is reported and
    /// skipped here so that parsing carries on after it.
    fn peek_kind(&mut self) -> TokenKind {
        loop {
            let Some(token) = self.tokens.get(self.position) else {
                return TokenKind::Eof;
            };
            if token.kind == TokenKind::RParen && self.depth == 0 {
                self.balanced = false;
                self.diagnostics
                    .push(ParseIssue::UnmatchedClosingParenthesis.diagnostic(Some(token.span), None));
                self.position += 1;
                continue;
            }
            return token.kind;
        }
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.position)?;
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        Some(token)
    }
}

/// Whether a token of `kind` begins an operand.
const fn starts_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Not
            | TokenKind::FieldQualifier
            | TokenKind::Term
            | TokenKind::Phrase
            | TokenKind::LParen
    )
}

/// Whether two binary operators may share a node without being flagged.
fn same_family(a: BinaryOp, b: BinaryOp) -> bool {
    a == b || (a.is_conjunctive() && b.is_conjunctive())
}

/// Parses a token stream into a query tree.
///
/// Never fails: syntax problems become fatal diagnostics and the tree is the
/// best the parser could recover.
pub fn parse(tokens: &[Token], options: &ParseOptions) -> Parsed {
    Parser::new(tokens, options).parse()
}

/// Tokenizes and parses a query string with the default precedence.
pub fn parse_str(input: &str) -> Parsed {
    parse_str_with(input, &ParseOptions::default())
}

/// Tokenizes and parses a query string.
pub fn parse_str_with(input: &str, options: &ParseOptions) -> Parsed {
    parse(&tokenize(input), options)
}
