//! Rules over the token stream.

use litq_query::{Severity, Span, Token, TokenKind};

use super::{GENERIC, NO_PROXIMITY, platforms_where};
use crate::rule::{Check, Findings, Rule, RuleContext};

/// Quotation marks that databases do not read as phrase delimiters.
const NON_STANDARD_QUOTES: [char; 8] = [
    '\u{201c}', '\u{201d}', '\u{201e}', '\u{201f}', '\u{2033}', '\u{00ab}', '\u{00bb}', '\u{2018}',
];

/// Token rules.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "F1001",
            name: "unbalanced-quotes",
            severity: Severity::Fatal,
            scope: GENERIC,
            message: "quotation mark is never closed",
            fix_hint: "add the closing quotation mark",
            example: "\"machine learning AND ai",
            corrected: "\"machine learning\" AND ai",
            check: Check::Tokens(unbalanced_quotes),
        },
        Rule {
            code: "W0002",
            name: "redundant-parentheses",
            severity: Severity::Warning,
            scope: GENERIC,
            message: "parentheses do not change the meaning",
            fix_hint: "remove the extra parentheses",
            example: "((a OR b)) AND (c)",
            corrected: "(a OR b) AND c",
            check: Check::Tokens(redundant_parentheses),
        },
        Rule {
            code: "W0003",
            name: "lowercase-operator",
            severity: Severity::Warning,
            scope: GENERIC,
            message: "operator is not upper case",
            fix_hint: "write boolean operators in upper case; some platforms search lower-case ones as words",
            example: "a and b",
            corrected: "a AND b",
            check: Check::Tokens(lowercase_operator),
        },
        Rule {
            code: "W0004",
            name: "implicit-and",
            severity: Severity::Warning,
            scope: GENERIC,
            message: "adjacent terms are joined by an implicit AND",
            fix_hint: "write AND explicitly, or quote the words as a phrase",
            example: "machine learning",
            corrected: "\"machine learning\"",
            check: Check::Tokens(implicit_and),
        },
        Rule {
            code: "W0006",
            name: "non-standard-quotes",
            severity: Severity::Warning,
            scope: GENERIC,
            message: "term contains typographic quotation marks",
            fix_hint: "use straight double quotes (\") for phrases",
            example: "\u{201c}machine learning\u{201d}",
            corrected: "\"machine learning\"",
            check: Check::Tokens(non_standard_quotes),
        },
        Rule {
            code: "E0005",
            name: "unsupported-proximity-operator",
            severity: Severity::Error,
            scope: NO_PROXIMITY,
            message: "proximity operators are not supported",
            fix_hint: "combine the terms with AND, or use a quoted phrase",
            example: "cancer NEAR/3 therapy",
            corrected: "cancer AND therapy",
            check: Check::Tokens(unsupported_proximity),
        },
    ]
}

/// F1001: a phrase whose closing quote is missing.
fn unbalanced_quotes(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for token in ctx.tokens {
        if token.kind == TokenKind::Phrase && !token.is_closed_phrase() {
            findings.push(Span::new(token.span.start, token.span.start + 1));
        }
    }
}

/// W0002: parentheses around a single term, doubled parentheses, or
/// parentheses around the whole query.
fn redundant_parentheses(ctx: &RuleContext<'_>, findings: &mut Findings) {
    let tokens = ctx.tokens;
    let pairs = matching_parens(tokens);
    let last = tokens
        .iter()
        .rposition(|t| t.kind != TokenKind::Eof)
        .unwrap_or_default();

    for &(open, close) in &pairs {
        let single_operand = close == open + 2
            && matches!(tokens[open + 1].kind, TokenKind::Term | TokenKind::Phrase);
        let doubled = open > 0 && pairs.contains(&(open - 1, close + 1));
        let whole_query = open == 0 && close == last && pairs.len() == 1;

        let span = tokens[open].span.cover(tokens[close].span);
        if single_operand {
            findings.push_detail(span, "around a single term");
        } else if doubled {
            findings.push_detail(span, "doubled");
        } else if whole_query {
            findings.push_detail(span, "around the whole query");
        }
    }
}

/// Index pairs of matched parentheses, in order of the opening one.
fn matching_parens(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut stack = Vec::new();
    let mut pairs = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => stack.push(i),
            TokenKind::RParen => {
                if let Some(open) = stack.pop() {
                    pairs.push((open, i));
                }
            }
            _ => {}
        }
    }
    pairs.sort_unstable();
    pairs
}

/// W0003: `and`, `Or`, `near/3`.
fn lowercase_operator(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for token in ctx.tokens {
        if token.is_operator() && token.text != token.text.to_ascii_uppercase() {
            findings.push_detail(token.span, format!("'{}'", token.text));
        }
    }
}

/// W0004: two operands with no operator between them.
fn implicit_and(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for pair in ctx.tokens.windows(2) {
        let ends_operand = matches!(
            pair[0].kind,
            TokenKind::Term | TokenKind::Phrase | TokenKind::RParen
        );
        let starts_operand = matches!(
            pair[1].kind,
            TokenKind::Term | TokenKind::Phrase | TokenKind::LParen | TokenKind::FieldQualifier
        );
        if ends_operand && starts_operand {
            findings.push_detail(
                pair[0].span.cover(pair[1].span),
                format!("between '{}' and '{}'", pair[0].text, pair[1].text),
            );
        }
    }
}

/// W0006: curly or angled quotes inside terms.
fn non_standard_quotes(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for token in ctx.tokens {
        if token.kind == TokenKind::Term && token.text.contains(NON_STANDARD_QUOTES) {
            findings.push_detail(token.span, format!("'{}'", token.text));
        }
    }
}

/// E0005: any proximity operator.
fn unsupported_proximity(ctx: &RuleContext<'_>, findings: &mut Findings) {
    let unsupported = platforms_where(ctx, |s| !s.proximity);
    if unsupported.is_empty() {
        return;
    }
    for token in ctx.tokens {
        if token.kind == TokenKind::ProximityOp {
            let detail = format!("'{}'", token.text);
            findings.push_scoped(token.span, detail, unsupported.clone());
        }
    }
}
