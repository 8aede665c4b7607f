//! Query lexer (tokenizer).
//!
//! Converts query text into positioned tokens for the parser. Lexing never
//! fails: unclosed quotes and stray characters still produce tokens, and the
//! linter reports on them afterwards.

use std::{iter::Peekable, str::CharIndices};

use serde::Serialize;

use crate::span::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// A bare word (search term).
    Term,
    /// A quoted phrase, quotes included in the token text.
    Phrase,
    /// A field prefix such as `ti:`.
    FieldQualifier,
    /// The AND keyword.
    And,
    /// The OR keyword.
    Or,
    /// The NOT keyword.
    Not,
    /// Left parenthesis.
    LParen,
    /// Right parenthesis.
    RParen,
    /// A proximity operator (`NEAR/3`, `W/2`, `ADJ5`, ...).
    ProximityOp,
    /// End of input.
    Eof,
}

/// A token with its raw source text and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Kind of token.
    pub kind: TokenKind,
    /// The raw source slice.
    pub text: String,
    /// Byte range in the input.
    pub span: Span,
}

impl Token {
    /// Whether the token is a boolean or proximity operator.
    pub const fn is_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::And | TokenKind::Or | TokenKind::Not | TokenKind::ProximityOp
        )
    }

    /// Whether the token is a phrase with a closing quote.
    pub fn is_closed_phrase(&self) -> bool {
        self.kind == TokenKind::Phrase && self.text.len() >= 2 && self.text.ends_with('"')
    }

    /// Phrase content without the surrounding quotes.
    pub fn phrase_content(&self) -> &str {
        let inner = self.text.strip_prefix('"').unwrap_or(&self.text);
        if self.is_closed_phrase() {
            inner.strip_suffix('"').unwrap_or(inner)
        } else {
            inner
        }
    }

    /// Field name without the trailing colon.
    pub fn field_name(&self) -> &str {
        self.text.strip_suffix(':').unwrap_or(&self.text)
    }

    /// Distance of a proximity operator, if it has one.
    pub fn proximity_distance(&self) -> Option<u32> {
        if self.kind != TokenKind::ProximityOp {
            return None;
        }
        let digits: String = self
            .text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// Tokenizes query text.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<CharIndices<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the entire input, ending with an EOF token.
    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token() {
            tokens.push(token);
        }

        let end = self.input.len();
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::empty(end),
        });
        tokens
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();
            let &(_, ch) = self.chars.peek()?;

            let start = self.position;
            let token = match ch {
                '"' => self.read_phrase(),
                '(' => {
                    self.advance();
                    self.token(TokenKind::LParen, start)
                }
                ')' => {
                    self.advance();
                    self.token(TokenKind::RParen, start)
                }
                _ => match self.read_word() {
                    Some(token) => token,
                    // bare colon
                    None => continue,
                },
            };
            return Some(token);
        }
    }

    /// Builds a token spanning from `start` to the current position.
    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            text: self.input[start..self.position].to_string(),
            span: Span::new(start, self.position),
        }
    }

    /// Reads a quoted phrase. An unclosed quote runs to end of input.
    fn read_phrase(&mut self) -> Token {
        let start = self.position;
        self.advance(); // consume opening quote

        while let Some(&(_, ch)) = self.chars.peek() {
            self.advance();
            if ch == '"' {
                break;
            }
        }

        self.token(TokenKind::Phrase, start)
    }

    /// Reads a term, keyword, proximity operator or field qualifier.
    ///
    /// Returns None for a bare colon, which is skipped.
    fn read_word(&mut self) -> Option<Token> {
        let start = self.position;

        while let Some(&(_, ch)) = self.chars.peek() {
            if ends_word(ch) {
                break;
            }

            if ch == ':' {
                self.advance(); // consume the colon
                if self.position - start == 1 {
                    return None;
                }
                return Some(self.token(TokenKind::FieldQualifier, start));
            }

            self.advance();
        }

        let word = &self.input[start..self.position];
        let kind = if word.eq_ignore_ascii_case("AND") {
            TokenKind::And
        } else if word.eq_ignore_ascii_case("OR") {
            TokenKind::Or
        } else if word.eq_ignore_ascii_case("NOT") {
            TokenKind::Not
        } else if is_proximity(word) {
            TokenKind::ProximityOp
        } else {
            TokenKind::Term
        };

        Some(self.token(kind, start))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some((offset, ch)) = self.chars.next() {
            self.position = offset + ch.len_utf8();
        }
    }
}

/// Whether `ch` ends a bare word or field name.
fn ends_word(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"')
}

/// Whether `name` lexes back as a single field qualifier when written as
/// `name:`.
pub fn is_field_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|ch| ch == ':' || ends_word(ch))
}

/// Whether `word` is a proximity operator: `NEAR`, `NEAR/n`, `W/n`, `PRE/n`,
/// `ADJ` or `ADJn`.
fn is_proximity(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if upper == "NEAR" || upper == "ADJ" {
        return true;
    }
    if let Some(rest) = upper.strip_prefix("ADJ") {
        return all_digits(rest);
    }
    ["NEAR/", "W/", "PRE/"]
        .iter()
        .any(|prefix| upper.strip_prefix(prefix).is_some_and(all_digits))
}

/// Tokenizes query text. Never fails; the last token is always EOF.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_is_just_eof() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].span, Span::empty(0));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("a and b Or c NOT d"),
            vec![
                TokenKind::Term,
                TokenKind::And,
                TokenKind::Term,
                TokenKind::Or,
                TokenKind::Term,
                TokenKind::Not,
                TokenKind::Term,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spans_index_source() {
        let input = "(ai OR ml)";
        let tokens = tokenize(input);
        assert_eq!(tokens[1].span, Span::new(1, 3));
        assert_eq!(&input[tokens[2].span.start..tokens[2].span.end], "OR");
        assert_eq!(tokens[4].kind, TokenKind::RParen);
        assert_eq!(tokens[5].span, Span::empty(10));
    }

    #[test]
    fn phrase_keeps_internal_parens() {
        let tokens = tokenize("\"big (data)\" AND x");
        assert_eq!(tokens[0].kind, TokenKind::Phrase);
        assert_eq!(tokens[0].text, "\"big (data)\"");
        assert_eq!(tokens[0].phrase_content(), "big (data)");
        assert!(tokens[0].is_closed_phrase());
    }

    #[test]
    fn unclosed_phrase_runs_to_end() {
        let tokens = tokenize("a AND \"open phrase");
        assert_eq!(tokens[2].kind, TokenKind::Phrase);
        assert_eq!(tokens[2].span, Span::new(6, 18));
        assert!(!tokens[2].is_closed_phrase());
        assert_eq!(tokens[2].phrase_content(), "open phrase");
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn lone_quote_is_unclosed() {
        let tokens = tokenize("\"");
        assert_eq!(tokens[0].kind, TokenKind::Phrase);
        assert!(!tokens[0].is_closed_phrase());
        assert_eq!(tokens[0].phrase_content(), "");
    }

    #[test]
    fn field_qualifier() {
        let tokens = tokenize("ti:cancer tiab:(a OR b)");
        assert_eq!(tokens[0].kind, TokenKind::FieldQualifier);
        assert_eq!(tokens[0].field_name(), "ti");
        assert_eq!(tokens[1].text, "cancer");
        assert_eq!(tokens[2].field_name(), "tiab");
        assert_eq!(tokens[3].kind, TokenKind::LParen);
    }

    #[test]
    fn field_names_are_single_words() {
        for name in ["ti", "mh", "tiab", "x-y"] {
            assert!(is_field_name(name), "{name}");
            let tokens = tokenize(&format!("{name}:a"));
            assert_eq!(tokens[0].kind, TokenKind::FieldQualifier);
            assert_eq!(tokens[0].field_name(), name);
        }
        for name in ["", "mesh terms", "a:b", "(ti)", "\"ti\""] {
            assert!(!is_field_name(name), "{name}");
        }
    }

    #[test]
    fn bare_colon_is_skipped() {
        assert_eq!(kinds(": a"), vec![TokenKind::Term, TokenKind::Eof]);
    }

    #[test]
    fn proximity_forms() {
        for op in ["NEAR", "near/3", "W/2", "PRE/4", "ADJ", "adj5"] {
            let tokens = tokenize(&format!("a {op} b"));
            assert_eq!(tokens[1].kind, TokenKind::ProximityOp, "{op}");
        }
        assert_eq!(tokenize("a NEAR/3 b")[1].proximity_distance(), Some(3));
        assert_eq!(tokenize("a NEAR b")[1].proximity_distance(), None);
        assert_eq!(tokenize("a ADJ12 b")[1].proximity_distance(), Some(12));
        assert_eq!(tokenize("W/x")[0].kind, TokenKind::Term);
        assert_eq!(tokenize("adjective")[0].kind, TokenKind::Term);
    }

    #[test]
    fn curly_quotes_and_wildcards_are_terms() {
        let tokens = tokenize("\u{201c}machine learning\u{201d} comput*");
        assert_eq!(tokens[0].kind, TokenKind::Term);
        assert_eq!(tokens[0].text, "\u{201c}machine");
        assert_eq!(tokens[1].text, "learning\u{201d}");
        assert_eq!(tokens[2].text, "comput*");
    }

    #[test]
    fn multibyte_offsets() {
        let tokens = tokenize("é OR b");
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 5));
    }
}
