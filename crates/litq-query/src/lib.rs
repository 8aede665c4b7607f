//! Parsing and serialization for boolean bibliographic search queries.
//!
//! This crate reads search strategies written for literature databases:
//!
//! - **Terms**: `cancer`, wildcards `comput*`
//! - **Phrases**: `"machine learning"`
//! - **Operators**: `AND`, `OR`, `NOT`, implicit AND between adjacent terms
//! - **Proximity**: `NEAR/3`, `W/2`, `PRE/4`, `ADJ5`
//! - **Grouping**: `(a OR b) AND c`
//! - **Fields**: `ti:ethics`, `tiab:(ai OR ml)`
//!
//! Queries are parsed into a [`Query`] tree, either from a string or from the
//! list format of linked JSON records. Parsing never fails: syntax problems
//! are reported as fatal [`Diagnostic`]s next to a best-effort tree.
//!
//! # Example
//!
//! ```
//! use litq_query::{Shape, parse_str, to_json};
//!
//! let parsed = parse_str("ti:(ai OR \"machine learning\") AND ethics");
//! assert!(parsed.diagnostics.is_empty());
//! let json = to_json(&parsed.query, Shape::List);
//! assert!(json.is_array());
//! ```

#![warn(missing_docs)]

mod diagnostic;
mod error;
mod lexer;
mod list;
mod matching;
mod parser;
mod platform;
mod precedence;
mod qom;
mod serialize;
mod span;

pub use diagnostic::{Diagnostic, ParseIssue, Severity};
pub use error::{ParsePlatformError, ParseSeverityError, PrecedenceError, TreeViolation};
pub use lexer::{Token, TokenKind, tokenize};
pub use list::parse_list;
pub use matching::{Matcher, Record};
pub use parser::{MAX_DEPTH, ParseOptions, Parsed, parse, parse_str, parse_str_with};
pub use platform::{FieldTag, Platform, PlatformSyntax};
pub use precedence::{BinaryOp, Precedence};
pub use qom::{Metadata, Node, NodeId, NodeKind, Operator, OperatorKind, Origin, Query, Term};
pub use serialize::{
    Shape, from_json, from_json_with, to_json, to_platform_string, to_query_string,
    to_query_string_with,
};
pub use span::Span;
