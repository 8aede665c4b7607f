//! Error types for API misuse.
//!
//! Problems in a query are never errors: they are reported as
//! [`Diagnostic`](crate::Diagnostic) values. The types here cover invalid
//! configuration handed to the parser and unknown platform or severity
//! names.

use thiserror::Error;

use crate::precedence::BinaryOp;

/// A precedence table that is not a permutation of the four binary operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecedenceError {
    /// The table has the wrong number of levels.
    #[error("precedence must list exactly 4 operators, got {0}")]
    WrongLength(usize),

    /// An operator appears more than once.
    #[error("operator {0} appears more than once in the precedence table")]
    Duplicate(BinaryOp),

    /// An operator name could not be recognized.
    #[error("unknown operator '{0}' (expected one of: or, and, not, near)")]
    UnknownOperator(String),
}

/// An unrecognized platform name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform '{name}' (expected one of: all, pubmed, wos, scopus, ebsco)")]
pub struct ParsePlatformError {
    /// The name that failed to parse.
    pub name: String,
}

/// An unrecognized severity name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity '{name}' (expected warning, error or fatal)")]
pub struct ParseSeverityError {
    /// The name that failed to parse.
    pub name: String,
}

/// A malformed query tree.
///
/// Returned by [`Query::validate`](crate::Query::validate); the parsers never
/// produce these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeViolation {
    /// An operator has the wrong number of children.
    #[error("node {node} ({kind}) has {found} children")]
    Arity {
        /// Index of the offending node.
        node: usize,
        /// Operator keyword.
        kind: String,
        /// Number of children found.
        found: usize,
    },

    /// A node is reachable along more than one path.
    #[error("node {node} is reachable more than once")]
    SharedNode {
        /// Index of the shared node.
        node: usize,
    },

    /// A child id points outside the arena.
    #[error("node {node} references missing node {child}")]
    DanglingChild {
        /// Index of the parent.
        node: usize,
        /// The missing child index.
        child: usize,
    },

    /// The root id points outside the arena.
    #[error("root references missing node {0}")]
    DanglingRoot(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_error_display() {
        let err = PrecedenceError::Duplicate(BinaryOp::And);
        assert_eq!(
            err.to_string(),
            "operator AND appears more than once in the precedence table"
        );
    }

    #[test]
    fn severity_error_names_input() {
        let err = ParseSeverityError {
            name: "info".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown severity 'info' (expected warning, error or fatal)"
        );
    }

    #[test]
    fn platform_error_lists_choices() {
        let err = ParsePlatformError {
            name: "medline".into(),
        };
        let display = err.to_string();
        assert!(display.contains("medline"));
        assert!(display.contains("pubmed"));
    }
}
