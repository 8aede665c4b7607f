//! Error types for lint API misuse.

use litq_query::Severity;
use thiserror::Error;

/// Errors from configuring or invoking the linter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
    /// `lint` was called with an empty target set.
    #[error("no target platforms given")]
    NoTargetPlatforms,

    /// An override names a rule that is not registered.
    #[error("unknown rule code '{0}'")]
    UnknownRule(String),

    /// An override tries to disable or re-grade a fatal parser rule.
    #[error("rule {0} is fatal and cannot be disabled or re-graded")]
    FatalRule(String),
}

/// A malformed rule registration.
///
/// These are programming errors in a rule table, not user errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two rules share a code.
    #[error("rule code {0} is registered twice")]
    DuplicateCode(String),

    /// A rule applies to no platform.
    #[error("rule {0} has an empty scope")]
    EmptyScope(String),

    /// The code is not a letter followed by four digits.
    #[error("rule code '{0}' is not a letter followed by four digits")]
    MalformedCode(String),

    /// The code prefix disagrees with the severity.
    #[error("rule {code} is {severity} but its code does not start with '{expected}'")]
    SeverityMismatch {
        /// The rule code.
        code: String,
        /// Declared severity.
        severity: Severity,
        /// Prefix the severity requires.
        expected: char,
    },
}
