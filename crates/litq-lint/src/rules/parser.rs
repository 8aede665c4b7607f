//! Rules raised by the parsers.

use litq_query::{ParseIssue, Severity};

use super::GENERIC;
use crate::rule::{Check, Rule};

/// Registry entries for every parser issue.
pub fn rules() -> Vec<Rule> {
    ParseIssue::ALL
        .into_iter()
        .map(|issue| Rule {
            code: issue.code(),
            name: issue.name(),
            severity: Severity::Fatal,
            scope: GENERIC,
            message: issue.message(),
            fix_hint: issue.fix_hint(),
            example: issue.example(),
            corrected: issue.corrected(),
            check: Check::Parser,
        })
        .collect()
}
