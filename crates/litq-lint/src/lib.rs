//! Platform-scoped linting for bibliographic search queries.
//!
//! A [`Linter`] runs the rules of a [`Registry`] over the tokens and tree of a
//! parsed query and returns an ordered [`Report`]. Every rule is scoped to the
//! platforms it matters for, so the same query can be clean for one database
//! and broken for another.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//!
//! use litq_lint::Linter;
//! use litq_query::Platform;
//!
//! let linter = Linter::default();
//! let targets = BTreeSet::from([Platform::All, Platform::PubMed]);
//! let report = linter.lint_str("cancer AND therapy OR ti:oncology", &targets).unwrap();
//! assert!(report.iter().any(|d| d.code() == "W0007"));
//! ```

#![warn(missing_docs)]

mod error;
mod linter;
mod overrides;
mod registry;
mod report;
mod rule;
mod rules;

pub use error::{LintError, RegistryError};
pub use linter::{LintOptions, Linter};
pub use overrides::{PlatformOverrides, PlatformProfile};
pub use registry::Registry;
pub use report::Report;
pub use rule::{Check, CheckFn, Finding, Findings, Rule, RuleContext};
