//! litq: a linter for boolean bibliographic search queries.
//!
//! Systematic reviews run the same search on several literature databases,
//! each with its own query dialect. litq parses a query into a
//! platform-independent tree, checks it against platform-scoped rules, and
//! renders it back in canonical or platform syntax. This crate is the
//! command-line front end; the work happens in `litq-query`, `litq-lint` and
//! `litq-config`.

#![warn(missing_docs)]

pub mod cli;
