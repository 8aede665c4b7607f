//! Error types for litq configuration.

use std::{io, path::PathBuf};

use litq_query::{ParsePlatformError, PrecedenceError};
use thiserror::Error;
use toml::{de, ser};

/// Errors that can occur when loading or processing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A platform name is not in the catalogue.
    #[error("{path}: {source}")]
    UnknownPlatform {
        /// Config file naming the platform.
        path: PathBuf,
        /// The parse failure.
        source: ParsePlatformError,
    },

    /// `parse.precedence` is not a permutation of the binary operators.
    #[error("{path}: invalid precedence: {source}")]
    InvalidPrecedence {
        /// Config file with the precedence.
        path: PathBuf,
        /// Why it was rejected.
        source: PrecedenceError,
    },

    /// A severity name is not `warning`, `error` or `fatal`.
    #[error("{path}: invalid severity '{value}' for {key}")]
    InvalidSeverity {
        /// Config file with the value.
        path: PathBuf,
        /// Setting the value was given for.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// The effective configuration could not be rendered.
    #[error("failed to render config: {0}")]
    Serialize(#[from] ser::Error),
}
