//! Configuration file parsing.
//!
//! Parses individual `.litq.toml` files into intermediate `RawConfig` structures
//! that preserve the optional nature of all fields before merging. Values stay
//! as strings here; they are checked when the files are merged.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
/// This mirrors the TOML schema exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Lint settings section.
    pub lint: Option<RawLintSettings>,
    /// Parse settings section.
    pub parse: Option<RawParseSettings>,
    /// Per-platform profiles: platform name -> profile.
    pub platform: Option<BTreeMap<String, RawPlatformProfile>>,
}

/// Raw `[lint]` section.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLintSettings {
    /// Target platform name(s).
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub platforms: Option<Vec<String>>,
    /// Rule codes switched off everywhere.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub disable: Option<Vec<String>>,
    /// Lowest severity to report.
    pub min_severity: Option<String>,
}

/// Raw `[parse]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawParseSettings {
    /// Binary operators, loosest first.
    pub precedence: Option<Vec<String>>,
}

/// Raw `[platform.<name>]` section.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlatformProfile {
    /// Rule codes the platform does not run.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub disable: Option<Vec<String>>,
    /// Severity replacements: code -> severity name.
    pub severity: Option<BTreeMap<String, String>>,
}

/// Parses a configuration file from disk.
///
/// Returns a `RawConfig` with all fields as optionals, ready for merging.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
///
/// Useful for validating template content (tests only).
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// This is used during discovery to stop traversal at root configs.
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
