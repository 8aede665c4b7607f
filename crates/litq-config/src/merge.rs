//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`, checking
//! every value on the way.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    str::FromStr,
};

use litq_query::{Platform, Precedence, Severity};
use log::debug;

use crate::{
    Config, ConfigError, LintSettings, ParseSettings, PlatformSettings,
    parse::{RawConfig, RawLintSettings, RawPlatformProfile},
};

/// A parsed config file with its source path.
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar and list settings: the closest file that sets a field wins
/// - Platform profiles: merged per platform; `disable` lists follow the rule above, severity
///   overrides merge by code with the closest file winning
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // Lowest precedence first so higher precedence overwrites.
    for parsed in configs.iter().rev() {
        debug!("merging {}", parsed.path.display());
        let raw = &parsed.config;
        if let Some(lint) = &raw.lint {
            apply_lint(&mut config.lint, lint, &parsed.path)?;
        }
        if let Some(names) = raw.parse.as_ref().and_then(|p| p.precedence.as_ref()) {
            let precedence = Precedence::from_names(names).map_err(|source| {
                ConfigError::InvalidPrecedence {
                    path: parsed.path.clone(),
                    source,
                }
            })?;
            config.parse = ParseSettings {
                precedence: Some(precedence),
            };
        }
        for (name, profile) in raw.platform.iter().flatten() {
            let platform = parse_platform(name, &parsed.path)?;
            let settings = config.platforms.entry(platform).or_default();
            apply_profile(settings, profile, name, &parsed.path)?;
        }
    }

    config.config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(Path::to_path_buf);
    config.sources = configs.iter().map(|c| c.path.clone()).collect();
    Ok(config)
}

/// Applies a `[lint]` section.
fn apply_lint(
    result: &mut LintSettings,
    raw: &RawLintSettings,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(names) = &raw.platforms {
        let mut platforms = Vec::with_capacity(names.len());
        for name in names {
            let platform = parse_platform(name, path)?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        result.platforms = platforms;
    }
    if let Some(codes) = &raw.disable {
        result.disable = normalize_codes(codes);
    }
    if let Some(value) = &raw.min_severity {
        result.min_severity = parse_severity(value, "lint.min_severity", path)?;
    }
    Ok(())
}

/// Applies a `[platform.<name>]` section.
fn apply_profile(
    result: &mut PlatformSettings,
    raw: &RawPlatformProfile,
    name: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(codes) = &raw.disable {
        result.disable = normalize_codes(codes);
    }
    for (code, value) in raw.severity.iter().flatten() {
        let key = format!("platform.{name}.severity.{code}");
        let severity = parse_severity(value, &key, path)?;
        result
            .severity
            .insert(code.trim().to_ascii_uppercase(), severity);
    }
    Ok(())
}

/// Upper-cases and de-duplicates rule codes.
fn normalize_codes(codes: &[String]) -> BTreeSet<String> {
    codes
        .iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .collect()
}

/// Parses a platform name.
fn parse_platform(name: &str, path: &Path) -> Result<Platform, ConfigError> {
    Platform::from_str(name).map_err(|source| ConfigError::UnknownPlatform {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a severity name.
fn parse_severity(value: &str, key: &str, path: &Path) -> Result<Severity, ConfigError> {
    Severity::from_str(value).map_err(|_| ConfigError::InvalidSeverity {
        path: path.to_path_buf(),
        key: key.to_string(),
        value: value.to_string(),
    })
}
