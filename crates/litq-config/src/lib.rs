//! Configuration system for litq.
//!
//! litq uses TOML configuration files named `.litq.toml`. Configuration is resolved by walking
//! up the directory tree from the current working directory, collecting any `.litq.toml` files
//! found, then loading `~/.litq.toml` as the global config with lowest precedence. A file with
//! `root = true` stops the walk.
//!
//! ```toml
//! [lint]
//! platforms = ["pubmed", "scopus"]
//! disable = ["W0004"]
//! min_severity = "warning"
//!
//! [parse]
//! precedence = ["or", "and", "not", "near"]
//!
//! [platform.pubmed]
//! disable = ["W0008"]
//! severity = { W0007 = "error" }
//! ```

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
use litq_lint::{LintOptions, PlatformOverrides, Registry};
use litq_query::{ParseOptions, Platform, Precedence, Severity};
use log::warn;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawConfig, RawLintSettings, RawParseSettings, RawPlatformProfile, is_root_config,
    parse_config_file, parse_config_str,
};
use serde::Serialize;
pub use templates::{global_template, local_template};
pub use validate::ConfigWarning;
use validate::{unusable_code, validate_config};

/// Top-level merged configuration for litq.
///
/// This represents the fully resolved configuration after merging all discovered `.litq.toml`
/// files according to precedence rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// `[lint]` settings.
    pub lint: LintSettings,
    /// `[parse]` settings.
    pub parse: ParseSettings,
    /// `[platform.<name>]` profiles.
    pub platforms: BTreeMap<Platform, PlatformSettings>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
    /// Files that contributed, highest precedence first.
    pub sources: Vec<PathBuf>,
}

/// Lint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSettings {
    /// Platforms to lint for.
    pub platforms: Vec<Platform>,
    /// Rule codes switched off everywhere.
    pub disable: BTreeSet<String>,
    /// Lowest severity to report.
    pub min_severity: Severity,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            platforms: vec![Platform::All],
            disable: BTreeSet::new(),
            min_severity: Severity::Warning,
        }
    }
}

/// Parse settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSettings {
    /// Operator precedence; unset means the targeted platform's default.
    pub precedence: Option<Precedence>,
}

/// Rule overrides for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSettings {
    /// Codes the platform does not run.
    pub disable: BTreeSet<String>,
    /// Severity replacements by code.
    pub severity: BTreeMap<String, Severity>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.litq.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                Ok(ParsedConfig {
                    path: path.clone(),
                    config: parse_config_file(path)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// The platforms to lint for: `explicit` when given, the configured
    /// platforms otherwise. The generic profile is always included.
    pub fn targets(&self, explicit: &[Platform]) -> BTreeSet<Platform> {
        let chosen = if explicit.is_empty() {
            &self.lint.platforms
        } else {
            explicit
        };
        chosen
            .iter()
            .copied()
            .chain([Platform::All])
            .collect()
    }

    /// Parse options for linting against `targets`.
    ///
    /// A configured precedence wins. Otherwise, if every targeted database
    /// agrees on a precedence, that one is used, falling back to the
    /// standard `OR < AND < NOT < NEAR`.
    pub fn parse_options(&self, targets: &BTreeSet<Platform>) -> ParseOptions {
        if let Some(precedence) = self.parse.precedence {
            return ParseOptions { precedence };
        }
        let mut defaults = targets
            .iter()
            .filter(|p| **p != Platform::All)
            .map(|p| p.syntax().precedence());
        let precedence = match defaults.next() {
            Some(first) if defaults.all(|p| p == first) => first,
            _ => Precedence::default(),
        };
        ParseOptions { precedence }
    }

    /// Lint options for linting against `targets`.
    ///
    /// Configured profiles are layered over the built-in catalogue. Codes the
    /// registry does not know, and fatal codes, are dropped with a warning;
    /// [`Config::validate`] reports them.
    pub fn lint_options(&self, targets: &BTreeSet<Platform>) -> LintOptions {
        let registry = Registry::builtin();
        let usable = |code: &String| {
            let problem = unusable_code(registry, code);
            if let Some(problem) = &problem {
                warn!("ignoring rule {code}: {problem}");
            }
            problem.is_none()
        };

        let mut configured = PlatformOverrides::new();
        for (platform, settings) in &self.platforms {
            for code in settings.disable.iter().filter(|&c| usable(c)) {
                configured.disable(*platform, code.clone());
            }
            for (code, severity) in settings.severity.iter().filter(|&(c, _)| usable(c)) {
                configured.set_severity(*platform, code.clone(), *severity);
            }
        }
        let mut overrides = PlatformOverrides::builtin();
        overrides.merge(&configured);

        LintOptions {
            overrides,
            disabled: self
                .lint
                .disable
                .iter()
                .filter(|&c| usable(c))
                .cloned()
                .collect(),
            parse: self.parse_options(targets),
        }
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self, Registry::builtin())
    }

    /// Serializes the effective configuration to TOML, in the same format as a
    /// `.litq.toml` file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableConfig {
            lint: SerializableLint {
                platforms: self.lint.platforms.iter().map(|p| p.name()).collect(),
                disable: self.lint.disable.iter().cloned().collect(),
                min_severity: self.lint.min_severity.name(),
            },
            parse: SerializableParse {
                precedence: self.parse.precedence.unwrap_or_default().names(),
            },
            platform: self
                .platforms
                .iter()
                .map(|(platform, settings)| {
                    let profile = SerializablePlatform {
                        disable: settings.disable.iter().cloned().collect(),
                        severity: settings
                            .severity
                            .iter()
                            .map(|(code, severity)| (code.clone(), severity.name()))
                            .collect(),
                    };
                    (platform.name(), profile)
                })
                .collect(),
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Internal struct for TOML serialization of the effective config.
#[derive(Serialize)]
struct SerializableConfig {
    /// `[lint]`.
    lint: SerializableLint,
    /// `[parse]`.
    parse: SerializableParse,
    /// `[platform.<name>]`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    platform: BTreeMap<&'static str, SerializablePlatform>,
}

/// `[lint]` with names instead of typed values.
#[derive(Serialize)]
struct SerializableLint {
    /// Platform names.
    platforms: Vec<&'static str>,
    /// Disabled codes, sorted.
    disable: Vec<String>,
    /// Severity name.
    min_severity: &'static str,
}

/// `[parse]` with operator names.
#[derive(Serialize)]
struct SerializableParse {
    /// Operators, loosest first.
    precedence: Vec<String>,
}

/// One platform profile.
#[derive(Serialize)]
struct SerializablePlatform {
    /// Disabled codes, sorted.
    disable: Vec<String>,
    /// Severity names by code.
    severity: BTreeMap<String, &'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.lint.platforms, vec![Platform::All]);
        assert!(config.lint.disable.is_empty());
        assert_eq!(config.lint.min_severity, Severity::Warning);
        assert!(config.parse.precedence.is_none());
        assert!(config.config_root.is_none());
    }

    #[test]
    fn test_targets_always_generic() {
        let mut config = Config::default();
        config.lint.platforms = vec![Platform::PubMed];
        assert_eq!(
            config.targets(&[]),
            BTreeSet::from([Platform::All, Platform::PubMed])
        );
        assert_eq!(
            config.targets(&[Platform::Scopus]),
            BTreeSet::from([Platform::All, Platform::Scopus])
        );
    }

    #[test]
    fn test_parse_options_follow_platform() {
        let config = Config::default();
        let scopus = config.parse_options(&BTreeSet::from([Platform::All, Platform::Scopus]));
        assert_eq!(scopus.precedence, Platform::Scopus.syntax().precedence());

        let mixed =
            config.parse_options(&BTreeSet::from([Platform::Scopus, Platform::PubMed]));
        assert_eq!(mixed.precedence, Precedence::default());
    }

    #[test]
    fn test_configured_precedence_wins() {
        let mut config = Config::default();
        let custom = Precedence::from_names(&["and", "or", "not", "near"]).unwrap();
        config.parse.precedence = Some(custom);
        let options = config.parse_options(&BTreeSet::from([Platform::Scopus]));
        assert_eq!(options.precedence, custom);
    }

    #[test]
    fn test_lint_options_layer_over_builtin() {
        let mut config = Config::default();
        config.lint.disable = BTreeSet::from(["W0004".to_string(), "F1002".to_string()]);
        config.platforms.insert(
            Platform::PubMed,
            PlatformSettings {
                disable: BTreeSet::from(["W0008".to_string(), "W9999".to_string()]),
                severity: BTreeMap::from([("W0007".to_string(), Severity::Error)]),
            },
        );

        let targets = BTreeSet::from([Platform::All, Platform::PubMed]);
        let options = config.lint_options(&targets);
        assert_eq!(options.disabled, BTreeSet::from(["W0004".to_string()]));
        assert!(options.overrides.is_disabled(Platform::PubMed, "W0008"));
        assert!(!options.overrides.is_disabled(Platform::PubMed, "W9999"));
        assert_eq!(
            options.overrides.severity_for("W0007", &targets),
            Some(Severity::Error)
        );
        // Built-in catalogue entries survive.
        assert_eq!(
            options.overrides.severity_for("W0003", &targets),
            Some(Severity::Error)
        );
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = Config::default();
        config.lint.platforms = vec![Platform::PubMed, Platform::Ebsco];
        config.lint.disable.insert("W0004".into());
        config.platforms.insert(
            Platform::PubMed,
            PlatformSettings {
                disable: BTreeSet::from(["W0008".to_string()]),
                severity: BTreeMap::from([("W0007".to_string(), Severity::Error)]),
            },
        );

        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[lint]"));
        assert!(toml.contains("[parse]"));
        assert!(toml.contains("[platform.pubmed]"));
        assert!(toml.contains("min_severity = \"warning\""));

        let raw = parse_config_str(&toml, Path::new("effective.toml")).unwrap();
        let reparsed = merge_configs(&[ParsedConfig {
            path: PathBuf::from("/tmp/effective.toml"),
            config: raw,
        }])
        .unwrap();
        assert_eq!(reparsed.lint, config.lint);
        assert_eq!(reparsed.platforms, config.platforms);
        assert_eq!(reparsed.parse.precedence, Some(Precedence::default()));
    }
}
