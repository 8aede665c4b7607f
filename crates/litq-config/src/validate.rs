//! Configuration validation.
//!
//! Checks a merged configuration against the rule registry. Problems here are
//! warnings: the configuration still loads, and the offending entries are
//! ignored when lint options are built.

use std::fmt;

use litq_lint::Registry;
use litq_query::{Platform, Severity};

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A rule code that is not registered.
    UnknownRule {
        /// Setting that names the code.
        key: String,
        /// The code.
        code: String,
    },
    /// An attempt to disable or re-grade a fatal rule.
    FatalRule {
        /// Setting that names the code.
        key: String,
        /// The code.
        code: String,
    },
    /// A platform disables a rule that never runs for it anyway.
    IneffectiveDisable {
        /// The platform.
        platform: Platform,
        /// The code.
        code: String,
    },
    /// A platform profile for a platform that is not targeted.
    PlatformNotTargeted {
        /// The platform.
        platform: Platform,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRule { key, code } => write!(f, "{key}: unknown rule code '{code}'"),
            Self::FatalRule { key, code } => {
                write!(f, "{key}: rule {code} is fatal and cannot be disabled or re-graded")
            }
            Self::IneffectiveDisable { platform, code } => write!(
                f,
                "platform.{platform}.disable: rule {code} does not apply to {platform}"
            ),
            Self::PlatformNotTargeted { platform } => write!(
                f,
                "platform.{platform} is configured but not listed in lint.platforms"
            ),
        }
    }
}

/// Why `code` cannot be used in an override, if it cannot.
pub fn unusable_code(registry: &Registry, code: &str) -> Option<&'static str> {
    match registry.get(code) {
        None => Some("not a registered rule"),
        Some(rule) if rule.severity == Severity::Fatal => Some("fatal rules cannot be overridden"),
        Some(_) => None,
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config, registry: &Registry) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let mut check = |key: String, code: &str| match registry.get(code) {
        None => warnings.push(ConfigWarning::UnknownRule {
            key,
            code: code.to_string(),
        }),
        Some(rule) if rule.severity == Severity::Fatal => {
            warnings.push(ConfigWarning::FatalRule {
                key,
                code: code.to_string(),
            });
        }
        Some(_) => {}
    };

    for code in &config.lint.disable {
        check("lint.disable".to_string(), code);
    }
    for (platform, settings) in &config.platforms {
        for code in &settings.disable {
            check(format!("platform.{platform}.disable"), code);
        }
        for code in settings.severity.keys() {
            check(format!("platform.{platform}.severity"), code);
        }
    }

    for (platform, settings) in &config.platforms {
        if !config.lint.platforms.contains(platform) && *platform != Platform::All {
            warnings.push(ConfigWarning::PlatformNotTargeted {
                platform: *platform,
            });
        }
        for code in &settings.disable {
            let out_of_scope = registry
                .get(code)
                .is_some_and(|rule| !rule.scope.contains(platform));
            if out_of_scope {
                warnings.push(ConfigWarning::IneffectiveDisable {
                    platform: *platform,
                    code: code.clone(),
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::PlatformSettings;

    fn validate(config: &Config) -> Vec<ConfigWarning> {
        validate_config(config, Registry::builtin())
    }

    #[test]
    fn test_default_config_is_clean() {
        assert!(validate(&Config::default()).is_empty());
    }

    #[test]
    fn test_unknown_and_fatal_codes() {
        let mut config = Config::default();
        config.lint.disable = BTreeSet::from(["W9999".to_string(), "F1003".to_string()]);
        let warnings = validate(&config);
        assert_eq!(
            warnings,
            vec![
                ConfigWarning::FatalRule {
                    key: "lint.disable".into(),
                    code: "F1003".into()
                },
                ConfigWarning::UnknownRule {
                    key: "lint.disable".into(),
                    code: "W9999".into()
                },
            ]
        );
        assert_eq!(
            warnings[1].to_string(),
            "lint.disable: unknown rule code 'W9999'"
        );
    }

    #[test]
    fn test_platform_profile_checks() {
        let mut config = Config::default();
        config.lint.platforms = vec![Platform::PubMed];
        config.platforms.insert(
            Platform::PubMed,
            PlatformSettings {
                disable: BTreeSet::from(["W0008".to_string()]),
                severity: BTreeMap::from([("W0007".to_string(), Severity::Error)]),
            },
        );
        config.platforms.insert(
            Platform::Scopus,
            PlatformSettings {
                disable: BTreeSet::from(["E0005".to_string()]),
                severity: BTreeMap::new(),
            },
        );
        let warnings = validate(&config);
        assert_eq!(
            warnings,
            vec![
                ConfigWarning::PlatformNotTargeted {
                    platform: Platform::Scopus
                },
                ConfigWarning::IneffectiveDisable {
                    platform: Platform::Scopus,
                    code: "E0005".into()
                },
            ]
        );
    }

    #[test]
    fn test_unusable_code() {
        let registry = Registry::builtin();
        assert!(unusable_code(registry, "W0001").is_none());
        assert!(unusable_code(registry, "F1001").is_some());
        assert!(unusable_code(registry, "X0001").is_some());
    }
}
