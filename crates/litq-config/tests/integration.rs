//! Integration tests for litq-config.
//!
//! Tests the full configuration loading pipeline: discovery -> parse -> merge -> lint options.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use litq_config::{CONFIG_FILENAME, Config, ConfigError, ConfigWarning, is_global_config};
use litq_lint::Linter;
use litq_query::{Platform, Severity};

/// Test helper to create a temporary directory structure for tests.
struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn dir(&self, rel: &str) -> PathBuf {
        let path = self.path().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn config(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir(rel).join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }
}

/// Loads config from `cwd`, ignoring the user's own `~/.litq.toml`.
fn load(cwd: &Path) -> Result<Config, ConfigError> {
    let files: Vec<PathBuf> = litq_config::discover_config_files(cwd)
        .into_iter()
        .filter(|p| !is_global_config(p))
        .collect();
    Config::load_from_files(&files)
}

#[test]
fn no_config_gives_defaults() {
    let env = TestEnv::new();
    let config = load(&env.dir("a/b")).unwrap();
    assert_eq!(config.lint.platforms, vec![Platform::All]);
    assert!(config.sources.is_empty());
    assert!(config.config_root.is_none());
}

#[test]
fn nested_configs_merge() {
    let env = TestEnv::new();
    env.config(
        "",
        r#"
root = true
[lint]
platforms = ["scopus"]
min_severity = "error"

[platform.pubmed]
disable = ["W0008"]
"#,
    );
    let review = env.config(
        "reviews/oncology",
        r#"
[lint]
platforms = ["pubmed", "wos"]

[platform.pubmed]
severity = { W0007 = "error" }
"#,
    );
    let cwd = env.dir("reviews/oncology/queries");

    let config = load(&cwd).unwrap();
    assert_eq!(config.sources.first(), Some(&review));
    assert_eq!(config.sources.len(), 2);
    assert_eq!(
        config.lint.platforms,
        vec![Platform::PubMed, Platform::WebOfScience]
    );
    assert_eq!(config.lint.min_severity, Severity::Error);
    let pubmed = &config.platforms[&Platform::PubMed];
    assert!(pubmed.disable.contains("W0008"));
    assert_eq!(pubmed.severity["W0007"], Severity::Error);
    assert_eq!(config.config_root, review.parent().map(Path::to_path_buf));
}

#[test]
fn root_config_hides_parents() {
    let env = TestEnv::new();
    env.config("", "[lint]\nplatforms = \"nonsense\"\n");
    env.config("project", "root = true\n[lint]\nplatforms = \"ebsco\"\n");
    let config = Config::load(&env.dir("project/src")).unwrap();
    assert_eq!(config.lint.platforms, vec![Platform::Ebsco]);
    assert_eq!(config.sources.len(), 1);
}

#[test]
fn broken_file_reports_path() {
    let env = TestEnv::new();
    let path = env.config("", "root = true\n[lint\n");
    let err = Config::load(env.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn invalid_values_are_errors() {
    let env = TestEnv::new();
    env.config("", "root = true\n[parse]\nprecedence = [\"or\", \"or\", \"and\", \"near\"]\n");
    let err = Config::load(env.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPrecedence { .. }));
}

#[test]
fn config_drives_the_linter() {
    let env = TestEnv::new();
    env.config(
        "",
        r#"
root = true
[lint]
platforms = ["pubmed"]
disable = ["W0004"]

[platform.pubmed]
disable = ["W0008"]
severity = { W0007 = "error" }
"#,
    );
    let config = Config::load(env.path()).unwrap();
    assert!(config.validate().is_empty());

    let targets = config.targets(&[]);
    assert_eq!(targets, BTreeSet::from([Platform::All, Platform::PubMed]));
    let linter = Linter::new(config.lint_options(&targets)).unwrap();
    let report = linter.lint_str("cancer therapy OR ti:oncology", &targets).unwrap();

    let codes: Vec<&str> = report.iter().map(|d| d.code()).collect();
    assert!(!codes.contains(&"W0004"), "{codes:?}");
    assert!(!codes.contains(&"W0008"), "{codes:?}");
    let w0007 = report.iter().find(|d| d.code() == "W0007").unwrap();
    assert_eq!(w0007.severity(), Severity::Error);
}

#[test]
fn bad_codes_warn_but_load() {
    let env = TestEnv::new();
    env.config(
        "",
        "root = true\n[lint]\ndisable = [\"W0042\", \"F1002\"]\n",
    );
    let config = Config::load(env.path()).unwrap();
    let warnings = config.validate();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::UnknownRule { .. })));
    assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::FatalRule { .. })));

    let targets = config.targets(&[]);
    let options = config.lint_options(&targets);
    assert!(options.disabled.is_empty());
    assert!(Linter::new(options).is_ok());
}

#[test]
fn effective_config_reloads() {
    let env = TestEnv::new();
    env.config(
        "",
        r#"
root = true
[lint]
platforms = ["scopus", "ebsco"]
disable = ["W0002"]
[platform.ebsco]
severity = { W0004 = "warning" }
"#,
    );
    let config = Config::load(env.path()).unwrap();
    let rendered = config.to_toml().unwrap();

    let other = TestEnv::new();
    other.config("", &format!("root = true\n{rendered}"));
    let reloaded = Config::load(other.path()).unwrap();
    assert_eq!(reloaded.lint, config.lint);
    assert_eq!(reloaded.platforms, config.platforms);
}
