//! Shared context for running CLI commands.

use std::{
    collections::BTreeSet,
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use litq_config::Config;
use litq_lint::Linter;
use litq_query::{ParseOptions, Platform};

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = load_config_or_failure(&cwd)?;
        Ok(Self { cwd, config })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used for `init`, which should work even when an existing config file is
    /// invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Config::default(),
        })
    }

    /// Target platforms: the explicit ones if any, else the configured ones.
    pub fn targets(&self, explicit: &[Platform]) -> BTreeSet<Platform> {
        self.config.targets(explicit)
    }

    /// Parse options for `targets`.
    pub fn parse_options(&self, targets: &BTreeSet<Platform>) -> ParseOptions {
        self.config.parse_options(targets)
    }

    /// Builds a linter for `targets`, with extra rules disabled for this run.
    pub fn linter(
        &self,
        targets: &BTreeSet<Platform>,
        disable: &[String],
    ) -> Result<Linter<'static>, ExitCode> {
        let mut options = self.config.lint_options(targets);
        options
            .disabled
            .extend(disable.iter().map(|code| code.trim().to_ascii_uppercase()));
        Linter::new(options).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        })
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the provided directory or exits with an error.
fn load_config_or_failure(cwd: &Path) -> Result<Config, ExitCode> {
    Config::load(cwd).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}
