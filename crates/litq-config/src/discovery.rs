//! Configuration file discovery.
//!
//! `.litq.toml` files are collected from the working directory upwards. A file
//! with `root = true` ends the walk; otherwise `~/.litq.toml` is appended as the
//! lowest-precedence layer.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use log::debug;

use crate::parse::is_root_config;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".litq.toml";

/// Discovers all configuration files relevant to the given directory.
///
/// Returns paths in precedence order: closest to `cwd` first, global last.
/// Returns an empty vector if no configuration files are found.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();

    for dir in cwd.ancestors() {
        let candidate = dir.join(CONFIG_FILENAME);
        if !candidate.is_file() {
            continue;
        }
        debug!("found config {}", candidate.display());
        let is_root = is_root_config(&candidate);
        configs.push(candidate);
        if is_root {
            return configs;
        }
    }

    if let Some(global) = global_config_path()
        && global.is_file()
        && !configs.contains(&global)
    {
        debug!("adding global config {}", global.display());
        configs.push(global);
    }
    configs
}

/// Returns the path to the global configuration file (`~/.litq.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Checks if a path is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::TestDir;

    /// Discovered files, minus the user's own global config.
    fn local(cwd: &Path) -> Vec<PathBuf> {
        discover_config_files(cwd)
            .into_iter()
            .filter(|p| !is_global_config(p))
            .collect()
    }

    #[test]
    fn test_discover_nothing() {
        let dir = TestDir::new();
        assert!(local(&dir.create_dir("reviews/2024")).is_empty());
    }

    #[test]
    fn test_closest_first() {
        let dir = TestDir::new();
        let top = dir.create_config_at_root();
        let mid = dir.create_config("reviews");
        let cwd = dir.create_dir("reviews/2024/oncology");

        assert_eq!(local(&cwd), vec![mid, top]);
        assert_eq!(local(dir.path()), vec![dir.path().join(CONFIG_FILENAME)]);
    }

    #[test]
    fn test_root_config_stops_discovery() {
        let dir = TestDir::new();
        dir.create_config_at_root();
        let root = dir.create_root_config("project");
        let child = dir.create_config("project/sub");
        let cwd = dir.create_dir("project/sub/deep");

        // No global config either.
        assert_eq!(discover_config_files(&cwd), vec![child, root]);
    }

    #[test]
    fn test_root_false_continues() {
        let dir = TestDir::new();
        let top = dir.create_config_at_root();
        let mid = dir.create_config_with_content("project", "root = false\n");
        assert_eq!(local(&dir.create_dir("project/src")), vec![mid, top]);
    }

    #[test]
    fn test_directory_named_like_config_is_skipped() {
        let dir = TestDir::new();
        fs::create_dir_all(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(local(&dir.create_dir("sub")).is_empty());
    }

    #[test]
    fn test_global_config_path() {
        let global = global_config_path().unwrap();
        assert!(global.ends_with(CONFIG_FILENAME));
        assert!(is_global_config(&global));
        assert!(!is_global_config(Path::new("/srv/reviews/.litq.toml")));
    }
}
