//! CLI integration tests for litq commands.
//!
//! These tests focus on exit codes and the diagnostics that reach the user,
//! not on exact output formatting.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get a litq command with HOME isolated to `home`.
fn litq(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("litq").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG").current_dir(home);
    cmd
}

/// Runs a command expected to print JSON and parses its stdout.
fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

mod lint {
    use super::*;

    #[test]
    fn clean_query_succeeds() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "cancer AND therapy"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no issues"));
    }

    #[test]
    fn warnings_do_not_fail() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "a AND b OR c"])
            .assert()
            .success()
            .stdout(predicate::str::contains("warning[W0007]"))
            .stdout(predicate::str::contains("1 warning"));
    }

    #[test]
    fn errors_fail() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "*cancer"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("E0002"));
    }

    #[test]
    fn fatal_points_at_the_problem() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "a AND b) OR c"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("fatal[F1003]"))
            .stdout(predicate::str::contains("  a AND b) OR c\n         ^"));
    }

    #[test]
    fn platform_rules_need_the_platform() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "ca* AND ti:x"])
            .assert()
            .success()
            .stdout(predicate::str::contains("E0004").not());

        litq(dir.path())
            .args(["lint", "-p", "pubmed", "ca* AND ti:x"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("E0004"));
    }

    #[test]
    fn min_severity_hides_warnings() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "--min-severity", "error", "a AND b OR c"])
            .assert()
            .success()
            .stdout(predicate::str::contains("W0007").not());
    }

    #[test]
    fn disable_flag_skips_rule() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "-d", "w0007", "a AND b OR c"])
            .assert()
            .success()
            .stdout(predicate::str::contains("W0007").not());
    }

    #[test]
    fn fatal_rules_cannot_be_disabled() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "-d", "F1002", "a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn json_output_lists_diagnostics() {
        let dir = temp_dir();
        let json = json_output(litq(dir.path()).args(["lint", "--json", "a AND b OR c", "x"]));
        let results = json.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["source"], "query 1");
        assert_eq!(results[0]["diagnostics"][0]["code"], "W0007");
        assert_eq!(results[0]["diagnostics"][0]["severity"], "warning");
        assert!(results[1]["diagnostics"].as_array().unwrap().is_empty());
    }

    #[test]
    fn reads_queries_from_file() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("queries.txt"),
            "# oncology\ncancer AND therapy\n\na AND b OR c\n",
        )
        .unwrap();
        litq(dir.path())
            .args(["lint", "-f", "queries.txt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("queries.txt:2"))
            .stdout(predicate::str::contains("queries.txt:4"))
            .stdout(predicate::str::contains("W0007"));
    }

    #[test]
    fn reads_canonical_json() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("search.json"),
            r#"[{"operator": "OR", "operands": ["*cancer", "tumour"]}]"#,
        )
        .unwrap();
        litq(dir.path())
            .args(["lint", "--from-json", "-f", "search.json"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("E0002"));
    }

    #[test]
    fn reads_stdin() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["lint", "-f", "-"])
            .write_stdin("a AND b OR c\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("W0007"));
    }

    #[test]
    fn no_queries_fails() {
        let dir = temp_dir();
        litq(dir.path())
            .arg("lint")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no queries given"));
    }

    #[test]
    fn config_disables_rules() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".litq.toml"),
            "root = true\n[lint]\ndisable = [\"W0007\"]\n",
        )
        .unwrap();
        litq(dir.path())
            .args(["lint", "a AND b OR c"])
            .assert()
            .success()
            .stdout(predicate::str::contains("W0007").not());
    }

    #[test]
    fn config_platform_severity_applies() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".litq.toml"),
            r#"
root = true
[lint]
platforms = ["pubmed"]
[platform.pubmed]
disable = ["W0008"]
severity = { W0007 = "error" }
"#,
        )
        .unwrap();
        litq(dir.path())
            .args(["lint", "ti:a AND ti:b OR ti:c"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("error[W0007]"));
    }

    #[test]
    fn broken_config_fails() {
        let dir = temp_dir();
        fs::write(dir.path().join(".litq.toml"), "root = true\n[lint\n").unwrap();
        litq(dir.path())
            .args(["lint", "a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to load configuration"));
    }
}

mod parse {
    use super::*;

    #[test]
    fn prints_tree() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["parse", "ti:cancer AND (therapy OR drug)"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cancer [ti]"))
            .stdout(predicate::str::contains("OR (parens)"));
    }

    #[test]
    fn json_string_shape() {
        let dir = temp_dir();
        let json = json_output(litq(dir.path()).args(["parse", "--json", "ti:ai OR ml"]));
        assert_eq!(json["search_string"], "ti:ai OR ml");
    }

    #[test]
    fn json_list_shape() {
        let dir = temp_dir();
        let json = json_output(litq(dir.path()).args(["parse", "--json", "--list", "a AND b"]));
        assert_eq!(json[0]["operator"], "AND");
    }

    #[test]
    fn fatal_parse_fails() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["parse", "(a AND b OR c"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("F1002"));
    }
}

mod format {
    use super::*;

    #[test]
    fn canonical() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["format", "a b"])
            .assert()
            .success()
            .stdout("a AND b\n");
    }

    #[test]
    fn platform_syntax() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["format", "-p", "wos", "ti:ai OR ml"])
            .assert()
            .success()
            .stdout("TI=(ai) OR TS=(ml)\n");
    }

    #[test]
    fn refuses_fatal_queries() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["format", "(a"])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("F1002"));
    }
}

mod screen {
    use super::*;

    #[test]
    fn selects_matching_records() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("records.json"),
            r#"[{"title": "Cancer therapy outcomes"}, {"title": "Heart disease", "abstract": "no tumours"}]"#,
        )
        .unwrap();
        litq(dir.path())
            .args(["screen", "cancer", "-r", "records.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cancer therapy outcomes"))
            .stdout(predicate::str::contains("1 of 2 records selected"));

        let json = json_output(litq(dir.path()).args([
            "screen",
            "--json",
            "heart OR cancer",
            "-r",
            "records.json",
        ]));
        assert_eq!(json["total"], 2);
        assert_eq!(json["selected"], serde_json::json!([0, 1]));
    }

    #[test]
    fn missing_records_file_fails() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["screen", "cancer", "-r", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read"));
    }
}

mod rules {
    use super::*;

    #[test]
    fn lists_rules() {
        let dir = temp_dir();
        litq(dir.path())
            .arg("rules")
            .assert()
            .success()
            .stdout(predicate::str::contains("W0007"))
            .stdout(predicate::str::contains("implicit-precedence"));
    }

    #[test]
    fn shows_one_rule() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["rules", "w0007"])
            .assert()
            .success()
            .stdout(predicate::str::contains("a AND b OR c"))
            .stdout(predicate::str::contains("(a AND b) OR c"));
    }

    #[test]
    fn unknown_rule_fails() {
        let dir = temp_dir();
        litq(dir.path())
            .args(["rules", "X9999"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown rule code"));
    }

    #[test]
    fn platform_filter() {
        let dir = temp_dir();
        let json = json_output(litq(dir.path()).args(["rules", "--json", "-p", "ebsco"]));
        let codes: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|rule| rule["code"].as_str().unwrap())
            .collect();
        assert!(codes.contains(&"W0007"));
        assert!(codes.contains(&"E0001"));
        assert!(!codes.contains(&"E0003"));
    }

    #[test]
    fn rules_work_with_broken_config() {
        let dir = temp_dir();
        fs::write(dir.path().join(".litq.toml"), "[lint\n").unwrap();
        litq(dir.path()).arg("rules").assert().success();
    }
}

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();
        let home = temp_dir();
        let mut cmd = litq(home.path());
        cmd.current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let contents = fs::read_to_string(dir.path().join(".litq.toml")).unwrap();
        assert!(contents.contains("# [lint]"));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join(".litq.toml"), "existing").unwrap();
        let mut cmd = litq(home.path());
        cmd.current_dir(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn force_overwrites_broken_config() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join(".litq.toml"), "[lint\n").unwrap();
        let mut cmd = litq(home.path());
        cmd.current_dir(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();
        let contents = fs::read_to_string(dir.path().join(".litq.toml")).unwrap();
        assert!(contents.contains("# root = true"));
    }

    #[test]
    fn global_writes_home_config() {
        let home = temp_dir();
        litq(home.path()).args(["init", "--global"]).assert().success();
        let contents = fs::read_to_string(home.path().join(".litq.toml")).unwrap();
        assert!(contents.contains("# [lint]"));
    }
}

mod config {
    use super::*;

    #[test]
    fn shows_defaults_without_files() {
        let dir = temp_dir();
        litq(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("no configuration files found"))
            .stdout(predicate::str::contains("[lint]"));
    }

    #[test]
    fn shows_merged_settings_and_warnings() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".litq.toml"),
            "root = true\n[lint]\nplatforms = [\"scopus\"]\ndisable = [\"W9999\"]\n",
        )
        .unwrap();
        litq(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("scopus"))
            .stderr(predicate::str::contains("unknown rule code 'W9999'"));
    }
}

#[test]
fn top_level_help_lists_commands() {
    let dir = temp_dir();
    litq(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("Platforms: all, pubmed"));
}
