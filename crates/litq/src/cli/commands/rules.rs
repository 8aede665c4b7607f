//! Implementation of `litq rules`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use litq_lint::{Registry, Rule};
use litq_query::{Platform, Severity};
use serde::Serialize;

use crate::cli::{
    args::RulesCommand,
    output::{dim, header, print_json, severity, subheader},
};

/// JSON output for a single rule.
#[derive(Serialize)]
struct JsonRule {
    /// Rule code.
    code: &'static str,
    /// Short rule name.
    name: &'static str,
    /// Default severity.
    severity: Severity,
    /// Platforms the rule applies to.
    scope: &'static [Platform],
    /// Diagnostic message.
    message: &'static str,
    /// Suggested fix.
    fix_hint: &'static str,
    /// A query that triggers the rule.
    example: &'static str,
    /// The same query with the problem fixed.
    corrected: &'static str,
}

impl From<&Rule> for JsonRule {
    fn from(rule: &Rule) -> Self {
        Self {
            code: rule.code,
            name: rule.name,
            severity: rule.severity,
            scope: rule.scope,
            message: rule.message,
            fix_hint: rule.fix_hint,
            example: rule.example,
            corrected: rule.corrected,
        }
    }
}

/// Lists the built-in rules, or shows one rule in detail.
pub fn run(cmd: &RulesCommand) -> ExitCode {
    let registry = Registry::builtin();

    if let Some(code) = &cmd.code {
        let Some(rule) = registry.get(&code.trim().to_ascii_uppercase()) else {
            eprintln!("error: unknown rule code '{code}'");
            eprintln!("run 'litq rules' to list all rules");
            return ExitCode::FAILURE;
        };
        if cmd.json {
            return print_json(&JsonRule::from(rule));
        }
        print_rule(rule);
        return ExitCode::SUCCESS;
    }

    let rules: Vec<&Rule> = registry
        .rules()
        .filter(|rule| cmd.platform.is_none_or(|p| applies_to(rule, p)))
        .collect();

    if cmd.json {
        let rules: Vec<JsonRule> = rules.into_iter().map(JsonRule::from).collect();
        return print_json(&rules);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Code", "Name", "Severity", "Scope", "Message"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(rule.code),
            Cell::new(rule.name),
            Cell::new(rule.severity.name()),
            Cell::new(scope_names(rule.scope)),
            Cell::new(rule.message),
        ]);
    }
    println!("{table}");
    ExitCode::SUCCESS
}

/// Whether `rule` runs when `platform` is targeted.
fn applies_to(rule: &Rule, platform: Platform) -> bool {
    rule.scope.contains(&platform) || rule.scope.contains(&Platform::All)
}

/// Comma-separated platform names.
fn scope_names(scope: &[Platform]) -> String {
    scope
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints one rule with its example and corrected queries.
fn print_rule(rule: &Rule) {
    println!(
        "{} {} {}",
        header(rule.code),
        subheader(rule.name),
        dim(&format!("({})", scope_names(rule.scope)))
    );
    println!("{}: {}", severity(rule.severity), rule.message);
    println!();
    println!("{}", subheader("Fix:"));
    println!("    {}", rule.fix_hint);
    println!();
    println!("{}", subheader("Example:"));
    println!("    {}", rule.example);
    println!();
    println!("{}", subheader("Corrected:"));
    println!("    {}", rule.corrected);
}
