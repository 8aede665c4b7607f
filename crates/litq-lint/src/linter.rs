//! The lint engine.

use std::collections::BTreeSet;

use litq_query::{
    Diagnostic, ParseOptions, Parsed, Platform, Severity, Token, from_json_with, parse, tokenize,
};
use log::{debug, trace};
use rayon::prelude::*;
use serde_json::Value;

use crate::{
    error::LintError,
    overrides::PlatformOverrides,
    registry::Registry,
    report::Report,
    rule::{Check, Findings, Rule, RuleContext},
};

/// How a [`Linter`] is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOptions {
    /// Per-platform profiles. Defaults to the built-in catalogue.
    pub overrides: PlatformOverrides,
    /// Codes switched off for every platform.
    pub disabled: BTreeSet<String>,
    /// Options for parsing query strings.
    pub parse: ParseOptions,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            overrides: PlatformOverrides::builtin(),
            disabled: BTreeSet::new(),
            parse: ParseOptions::default(),
        }
    }
}

/// Runs registered rules over parsed queries.
///
/// A linter holds no mutable state, so one instance can lint any number of
/// queries, from any number of threads.
#[derive(Debug, Clone)]
pub struct Linter<'r> {
    /// Rules to run.
    registry: &'r Registry,
    /// Overrides and parse settings.
    options: LintOptions,
}

impl Default for Linter<'static> {
    fn default() -> Self {
        Self {
            registry: Registry::builtin(),
            options: LintOptions::default(),
        }
    }
}

impl Linter<'static> {
    /// A linter over the built-in rules.
    ///
    /// Fails if `options` names a code that is not registered, or tries to
    /// disable or re-grade a fatal rule.
    pub fn new(options: LintOptions) -> Result<Self, LintError> {
        Linter::with_registry(Registry::builtin(), options)
    }
}

impl<'r> Linter<'r> {
    /// A linter over a custom rule table.
    pub fn with_registry(registry: &'r Registry, options: LintOptions) -> Result<Self, LintError> {
        let codes = options
            .disabled
            .iter()
            .map(String::as_str)
            .chain(options.overrides.codes());
        for code in codes {
            let rule = registry
                .get(code)
                .ok_or_else(|| LintError::UnknownRule(code.to_string()))?;
            if rule.severity == Severity::Fatal {
                return Err(LintError::FatalRule(code.to_string()));
            }
        }
        Ok(Self { registry, options })
    }

    /// The options in effect.
    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    /// The rule table.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Lints a parsed query.
    ///
    /// `tokens` are the tokens the query was parsed from; pass an empty slice
    /// for list-format input, which skips the token rules. Parser diagnostics
    /// in `parsed` are always part of the report.
    pub fn lint(
        &self,
        tokens: &[Token],
        parsed: &Parsed,
        targets: &BTreeSet<Platform>,
    ) -> Result<Report, LintError> {
        if targets.is_empty() {
            return Err(LintError::NoTargetPlatforms);
        }
        debug!("linting {} tokens for {targets:?}", tokens.len());

        let mut diagnostics = parsed.diagnostics.clone();
        for rule in self.registry.rules() {
            if self.options.disabled.contains(rule.code) {
                continue;
            }
            let runnable = match rule.check {
                Check::Tokens(_) => !tokens.is_empty(),
                Check::Tree(_) => !parsed.query.is_empty(),
                Check::Parser => false,
            };
            if !runnable {
                continue;
            }
            diagnostics.extend(self.run_rule(rule, tokens, parsed, targets));
        }
        Ok(Report::new(diagnostics))
    }

    /// Tokenizes, parses and lints a query string.
    pub fn lint_str(&self, text: &str, targets: &BTreeSet<Platform>) -> Result<Report, LintError> {
        let tokens = tokenize(text);
        let parsed = parse(&tokens, &self.options.parse);
        self.lint(&tokens, &parsed, targets)
    }

    /// Lints a query in canonical JSON, in either shape.
    pub fn lint_json(&self, value: &Value, targets: &BTreeSet<Platform>) -> Result<Report, LintError> {
        let parsed = from_json_with(value, &self.options.parse);
        let tokens = value
            .get("search_string")
            .and_then(Value::as_str)
            .map(tokenize)
            .unwrap_or_default();
        self.lint(&tokens, &parsed, targets)
    }

    /// Lints independent query strings in parallel. Results are in input
    /// order.
    pub fn lint_batch<S>(
        &self,
        queries: &[S],
        targets: &BTreeSet<Platform>,
    ) -> Vec<Result<Report, LintError>>
    where
        S: AsRef<str> + Sync,
    {
        debug!("linting a batch of {} queries", queries.len());
        queries
            .par_iter()
            .map(|query| self.lint_str(query.as_ref(), targets))
            .collect()
    }

    /// Runs one rule and turns its findings into diagnostics.
    fn run_rule(
        &self,
        rule: &Rule,
        tokens: &[Token],
        parsed: &Parsed,
        targets: &BTreeSet<Platform>,
    ) -> Vec<Diagnostic> {
        let scope = self.options.overrides.effective_scope(rule);
        let mut active: BTreeSet<Platform> = scope.intersection(targets).copied().collect();
        if active.is_empty() {
            // Fatal findings make the query unusable on any platform.
            if rule.severity != Severity::Fatal || scope.is_empty() {
                return Vec::new();
            }
            active = scope;
        }

        let ctx = RuleContext {
            tokens,
            query: &parsed.query,
            platforms: &active,
        };
        let mut findings = Findings::default();
        if let Check::Tokens(check) | Check::Tree(check) = rule.check {
            check(&ctx, &mut findings);
        }
        if findings.is_empty() {
            return Vec::new();
        }
        trace!("{} found {} times", rule.code, findings.len());

        let severity = if rule.severity == Severity::Fatal {
            rule.severity
        } else {
            self.options
                .overrides
                .severity_for(rule.code, targets)
                .unwrap_or(rule.severity)
        };
        findings
            .into_iter()
            .map(|finding| rule.diagnostic(finding, severity, &active))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use litq_query::{Span, parse_str};

    use super::*;

    fn targets(platforms: &[Platform]) -> BTreeSet<Platform> {
        platforms.iter().copied().collect()
    }

    fn codes(report: &Report) -> Vec<&str> {
        report.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn empty_targets_rejected() {
        let linter = Linter::default();
        assert_eq!(
            linter.lint_str("a", &BTreeSet::new()),
            Err(LintError::NoTargetPlatforms)
        );
    }

    #[test]
    fn clean_query() {
        let linter = Linter::default();
        let report = linter
            .lint_str("(a AND b) OR c", &targets(&[Platform::All]))
            .expect("lint");
        assert!(report.is_empty(), "{report}");
    }

    #[test]
    fn implicit_precedence_reported_once() {
        let linter = Linter::default();
        let report = linter
            .lint_str("a AND b OR c", &targets(&[Platform::All]))
            .expect("lint");
        assert_eq!(codes(&report), ["W0007"]);
    }

    #[test]
    fn parser_diagnostics_merged() {
        let linter = Linter::default();
        let report = linter
            .lint_str("(a AND b OR c", &targets(&[Platform::All]))
            .expect("lint");
        let fatal: Vec<_> = report.iter().filter(|d| d.code() == "F1002").collect();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].span().map(|s| s.start), Some(0));
    }

    #[test]
    fn scope_limits_rules() {
        let linter = Linter::default();
        let generic = linter
            .lint_str("cancer NEAR/3 therapy", &targets(&[Platform::All]))
            .expect("lint");
        assert!(!codes(&generic).contains(&"E0005"));

        let pubmed = linter
            .lint_str("cancer NEAR/3 therapy", &targets(&[Platform::PubMed]))
            .expect("lint");
        assert!(codes(&pubmed).contains(&"E0005"));
        assert!(codes(&pubmed).contains(&"W0008"));
        for diagnostic in &pubmed {
            assert!(diagnostic.scope().contains(&Platform::PubMed) || diagnostic.is_fatal());
        }
    }

    #[test]
    fn builtin_severity_override() {
        let linter = Linter::default();
        let generic = linter
            .lint_str("ti:a and ti:b", &targets(&[Platform::All]))
            .expect("lint");
        let w0003 = generic.iter().find(|d| d.code() == "W0003").expect("W0003");
        assert_eq!(w0003.severity(), Severity::Warning);

        let pubmed = linter
            .lint_str("ti:a and ti:b", &targets(&[Platform::All, Platform::PubMed]))
            .expect("lint");
        let w0003 = pubmed.iter().find(|d| d.code() == "W0003").expect("W0003");
        assert_eq!(w0003.severity(), Severity::Error);
    }

    #[test]
    fn disabled_rules_skipped() {
        let options = LintOptions {
            disabled: BTreeSet::from(["W0007".to_string()]),
            ..LintOptions::default()
        };
        let linter = Linter::new(options).expect("linter");
        let report = linter
            .lint_str("a AND b OR c", &targets(&[Platform::All]))
            .expect("lint");
        assert!(report.is_empty());
    }

    #[test]
    fn platform_disable_narrows_scope() {
        let mut options = LintOptions::default();
        options.overrides.disable(Platform::PubMed, "W0008");
        let linter = Linter::new(options).expect("linter");
        let report = linter
            .lint_str("ti:a OR b", &targets(&[Platform::PubMed]))
            .expect("lint");
        assert!(!codes(&report).contains(&"W0008"));
    }

    #[test]
    fn options_validated() {
        let unknown = LintOptions {
            disabled: BTreeSet::from(["W9999".to_string()]),
            ..LintOptions::default()
        };
        assert_eq!(
            Linter::new(unknown).err(),
            Some(LintError::UnknownRule("W9999".into()))
        );

        let fatal = LintOptions {
            disabled: BTreeSet::from(["F1002".to_string()]),
            ..LintOptions::default()
        };
        assert_eq!(
            Linter::new(fatal).err(),
            Some(LintError::FatalRule("F1002".into()))
        );
    }

    #[test]
    fn fatal_token_rule_ignores_scope() {
        let linter = Linter::default();
        let report = linter
            .lint_str("\"open phrase", &targets(&[Platform::Scopus]))
            .expect("lint");
        let f1001 = report.iter().find(|d| d.code() == "F1001").expect("F1001");
        assert_eq!(f1001.span(), Some(Span::new(0, 1)));
    }

    #[test]
    fn list_input_skips_token_rules() {
        let linter = Linter::default();
        let value = serde_json::json!([
            {"operator": "AND", "operands": ["a", {"term": "b", "field": "ti"}]}
        ]);
        let report = linter.lint_json(&value, &targets(&[Platform::All])).expect("lint");
        assert!(report.is_empty(), "{report}");
    }

    #[test]
    fn lint_matches_prepared_parse() {
        let linter = Linter::default();
        let text = "a b";
        let tokens = tokenize(text);
        let parsed = parse_str(text);
        let all = targets(&[Platform::All]);
        assert_eq!(
            linter.lint(&tokens, &parsed, &all),
            linter.lint_str(text, &all)
        );
    }

    #[test]
    fn batch_preserves_order() {
        let linter = Linter::default();
        let queries = ["a AND b OR c", "(a", "a OR b"];
        let reports = linter.lint_batch(&queries, &targets(&[Platform::All]));
        assert_eq!(reports.len(), 3);
        let first = reports[0].as_ref().expect("lint");
        assert_eq!(codes(first), ["W0007"]);
        assert!(reports[1].as_ref().expect("lint").has_fatal());
        assert!(reports[2].as_ref().expect("lint").is_empty());
    }
}
