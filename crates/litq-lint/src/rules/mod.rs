//! Built-in rules.

mod parser;
mod platform;
mod structure;
mod syntax;

use std::collections::BTreeSet;

use litq_query::{Platform, PlatformSyntax};

use crate::rule::{Rule, RuleContext};

/// Scope of rules that apply everywhere.
const GENERIC: &[Platform] = &[Platform::All];

/// Scope of PubMed-only rules.
const PUBMED: &[Platform] = &[Platform::PubMed];

/// Platforms whose syntax has no proximity operator.
const NO_PROXIMITY: &[Platform] = &[Platform::PubMed];

/// Platforms that silently expand unqualified terms.
const EXPANDS_UNQUALIFIED: &[Platform] = &[Platform::PubMed];

/// Every built-in rule, in no particular order.
pub fn builtin() -> Vec<Rule> {
    let mut rules = parser::rules();
    rules.extend(syntax::rules());
    rules.extend(structure::rules());
    rules.extend(platform::rules());
    rules
}

/// Active platforms whose syntax satisfies `pred`.
pub fn platforms_where(
    ctx: &RuleContext<'_>,
    pred: impl Fn(&PlatformSyntax) -> bool,
) -> BTreeSet<Platform> {
    ctx.platforms
        .iter()
        .copied()
        .filter(|p| pred(p.syntax()))
        .collect()
}

/// Names of `platforms`, comma separated.
pub fn names(platforms: &BTreeSet<Platform>) -> String {
    platforms
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub use test_support::run_check;


#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue(pred: impl Fn(&PlatformSyntax) -> bool) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| pred(p.syntax()))
            .collect()
    }

    #[test]
    fn capability_scopes_follow_the_catalogue() {
        assert_eq!(NO_PROXIMITY, catalogue(|s| !s.proximity).as_slice());
        assert_eq!(EXPANDS_UNQUALIFIED, catalogue(|s| s.expands_unqualified).as_slice());
    }

    #[test]
    fn capability_rules_declare_capability_scopes() {
        let rules = builtin();
        let scope = |code: &str| rules.iter().find(|r| r.code == code).map(|r| r.scope);
        assert_eq!(scope("E0005"), Some(NO_PROXIMITY));
        assert_eq!(scope("W0008"), Some(EXPANDS_UNQUALIFIED));
    }
}
