//! Rules that depend on a platform's syntax profile.

use litq_query::{Platform, Severity, Term};

use super::{EXPANDS_UNQUALIFIED, PUBMED, names, platforms_where};
use crate::rule::{Check, Findings, Rule, RuleContext};

/// Platforms with their own field tags.
const TAGGED: &[Platform] = &[
    Platform::PubMed,
    Platform::WebOfScience,
    Platform::Scopus,
    Platform::Ebsco,
];

/// Platform rules.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "E0001",
            name: "unsupported-field",
            severity: Severity::Error,
            scope: TAGGED,
            message: "field is not supported",
            fix_hint: "use a field the platform supports, or drop the qualifier",
            example: "tiab:cancer",
            corrected: "ti:cancer OR ab:cancer",
            check: Check::Tree(unsupported_field),
        },
        Rule {
            code: "E0003",
            name: "unsupported-wildcard-character",
            severity: Severity::Error,
            scope: PUBMED,
            message: "wildcard character is not supported",
            fix_hint: "use '*' as the only wildcard",
            example: "wom?n",
            corrected: "woman OR women",
            check: Check::Tree(unsupported_wildcard),
        },
        Rule {
            code: "E0004",
            name: "wildcard-stem-too-short",
            severity: Severity::Error,
            scope: PUBMED,
            message: "too few characters before the wildcard",
            fix_hint: "lengthen the stem before the wildcard",
            example: "ca*",
            corrected: "cancer*",
            check: Check::Tree(short_wildcard_stem),
        },
        Rule {
            code: "W0008",
            name: "unqualified-term",
            severity: Severity::Warning,
            scope: EXPANDS_UNQUALIFIED,
            message: "term has no field and is subject to automatic term mapping",
            fix_hint: "add a field qualifier such as tiab:",
            example: "cancer",
            corrected: "tiab:cancer",
            check: Check::Tree(unqualified_term),
        },
    ]
}

/// Characters of a non-exact term that some platform treats as wildcards.
fn wildcard_chars(term: &Term) -> impl Iterator<Item = char> + '_ {
    term.value
        .chars()
        .filter(move |c| !term.exact && matches!(c, '*' | '?' | '$' | '#'))
}

/// E0001: a field qualifier the targeted platform has no tag for.
fn unsupported_field(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for (id, term) in ctx.query.terms() {
        let Some(field) = &term.field else { continue };
        let unsupported = platforms_where(ctx, |s| !s.supports_field(field));
        if !unsupported.is_empty() {
            let detail = format!("'{field}' on {}", names(&unsupported));
            findings.push_scoped(ctx.query.node(id).span, detail, unsupported);
        }
    }
}

/// E0003: a wildcard character outside the platform's set.
fn unsupported_wildcard(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for (id, term) in ctx.query.terms() {
        for ch in wildcard_chars(term) {
            let unsupported = platforms_where(ctx, |s| !s.wildcards.contains(&ch));
            if !unsupported.is_empty() {
                let detail = format!("'{ch}' in '{}' on {}", term.value, names(&unsupported));
                findings.push_scoped(ctx.query.node(id).span, detail, unsupported);
                break;
            }
        }
    }
}

/// E0004: `ca*` where the platform needs a longer stem. Leading wildcards
/// are left to E0002.
fn short_wildcard_stem(ctx: &RuleContext<'_>, findings: &mut Findings) {
    for (id, term) in ctx.query.terms() {
        if term.exact {
            continue;
        }
        let Some(stem) = term.value.find(['*', '?', '$', '#']) else {
            continue;
        };
        let stem_chars = term.value[..stem].chars().count();
        if stem_chars == 0 {
            continue;
        }
        let short = platforms_where(ctx, |s| stem_chars < s.min_wildcard_stem);
        if !short.is_empty() {
            let detail = format!("'{}' on {}", term.value, names(&short));
            findings.push_scoped(ctx.query.node(id).span, detail, short);
        }
    }
}

/// W0008: a term without a field qualifier, on platforms that expand such
/// terms.
fn unqualified_term(ctx: &RuleContext<'_>, findings: &mut Findings) {
    let expanding = platforms_where(ctx, |s| s.expands_unqualified);
    if expanding.is_empty() {
        return;
    }
    for (id, term) in ctx.query.terms() {
        if term.field.is_none() {
            let detail = format!("'{}'", term.value);
            findings.push_scoped(ctx.query.node(id).span, detail, expanding.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use litq_query::Span;

    use super::*;
    use crate::rules::run_check;

    #[test]
    fn field_unsupported_on_some_platforms() {
        let findings = run_check(
            &Check::Tree(unsupported_field),
            "tiab:cancer AND ti:therapy",
            &[Platform::PubMed, Platform::Ebsco],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span, Some(Span::new(0, 11)));
        assert_eq!(findings[0].scope, Some(BTreeSet::from([Platform::Ebsco])));
        assert_eq!(findings[0].detail.as_deref(), Some("'tiab' on ebsco"));
    }

    #[test]
    fn unknown_field_everywhere() {
        let findings = run_check(&Check::Tree(unsupported_field), "xx:cancer", TAGGED);
        assert_eq!(findings[0].scope.as_ref().map(BTreeSet::len), Some(4));
    }

    #[test]
    fn pubmed_wildcards() {
        let pubmed = &[Platform::PubMed];
        assert_eq!(run_check(&Check::Tree(unsupported_wildcard), "wom?n", pubmed).len(), 1);
        assert!(run_check(&Check::Tree(unsupported_wildcard), "wom*", pubmed).is_empty());
        assert!(run_check(&Check::Tree(unsupported_wildcard), "\"wom?n\"", pubmed).is_empty());
        assert_eq!(run_check(&Check::Tree(short_wildcard_stem), "ca*", pubmed).len(), 1);
        assert!(run_check(&Check::Tree(short_wildcard_stem), "canc*", pubmed).is_empty());
        assert!(run_check(&Check::Tree(short_wildcard_stem), "*cancer", pubmed).is_empty());
    }

    #[test]
    fn unqualified_terms() {
        let findings = run_check(
            &Check::Tree(unqualified_term),
            "cancer AND ti:therapy",
            &[Platform::PubMed],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span, Some(Span::new(0, 6)));
        assert_eq!(findings[0].scope, Some(BTreeSet::from([Platform::PubMed])));
        let scopus = run_check(&Check::Tree(unqualified_term), "cancer", &[Platform::Scopus]);
        assert!(scopus.is_empty());
    }
}
