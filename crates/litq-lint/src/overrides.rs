//! Per-platform rule profiles.
//!
//! A profile can switch a rule off for one platform or change the severity
//! it reports with when that platform is targeted. The built-in catalogue
//! carries a few of these; configuration layers more on top.

use std::collections::{BTreeMap, BTreeSet};

use litq_query::{Platform, Severity};

use crate::rule::Rule;

/// Rule adjustments for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Codes the platform does not run.
    pub disabled: BTreeSet<String>,
    /// Severity replacements by code.
    pub severity: BTreeMap<String, Severity>,
}

impl PlatformProfile {
    /// Whether the profile changes nothing.
    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty() && self.severity.is_empty()
    }
}

/// Rule profiles keyed by platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOverrides {
    /// The profiles.
    profiles: BTreeMap<Platform, PlatformProfile>,
}

impl PlatformOverrides {
    /// An empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalogue's own adjustments: PubMed treats lowercase operators
    /// as search terms and EBSCO joins adjacent words as a phrase, so both
    /// are errors there.
    pub fn builtin() -> Self {
        let mut overrides = Self::new();
        overrides.set_severity(Platform::PubMed, "W0003", Severity::Error);
        overrides.set_severity(Platform::Ebsco, "W0004", Severity::Error);
        overrides
    }

    /// Disables `code` for `platform`.
    pub fn disable(&mut self, platform: Platform, code: impl Into<String>) {
        self.profiles
            .entry(platform)
            .or_default()
            .disabled
            .insert(code.into());
    }

    /// Reports `code` with `severity` when `platform` is targeted.
    pub fn set_severity(&mut self, platform: Platform, code: impl Into<String>, severity: Severity) {
        self.profiles
            .entry(platform)
            .or_default()
            .severity
            .insert(code.into(), severity);
    }

    /// The profile for `platform`, if any.
    pub fn profile(&self, platform: Platform) -> Option<&PlatformProfile> {
        self.profiles.get(&platform)
    }

    /// Iterates over profiles in platform order.
    pub fn iter(&self) -> impl Iterator<Item = (Platform, &PlatformProfile)> {
        self.profiles.iter().map(|(p, profile)| (*p, profile))
    }

    /// Every code the overrides mention.
    pub fn codes(&self) -> BTreeSet<&str> {
        self.profiles
            .values()
            .flat_map(|p| p.disabled.iter().chain(p.severity.keys()))
            .map(String::as_str)
            .collect()
    }

    /// Layers `other` on top; its entries win.
    pub fn merge(&mut self, other: &Self) {
        for (platform, profile) in &other.profiles {
            let ours = self.profiles.entry(*platform).or_default();
            ours.disabled.extend(profile.disabled.iter().cloned());
            for (code, severity) in &profile.severity {
                ours.severity.insert(code.clone(), *severity);
            }
        }
    }

    /// Whether `platform` switches `code` off.
    pub fn is_disabled(&self, platform: Platform, code: &str) -> bool {
        self.profiles
            .get(&platform)
            .is_some_and(|p| p.disabled.contains(code))
    }

    /// The severity override for `code`, taking the most severe one among
    /// the targeted platforms.
    pub fn severity_for(&self, code: &str, targets: &BTreeSet<Platform>) -> Option<Severity> {
        targets
            .iter()
            .filter_map(|p| self.profiles.get(p)?.severity.get(code).copied())
            .max()
    }

    /// The rule's declared scope minus platforms that disable it.
    pub fn effective_scope(&self, rule: &Rule) -> BTreeSet<Platform> {
        rule.scope
            .iter()
            .copied()
            .filter(|p| !self.is_disabled(*p, rule.code))
            .collect()
    }
}
