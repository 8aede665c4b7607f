//! The rule registry.
//!
//! A table from code to [`Rule`], validated when it is built and read-only
//! afterwards. The built-in table is built once per process.

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;

use crate::{error::RegistryError, rule::Rule, rules};

/// The built-in rule table.
static BUILTIN: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new(rules::builtin()).expect("built-in rule table is valid");
    debug!("registered {} built-in rules", registry.len());
    registry
});

/// Rules keyed by code.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Rules in code order.
    rules: BTreeMap<&'static str, Rule>,
}

impl Registry {
    /// Validates and registers `rules`.
    ///
    /// Codes must be unique and a letter followed by four digits, the letter
    /// must match the severity (`F` fatal, `E` error, `W` warning), and every
    /// scope must be non-empty.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RegistryError> {
        let mut table = BTreeMap::new();
        for rule in rules {
            validate(&rule)?;
            if table.insert(rule.code, rule).is_some() {
                return Err(RegistryError::DuplicateCode(rule.code.to_string()));
            }
        }
        Ok(Self { rules: table })
    }

    /// The built-in rule table.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Looks up a rule by code.
    pub fn get(&self, code: &str) -> Option<&Rule> {
        self.rules.get(code)
    }

    /// Whether a rule with `code` exists.
    pub fn contains(&self, code: &str) -> bool {
        self.rules.contains_key(code)
    }

    /// Rules in code order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Checks one registration.
fn validate(rule: &Rule) -> Result<(), RegistryError> {
    let mut chars = rule.code.chars();
    let prefix = chars.next();
    let digits = chars.as_str();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegistryError::MalformedCode(rule.code.to_string()));
    }

    let expected = rule.severity.code_prefix();
    if prefix != Some(expected) {
        return Err(RegistryError::SeverityMismatch {
            code: rule.code.to_string(),
            severity: rule.severity,
            expected,
        });
    }

    if rule.scope.is_empty() {
        return Err(RegistryError::EmptyScope(rule.code.to_string()));
    }
    Ok(())
}
