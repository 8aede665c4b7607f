//! Operator precedence tables.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::PrecedenceError;

/// The binary operators of the surface grammar.
///
/// `Not` here is the infix form (`a NOT b`); the prefix form is always unary
/// and binds tighter than every binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    /// Disjunction.
    Or,
    /// Conjunction, explicit or implicit.
    And,
    /// Infix negation, read as `AND NOT`.
    Not,
    /// Proximity (`NEAR/n`, `W/n`, ...).
    Near,
}

impl BinaryOp {
    /// Every binary operator.
    pub const ALL: [Self; 4] = [Self::Or, Self::And, Self::Not, Self::Near];

    /// Whether the operator is a conjunction. `AND` and infix `NOT` both are,
    /// and chains mixing them are flattened rather than flagged.
    pub const fn is_conjunctive(self) -> bool {
        matches!(self, Self::And | Self::Not)
    }

    /// Returns the upper-case keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Not => "NOT",
            Self::Near => "NEAR",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for BinaryOp {
    type Err = PrecedenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.keyword().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PrecedenceError::UnknownOperator(s.to_string()))
    }
}

/// Binding strength of the binary operators, loosest first.
///
/// The default is `OR < AND < NOT < NEAR`: `a OR b AND c` reads as
/// `a OR (b AND c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precedence {
    /// Operators from loosest to tightest.
    levels: [BinaryOp; 4],
}

impl Precedence {
    /// Builds a table from operators listed loosest first.
    pub fn new(levels: &[BinaryOp]) -> Result<Self, PrecedenceError> {
        let table: [BinaryOp; 4] = levels
            .try_into()
            .map_err(|_| PrecedenceError::WrongLength(levels.len()))?;
        for (i, op) in table.iter().enumerate() {
            if table[..i].contains(op) {
                return Err(PrecedenceError::Duplicate(*op));
            }
        }
        Ok(Self { levels: table })
    }

    /// Builds a table from operator names, e.g. `["or", "and", "not", "near"]`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, PrecedenceError> {
        let ops = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<BinaryOp>, _>>()?;
        Self::new(&ops)
    }

    /// Operators from loosest to tightest.
    pub const fn levels(&self) -> &[BinaryOp; 4] {
        &self.levels
    }

    /// Level of `op`: 0 is the loosest.
    pub fn level(&self, op: BinaryOp) -> usize {
        self.levels.iter().position(|l| *l == op).unwrap_or(0)
    }

    /// Lower-case operator names, loosest first.
    pub fn names(&self) -> Vec<String> {
        self.levels
            .iter()
            .map(|op| op.keyword().to_ascii_lowercase())
            .collect()
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Self {
            levels: [BinaryOp::Or, BinaryOp::And, BinaryOp::Not, BinaryOp::Near],
        }
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.levels.iter().map(|op| op.keyword()).collect();
        write!(f, "{}", names.join(" < "))
    }
}
