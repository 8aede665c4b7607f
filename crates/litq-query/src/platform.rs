//! Platform tags and their syntax profiles.
//!
//! Every literature database the linter knows about contributes a
//! [`PlatformSyntax`]: which field tags it accepts and how they are spelled,
//! how it handles wildcards and proximity, and how tightly its operators bind.
//! [`Platform::All`] is the generic profile, the canonical syntax the parser
//! reads.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::ParsePlatformError,
    precedence::{BinaryOp, Precedence},
};

/// A platform tag used to scope rules and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// The generic, platform-independent profile.
    #[serde(rename = "all")]
    All,
    /// PubMed / MEDLINE.
    #[serde(rename = "pubmed")]
    PubMed,
    /// Web of Science.
    #[serde(rename = "wos")]
    WebOfScience,
    /// Scopus.
    #[serde(rename = "scopus")]
    Scopus,
    /// EBSCOhost.
    #[serde(rename = "ebsco")]
    Ebsco,
}

impl Platform {
    /// Every known platform, in tag order.
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::PubMed,
        Self::WebOfScience,
        Self::Scopus,
        Self::Ebsco,
    ];

    /// The lower-case tag name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::PubMed => "pubmed",
            Self::WebOfScience => "wos",
            Self::Scopus => "scopus",
            Self::Ebsco => "ebsco",
        }
    }

    /// The syntax profile of this platform.
    pub const fn syntax(self) -> &'static PlatformSyntax {
        match self {
            Self::All => &GENERIC,
            Self::PubMed => &PUBMED,
            Self::WebOfScience => &WEB_OF_SCIENCE,
            Self::Scopus => &SCOPUS,
            Self::Ebsco => &EBSCO,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "all" | "generic" => Ok(Self::All),
            "pubmed" | "medline" => Ok(Self::PubMed),
            "wos" | "web-of-science" | "webofscience" => Ok(Self::WebOfScience),
            "scopus" => Ok(Self::Scopus),
            "ebsco" | "ebscohost" => Ok(Self::Ebsco),
            _ => Err(ParsePlatformError {
                name: s.to_string(),
            }),
        }
    }
}

/// A canonical field and its platform spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag {
    /// Canonical name used in the query language (`ti`, `ab`, ...).
    pub canonical: &'static str,
    /// The platform's own tag (`[ti]`, `TI`, `TITLE`, ...).
    pub native: &'static str,
}

/// Syntax capabilities of a platform.
#[derive(Debug)]
pub struct PlatformSyntax {
    /// Supported canonical fields.
    pub fields: &'static [FieldTag],
    /// Native tag for unqualified terms, if the platform has one.
    pub default_field: Option<&'static str>,
    /// Whether `NEAR`-style proximity operators exist.
    pub proximity: bool,
    /// Accepted wildcard characters.
    pub wildcards: &'static [char],
    /// Minimum number of characters before a wildcard.
    pub min_wildcard_stem: usize,
    /// Whether unqualified terms are silently expanded by the platform.
    pub expands_unqualified: bool,
    /// Operator binding, loosest first.
    pub precedence: [BinaryOp; 4],
}

impl PlatformSyntax {
    /// Looks up the native tag for a canonical field.
    pub fn native_field(&self, canonical: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|tag| tag.canonical.eq_ignore_ascii_case(canonical))
            .map(|tag| tag.native)
    }

    /// Whether the platform supports the canonical field.
    pub fn supports_field(&self, canonical: &str) -> bool {
        self.native_field(canonical).is_some()
    }

    /// The platform's default precedence table.
    pub fn precedence(&self) -> Precedence {
        Precedence::new(&self.precedence).unwrap_or_default()
    }
}

/// Conventional binding shared by most platforms.
const STANDARD_PRECEDENCE: [BinaryOp; 4] =
    [BinaryOp::Or, BinaryOp::And, BinaryOp::Not, BinaryOp::Near];

/// The generic profile.
static GENERIC: PlatformSyntax = PlatformSyntax {
    fields: &[
        FieldTag { canonical: "ti", native: "ti" },
        FieldTag { canonical: "ab", native: "ab" },
        FieldTag { canonical: "tiab", native: "tiab" },
        FieldTag { canonical: "au", native: "au" },
        FieldTag { canonical: "kw", native: "kw" },
        FieldTag { canonical: "so", native: "so" },
    ],
    default_field: None,
    proximity: true,
    wildcards: &['*', '?', '$'],
    min_wildcard_stem: 1,
    expands_unqualified: false,
    precedence: STANDARD_PRECEDENCE,
};

/// PubMed: bracketed suffix tags, automatic term mapping for untagged terms.
static PUBMED: PlatformSyntax = PlatformSyntax {
    fields: &[
        FieldTag { canonical: "ti", native: "ti" },
        FieldTag { canonical: "ab", native: "ab" },
        FieldTag { canonical: "tiab", native: "tiab" },
        FieldTag { canonical: "au", native: "au" },
        FieldTag { canonical: "kw", native: "mh" },
        FieldTag { canonical: "so", native: "ta" },
    ],
    default_field: None,
    proximity: false,
    wildcards: &['*'],
    min_wildcard_stem: 4,
    expands_unqualified: true,
    precedence: STANDARD_PRECEDENCE,
};

/// Web of Science: `TAG=(...)` prefixes.
static WEB_OF_SCIENCE: PlatformSyntax = PlatformSyntax {
    fields: &[
        FieldTag { canonical: "ti", native: "TI" },
        FieldTag { canonical: "ab", native: "AB" },
        FieldTag { canonical: "tiab", native: "TS" },
        FieldTag { canonical: "au", native: "AU" },
        FieldTag { canonical: "kw", native: "AK" },
        FieldTag { canonical: "so", native: "SO" },
    ],
    default_field: Some("TS"),
    proximity: true,
    wildcards: &['*', '?', '$'],
    min_wildcard_stem: 1,
    expands_unqualified: false,
    precedence: STANDARD_PRECEDENCE,
};

/// Scopus: function-style tags; OR binds tighter than AND, AND NOT loosest.
static SCOPUS: PlatformSyntax = PlatformSyntax {
    fields: &[
        FieldTag { canonical: "ti", native: "TITLE" },
        FieldTag { canonical: "ab", native: "ABS" },
        FieldTag { canonical: "tiab", native: "TITLE-ABS" },
        FieldTag { canonical: "au", native: "AUTH" },
        FieldTag { canonical: "kw", native: "KEY" },
        FieldTag { canonical: "so", native: "SRCTITLE" },
    ],
    default_field: Some("TITLE-ABS-KEY"),
    proximity: true,
    wildcards: &['*', '?'],
    min_wildcard_stem: 1,
    expands_unqualified: false,
    precedence: [BinaryOp::Not, BinaryOp::And, BinaryOp::Or, BinaryOp::Near],
};

/// EBSCOhost: space-separated prefix tags, no combined title/abstract field.
static EBSCO: PlatformSyntax = PlatformSyntax {
    fields: &[
        FieldTag { canonical: "ti", native: "TI" },
        FieldTag { canonical: "ab", native: "AB" },
        FieldTag { canonical: "au", native: "AU" },
        FieldTag { canonical: "kw", native: "KW" },
        FieldTag { canonical: "so", native: "SO" },
    ],
    default_field: None,
    proximity: true,
    wildcards: &['*', '?', '#'],
    min_wildcard_stem: 1,
    expands_unqualified: false,
    precedence: STANDARD_PRECEDENCE,
};
