//! Knowledge-graph identifiers
//!
//! A [`Qid`] is the stable identifier of a Wikidata entity (`Q` followed by digits).
//! Once parsed it is a plain value: it is used as a map key everywhere and never
//! mutated.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static QID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Q\d+$").expect("QID pattern is valid"));

/// Prefix used by the query service when returning entity references
const ENTITY_PREFIXES: [&str; 2] = [
    "http://www.wikidata.org/entity/",
    "https://www.wikidata.org/entity/",
];

/// Wikidata entity identifier, e.g. `Q106245681`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Qid(String);

impl Qid {
    /// Parse a QID, accepting either the bare form or the entity URL form
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let bare = ENTITY_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        if QID_PATTERN.is_match(bare) {
            Ok(Self(bare.to_string()))
        } else {
            Err(Error::InvalidInput(format!(
                "Expected a QID of the form Q<digits>, got '{}'",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Qid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Qid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Qid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Qid> for String {
    fn from(qid: Qid) -> Self {
        qid.0
    }
}
