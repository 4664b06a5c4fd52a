//! Event→series links and matcher training data

use eventseries_common::Qid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The series side of a match
///
/// Sources that only know a series by name (e.g. DBLP venue information
/// without a resolvable reference) produce [`SeriesRef::Name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SeriesRef {
    Series(Qid),
    Name(String),
}

impl SeriesRef {
    pub fn qid(&self) -> Option<&Qid> {
        match self {
            SeriesRef::Series(qid) => Some(qid),
            SeriesRef::Name(_) => None,
        }
    }
}

impl fmt::Display for SeriesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRef::Series(qid) => write!(f, "{}", qid),
            SeriesRef::Name(name) => write!(f, "name:{}", name),
        }
    }
}

/// A proposed or accepted link from an event to its series
///
/// `found_by` names the producing strategy; after cross-validation it is the
/// `+`-joined list of agreeing strategies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub event: Qid,
    pub series: SeriesRef,
    pub found_by: String,
}

impl Match {
    pub fn new(event: Qid, series: Qid, found_by: impl Into<String>) -> Self {
        Self {
            event,
            series: SeriesRef::Series(series),
            found_by: found_by.into(),
        }
    }

    pub fn by_name(event: Qid, name: impl Into<String>, found_by: impl Into<String>) -> Self {
        Self {
            event,
            series: SeriesRef::Name(name.into()),
            found_by: found_by.into(),
        }
    }

    /// Whether both matches link the same event to the same series
    pub fn same_link(&self, other: &Match) -> bool {
        self.event == other.event && self.series == other.series
    }
}

/// A known event title → series title pair used to fit matchers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingPair {
    pub event_title: String,
    pub series_title: String,
}

impl TrainingPair {
    pub fn new(event_title: impl Into<String>, series_title: impl Into<String>) -> Self {
        Self {
            event_title: event_title.into(),
            series_title: series_title.into(),
        }
    }
}
