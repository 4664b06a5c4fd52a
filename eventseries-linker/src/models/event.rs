//! Knowledge-graph records: events, event series and proceedings

use chrono::{DateTime, Utc};
use eventseries_common::Qid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a record describes a conference or a workshop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Conference,
    Workshop,
    #[default]
    Unknown,
}

impl EventKind {
    /// Map a knowledge-graph type label ("academic conference", "workshop", ...)
    pub fn from_type_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("workshop") {
            EventKind::Workshop
        } else if lower.contains("conference") {
            EventKind::Conference
        } else {
            EventKind::Unknown
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Conference => "CONFERENCE",
            EventKind::Workshop => "WORKSHOP",
            EventKind::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Records carrying a mandatory label and an optional title
pub trait Titled {
    fn qid(&self) -> &Qid;
    fn label(&self) -> &str;
    fn title(&self) -> Option<&str>;

    /// Title when present and non-empty, else the label
    fn title_else_label(&self) -> &str {
        match self.title() {
            Some(title) if !title.trim().is_empty() => title,
            _ => self.label(),
        }
    }
}

/// Targets of completion application
///
/// Each setter reports whether the record has a slot for the attribute; the
/// completion cache decides which setter to call.
pub trait Patchable: Titled {
    fn set_ordinal(&mut self, _ordinal: u32) -> bool {
        false
    }
    fn set_acronym(&mut self, _acronym: String) -> bool {
        false
    }
    fn set_canonical_title(&mut self, _title: String) -> bool {
        false
    }
    fn set_kind(&mut self, _kind: EventKind) -> bool {
        false
    }
}

/// One concrete occurrence of a conference or workshop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub qid: Qid,
    pub label: String,
    pub title: Option<String>,
    pub acronym: Option<String>,
    pub dblp_id: Option<String>,
    pub ordinal: Option<u32>,
    pub part_of_series: Option<Qid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub official_website: Option<String>,
    pub ceurws_url: Option<String>,
    pub canonical_title: Option<String>,
    #[serde(default)]
    pub kind: EventKind,
}

impl Event {
    /// Minimal event with only identity and label set
    pub fn new(qid: Qid, label: impl Into<String>) -> Self {
        Self {
            qid,
            label: label.into(),
            title: None,
            acronym: None,
            dblp_id: None,
            ordinal: None,
            part_of_series: None,
            start_time: None,
            end_time: None,
            official_website: None,
            ceurws_url: None,
            canonical_title: None,
            kind: EventKind::Unknown,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_series(mut self, series: Qid) -> Self {
        self.part_of_series = Some(series);
        self
    }
}

impl Titled for Event {
    fn qid(&self) -> &Qid {
        &self.qid
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl Patchable for Event {
    fn set_ordinal(&mut self, ordinal: u32) -> bool {
        self.ordinal = Some(ordinal);
        true
    }
    fn set_acronym(&mut self, acronym: String) -> bool {
        self.acronym = Some(acronym);
        true
    }
    fn set_canonical_title(&mut self, title: String) -> bool {
        self.canonical_title = Some(title);
        true
    }
    fn set_kind(&mut self, kind: EventKind) -> bool {
        self.kind = kind;
        true
    }
}

/// A recurring conference or workshop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSeries {
    pub qid: Qid,
    pub label: String,
    pub title: Option<String>,
    pub acronym: Option<String>,
    pub dblp_id: Option<String>,
    pub official_website: Option<String>,
    pub canonical_title: Option<String>,
    #[serde(default)]
    pub kind: EventKind,
}

impl EventSeries {
    pub fn new(qid: Qid, label: impl Into<String>) -> Self {
        Self {
            qid,
            label: label.into(),
            title: None,
            acronym: None,
            dblp_id: None,
            official_website: None,
            canonical_title: None,
            kind: EventKind::Unknown,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Titled for EventSeries {
    fn qid(&self) -> &Qid {
        &self.qid
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl Patchable for EventSeries {
    fn set_acronym(&mut self, acronym: String) -> bool {
        self.acronym = Some(acronym);
        true
    }
    fn set_canonical_title(&mut self, title: String) -> bool {
        self.canonical_title = Some(title);
        true
    }
    fn set_kind(&mut self, kind: EventKind) -> bool {
        self.kind = kind;
        true
    }
}

/// The published volume of one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proceeding {
    pub qid: Qid,
    pub event: Option<Qid>,
    pub volume_number: Option<u32>,
    pub label: String,
    pub title: Option<String>,
    /// Title as published on the volume index, filled by completion
    pub canonical_title: Option<String>,
    pub acronym: Option<String>,
}

impl Proceeding {
    pub fn new(qid: Qid, label: impl Into<String>) -> Self {
        Self {
            qid,
            event: None,
            volume_number: None,
            label: label.into(),
            title: None,
            canonical_title: None,
            acronym: None,
        }
    }
}

impl Titled for Proceeding {
    fn qid(&self) -> &Qid {
        &self.qid
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl Patchable for Proceeding {
    fn set_acronym(&mut self, acronym: String) -> bool {
        self.acronym = Some(acronym);
        true
    }
    fn set_canonical_title(&mut self, title: String) -> bool {
        self.canonical_title = Some(title);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(s: &str) -> Qid {
        Qid::parse(s).unwrap()
    }

    #[test]
    fn test_title_else_label() {
        let event = Event::new(qid("Q1"), "ISWC 2003");
        assert_eq!(event.title_else_label(), "ISWC 2003");

        let event = event.with_title("2nd International Semantic Web Conference");
        assert_eq!(
            event.title_else_label(),
            "2nd International Semantic Web Conference"
        );

        let blank = Event::new(qid("Q2"), "label").with_title("   ");
        assert_eq!(blank.title_else_label(), "label");
    }

    #[test]
    fn test_kind_from_type_label() {
        assert_eq!(
            EventKind::from_type_label("academic conference"),
            EventKind::Conference
        );
        assert_eq!(EventKind::from_type_label("Workshop"), EventKind::Workshop);
        assert_eq!(EventKind::from_type_label("symposium"), EventKind::Unknown);
    }

    #[test]
    fn test_series_has_no_ordinal_slot() {
        let mut series = EventSeries::new(qid("Q10"), "ISWC");
        assert!(!series.set_ordinal(3));
        assert!(series.set_acronym("ISWC".into()));
        assert_eq!(series.acronym.as_deref(), Some("ISWC"));
    }

    #[test]
    fn test_kind_serialized_upper_case() {
        let json = serde_json::to_string(&EventKind::Workshop).unwrap();
        assert_eq!(json, "\"WORKSHOP\"");
    }
}
