//! DBLP records and the read-only source the hierarchy matcher consumes
//!
//! Fetching and parsing DBLP pages happens outside this crate; here we only
//! model the parsed structure. [`InMemoryDblp`] can be filled directly or
//! loaded from a JSON dump of parsed pages.

use crate::error::{LinkError, LinkResult};
use crate::parsing::ParsedTitle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

const DBLP_URL_PREFIXES: [&str; 4] = [
    "https://dblp.org/db/",
    "http://dblp.org/db/",
    "https://dblp.uni-trier.de/db/",
    "https://dblp.org/",
];

/// Strip the DBLP site prefix and page suffix from a venue URL
///
/// `https://dblp.org/db/conf/esws/index.html` → `conf/esws`
pub fn get_dblp_id_from_url(url: &str) -> String {
    let without_prefix = DBLP_URL_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .unwrap_or(url);
    let without_prefix = without_prefix.strip_prefix("db/").unwrap_or(without_prefix);
    let id = without_prefix
        .strip_suffix("/index.html")
        .or_else(|| without_prefix.strip_suffix(".html"))
        .unwrap_or(without_prefix);
    id.trim_end_matches('/').to_string()
}

/// One event page on DBLP, e.g. `conf/esws/2013`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DblpEvent {
    pub dblp_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub location: Option<String>,
    pub ordinal: Option<u32>,
}

impl DblpEvent {
    /// Build an event from its full headline (`"<title>: <location>"`)
    pub fn from_headline(dblp_id: impl Into<String>, headline: &str) -> Self {
        let parsed = ParsedTitle::parse(headline);
        Self {
            dblp_id: dblp_id.into(),
            title: parsed.title,
            year: parsed.year,
            location: parsed.location,
            ordinal: parsed.ordinal,
        }
    }
}

/// Inclusive range of years; an open end means "until today"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: Option<i32>,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && self.end.map_or(true, |end| year <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameWithOptionalReference {
    pub name: String,
    /// URL of the part's own DBLP page
    pub reference: Option<String>,
}

/// A "has part" entry of a venue's information box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasPart {
    pub part: NameWithOptionalReference,
    #[serde(default)]
    pub years: Vec<YearRange>,
}

impl HasPart {
    /// Whether `year` is covered; an entry without years covers every year
    pub fn covers_year(&self, year: i32) -> bool {
        self.years.is_empty() || self.years.iter().any(|range| range.contains(year))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueInformation {
    #[serde(default)]
    pub has_part: Vec<HasPart>,
}

/// A venue (series) page on DBLP, e.g. `conf/esws`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DblpEventSeries {
    pub dblp_id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub venue_information: Option<VenueInformation>,
}

/// A venue listed as possible parent of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DblpParent {
    pub dblp_id: String,
    pub name: String,
}

/// Read-only access to parsed DBLP data
pub trait DblpSource: Send + Sync {
    fn event(&self, dblp_id: &str) -> Option<DblpEvent>;

    fn series(&self, dblp_id: &str) -> Option<DblpEventSeries>;

    /// Candidate parent venues of an event, in page order
    fn parents_of(&self, event_dblp_id: &str) -> Vec<DblpParent>;
}

/// DBLP data held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDblp {
    #[serde(default)]
    events: HashMap<String, DblpEvent>,
    #[serde(default)]
    series: HashMap<String, DblpEventSeries>,
    #[serde(default)]
    parents: HashMap<String, Vec<DblpParent>>,
}

impl InMemoryDblp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dump written by the DBLP crawler
    pub fn from_json_file(path: &Path) -> LinkResult<Self> {
        let content = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                LinkError::NotFound(format!("DBLP dump {}", path.display()))
            }
            _ => LinkError::Io(e),
        })?;
        let dblp: Self = serde_json::from_slice(&content)?;
        info!(
            events = dblp.events.len(),
            series = dblp.series.len(),
            "Loaded DBLP dump"
        );
        Ok(dblp)
    }

    pub fn add_event(&mut self, event: DblpEvent) -> &mut Self {
        self.events.insert(event.dblp_id.clone(), event);
        self
    }

    pub fn add_series(&mut self, series: DblpEventSeries) -> &mut Self {
        self.series.insert(series.dblp_id.clone(), series);
        self
    }

    pub fn add_parent(&mut self, event_dblp_id: &str, parent: DblpParent) -> &mut Self {
        self.parents
            .entry(event_dblp_id.to_string())
            .or_default()
            .push(parent);
        self
    }
}

impl DblpSource for InMemoryDblp {
    fn event(&self, dblp_id: &str) -> Option<DblpEvent> {
        self.events.get(dblp_id).cloned()
    }

    fn series(&self, dblp_id: &str) -> Option<DblpEventSeries> {
        self.series.get(dblp_id).cloned()
    }

    fn parents_of(&self, event_dblp_id: &str) -> Vec<DblpParent> {
        self.parents.get(event_dblp_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dblp_id_from_url() {
        assert_eq!(
            get_dblp_id_from_url("https://dblp.org/db/conf/esws/index.html"),
            "conf/esws"
        );
        assert_eq!(get_dblp_id_from_url("https://dblp.org/db/conf/ki/"), "conf/ki");
        assert_eq!(
            get_dblp_id_from_url("https://dblp.org/db/conf/semweb/iswc2003.html"),
            "conf/semweb/iswc2003"
        );
        assert_eq!(get_dblp_id_from_url("conf/esws"), "conf/esws");
    }

    #[test]
    fn test_event_from_headline() {
        let event = DblpEvent::from_headline("conf/esws/2013", "10th ESWC 2013: Montpellier, France");
        assert_eq!(event.title, "10th ESWC 2013");
        assert_eq!(event.year, Some(2013));
        assert_eq!(event.ordinal, Some(10));
    }

    #[test]
    fn test_has_part_years() {
        let part = HasPart {
            part: NameWithOptionalReference {
                name: "SemWiki".into(),
                reference: None,
            },
            years: vec![YearRange {
                start: 2006,
                end: Some(2008),
            }],
        };
        assert!(part.covers_year(2007));
        assert!(!part.covers_year(2010));

        let open = HasPart {
            years: vec![],
            ..part
        };
        assert!(open.covers_year(2010));
    }

    #[test]
    fn test_json_dump_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("dblp.json");

        let mut dblp = InMemoryDblp::new();
        dblp.add_event(DblpEvent::from_headline("conf/ki/2019", "KI 2019: Kassel, Germany"))
            .add_parent(
                "conf/ki/2019",
                DblpParent {
                    dblp_id: "conf/ki".into(),
                    name: "German Conference on Artificial Intelligence".into(),
                },
            );
        std::fs::write(&path, serde_json::to_vec(&dblp).unwrap()).unwrap();

        let loaded = InMemoryDblp::from_json_file(&path).unwrap();
        assert_eq!(loaded.event("conf/ki/2019").unwrap().year, Some(2019));
        assert_eq!(loaded.parents_of("conf/ki/2019").len(), 1);
        assert!(loaded.parents_of("conf/unknown/2000").is_empty());
    }
}
