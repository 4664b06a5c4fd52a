//! Cached knowledge-graph query results
//!
//! Each query's result is stored as `<query_dir>/<query_id>.json`: an array of
//! flat row objects keyed by the query's variable names. Rows missing their
//! identity are logged and skipped.

use crate::error::{LinkError, LinkResult};
use crate::models::{Event, EventKind, EventSeries, Proceeding};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use eventseries_common::Qid;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EVENTS_QUERY_ID: &str = "wikidata_all_ceurws_events";
pub const SERIES_QUERY_ID: &str = "wikidata_all_ceurws_event_series";
pub const PROCEEDINGS_QUERY_ID: &str = "wikidata_all_proceedings";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRow {
    event: Option<String>,
    event_label: Option<String>,
    title: Option<String>,
    acronym: Option<String>,
    dblp_event_id: Option<String>,
    series: Option<String>,
    ordinal: Option<Value>,
    start_time: Option<String>,
    end_time: Option<String>,
    official_website: Option<String>,
    ceurws_url: Option<String>,
    #[serde(rename = "type")]
    type_label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesRow {
    series: Option<String>,
    series_label: Option<String>,
    title: Option<String>,
    acronym: Option<String>,
    dblp_venue_id: Option<String>,
    official_website: Option<String>,
    #[serde(rename = "type")]
    type_label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProceedingRow {
    proceeding: Option<String>,
    proceeding_label: Option<String>,
    proceeding_title: Option<String>,
    event: Option<String>,
    volume_number: Option<Value>,
    acronym: Option<String>,
}

/// Reads typed records from cached query results
#[derive(Debug, Clone)]
pub struct QueryResultSource {
    query_dir: PathBuf,
}

impl QueryResultSource {
    pub fn new(query_dir: impl Into<PathBuf>) -> Self {
        Self {
            query_dir: query_dir.into(),
        }
    }

    fn result_path(&self, query_id: &str) -> PathBuf {
        self.query_dir.join(format!("{}.json", query_id))
    }

    fn load_rows<R: DeserializeOwned>(&self, query_id: &str) -> LinkResult<Vec<R>> {
        let path = self.result_path(query_id);
        let content = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                LinkError::NotFound(format!("query result {}", path.display()))
            }
            _ => LinkError::Io(e),
        })?;

        let raw: Vec<Value> = serde_json::from_slice(&content)?;
        let total = raw.len();
        let rows: Vec<R> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!(query_id, row = index, error = %e, "Skipping unreadable row");
                    None
                }
            })
            .collect();

        info!(query_id, rows = rows.len(), total, "Loaded query result");
        Ok(rows)
    }

    pub fn load_events(&self) -> LinkResult<Vec<Event>> {
        let rows: Vec<EventRow> = self.load_rows(EVENTS_QUERY_ID)?;
        Ok(rows.into_iter().filter_map(event_from_row).collect())
    }

    pub fn load_series(&self) -> LinkResult<Vec<EventSeries>> {
        let rows: Vec<SeriesRow> = self.load_rows(SERIES_QUERY_ID)?;
        Ok(rows.into_iter().filter_map(series_from_row).collect())
    }

    pub fn load_proceedings(&self) -> LinkResult<Vec<Proceeding>> {
        let rows: Vec<ProceedingRow> = self.load_rows(PROCEEDINGS_QUERY_ID)?;
        Ok(rows.into_iter().filter_map(proceeding_from_row).collect())
    }

    /// Load all three tables into a record store
    ///
    /// A missing proceedings result is tolerated; events and series are required.
    pub fn load_store(&self) -> LinkResult<RecordStore> {
        let events = self.load_events()?;
        let series = self.load_series()?;
        let proceedings = match self.load_proceedings() {
            Ok(p) => p,
            Err(LinkError::NotFound(what)) => {
                warn!(missing = %what, "No proceedings loaded");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(RecordStore::new(events, series, proceedings))
    }

    pub fn query_dir(&self) -> &Path {
        &self.query_dir
    }
}

/// Parse a required identity column, logging the row as malformed when absent
fn required_qid(raw: Option<&str>, column: &str) -> Option<Qid> {
    let Some(raw) = raw else {
        warn!(column, "{}", LinkError::MalformedInput(format!("row without {}", column)));
        return None;
    };
    match Qid::parse(raw) {
        Ok(qid) => Some(qid),
        Err(e) => {
            warn!(column, value = raw, error = %e, "Skipping row with malformed id");
            None
        }
    }
}

fn optional_qid(raw: Option<&str>) -> Option<Qid> {
    raw.and_then(|r| Qid::parse(r).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Numbers come back as JSON numbers or as strings depending on the query
fn number_from_value(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!(value = raw, error = %e, "Ignoring unparsable timestamp");
            None
        }
    }
}

fn event_from_row(row: EventRow) -> Option<Event> {
    let qid = required_qid(row.event.as_deref(), "event")?;
    let label = non_empty(row.event_label)
        .or_else(|| row.title.clone())
        .unwrap_or_else(|| qid.to_string());

    Some(Event {
        label,
        title: non_empty(row.title),
        acronym: non_empty(row.acronym),
        dblp_id: non_empty(row.dblp_event_id),
        ordinal: number_from_value(row.ordinal.as_ref()),
        part_of_series: optional_qid(row.series.as_deref()),
        start_time: timestamp(row.start_time.as_deref()),
        end_time: timestamp(row.end_time.as_deref()),
        official_website: non_empty(row.official_website),
        ceurws_url: non_empty(row.ceurws_url),
        canonical_title: None,
        kind: row
            .type_label
            .as_deref()
            .map(EventKind::from_type_label)
            .unwrap_or_default(),
        qid,
    })
}

fn series_from_row(row: SeriesRow) -> Option<EventSeries> {
    let qid = required_qid(row.series.as_deref(), "series")?;
    let label = non_empty(row.series_label)
        .or_else(|| row.title.clone())
        .unwrap_or_else(|| qid.to_string());

    Some(EventSeries {
        label,
        title: non_empty(row.title),
        acronym: non_empty(row.acronym),
        dblp_id: non_empty(row.dblp_venue_id),
        official_website: non_empty(row.official_website),
        canonical_title: None,
        kind: row
            .type_label
            .as_deref()
            .map(EventKind::from_type_label)
            .unwrap_or_default(),
        qid,
    })
}

fn proceeding_from_row(row: ProceedingRow) -> Option<Proceeding> {
    let qid = required_qid(row.proceeding.as_deref(), "proceeding")?;
    let label = non_empty(row.proceeding_label)
        .or_else(|| row.proceeding_title.clone())
        .unwrap_or_else(|| qid.to_string());

    Some(Proceeding {
        event: optional_qid(row.event.as_deref()),
        volume_number: number_from_value(row.volume_number.as_ref()),
        label,
        title: non_empty(row.proceeding_title),
        canonical_title: None,
        acronym: non_empty(row.acronym),
        qid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_query(dir: &Path, query_id: &str, rows: Value) {
        std::fs::write(
            dir.join(format!("{}.json", query_id)),
            serde_json::to_vec(&rows).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_events_skips_malformed_rows() {
        let temp_dir = TempDir::new().unwrap();
        write_query(
            temp_dir.path(),
            EVENTS_QUERY_ID,
            json!([
                {
                    "event": "http://www.wikidata.org/entity/Q48027371",
                    "eventLabel": "ISWC 2003",
                    "title": "2nd International Semantic Web Conference",
                    "series": "http://www.wikidata.org/entity/Q6053150",
                    "ordinal": "2",
                    "startTime": "2003-10-20T00:00:00Z",
                    "type": "academic conference"
                },
                { "eventLabel": "row without id" },
                { "event": "not-a-qid", "eventLabel": "bad id" },
                "not even an object"
            ]),
        );

        let source = QueryResultSource::new(temp_dir.path());
        let events = source.load_events().unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.qid.as_str(), "Q48027371");
        assert_eq!(event.ordinal, Some(2));
        assert_eq!(event.part_of_series.as_ref().unwrap().as_str(), "Q6053150");
        assert_eq!(event.kind, EventKind::Conference);
        assert!(event.start_time.is_some());
    }

    #[test]
    fn test_missing_result_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let source = QueryResultSource::new(temp_dir.path());

        assert!(matches!(source.load_series(), Err(LinkError::NotFound(_))));
    }

    #[test]
    fn test_load_store_without_proceedings() {
        let temp_dir = TempDir::new().unwrap();
        write_query(
            temp_dir.path(),
            EVENTS_QUERY_ID,
            json!([{ "event": "Q1", "eventLabel": "Event" }]),
        );
        write_query(
            temp_dir.path(),
            SERIES_QUERY_ID,
            json!([{ "series": "Q2", "seriesLabel": "Series", "dblpVenueId": "conf/iswc" }]),
        );

        let store = QueryResultSource::new(temp_dir.path()).load_store().unwrap();

        assert_eq!(store.events().len(), 1);
        assert_eq!(store.all_series().len(), 1);
        assert!(store.proceedings().is_empty());
        let series = store.series(&Qid::parse("Q2").unwrap()).unwrap();
        assert_eq!(series.dblp_id.as_deref(), Some("conf/iswc"));
    }

    #[test]
    fn test_volume_number_as_number() {
        let temp_dir = TempDir::new().unwrap();
        write_query(
            temp_dir.path(),
            PROCEEDINGS_QUERY_ID,
            json!([{ "proceeding": "Q7", "proceedingTitle": "Proc.", "volumeNumber": 3012, "event": "Q1" }]),
        );

        let proceedings = QueryResultSource::new(temp_dir.path())
            .load_proceedings()
            .unwrap();

        assert_eq!(proceedings[0].volume_number, Some(3012));
        assert_eq!(proceedings[0].label, "Proc.");
    }
}
