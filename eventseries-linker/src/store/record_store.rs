//! Typed record tables keyed by QID
//!
//! Iteration follows load order so that downstream stages (and their
//! tie-breaks) are deterministic for a given input.

use crate::error::{LinkError, LinkResult};
use crate::models::{Event, EventSeries, Proceeding, Titled};
use eventseries_common::Qid;
use std::collections::HashMap;
use tracing::warn;

/// Insertion-ordered table with id lookup
#[derive(Debug, Clone)]
pub struct Table<T> {
    records: Vec<T>,
    index: HashMap<Qid, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Titled> Table<T> {
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Insert a record; a record with an already known id replaces the old one in place
    pub fn insert(&mut self, record: T) {
        match self.index.get(record.qid()) {
            Some(&pos) => {
                warn!(qid = %record.qid(), "Duplicate record id, keeping the later row");
                self.records[pos] = record;
            }
            None => {
                self.index.insert(record.qid().clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, qid: &Qid) -> Option<&T> {
        self.index.get(qid).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, qid: &Qid) -> bool {
        self.index.contains_key(qid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Events, series and proceedings loaded for one run
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    events: Table<Event>,
    series: Table<EventSeries>,
    proceedings: Table<Proceeding>,
}

impl RecordStore {
    pub fn new(
        events: impl IntoIterator<Item = Event>,
        series: impl IntoIterator<Item = EventSeries>,
        proceedings: impl IntoIterator<Item = Proceeding>,
    ) -> Self {
        Self {
            events: Table::from_records(events),
            series: Table::from_records(series),
            proceedings: Table::from_records(proceedings),
        }
    }

    pub fn event(&self, qid: &Qid) -> LinkResult<&Event> {
        self.events
            .get(qid)
            .ok_or_else(|| LinkError::NotFound(format!("event {}", qid)))
    }

    pub fn series(&self, qid: &Qid) -> LinkResult<&EventSeries> {
        self.series
            .get(qid)
            .ok_or_else(|| LinkError::NotFound(format!("event series {}", qid)))
    }

    pub fn proceeding(&self, qid: &Qid) -> LinkResult<&Proceeding> {
        self.proceedings
            .get(qid)
            .ok_or_else(|| LinkError::NotFound(format!("proceeding {}", qid)))
    }

    pub fn events(&self) -> &Table<Event> {
        &self.events
    }

    pub fn all_series(&self) -> &Table<EventSeries> {
        &self.series
    }

    pub fn proceedings(&self) -> &Table<Proceeding> {
        &self.proceedings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(s: &str) -> Qid {
        Qid::parse(s).unwrap()
    }

    #[test]
    fn test_lookup_and_load_order() {
        let store = RecordStore::new(
            vec![
                Event::new(qid("Q3"), "c"),
                Event::new(qid("Q1"), "a"),
                Event::new(qid("Q2"), "b"),
            ],
            vec![],
            vec![],
        );

        assert_eq!(store.event(&qid("Q1")).unwrap().label, "a");
        let labels: Vec<&str> = store.events().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let store = RecordStore::default();
        assert!(matches!(
            store.series(&qid("Q404")),
            Err(LinkError::NotFound(_))
        ));
        assert!(store.proceeding(&qid("Q404")).is_err());
    }

    #[test]
    fn test_duplicate_id_replaced_in_place() {
        let mut table = Table::default();
        table.insert(Event::new(qid("Q1"), "old"));
        table.insert(Event::new(qid("Q2"), "other"));
        table.insert(Event::new(qid("Q1"), "new"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.iter().next().unwrap().label, "new");
    }
}
