//! Series of annual proceedings
//!
//! A proceeding whose title says it is annual ("Annual", "Yearly", ...) belongs
//! to a recurring event. The series of its event, when known, is collected so
//! that such volumes can be linked to their series.

use crate::matching::text::word_tokens;
use crate::models::{Proceeding, Titled};
use crate::repository::Repository;
use eventseries_common::config::default_annual_synonyms;
use eventseries_common::Qid;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Outcome of one series completion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnualSeries {
    /// Proceedings whose title carries an annual synonym, in store order
    pub annual_proceedings: Vec<Qid>,
    /// Distinct series of the events of those proceedings
    pub series: BTreeSet<Qid>,
}

pub struct SeriesCompletion {
    /// Lowercased token sequences, one per synonym
    synonyms: Vec<Vec<String>>,
}

impl Default for SeriesCompletion {
    fn default() -> Self {
        Self::new(&default_annual_synonyms())
    }
}

impl SeriesCompletion {
    pub fn new(synonyms: &[String]) -> Self {
        let synonyms = synonyms
            .iter()
            .map(|s| word_tokens(s))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        Self { synonyms }
    }

    /// Whether `title` contains one of the synonyms as whole words
    pub fn is_annual(&self, title: &str) -> bool {
        let tokens = word_tokens(title);
        self.synonyms
            .iter()
            .any(|synonym| tokens.windows(synonym.len()).any(|w| w == synonym.as_slice()))
    }

    /// Annual proceedings and the series of their events
    ///
    /// Proceedings without an event, or whose event is not in the store, are
    /// logged and skipped.
    pub fn run(&self, repo: &Repository) -> AnnualSeries {
        let annual: Vec<&Proceeding> = repo
            .store()
            .proceedings()
            .iter()
            .filter(|p| self.is_annual(p.title_else_label()))
            .collect();
        info!(count = annual.len(), "Found proceedings with annual synonyms");

        let mut series = BTreeSet::new();
        for proceeding in &annual {
            let Some(event_qid) = &proceeding.event else {
                warn!(proceeding = %proceeding.qid, "Annual proceeding without event, skipping");
                continue;
            };
            match repo.get_event_by_qid(event_qid, true) {
                Ok(event) => match event.part_of_series {
                    Some(qid) => {
                        series.insert(qid);
                    }
                    None => debug!(event = %event.qid, "Event of annual proceeding has no series"),
                },
                Err(e) => {
                    warn!(proceeding = %proceeding.qid, error = %e, "Event of annual proceeding not loaded, skipping");
                }
            }
        }

        info!(count = series.len(), "Distinct series of annual proceedings");
        AnnualSeries {
            annual_proceedings: annual.iter().map(|p| p.qid.clone()).collect(),
            series,
        }
    }
}
