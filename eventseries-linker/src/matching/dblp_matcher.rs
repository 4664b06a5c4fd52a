//! Series resolution through the DBLP venue hierarchy
//!
//! Conferences take their DBLP parent venue directly. Workshops are harder:
//! their DBLP page usually lists the co-located conference as parent, so the
//! matcher also looks at `X@Y` abbreviations in the title and at the "has
//! part" entries of the parents' venue information. A DBLP venue found this
//! way is then mapped onto a knowledge-graph series where possible.

use crate::models::{Event, EventKind, EventSeries, Match, Titled};
use crate::sources::dblp::{get_dblp_id_from_url, DblpSource};
use crate::sources::DblpParent;
use chrono::Datelike;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CONFERENCE_FOUND_BY: &str = "DblpMatcher::conference";
pub const WORKSHOP_PARENT_FOUND_BY: &str = "DblpMatcher::workshop_parent";
pub const VENUE_INFORMATION_FOUND_BY: &str = "DblpMatcher::venue_information";
pub const ABBREVIATION_FOUND_BY: &str = "DblpMatcher::abbreviation";

pub const DEFAULT_PARALLEL_THRESHOLD: usize = 500;

static AT_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)@\w+").expect("abbreviation pattern is valid"));

/// Abbreviation `X` of a workshop titled `X@Y`, lowercased
pub fn possible_series_abbreviation(title: &str) -> Option<String> {
    AT_ABBREVIATION
        .captures(title)
        .map(|captures| captures[1].to_lowercase())
}

/// A DBLP venue (or a venue known only by name) to be mapped onto a series
#[derive(Debug, Clone, PartialEq, Eq)]
struct DblpCandidate {
    dblp_id: Option<String>,
    name: String,
    abbreviation: Option<String>,
}

pub struct DblpMatcher {
    source: Arc<dyn DblpSource>,
    parallel_threshold: usize,
}

impl DblpMatcher {
    pub fn new(source: Arc<dyn DblpSource>, parallel_threshold: usize) -> Self {
        Self {
            source,
            parallel_threshold,
        }
    }

    /// One match per resolvable event; events without a DBLP id are skipped
    pub fn match_events(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match> {
        let with_dblp_id: Vec<&Event> = events.iter().filter(|e| e.dblp_id.is_some()).collect();

        let matches: Vec<Match> = if with_dblp_id.len() > self.parallel_threshold {
            debug!(events = with_dblp_id.len(), "Matching through DBLP in parallel");
            with_dblp_id
                .par_iter()
                .filter_map(|event| self.match_event(event, series))
                .collect()
        } else {
            with_dblp_id
                .iter()
                .filter_map(|event| self.match_event(event, series))
                .collect()
        };

        info!(
            events = with_dblp_id.len(),
            matches = matches.len(),
            "DBLP matching finished"
        );
        matches
    }

    fn match_event(&self, event: &Event, series: &[EventSeries]) -> Option<Match> {
        let dblp_id = event.dblp_id.as_deref()?;
        let (candidate, found_by) = match event.kind {
            EventKind::Conference => (self.conference_parent(dblp_id)?, CONFERENCE_FOUND_BY),
            EventKind::Workshop => self.workshop_parent(event, dblp_id)?,
            EventKind::Unknown => {
                debug!(event = %event.qid, "Skipping event of unknown kind");
                return None;
            }
        };
        Some(resolve(event, candidate, series, found_by))
    }

    /// Name of a DBLP venue, from its own page when available
    fn venue_name(&self, parent: &DblpParent) -> String {
        self.source
            .series(&parent.dblp_id)
            .map(|s| s.name)
            .unwrap_or_else(|| parent.name.clone())
            .to_lowercase()
    }

    fn candidate_from_parent(&self, parent: &DblpParent) -> DblpCandidate {
        let venue = self.source.series(&parent.dblp_id);
        DblpCandidate {
            dblp_id: Some(parent.dblp_id.clone()),
            name: venue.as_ref().map_or_else(|| parent.name.clone(), |v| v.name.clone()),
            abbreviation: venue.and_then(|v| v.abbreviation),
        }
    }

    fn candidate_from_id(&self, dblp_id: String, fallback_name: &str) -> DblpCandidate {
        match self.source.series(&dblp_id) {
            Some(venue) => DblpCandidate {
                dblp_id: Some(dblp_id),
                name: venue.name,
                abbreviation: venue.abbreviation,
            },
            None => DblpCandidate {
                dblp_id: Some(dblp_id),
                name: fallback_name.to_string(),
                abbreviation: None,
            },
        }
    }

    fn conference_parent(&self, event_dblp_id: &str) -> Option<DblpCandidate> {
        let parents = self.source.parents_of(event_dblp_id);
        let parent = match parents.as_slice() {
            [] => {
                warn!(dblp_id = event_dblp_id, "No DBLP parents for conference");
                return None;
            }
            [single] => single,
            _ => {
                debug!(dblp_id = event_dblp_id, parents = parents.len(), "Several DBLP parents for conference");
                parents.iter().find(|p| event_dblp_id.starts_with(&p.dblp_id))?
            }
        };

        let name = self.venue_name(parent);
        if name.contains("workshop") && !name.contains("conference") {
            warn!(
                dblp_id = event_dblp_id,
                parent = %parent.dblp_id,
                "DBLP parent of a conference is a workshop series"
            );
            return None;
        }
        Some(self.candidate_from_parent(parent))
    }

    fn workshop_parent(&self, event: &Event, event_dblp_id: &str) -> Option<(DblpCandidate, &'static str)> {
        let parents = self.source.parents_of(event_dblp_id);
        if parents.is_empty() {
            warn!(dblp_id = event_dblp_id, "No DBLP parents for workshop");
        }
        let workshop_parents: Vec<&DblpParent> = parents
            .iter()
            .filter(|p| self.venue_name(p).contains("workshop"))
            .collect();
        if let [single] = workshop_parents.as_slice() {
            return Some((self.candidate_from_parent(single), WORKSHOP_PARENT_FOUND_BY));
        }

        let dblp_event = self.source.event(event_dblp_id);
        let title = dblp_event
            .as_ref()
            .map_or_else(|| event.title_else_label().to_string(), |e| e.title.clone());
        let abbreviation = possible_series_abbreviation(&title)?;
        let year = dblp_event
            .and_then(|e| e.year)
            .or_else(|| event.start_time.map(|t| t.year()));

        if let Some(candidate) = self.venue_information_part(&parents, &abbreviation, year) {
            return Some((candidate, VENUE_INFORMATION_FOUND_BY));
        }

        let with_abbreviation: Vec<&&DblpParent> = workshop_parents
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&abbreviation) || p.dblp_id.contains(&abbreviation)
            })
            .collect();
        match with_abbreviation.as_slice() {
            [single] => Some((self.candidate_from_parent(single), ABBREVIATION_FOUND_BY)),
            _ => None,
        }
    }

    /// First "has part" entry of any parent naming the abbreviation in a fitting year
    fn venue_information_part(
        &self,
        parents: &[DblpParent],
        abbreviation: &str,
        year: Option<i32>,
    ) -> Option<DblpCandidate> {
        let parts = parents
            .iter()
            .filter_map(|p| self.source.series(&p.dblp_id))
            .filter_map(|s| s.venue_information)
            .flat_map(|info| info.has_part);

        for has_part in parts {
            if !has_part.part.name.to_lowercase().contains(abbreviation) {
                continue;
            }
            if let Some(year) = year {
                if !has_part.covers_year(year) {
                    debug!(part = %has_part.part.name, year, "Venue part does not cover the event year");
                    continue;
                }
            }
            let candidate = match &has_part.part.reference {
                Some(reference) => {
                    self.candidate_from_id(get_dblp_id_from_url(reference), &has_part.part.name)
                }
                None => DblpCandidate {
                    dblp_id: None,
                    name: has_part.part.name.clone(),
                    abbreviation: Some(abbreviation.to_string()),
                },
            };
            return Some(candidate);
        }
        None
    }
}

/// Map a DBLP venue onto a series, else fall back to a name match
///
/// Tried in order: same DBLP id, title contains the venue name, acronym
/// equals the venue abbreviation, label contains the venue name.
fn resolve(event: &Event, candidate: DblpCandidate, series: &[EventSeries], found_by: &str) -> Match {
    let name = candidate.name.to_lowercase();
    let by_id = candidate
        .dblp_id
        .as_deref()
        .and_then(|id| series.iter().find(|s| s.dblp_id.as_deref() == Some(id)));
    let found = by_id.or_else(|| {
        series.iter().find(|s| {
            let title_contains = s
                .title
                .as_deref()
                .is_some_and(|t| !name.is_empty() && t.to_lowercase().contains(&name));
            let same_acronym = match (&s.acronym, &candidate.abbreviation) {
                (Some(acronym), Some(abbreviation)) => acronym.eq_ignore_ascii_case(abbreviation),
                _ => false,
            };
            let label_contains = !name.is_empty() && s.label.to_lowercase().contains(&name);
            title_contains || same_acronym || label_contains
        })
    });

    match found {
        Some(s) => Match::new(event.qid.clone(), s.qid.clone(), found_by),
        None => {
            debug!(
                event = %event.qid,
                venue = %candidate.name,
                "No series for DBLP venue, keeping the name"
            );
            Match::by_name(event.qid.clone(), candidate.name, found_by)
        }
    }
}
