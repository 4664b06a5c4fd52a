//! Phrase matching over acronyms

use super::phrase::{evaluate_phrases, phrase_matches};
use super::{Evaluation, Matcher};
use crate::completion::acronym::{acronym_of, extract_acronym};
use crate::models::{Event, EventSeries, Match, TrainingPair};
use eventseries_common::Qid;

pub const NAME: &str = "AcronymMatch";

#[derive(Debug, Default)]
pub struct AcronymMatch {
    evaluation: Option<Evaluation>,
}

impl AcronymMatch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Training pairs reduced to the acronyms of both sides
///
/// Pairs where either title carries no acronym are dropped.
pub fn acronym_pairs(pairs: &[TrainingPair]) -> Vec<TrainingPair> {
    pairs
        .iter()
        .filter_map(|pair| {
            let event = extract_acronym(&pair.event_title)?;
            let series = extract_acronym(&pair.series_title)?;
            Some(TrainingPair::new(event, series))
        })
        .collect()
}

impl Matcher for AcronymMatch {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, pairs: &[TrainingPair]) -> Evaluation {
        let evaluation = evaluate_phrases(&acronym_pairs(pairs));
        self.evaluation = Some(evaluation);
        evaluation
    }

    fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    fn propose(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match> {
        let event_acronyms: Vec<(&Qid, String)> = events
            .iter()
            .filter_map(|e| Some((&e.qid, e.acronym.clone().or_else(|| acronym_of(e))?)))
            .collect();
        let series_acronyms: Vec<(&Qid, String)> = series
            .iter()
            .filter_map(|s| Some((&s.qid, s.acronym.clone().or_else(|| acronym_of(s))?)))
            .collect();

        phrase_matches(&as_texts(&event_acronyms), &as_texts(&series_acronyms), NAME)
    }
}

fn as_texts<'a>(items: &'a [(&'a Qid, String)]) -> Vec<(&'a Qid, &'a str)> {
    items.iter().map(|(qid, text)| (*qid, text.as_str())).collect()
}
