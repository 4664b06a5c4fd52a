//! Phrase matching on token sequences
//!
//! Each series name is registered as a token phrase. An event matches the
//! phrase that occurs earliest in its token stream; at the same position the
//! longest phrase wins, then the first registered one.

use super::text::word_tokens;
use super::{self_evaluate, Evaluation, Matcher};
use crate::models::{Event, EventSeries, Match, Titled, TrainingPair};
use eventseries_common::Qid;
use std::collections::HashMap;
use tracing::debug;

pub const NAME: &str = "PhraseMatch";

#[derive(Debug, Default)]
pub struct PhraseIndex {
    phrases: Vec<Vec<String>>,
    by_first: HashMap<String, Vec<usize>>,
}

impl PhraseIndex {
    /// Register phrases in order; the n-th text gets id n
    pub fn new<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for text in texts {
            index.register(text);
        }
        index
    }

    fn register(&mut self, text: &str) -> usize {
        let id = self.phrases.len();
        let tokens = word_tokens(text);
        if let Some(first) = tokens.first() {
            self.by_first.entry(first.clone()).or_default().push(id);
        }
        self.phrases.push(tokens);
        id
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Id of the phrase found in `text`, if any
    pub fn find(&self, text: &str) -> Option<usize> {
        let tokens = word_tokens(text);
        for position in 0..tokens.len() {
            let Some(ids) = self.by_first.get(&tokens[position]) else {
                continue;
            };
            let rest = &tokens[position..];
            let mut best: Option<usize> = None;
            for &id in ids {
                let phrase = &self.phrases[id];
                if !rest.starts_with(phrase) {
                    continue;
                }
                if best.map_or(true, |b| phrase.len() > self.phrases[b].len()) {
                    best = Some(id);
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }
}

/// Phrase-match event texts against series texts
pub fn phrase_matches(
    events: &[(&Qid, &str)],
    series: &[(&Qid, &str)],
    found_by: &str,
) -> Vec<Match> {
    let index = PhraseIndex::new(series.iter().map(|(_, text)| *text));
    events
        .iter()
        .filter_map(|(event, text)| {
            let id = index.find(text)?;
            let (series_qid, phrase) = series[id];
            debug!(strategy = found_by, event = %event, series = %series_qid, phrase, "Phrase found");
            Some(Match::new((*event).clone(), series_qid.clone(), found_by))
        })
        .collect()
}

/// Self-evaluation of phrase matching on training pairs
pub fn evaluate_phrases(pairs: &[TrainingPair]) -> Evaluation {
    self_evaluate(pairs, |event_title, series_titles| {
        PhraseIndex::new(series_titles.iter().copied()).find(event_title)
    })
}

#[derive(Debug, Default)]
pub struct PhraseMatch {
    evaluation: Option<Evaluation>,
}

impl PhraseMatch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Matcher for PhraseMatch {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, pairs: &[TrainingPair]) -> Evaluation {
        let evaluation = evaluate_phrases(pairs);
        self.evaluation = Some(evaluation);
        evaluation
    }

    fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    fn propose(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match> {
        let event_texts: Vec<(&Qid, &str)> =
            events.iter().map(|e| (&e.qid, e.title_else_label())).collect();
        let series_texts: Vec<(&Qid, &str)> =
            series.iter().map(|s| (&s.qid, s.title_else_label())).collect();
        phrase_matches(&event_texts, &series_texts, NAME)
    }
}
