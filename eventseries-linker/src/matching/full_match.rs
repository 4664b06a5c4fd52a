//! Case-insensitive containment between event and series names

use super::{self_evaluate, Evaluation, Matcher};
use crate::models::{Event, EventSeries, Match, Titled, TrainingPair};
use tracing::debug;

pub const NAME: &str = "FullMatch";

fn lowered_names<T: Titled>(record: &T) -> Vec<String> {
    let mut names = vec![record.label().to_lowercase()];
    if let Some(title) = record.title() {
        let title = title.to_lowercase();
        if !names.contains(&title) {
            names.push(title);
        }
    }
    names.retain(|n| !n.trim().is_empty());
    names
}

/// Either string contains the other; both are expected lowercased
fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[derive(Debug, Default)]
pub struct FullMatch {
    evaluation: Option<Evaluation>,
}

impl FullMatch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Matcher for FullMatch {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, pairs: &[TrainingPair]) -> Evaluation {
        let evaluation = self_evaluate(pairs, |event_title, series_titles| {
            let event_title = event_title.to_lowercase();
            if event_title.trim().is_empty() {
                return None;
            }
            series_titles.iter().position(|title| {
                let title = title.to_lowercase();
                !title.trim().is_empty() && contains_either(&event_title, &title)
            })
        });
        debug!(
            strategy = NAME,
            precision = evaluation.precision,
            recall = evaluation.recall,
            "Fitted strategy"
        );
        self.evaluation = Some(evaluation);
        evaluation
    }

    fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    fn propose(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match> {
        let series_names: Vec<Vec<String>> = series.iter().map(lowered_names).collect();

        let mut matches = Vec::new();
        for event in events {
            let event_names = lowered_names(event);
            for (candidate, names) in series.iter().zip(&series_names) {
                let qualifies = event_names
                    .iter()
                    .any(|e| names.iter().any(|s| contains_either(e, s)));
                if qualifies {
                    matches.push(Match::new(event.qid.clone(), candidate.qid.clone(), NAME));
                }
            }
        }
        matches
    }
}
