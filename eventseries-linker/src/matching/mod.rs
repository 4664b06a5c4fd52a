//! Matcher cascade
//!
//! Every strategy implements [`Matcher`]. Strategies are fit on known
//! event→series title pairs, report a self-evaluation on those pairs, and then
//! propose matches for events without a series. A strategy whose recall on its
//! own training data reaches 1.0 is treated as overfit and proposes nothing.

pub mod acronym;
pub mod cascade;
pub mod cross_validation;
pub mod dblp_matcher;
pub mod embedding;
pub mod full_match;
pub mod ngram;
pub mod phrase;
pub mod scoring;
pub mod text;
pub mod tfidf;
pub mod word_vectors;

pub use cascade::{MatcherCascade, StrategyProposals};
pub use cross_validation::CrossValidator;
pub use dblp_matcher::DblpMatcher;
pub use scoring::{Scorer, ScoringMatcher, SimilarityModel};

use crate::models::{Event, EventSeries, Match, TrainingPair};
use tracing::warn;

/// Self-evaluation of a strategy on its training pairs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Evaluation {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Evaluation {
    /// Metrics from raw counts; empty denominators yield 0
    pub fn from_counts(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, true_positives + false_negatives);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1,
        }
    }

    pub fn is_overfit(&self) -> bool {
        self.recall >= 1.0
    }
}

/// Evaluate a best-match function on training pairs
///
/// Each event title is matched against the distinct series titles of the
/// pairs (first-seen order). `best` returns the index of the chosen series
/// title, or `None` when nothing clears the strategy's threshold.
pub fn self_evaluate<F>(pairs: &[TrainingPair], mut best: F) -> Evaluation
where
    F: FnMut(&str, &[&str]) -> Option<usize>,
{
    let mut series_titles: Vec<&str> = Vec::new();
    for pair in pairs {
        if !series_titles.contains(&pair.series_title.as_str()) {
            series_titles.push(&pair.series_title);
        }
    }

    let (mut tp, mut fp, mut fn_) = (0, 0, 0);
    for pair in pairs {
        match best(&pair.event_title, &series_titles) {
            Some(index) if series_titles[index] == pair.series_title => tp += 1,
            Some(_) => fp += 1,
            None => fn_ += 1,
        }
    }
    Evaluation::from_counts(tp, fp, fn_)
}

/// A match strategy
pub trait Matcher: Send + Sync {
    /// Provenance tag written into `found_by`
    fn name(&self) -> &str;

    /// Calibrate on known pairs and return the self-evaluation
    fn fit(&mut self, pairs: &[TrainingPair]) -> Evaluation;

    /// Evaluation of the last fit, if any
    fn evaluation(&self) -> Option<&Evaluation>;

    /// Raw proposals, without the overfit guard
    fn propose(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match>;

    /// Proposals, or nothing when the last fit flagged the strategy as overfit
    fn match_events(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match> {
        if let Some(evaluation) = self.evaluation() {
            if evaluation.is_overfit() {
                warn!(
                    strategy = self.name(),
                    recall = evaluation.recall,
                    "Strategy is overfit on its training data, refusing to match"
                );
                return Vec::new();
            }
        }
        self.propose(events, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts() {
        let eval = Evaluation::from_counts(6, 2, 2);
        assert!((eval.precision - 0.75).abs() < 1e-9);
        assert!((eval.recall - 0.75).abs() < 1e-9);
        assert!((eval.f1 - 0.75).abs() < 1e-9);
        assert!(!eval.is_overfit());
    }

    #[test]
    fn test_empty_denominators() {
        let eval = Evaluation::from_counts(0, 0, 0);
        assert_eq!(eval.precision, 0.0);
        assert_eq!(eval.recall, 0.0);
        assert_eq!(eval.f1, 0.0);
    }

    #[test]
    fn test_self_evaluate_counts() {
        let pairs = vec![
            TrainingPair::new("ISWC 2003", "ISWC"),
            TrainingPair::new("ESWC 2013", "ESWC"),
            TrainingPair::new("KI 2019", "KI"),
        ];
        // First event right, second wrong, third unmatched
        let eval = self_evaluate(&pairs, |event, titles| match event {
            "ISWC 2003" => titles.iter().position(|t| *t == "ISWC"),
            "ESWC 2013" => titles.iter().position(|t| *t == "KI"),
            _ => None,
        });
        assert_eq!(
            (eval.true_positives, eval.false_positives, eval.false_negatives),
            (1, 1, 1)
        );
    }
}
