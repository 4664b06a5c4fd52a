//! Threshold strategies over a similarity score
//!
//! [`ScoringMatcher`] holds the parts that n-gram, TF-IDF and word-vector
//! matching share: grid search over parameters, self-evaluation and
//! best-candidate selection. A [`Scorer`] only supplies the similarity model.

use super::{self_evaluate, Evaluation, Matcher};
use crate::models::{Event, EventSeries, Match, Titled, TrainingPair};
use std::fmt::Debug;
use tracing::{debug, info};

/// Text representation plus a similarity between two representations
pub trait SimilarityModel {
    type Vector;

    /// `None` when the text has no usable tokens
    fn embed(&self, text: &str) -> Option<Self::Vector>;

    fn similarity(&self, a: &Self::Vector, b: &Self::Vector) -> f64;
}

pub trait Scorer: Send + Sync {
    type Param: Clone + Debug + Send + Sync;
    type Model: SimilarityModel;

    /// Candidate parameters in search order
    fn grid(&self) -> Vec<Self::Param>;

    fn threshold(&self, param: &Self::Param) -> f64;

    /// Whether a best score clears the threshold
    fn accepts(&self, score: f64, threshold: f64) -> bool {
        score >= threshold
    }

    /// Learn parameter-independent state from the training pairs
    fn train(&mut self, _pairs: &[TrainingPair]) {}

    /// Build a model for `param`; `corpus` holds every text that will be embedded
    fn build(&self, param: &Self::Param, corpus: &[&str]) -> Self::Model;
}

/// Index of the best-scoring candidate that clears the threshold
///
/// Ties keep the first candidate.
pub fn best_candidate<S: Scorer>(
    scorer: &S,
    model: &S::Model,
    threshold: f64,
    query: &<S::Model as SimilarityModel>::Vector,
    candidates: &[Option<<S::Model as SimilarityModel>::Vector>],
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let Some(candidate) = candidate else { continue };
        let score = model.similarity(query, candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best.filter(|(_, score)| scorer.accepts(*score, threshold))
}

pub struct ScoringMatcher<S: Scorer> {
    name: String,
    scorer: S,
    param: Option<S::Param>,
    evaluation: Option<Evaluation>,
}

impl<S: Scorer> ScoringMatcher<S> {
    pub fn new(name: impl Into<String>, scorer: S) -> Self {
        Self {
            name: name.into(),
            scorer,
            param: None,
            evaluation: None,
        }
    }

    /// Fix the parameter instead of searching for it
    pub fn with_param(mut self, param: S::Param) -> Self {
        self.param = Some(param);
        self
    }

    /// Parameter in use: the fitted one, else the first of the grid
    pub fn param(&self) -> Option<S::Param> {
        self.param
            .clone()
            .or_else(|| self.scorer.grid().into_iter().next())
    }

    fn evaluate(&self, param: &S::Param, pairs: &[TrainingPair]) -> Evaluation {
        let corpus: Vec<&str> = pairs
            .iter()
            .flat_map(|p| [p.event_title.as_str(), p.series_title.as_str()])
            .collect();
        let model = self.scorer.build(param, &corpus);
        let threshold = self.scorer.threshold(param);

        self_evaluate(pairs, |event_title, series_titles| {
            let query = model.embed(event_title)?;
            let candidates: Vec<_> = series_titles.iter().map(|t| model.embed(t)).collect();
            best_candidate(&self.scorer, &model, threshold, &query, &candidates).map(|(i, _)| i)
        })
    }
}

impl<S: Scorer> Matcher for ScoringMatcher<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, pairs: &[TrainingPair]) -> Evaluation {
        self.param = None;
        self.evaluation = None;
        self.scorer.train(pairs);

        let mut best: Option<(S::Param, Evaluation)> = None;
        for param in self.scorer.grid() {
            let evaluation = self.evaluate(&param, pairs);
            debug!(
                strategy = %self.name,
                param = ?param,
                precision = evaluation.precision,
                recall = evaluation.recall,
                f1 = evaluation.f1,
                "Evaluated parameter"
            );
            if best.as_ref().map_or(true, |(_, b)| evaluation.f1 > b.f1) {
                best = Some((param, evaluation));
            }
        }

        let (param, evaluation) = match best {
            Some(best) => best,
            None => return Evaluation::default(),
        };
        info!(
            strategy = %self.name,
            param = ?param,
            precision = evaluation.precision,
            recall = evaluation.recall,
            f1 = evaluation.f1,
            "Fitted strategy"
        );
        self.param = Some(param);
        self.evaluation = Some(evaluation);
        evaluation
    }

    fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    fn propose(&self, events: &[Event], series: &[EventSeries]) -> Vec<Match> {
        let Some(param) = self.param() else {
            return Vec::new();
        };

        let corpus: Vec<&str> = events
            .iter()
            .map(|e| e.title_else_label())
            .chain(series.iter().map(|s| s.title_else_label()))
            .collect();
        let model = self.scorer.build(&param, &corpus);
        let threshold = self.scorer.threshold(&param);

        let candidates: Vec<_> = series
            .iter()
            .map(|s| model.embed(s.title_else_label()))
            .collect();

        events
            .iter()
            .filter_map(|event| {
                let query = model.embed(event.title_else_label())?;
                let (index, score) =
                    best_candidate(&self.scorer, &model, threshold, &query, &candidates)?;
                debug!(
                    strategy = %self.name,
                    event = %event.qid,
                    series = %series[index].qid,
                    score,
                    "Proposed match"
                );
                Some(Match::new(
                    event.qid.clone(),
                    series[index].qid.clone(),
                    self.name.clone(),
                ))
            })
            .collect()
    }
}
