//! TF-IDF cosine similarity
//!
//! Raw term counts weighted by smooth idf (`ln((1 + n) / (1 + df)) + 1`),
//! L2-normalized. The vocabulary is fit on the texts being matched.

use super::scoring::{Scorer, ScoringMatcher, SimilarityModel};
use super::text::tfidf_tokens;
use std::collections::{HashMap, HashSet};

pub const NAME: &str = "TfIdfMatch";

const THRESHOLDS: [f64; 5] = [0.5, 0.6, 0.7, 0.8, 0.9];

/// Sparse, L2-normalized term weights
pub type SparseVector = HashMap<usize, f64>;

pub struct TfIdfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfModel {
    pub fn fit(corpus: &[&str]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for document in corpus {
            let terms: HashSet<String> = tfidf_tokens(document).into_iter().collect();
            for term in terms {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(term).or_insert(next_id);
                if id == document_frequency.len() {
                    document_frequency.push(0);
                }
                document_frequency[id] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        Self { vocabulary, idf }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

impl SimilarityModel for TfIdfModel {
    type Vector = SparseVector;

    fn embed(&self, text: &str) -> Option<SparseVector> {
        let mut weights: SparseVector = HashMap::new();
        for token in tfidf_tokens(text) {
            if let Some(&id) = self.vocabulary.get(&token) {
                *weights.entry(id).or_insert(0.0) += self.idf[id];
            }
        }

        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return None;
        }
        weights.values_mut().for_each(|w| *w /= norm);
        Some(weights)
    }

    fn similarity(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        small
            .iter()
            .filter_map(|(id, w)| large.get(id).map(|v| w * v))
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfIdfScorer;

impl Scorer for TfIdfScorer {
    type Param = f64;
    type Model = TfIdfModel;

    fn grid(&self) -> Vec<f64> {
        THRESHOLDS.to_vec()
    }

    fn threshold(&self, param: &f64) -> f64 {
        *param
    }

    fn build(&self, _param: &f64, corpus: &[&str]) -> TfIdfModel {
        TfIdfModel::fit(corpus)
    }
}

pub type TfIdfMatch = ScoringMatcher<TfIdfScorer>;

pub fn tfidf_match() -> TfIdfMatch {
    ScoringMatcher::new(NAME, TfIdfScorer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Matcher;
    use crate::models::{Event, EventSeries, TrainingPair};
    use eventseries_common::Qid;

    #[test]
    fn test_identical_texts_score_one() {
        let corpus = ["semantic web conference", "machine learning workshop"];
        let model = TfIdfModel::fit(&corpus);
        let a = model.embed("Semantic Web Conference").unwrap();
        assert!((model.similarity(&a, &a) - 1.0).abs() < 1e-9);

        let b = model.embed("machine learning workshop").unwrap();
        assert_eq!(model.similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_stop_words_only_has_no_vector() {
        let model = TfIdfModel::fit(&["the of and", "semantic web"]);
        assert_eq!(model.vocabulary_size(), 2);
        assert!(model.embed("the of and").is_none());
    }

    #[test]
    fn test_fit_keeps_first_best_threshold() {
        let mut matcher = tfidf_match();
        let pairs = vec![
            TrainingPair::new("2nd International Semantic Web Conference", "International Semantic Web Conference"),
            TrainingPair::new("European Semantic Web Conference 2013", "Extended Semantic Web Conference"),
            TrainingPair::new("Workshop on Ontology Patterns 2009", "Workshop on Ontology Patterns"),
        ];
        let eval = matcher.fit(&pairs);

        assert!(eval.f1 > 0.0);
        assert!(matcher.param().is_some());
    }

    #[test]
    fn test_proposes_closest_series() {
        let matcher = tfidf_match().with_param(0.5);
        let events = vec![Event::new(
            Qid::parse("Q1").unwrap(),
            "Workshop on Ontology Patterns 2009",
        )];
        let series = vec![
            EventSeries::new(Qid::parse("Q10").unwrap(), "Workshop on Ontology Patterns"),
            EventSeries::new(Qid::parse("Q11").unwrap(), "Semantic Web Conference"),
        ];

        let matches = matcher.match_events(&events, &series);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].series.qid().unwrap().as_str(), "Q10");
    }
}
