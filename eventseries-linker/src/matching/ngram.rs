//! N-gram matching with the Dice coefficient

use super::scoring::{Scorer, ScoringMatcher, SimilarityModel};
use super::text::word_tokens;
use std::collections::HashSet;

pub const NAME: &str = "NgramMatch";

const N_GRAM_SIZES: [usize; 3] = [3, 4, 5];
const THRESHOLDS: [f64; 3] = [0.8, 0.7, 0.6];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NgramParam {
    pub n: usize,
    pub threshold: f64,
}

/// Dice coefficient of two sets; two empty sets score 0
pub fn dice_coefficient(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    2.0 * a.intersection(b).count() as f64 / (a.len() + b.len()) as f64
}

/// Character n-grams of the lowercased text (or word n-grams when `word_wise`)
pub fn ngrams(text: &str, n: usize, word_wise: bool) -> HashSet<String> {
    if word_wise {
        let words = word_tokens(text);
        return words.windows(n).map(|w| w.join(" ")).collect();
    }
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

pub struct NgramModel {
    n: usize,
    word_wise: bool,
}

impl SimilarityModel for NgramModel {
    type Vector = HashSet<String>;

    fn embed(&self, text: &str) -> Option<HashSet<String>> {
        let grams = ngrams(text, self.n, self.word_wise);
        (!grams.is_empty()).then_some(grams)
    }

    fn similarity(&self, a: &HashSet<String>, b: &HashSet<String>) -> f64 {
        dice_coefficient(a, b)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NgramScorer {
    pub word_wise: bool,
}

impl Scorer for NgramScorer {
    type Param = NgramParam;
    type Model = NgramModel;

    fn grid(&self) -> Vec<NgramParam> {
        N_GRAM_SIZES
            .iter()
            .flat_map(|&n| THRESHOLDS.iter().map(move |&threshold| NgramParam { n, threshold }))
            .collect()
    }

    fn threshold(&self, param: &NgramParam) -> f64 {
        param.threshold
    }

    fn build(&self, param: &NgramParam, _corpus: &[&str]) -> NgramModel {
        NgramModel {
            n: param.n,
            word_wise: self.word_wise,
        }
    }
}

pub type NgramMatch = ScoringMatcher<NgramScorer>;

pub fn ngram_match(word_wise: bool) -> NgramMatch {
    ScoringMatcher::new(NAME, NgramScorer { word_wise })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Matcher;
    use crate::models::{Event, EventSeries};
    use eventseries_common::Qid;

    fn qid(s: &str) -> Qid {
        Qid::parse(s).unwrap()
    }

    #[test]
    fn test_dice() {
        let a = ngrams("night", 2, false);
        let b = ngrams("nacht", 2, false);
        // {ni, ig, gh, ht} vs {na, ac, ch, ht}
        assert!((dice_coefficient(&a, &b) - 0.25).abs() < 1e-9);
        assert_eq!(dice_coefficient(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_grid_order() {
        let grid = NgramScorer::default().grid();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], NgramParam { n: 3, threshold: 0.8 });
        assert_eq!(grid[8], NgramParam { n: 5, threshold: 0.6 });
    }

    #[test]
    fn test_selects_best_series() {
        let matcher = ngram_match(false);
        let events = vec![Event::new(qid("Q1"), "3rd ACM SIGKDD Conference")];
        let series = vec![
            EventSeries::new(qid("Q10"), "ACM SIGKDD Conference"),
            EventSeries::new(qid("Q11"), "ICML"),
        ];

        let a = ngrams("3rd ACM SIGKDD Conference", 3, false);
        let b = ngrams("ACM SIGKDD Conference", 3, false);
        assert!(dice_coefficient(&a, &b) > 0.8);

        let matches = matcher.match_events(&events, &series);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].series.qid(), Some(&qid("Q10")));
        assert_eq!(matches[0].found_by, NAME);
    }

    #[test]
    fn test_no_match_below_threshold() {
        let matcher = ngram_match(false);
        let events = vec![Event::new(qid("Q1"), "Workshop on Quantum Biology")];
        let series = vec![
            EventSeries::new(qid("Q10"), "ACM SIGKDD Conference"),
            EventSeries::new(qid("Q11"), "ICML"),
        ];
        assert!(matcher.match_events(&events, &series).is_empty());
    }

    #[test]
    fn test_word_wise_ngrams() {
        let grams = ngrams("ACM SIGKDD Conference on Data", 3, true);
        assert!(grams.contains("acm sigkdd conference"));
        assert_eq!(grams.len(), 3);
    }
}
