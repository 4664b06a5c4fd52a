//! The ordered set of match strategies

use super::acronym::AcronymMatch;
use super::embedding::{TrainingMode, WordEmbedding};
use super::full_match::FullMatch;
use super::ngram::ngram_match;
use super::phrase::PhraseMatch;
use super::tfidf::tfidf_match;
use super::word_vectors::{local_word_vectors, pretrained_word_vectors};
use super::{Evaluation, Matcher};
use crate::error::LinkResult;
use crate::models::{Event, EventSeries, Match, TrainingPair};
use eventseries_common::config::MatchingConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Matches proposed by one strategy
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyProposals {
    pub name: String,
    pub matches: Vec<Match>,
}

pub struct MatcherCascade {
    matchers: Vec<Box<dyn Matcher>>,
}

impl MatcherCascade {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Every strategy, configured from `[matching]`
    ///
    /// Fails when a configured pretrained vector file cannot be loaded.
    pub fn from_config(config: &MatchingConfig) -> LinkResult<Self> {
        let pretrained = match &config.pretrained_vectors {
            Some(path) => Some(Arc::new(WordEmbedding::load_glove(path)?)),
            None => {
                warn!("No pretrained word vectors configured, pretrained strategies train from scratch");
                None
            }
        };

        let matchers: Vec<Box<dyn Matcher>> = vec![
            Box::new(FullMatch::new()),
            Box::new(PhraseMatch::new()),
            Box::new(AcronymMatch::new()),
            Box::new(ngram_match(config.word_wise_ngrams)),
            Box::new(tfidf_match()),
            Box::new(local_word_vectors(config)),
            Box::new(pretrained_word_vectors(pretrained.clone(), TrainingMode::Cbow, config)),
            Box::new(pretrained_word_vectors(pretrained, TrainingMode::SkipGram, config)),
        ];
        Ok(Self::new(matchers))
    }

    pub fn names(&self) -> Vec<&str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Fit every strategy on the same training pairs
    pub fn fit_all(&mut self, pairs: &[TrainingPair]) -> Vec<(String, Evaluation)> {
        info!(strategies = self.matchers.len(), pairs = pairs.len(), "Fitting strategies");
        self.matchers
            .iter_mut()
            .map(|matcher| {
                let evaluation = matcher.fit(pairs);
                if evaluation.is_overfit() {
                    warn!(
                        strategy = matcher.name(),
                        recall = evaluation.recall,
                        "Strategy fits its training data perfectly and will not propose matches"
                    );
                }
                (matcher.name().to_string(), evaluation)
            })
            .collect()
    }

    /// Proposals of every strategy over the same events, overfit guard applied
    pub fn propose_all(&self, events: &[Event], series: &[EventSeries]) -> Vec<StrategyProposals> {
        self.matchers
            .iter()
            .map(|matcher| {
                let matches = matcher.match_events(events, series);
                info!(strategy = matcher.name(), proposals = matches.len(), "Strategy finished");
                StrategyProposals {
                    name: matcher.name().to_string(),
                    matches,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{full_match, ngram, phrase, tfidf, word_vectors};
    use eventseries_common::Qid;

    fn offline_config() -> MatchingConfig {
        MatchingConfig {
            training_epochs: 0,
            vector_dimensions: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_strategy_order() {
        let cascade = MatcherCascade::from_config(&offline_config()).unwrap();
        assert_eq!(
            cascade.names(),
            vec![
                full_match::NAME,
                phrase::NAME,
                "AcronymMatch",
                ngram::NAME,
                tfidf::NAME,
                word_vectors::LOCAL_NAME,
                word_vectors::PRETRAINED_CBOW_NAME,
                word_vectors::PRETRAINED_SKIP_GRAM_NAME,
            ]
        );
    }

    #[test]
    fn test_missing_pretrained_file_is_an_error() {
        let config = MatchingConfig {
            pretrained_vectors: Some("/nonexistent/vectors.txt".into()),
            ..offline_config()
        };
        assert!(MatcherCascade::from_config(&config).is_err());
    }

    #[test]
    fn test_every_strategy_sees_the_same_events() {
        let cascade = MatcherCascade::new(vec![
            Box::new(FullMatch::new()),
            Box::new(PhraseMatch::new()),
        ]);
        let events = vec![Event::new(Qid::parse("Q1").unwrap(), "Ontology Patterns 2009")];
        let series = vec![EventSeries::new(Qid::parse("Q10").unwrap(), "Ontology Patterns")];

        let proposals = cascade.propose_all(&events, &series);
        assert_eq!(proposals.len(), 2);
        assert!(proposals.iter().all(|p| p.matches.len() == 1));
    }
}
