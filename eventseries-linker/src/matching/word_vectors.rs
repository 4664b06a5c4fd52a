//! Averaged word vectors compared by cosine similarity

use super::embedding::{train, TrainingMode, TrainingOptions, WordEmbedding};
use super::scoring::{Scorer, ScoringMatcher, SimilarityModel};
use super::text::vector_tokens;
use crate::models::TrainingPair;
use eventseries_common::config::MatchingConfig;
use std::sync::Arc;

pub const LOCAL_NAME: &str = "LocalWordVectors";
pub const PRETRAINED_CBOW_NAME: &str = "PretrainedCbowWordVectors";
pub const PRETRAINED_SKIP_GRAM_NAME: &str = "PretrainedSkipGramWordVectors";

const THRESHOLDS: [f64; 2] = [0.93, 0.95];

pub struct WordVectorModel {
    embedding: Arc<WordEmbedding>,
}

impl SimilarityModel for WordVectorModel {
    type Vector = Vec<f32>;

    /// Mean of the token vectors; out-of-vocabulary tokens are skipped
    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let mut sum = vec![0.0f32; self.embedding.dims()];
        let mut found = 0usize;
        for token in vector_tokens(text) {
            if let Some(vector) = self.embedding.vector(&token) {
                sum.iter_mut().zip(vector).for_each(|(s, v)| *s += v);
                found += 1;
            }
        }
        if found == 0 {
            return None;
        }
        sum.iter_mut().for_each(|s| *s /= found as f32);
        Some(sum)
    }

    fn similarity(&self, a: &Vec<f32>, b: &Vec<f32>) -> f64 {
        let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
        let norm = |v: &Vec<f32>| v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        let denominator = norm(a) * norm(b);
        if denominator == 0.0 {
            0.0
        } else {
            dot / denominator
        }
    }
}

pub struct WordVectorScorer {
    pretrained: Option<Arc<WordEmbedding>>,
    options: TrainingOptions,
    trained: Option<Arc<WordEmbedding>>,
}

impl WordVectorScorer {
    pub fn new(pretrained: Option<Arc<WordEmbedding>>, options: TrainingOptions) -> Self {
        Self {
            pretrained,
            options,
            trained: None,
        }
    }

    pub fn mode(&self) -> TrainingMode {
        self.options.mode
    }

    fn train_on<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> WordEmbedding {
        let sentences: Vec<Vec<String>> = texts.into_iter().map(vector_tokens).collect();
        train(&sentences, self.pretrained.as_deref(), &self.options)
    }
}

impl Scorer for WordVectorScorer {
    type Param = f64;
    type Model = WordVectorModel;

    fn grid(&self) -> Vec<f64> {
        THRESHOLDS.to_vec()
    }

    fn threshold(&self, param: &f64) -> f64 {
        *param
    }

    fn accepts(&self, score: f64, threshold: f64) -> bool {
        score > threshold
    }

    fn train(&mut self, pairs: &[TrainingPair]) {
        let texts = pairs
            .iter()
            .flat_map(|p| [p.event_title.as_str(), p.series_title.as_str()]);
        self.trained = Some(Arc::new(self.train_on(texts)));
    }

    /// Uses the fitted embedding; an unfitted scorer trains on `corpus`
    fn build(&self, _param: &f64, corpus: &[&str]) -> WordVectorModel {
        let embedding = match &self.trained {
            Some(embedding) => Arc::clone(embedding),
            None => Arc::new(self.train_on(corpus.iter().copied())),
        };
        WordVectorModel { embedding }
    }
}

pub type WordVectorMatch = ScoringMatcher<WordVectorScorer>;

fn options_from(config: &MatchingConfig, mode: TrainingMode) -> TrainingOptions {
    TrainingOptions {
        mode,
        dims: config.vector_dimensions,
        epochs: config.training_epochs,
        ..Default::default()
    }
}

/// Embedding trained on the training titles only (CBOW)
pub fn local_word_vectors(config: &MatchingConfig) -> WordVectorMatch {
    ScoringMatcher::new(
        LOCAL_NAME,
        WordVectorScorer::new(None, options_from(config, TrainingMode::Cbow)),
    )
}

/// Embedding seeded from pretrained vectors, then trained in `mode`
pub fn pretrained_word_vectors(
    pretrained: Option<Arc<WordEmbedding>>,
    mode: TrainingMode,
    config: &MatchingConfig,
) -> WordVectorMatch {
    let name = match mode {
        TrainingMode::Cbow => PRETRAINED_CBOW_NAME,
        TrainingMode::SkipGram => PRETRAINED_SKIP_GRAM_NAME,
    };
    ScoringMatcher::new(name, WordVectorScorer::new(pretrained, options_from(config, mode)))
}
