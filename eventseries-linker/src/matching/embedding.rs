//! Word embeddings: GloVe-format loading and word2vec-style training
//!
//! Training uses negative sampling in CBOW or skip-gram mode. Vectors of
//! words present in a pretrained embedding start from the pretrained values;
//! all other words start from small random values. The RNG is seeded so
//! repeated runs on the same input give the same vectors.

use crate::error::{LinkError, LinkResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingMode {
    Cbow,
    SkipGram,
}

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub mode: TrainingMode,
    /// Ignored when a pretrained embedding fixes the dimensionality
    pub dims: usize,
    pub epochs: usize,
    pub window: usize,
    pub negative: usize,
    pub learning_rate: f32,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            mode: TrainingMode::Cbow,
            dims: 100,
            epochs: 5,
            window: 5,
            negative: 5,
            learning_rate: 0.025,
            seed: 1,
        }
    }
}

/// Dense word vectors stored row-major
#[derive(Debug, Clone, Default)]
pub struct WordEmbedding {
    dims: usize,
    index: HashMap<String, usize>,
    vectors: Vec<f32>,
}

impl WordEmbedding {
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        let row = *self.index.get(word)?;
        Some(&self.vectors[row * self.dims..(row + 1) * self.dims])
    }

    fn push(&mut self, word: String, vector: &[f32]) {
        self.index.insert(word, self.index.len());
        self.vectors.extend_from_slice(vector);
    }

    /// Load a GloVe text file (`word v1 v2 ...` per line)
    pub fn load_glove(path: &Path) -> LinkResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                LinkError::NotFound(format!("word vectors {}", path.display()))
            }
            _ => LinkError::Io(e),
        })?;
        let embedding = Self::parse_glove(BufReader::new(file))?;
        info!(
            path = %path.display(),
            words = embedding.len(),
            dims = embedding.dims(),
            "Loaded pretrained word vectors"
        );
        Ok(embedding)
    }

    /// Parse GloVe text; a word2vec `<count> <dims>` header line is skipped
    ///
    /// The first vector fixes the dimensionality. Lines with another length or
    /// unparsable values are skipped with a warning.
    pub fn parse_glove(reader: impl BufRead) -> LinkResult<Self> {
        let mut embedding = Self::default();
        let mut values: Vec<f32> = Vec::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };

            values.clear();
            let mut parsed = true;
            for part in parts {
                match part.parse::<f32>() {
                    Ok(value) => values.push(value),
                    Err(_) => {
                        parsed = false;
                        break;
                    }
                }
            }

            if line_number == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                debug!(header = %line, "Skipping word2vec header");
                continue;
            }
            if !parsed || values.is_empty() {
                warn!(line = line_number + 1, "Unparsable word vector line, skipping");
                continue;
            }
            if embedding.dims == 0 {
                embedding.dims = values.len();
            }
            if values.len() != embedding.dims {
                warn!(
                    line = line_number + 1,
                    expected = embedding.dims,
                    actual = values.len(),
                    "Word vector with inconsistent dimensions, skipping"
                );
                continue;
            }
            if embedding.contains(word) {
                continue;
            }
            embedding.push(word.to_string(), &values);
        }

        if embedding.is_empty() {
            return Err(LinkError::MalformedInput(
                "word vector file contains no vectors".to_string(),
            ));
        }
        Ok(embedding)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// One negative-sampling update of `target` against hidden vector `hidden`
fn update_output(
    output: &mut [f32],
    dims: usize,
    hidden: &[f32],
    target: usize,
    label: f32,
    learning_rate: f32,
    hidden_gradient: &mut [f32],
) {
    let row = &mut output[target * dims..(target + 1) * dims];
    let dot: f32 = hidden.iter().zip(row.iter()).map(|(h, o)| h * o).sum();
    let g = (label - sigmoid(dot)) * learning_rate;
    for i in 0..dims {
        hidden_gradient[i] += g * row[i];
        row[i] += g * hidden[i];
    }
}

/// Train an embedding on tokenized sentences
pub fn train(
    sentences: &[Vec<String>],
    pretrained: Option<&WordEmbedding>,
    options: &TrainingOptions,
) -> WordEmbedding {
    let dims = match pretrained {
        Some(p) if p.dims() != options.dims => {
            debug!(
                configured = options.dims,
                pretrained = p.dims(),
                "Using the pretrained dimensionality"
            );
            p.dims()
        }
        Some(p) => p.dims(),
        None => options.dims,
    };
    let mut rng = StdRng::seed_from_u64(options.seed);

    // Vocabulary: training words in first-seen order, then pretrained-only words
    let mut embedding = WordEmbedding {
        dims,
        ..Default::default()
    };
    let mut counts: Vec<u64> = Vec::new();
    let mut init = vec![0.0f32; dims];
    for word in sentences.iter().flatten() {
        if let Some(&row) = embedding.index.get(word) {
            counts[row] += 1;
            continue;
        }
        match pretrained.and_then(|p| p.vector(word)) {
            Some(vector) => init.copy_from_slice(vector),
            None => init
                .iter_mut()
                .for_each(|v| *v = (rng.gen::<f32>() - 0.5) / dims as f32),
        }
        embedding.push(word.clone(), &init);
        counts.push(1);
    }
    let trained_words = counts.len();
    if let Some(pretrained) = pretrained {
        let mut extra: Vec<(&String, usize)> = pretrained
            .index
            .iter()
            .filter(|(word, _)| !embedding.contains(word))
            .map(|(word, row)| (word, *row))
            .collect();
        extra.sort_by_key(|(_, row)| *row);
        for (word, _) in extra {
            if let Some(vector) = pretrained.vector(word) {
                embedding.push(word.clone(), vector);
            }
        }
    }

    if options.epochs == 0 || trained_words == 0 {
        return embedding;
    }
    let noise = match WeightedIndex::new(counts.iter().map(|&c| (c as f64).powf(0.75))) {
        Ok(noise) => noise,
        Err(e) => {
            warn!(error = %e, "Cannot build the noise distribution, skipping training");
            return embedding;
        }
    };

    let ids: Vec<Vec<usize>> = sentences
        .iter()
        .map(|s| s.iter().filter_map(|w| embedding.index.get(w).copied()).collect())
        .collect();
    let total_steps = (counts.iter().sum::<u64>() as usize * options.epochs).max(1);
    let min_learning_rate = options.learning_rate * 1e-4;

    let mut output = vec![0.0f32; trained_words * dims];
    let mut hidden = vec![0.0f32; dims];
    let mut gradient = vec![0.0f32; dims];
    let mut step = 0usize;

    for epoch in 0..options.epochs {
        for sentence in &ids {
            for (position, &word) in sentence.iter().enumerate() {
                let progress = step as f32 / total_steps as f32;
                let learning_rate =
                    (options.learning_rate * (1.0 - progress)).max(min_learning_rate);
                step += 1;

                let reduced = rng.gen_range(0..options.window.max(1));
                let span = options.window.saturating_sub(reduced).max(1);
                let start = position.saturating_sub(span);
                let end = (position + span + 1).min(sentence.len());
                let context: Vec<usize> = (start..end)
                    .filter(|&i| i != position)
                    .map(|i| sentence[i])
                    .collect();
                if context.is_empty() {
                    continue;
                }

                match options.mode {
                    TrainingMode::Cbow => {
                        hidden.iter_mut().for_each(|h| *h = 0.0);
                        for &c in &context {
                            let row = &embedding.vectors[c * dims..(c + 1) * dims];
                            hidden.iter_mut().zip(row).for_each(|(h, v)| *h += v);
                        }
                        let scale = 1.0 / context.len() as f32;
                        hidden.iter_mut().for_each(|h| *h *= scale);

                        gradient.iter_mut().for_each(|g| *g = 0.0);
                        sample_targets(
                            &mut output, dims, &hidden, word, &noise, options.negative,
                            learning_rate, &mut gradient, &mut rng,
                        );
                        for &c in &context {
                            let row = &mut embedding.vectors[c * dims..(c + 1) * dims];
                            row.iter_mut().zip(&gradient).for_each(|(v, g)| *v += g);
                        }
                    }
                    TrainingMode::SkipGram => {
                        for &c in &context {
                            hidden.copy_from_slice(&embedding.vectors[c * dims..(c + 1) * dims]);
                            gradient.iter_mut().for_each(|g| *g = 0.0);
                            sample_targets(
                                &mut output, dims, &hidden, word, &noise, options.negative,
                                learning_rate, &mut gradient, &mut rng,
                            );
                            let row = &mut embedding.vectors[c * dims..(c + 1) * dims];
                            row.iter_mut().zip(&gradient).for_each(|(v, g)| *v += g);
                        }
                    }
                }
            }
        }
        debug!(epoch, mode = ?options.mode, "Finished training epoch");
    }

    info!(
        words = embedding.len(),
        trained_words,
        dims,
        epochs = options.epochs,
        mode = ?options.mode,
        "Trained word vectors"
    );
    embedding
}

/// Positive update for `word` followed by `negative` noise samples
#[allow(clippy::too_many_arguments)]
fn sample_targets(
    output: &mut [f32],
    dims: usize,
    hidden: &[f32],
    word: usize,
    noise: &WeightedIndex<f64>,
    negative: usize,
    learning_rate: f32,
    gradient: &mut [f32],
    rng: &mut StdRng,
) {
    update_output(output, dims, hidden, word, 1.0, learning_rate, gradient);
    for _ in 0..negative {
        let target = noise.sample(rng);
        if target == word {
            continue;
        }
        update_output(output, dims, hidden, target, 0.0, learning_rate, gradient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GLOVE: &str = "semantic 1.0 0.0 0.0\nweb 0.9 0.1 0.0\nontology 0.0 1.0 0.0\n";

    fn sentences() -> Vec<Vec<String>> {
        ["semantic web conference", "ontology patterns workshop", "semantic web workshop"]
            .iter()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_parse_glove() {
        let embedding = WordEmbedding::parse_glove(Cursor::new(GLOVE)).unwrap();
        assert_eq!(embedding.len(), 3);
        assert_eq!(embedding.dims(), 3);
        assert_eq!(embedding.vector("web"), Some(&[0.9f32, 0.1, 0.0][..]));
    }

    #[test]
    fn test_parse_glove_skips_header_and_bad_lines() {
        let input = "3 2\nsemantic 1.0 0.0\nbroken 1.0\nweb x 0.5\nontology 0.0 1.0\n";
        let embedding = WordEmbedding::parse_glove(Cursor::new(input)).unwrap();
        assert_eq!(embedding.len(), 2);
        assert!(!embedding.contains("broken"));
        assert!(!embedding.contains("web"));
    }

    #[test]
    fn test_parse_glove_empty_is_error() {
        assert!(WordEmbedding::parse_glove(Cursor::new("")).is_err());
    }

    #[test]
    fn test_untrained_keeps_pretrained_vectors() {
        let pretrained = WordEmbedding::parse_glove(Cursor::new(GLOVE)).unwrap();
        let options = TrainingOptions {
            epochs: 0,
            ..Default::default()
        };
        let embedding = train(&sentences(), Some(&pretrained), &options);

        assert_eq!(embedding.dims(), 3);
        assert_eq!(embedding.vector("semantic"), pretrained.vector("semantic"));
        assert!(embedding.contains("conference"));
        assert!(embedding.contains("ontology"));
    }

    #[test]
    fn test_training_is_deterministic() {
        for mode in [TrainingMode::Cbow, TrainingMode::SkipGram] {
            let options = TrainingOptions {
                mode,
                dims: 8,
                epochs: 3,
                ..Default::default()
            };
            let a = train(&sentences(), None, &options);
            let b = train(&sentences(), None, &options);
            assert_eq!(a.vector("workshop"), b.vector("workshop"));
            assert_eq!(a.len(), 6);
        }
    }
}
