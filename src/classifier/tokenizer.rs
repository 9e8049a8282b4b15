//! Bounded-vocabulary tokenizer for the statistical classifier.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Index reserved for padding.
pub const PAD_INDEX: usize = 0;

/// Index assigned to out-of-vocabulary words.
pub const OOV_INDEX: usize = 1;

/// Bounded-vocabulary word tokenizer with an out-of-vocabulary placeholder.
///
/// `fit` ranks words by corpus frequency and assigns indices from 2 upward
/// (0 is padding, 1 is the OOV placeholder). At sequence time only the
/// `vocab_size` highest-ranked words keep their index; everything else maps
/// to OOV. Sequences are truncated from the end when longer than the fixed
/// length and zero-padded at the end otherwise, so a trained model always
/// sees inputs of one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedTokenizer {
    /// word -> rank index (2-based; pad and OOV are reserved).
    word_index: HashMap<String, usize>,
    /// Vocabulary cap, counting the reserved indices.
    vocab_size: usize,
    /// Fixed output sequence length.
    sequence_length: usize,
}

impl BoundedTokenizer {
    /// Create an unfitted tokenizer.
    pub fn new(vocab_size: usize, sequence_length: usize) -> Self {
        Self {
            word_index: HashMap::new(),
            vocab_size: vocab_size.max(2),
            sequence_length: sequence_length.max(1),
        }
    }

    /// Lowercase, strip punctuation, split on whitespace.
    pub fn split_words(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_string())
            .collect()
    }

    /// Fit the word index over the training texts.
    ///
    /// Words are ranked by descending frequency, ties broken by first
    /// appearance, so refitting over the same corpus is deterministic.
    pub fn fit(&mut self, texts: &[String]) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut order = 0usize;

        for text in texts {
            for word in Self::split_words(text) {
                *counts.entry(word.clone()).or_insert(0) += 1;
                first_seen.entry(word).or_insert_with(|| {
                    order += 1;
                    order
                });
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(first_seen[&a.0].cmp(&first_seen[&b.0])));

        self.word_index = ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (word, _))| (word, rank + 2))
            .collect();
    }

    /// Convert a text to a fixed-length index sequence.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        let mut sequence: Vec<usize> = Self::split_words(text)
            .into_iter()
            .map(|word| match self.word_index.get(&word) {
                Some(&idx) if idx < self.vocab_size => idx,
                _ => OOV_INDEX,
            })
            .collect();

        sequence.truncate(self.sequence_length);
        sequence.resize(self.sequence_length, PAD_INDEX);
        sequence
    }

    /// Number of distinct words seen during fitting (excluding reserved
    /// indices).
    pub fn fitted_words(&self) -> usize {
        self.word_index.len()
    }

    /// The vocabulary cap, counting reserved indices.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// The fixed output sequence length.
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }
}
