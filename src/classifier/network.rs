//! Feed-forward network for intent classification.
//!
//! A deliberately small model: embedding lookup, mean pooling over the
//! non-pad positions of the fixed-length sequence, one ReLU hidden layer,
//! and a softmax output over the intent labels. Trained by per-example SGD
//! on cross-entropy loss. Weights are plain `Vec`s so the whole network
//! serializes with serde alongside the rest of the trained state.
//!
//! Padding is excluded from the pool and the pad embedding row is pinned at
//! zero: with plain SGD a trainable pad row shared by every example drowns
//! the word signal in conflicting gradients and training never converges.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tokenizer::PAD_INDEX;

/// Metrics for one training epoch.
///
/// Validation metrics are absent when the held-out split rounds to zero rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean training loss over the epoch.
    pub loss: f64,
    /// Training accuracy at the end of the epoch.
    pub accuracy: f64,
    /// Mean validation loss, if a validation split exists.
    pub val_loss: Option<f64>,
    /// Validation accuracy, if a validation split exists.
    pub val_accuracy: Option<f64>,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Per-epoch metrics, in order.
    pub epochs: Vec<EpochMetrics>,
    /// Final training accuracy.
    pub accuracy: f64,
    /// Final mean training loss.
    pub loss: f64,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Wall-clock training time in milliseconds.
    pub training_time_ms: u64,
}

/// Embedding -> mean pooling -> dense ReLU -> softmax classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNetwork {
    vocab_size: usize,
    embedding_dim: usize,
    hidden_dim: usize,
    num_classes: usize,
    /// [vocab_size][embedding_dim]
    embedding: Vec<Vec<f64>>,
    /// [embedding_dim][hidden_dim]
    w1: Vec<Vec<f64>>,
    b1: Vec<f64>,
    /// [hidden_dim][num_classes]
    w2: Vec<Vec<f64>>,
    b2: Vec<f64>,
}

impl FeedForwardNetwork {
    /// Create a network with small uniform random weights.
    pub fn new<R: Rng>(
        vocab_size: usize,
        embedding_dim: usize,
        hidden_dim: usize,
        num_classes: usize,
        rng: &mut R,
    ) -> Self {
        let mut matrix = |rows: usize, cols: usize, scale: f64| -> Vec<Vec<f64>> {
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.random_range(-scale..scale)).collect())
                .collect()
        };

        let mut embedding = matrix(vocab_size, embedding_dim, 0.05);
        // The pad row never contributes to pooling; keep it at zero so a
        // deserialized and a freshly built network agree on its meaning.
        for slot in &mut embedding[PAD_INDEX] {
            *slot = 0.0;
        }
        let w1_scale = (6.0 / (embedding_dim + hidden_dim) as f64).sqrt();
        let w1 = matrix(embedding_dim, hidden_dim, w1_scale);
        let w2_scale = (6.0 / (hidden_dim + num_classes) as f64).sqrt();
        let w2 = matrix(hidden_dim, num_classes, w2_scale);

        Self {
            vocab_size,
            embedding_dim,
            hidden_dim,
            num_classes,
            embedding,
            w1,
            b1: vec![0.0; hidden_dim],
            w2,
            b2: vec![0.0; num_classes],
        }
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of non-pad positions in a sequence.
    fn active_len(sequence: &[usize]) -> usize {
        sequence.iter().filter(|&&idx| idx != PAD_INDEX).count()
    }

    /// Mean-pool the embeddings of the non-pad positions of a sequence.
    ///
    /// An all-pad sequence pools to the zero vector.
    fn pool(&self, sequence: &[usize]) -> Vec<f64> {
        let mut pooled = vec![0.0; self.embedding_dim];
        for &idx in sequence {
            if idx == PAD_INDEX {
                continue;
            }
            let row = &self.embedding[idx.min(self.vocab_size - 1)];
            for (p, &v) in pooled.iter_mut().zip(row.iter()) {
                *p += v;
            }
        }
        let len = Self::active_len(sequence).max(1) as f64;
        for p in &mut pooled {
            *p /= len;
        }
        pooled
    }

    fn hidden(&self, pooled: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut pre = self.b1.clone();
        for (e, &p) in pooled.iter().enumerate() {
            for (h, slot) in pre.iter_mut().enumerate() {
                *slot += p * self.w1[e][h];
            }
        }
        let activated = pre.iter().map(|&x| x.max(0.0)).collect();
        (pre, activated)
    }

    fn logits(&self, hidden: &[f64]) -> Vec<f64> {
        let mut logits = self.b2.clone();
        for (h, &a) in hidden.iter().enumerate() {
            for (c, slot) in logits.iter_mut().enumerate() {
                *slot += a * self.w2[h][c];
            }
        }
        logits
    }

    fn softmax(logits: &[f64]) -> Vec<f64> {
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|&x| (x - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / sum).collect()
    }

    /// Run inference, returning the softmax distribution over classes.
    pub fn predict_proba(&self, sequence: &[usize]) -> Vec<f64> {
        let pooled = self.pool(sequence);
        let (_, hidden) = self.hidden(&pooled);
        Self::softmax(&self.logits(&hidden))
    }

    /// One SGD step on a single example. Returns the example's loss.
    pub fn train_step(&mut self, sequence: &[usize], label: usize, learning_rate: f64) -> f64 {
        let pooled = self.pool(sequence);
        let (pre1, hidden) = self.hidden(&pooled);
        let probs = Self::softmax(&self.logits(&hidden));
        let loss = -(probs[label].max(1e-12)).ln();

        // d loss / d logits for softmax + cross-entropy.
        let mut dlogits = probs;
        dlogits[label] -= 1.0;

        // Gradient through the output layer, using pre-update weights.
        let mut dhidden = vec![0.0; self.hidden_dim];
        for (h, slot) in dhidden.iter_mut().enumerate() {
            for (c, &dl) in dlogits.iter().enumerate() {
                *slot += self.w2[h][c] * dl;
            }
        }
        // ReLU gate.
        for (dh, &pre) in dhidden.iter_mut().zip(pre1.iter()) {
            if pre <= 0.0 {
                *dh = 0.0;
            }
        }

        let mut dpooled = vec![0.0; self.embedding_dim];
        for (e, slot) in dpooled.iter_mut().enumerate() {
            for (h, &dh) in dhidden.iter().enumerate() {
                *slot += self.w1[e][h] * dh;
            }
        }

        // Apply updates.
        for (h, &a) in hidden.iter().enumerate() {
            for (c, &dl) in dlogits.iter().enumerate() {
                self.w2[h][c] -= learning_rate * a * dl;
            }
        }
        for (c, &dl) in dlogits.iter().enumerate() {
            self.b2[c] -= learning_rate * dl;
        }
        for (e, &p) in pooled.iter().enumerate() {
            for (h, &dh) in dhidden.iter().enumerate() {
                self.w1[e][h] -= learning_rate * p * dh;
            }
        }
        for (h, &dh) in dhidden.iter().enumerate() {
            self.b1[h] -= learning_rate * dh;
        }

        // The pooled vector is a mean over non-pad positions, so each of
        // those embedding rows receives its share of the gradient. The pad
        // row stays pinned at zero.
        let share = learning_rate / Self::active_len(sequence).max(1) as f64;
        for &idx in sequence {
            if idx == PAD_INDEX {
                continue;
            }
            let row = &mut self.embedding[idx.min(self.vocab_size - 1)];
            for (slot, &dp) in row.iter_mut().zip(dpooled.iter()) {
                *slot -= share * dp;
            }
        }

        loss
    }

    /// Mean loss and accuracy over a labeled dataset.
    pub fn evaluate(&self, data: &[(Vec<usize>, usize)]) -> (f64, f64) {
        if data.is_empty() {
            return (0.0, 0.0);
        }
        let mut total_loss = 0.0;
        let mut correct = 0usize;
        for (sequence, label) in data {
            let probs = self.predict_proba(sequence);
            total_loss += -(probs[*label].max(1e-12)).ln();
            let argmax = probs
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap_or(0);
            if argmax == *label {
                correct += 1;
            }
        }
        let n = data.len() as f64;
        (total_loss / n, correct as f64 / n)
    }
}
