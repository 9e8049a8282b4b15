//! Trainable statistical intent classifier.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::catalog::IntentCatalog;
use crate::error::{CarelineError, Result};

use super::network::{EpochMetrics, FeedForwardNetwork, TrainingReport};
use super::state::{LabelTable, ModelStore, StateMetadata, TrainedState};
use super::tokenizer::BoundedTokenizer;
use super::{Classifier, ClassificationResult, UNKNOWN_TAG_RESPONSE};

/// Hyperparameters for a training run.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Vocabulary cap for the tokenizer, counting reserved indices.
    pub vocab_size: usize,
    /// Fixed input sequence length.
    pub sequence_length: usize,
    /// Embedding dimension.
    pub embedding_dim: usize,
    /// Hidden layer width.
    pub hidden_dim: usize,
    /// Fixed epoch budget.
    pub epochs: usize,
    /// SGD learning rate.
    pub learning_rate: f64,
    /// Fraction of rows held out for validation.
    pub validation_split: f64,
    /// RNG seed for reproducible runs. `None` seeds from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 1000,
            sequence_length: 20,
            embedding_dim: 16,
            hidden_dim: 16,
            epochs: 100,
            learning_rate: 0.05,
            validation_split: 0.2,
            seed: None,
        }
    }
}

/// Statistical intent classifier backed by a trained feed-forward network.
///
/// Training is the only mutation path: it derives the training set from the
/// catalog, fits the tokenizer and network, persists the whole
/// [`TrainedState`] atomically, and publishes it wholesale to concurrent
/// readers. `predict` never mutates the state; it lazily loads persisted
/// state on first use and fails with a distinct
/// [`CarelineError::StateNotFound`] when none exists. The not-loaded vs
/// ready transition is observable through [`NeuralClassifier::is_loaded`] and
/// [`NeuralClassifier::load`].
pub struct NeuralClassifier {
    catalog: Arc<IntentCatalog>,
    store: ModelStore,
    config: TrainingConfig,
    state: RwLock<Option<Arc<TrainedState>>>,
}

impl std::fmt::Debug for NeuralClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralClassifier")
            .field("store", &self.store.dir())
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl NeuralClassifier {
    /// Create a classifier with default hyperparameters.
    pub fn new(catalog: Arc<IntentCatalog>, store: ModelStore) -> Self {
        Self::with_config(catalog, store, TrainingConfig::default())
    }

    /// Create a classifier with explicit hyperparameters.
    pub fn with_config(
        catalog: Arc<IntentCatalog>,
        store: ModelStore,
        config: TrainingConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
            state: RwLock::new(None),
        }
    }

    /// Whether a trained state is resident in memory.
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    /// Load the persisted state into memory.
    ///
    /// Fails with [`CarelineError::StateNotFound`] when no state has been
    /// persisted.
    pub fn load(&self) -> Result<()> {
        let state = Arc::new(self.store.load()?);
        *self.state.write() = Some(state);
        Ok(())
    }

    fn current_state(&self) -> Result<Arc<TrainedState>> {
        if let Some(state) = self.state.read().as_ref() {
            return Ok(Arc::clone(state));
        }
        self.load()?;
        self.state
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| CarelineError::state_not_found("state vanished after load"))
    }

    /// Train from the flattened catalog, persist the state atomically, and
    /// publish it for serving.
    pub fn train(&self) -> Result<TrainingReport> {
        let started = Instant::now();
        let rows = self.catalog.flatten();
        if rows.is_empty() {
            return Err(CarelineError::configuration(
                "catalog flattened to zero training rows",
            ));
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        // Fit the tokenizer over every training text.
        let texts: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        let mut tokenizer =
            BoundedTokenizer::new(self.config.vocab_size, self.config.sequence_length);
        tokenizer.fit(&texts);

        // Label bijection over distinct intents, in order of first appearance.
        let mut index_to_tag: Vec<String> = Vec::new();
        let mut tag_to_index: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();
        for row in &rows {
            if !tag_to_index.contains_key(&row.intent) {
                tag_to_index.insert(row.intent.clone(), index_to_tag.len());
                index_to_tag.push(row.intent.clone());
            }
        }
        let labels = LabelTable {
            index_to_tag: index_to_tag.clone(),
            response_lookup: rows
                .iter()
                .map(|r| (r.intent.clone(), r.response.clone()))
                .collect(),
        };

        // Encode rows and carve out the validation split.
        let mut encoded: Vec<(Vec<usize>, usize)> = rows
            .iter()
            .map(|row| (tokenizer.encode(&row.text), tag_to_index[&row.intent]))
            .collect();
        encoded.shuffle(&mut rng);

        let val_count = ((encoded.len() as f64) * self.config.validation_split) as usize;
        let val_count = val_count.min(encoded.len().saturating_sub(1));
        let validation = encoded.split_off(encoded.len() - val_count);
        let mut training = encoded;

        let mut network = FeedForwardNetwork::new(
            self.config.vocab_size,
            self.config.embedding_dim,
            self.config.hidden_dim,
            index_to_tag.len(),
            &mut rng,
        );

        let mut epochs = Vec::with_capacity(self.config.epochs);
        for epoch in 1..=self.config.epochs {
            training.shuffle(&mut rng);
            for (sequence, label) in &training {
                network.train_step(sequence, *label, self.config.learning_rate);
            }

            let (loss, accuracy) = network.evaluate(&training);
            let (val_loss, val_accuracy) = if validation.is_empty() {
                (None, None)
            } else {
                let (l, a) = network.evaluate(&validation);
                (Some(l), Some(a))
            };

            tracing::debug!(epoch, loss, accuracy, "training epoch complete");
            epochs.push(EpochMetrics {
                epoch,
                loss,
                accuracy,
                val_loss,
                val_accuracy,
            });
        }

        let (loss, accuracy) = network.evaluate(&training);
        let state = TrainedState {
            tokenizer,
            network,
            labels,
            metadata: StateMetadata {
                trained_at: chrono::Utc::now(),
                training_examples: training.len() + validation.len(),
                accuracy,
                loss,
            },
        };

        // Persist first; only a fully saved state becomes the active one.
        self.store.save(&state)?;
        *self.state.write() = Some(Arc::new(state));

        let report = TrainingReport {
            epochs,
            accuracy,
            loss,
            training_examples: rows.len(),
            training_time_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            accuracy = report.accuracy,
            loss = report.loss,
            examples = report.training_examples,
            elapsed_ms = report.training_time_ms,
            "training run complete"
        );
        Ok(report)
    }

    fn predict_impl(&self, text: &str) -> Result<ClassificationResult> {
        let state = self.current_state()?;

        let sequence = state.tokenizer.encode(text);
        let probs = state.network.predict_proba(&sequence);
        let (class, confidence) = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, &p)| (i, p))
            .ok_or_else(|| CarelineError::classification("network produced no classes"))?;

        let tag = state
            .labels
            .tag_for(class)
            .ok_or_else(|| {
                CarelineError::classification(format!("class index {class} has no label"))
            })?
            .to_string();

        let response = state
            .labels
            .response_lookup
            .get(&tag)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_TAG_RESPONSE.to_string());

        Ok(ClassificationResult {
            response,
            intent: tag,
            confidence,
        })
    }
}

impl Classifier for NeuralClassifier {
    fn predict(&self, query: &str) -> Result<ClassificationResult> {
        self.predict_impl(query)
    }

    fn name(&self) -> &str {
        "neural"
    }
}
