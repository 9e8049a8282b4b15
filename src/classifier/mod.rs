//! Intent classification for incoming queries.
//!
//! Two strategies implement the same [`Classifier`] trait:
//!
//! - [`RuleBasedClassifier`]: zero-training, two-tier matching (substring,
//!   then token overlap) directly over the intent catalog.
//! - [`NeuralClassifier`]: a small feed-forward network trained offline from
//!   the flattened catalog, with durable, atomically-replaced trained state.
//!
//! Which strategy backs a session is a configuration value
//! ([`ClassifierKind`]) chosen at construction time, not an ambient global.
//! Both strategies share the catalog as ground truth but are not required to
//! agree on every query.

mod network;
mod neural;
mod rule_based;
mod state;
mod tokenizer;

pub use network::{EpochMetrics, FeedForwardNetwork, TrainingReport};
pub use neural::{NeuralClassifier, TrainingConfig};
pub use rule_based::RuleBasedClassifier;
pub use state::{LabelTable, ModelStore, StateMetadata, TrainedState};
pub use tokenizer::BoundedTokenizer;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Response served when the rule-based classifier falls through both tiers.
pub const FALLBACK_RESPONSE: &str =
    "I'm not sure how to respond to that. Could you please rephrase your question?";

/// Response served when a predict call fails internally.
pub const ERROR_RESPONSE: &str =
    "I'm having trouble processing your request. Could you try again?";

/// Response served when the statistical path has no lookup entry for a tag.
pub const UNKNOWN_TAG_RESPONSE: &str = "I'm not sure how to respond to that.";

/// The outcome of classifying one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The chosen response text.
    pub response: String,
    /// The matched intent tag, or a sentinel (`"default"`, `"error"`).
    pub intent: String,
    /// Classifier certainty in the chosen intent, in [0.0, 1.0].
    pub confidence: f64,
}

/// Classifier trait.
///
/// Implementations classify a free-text query and select a response. The
/// serving path treats the result uniformly regardless of strategy.
pub trait Classifier: Send + Sync {
    /// Predict the intent and response for a query.
    fn predict(&self, query: &str) -> Result<ClassificationResult>;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;
}

/// Which classification strategy backs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// Rule-based two-tier matcher over the catalog.
    Rule,
    /// Trained feed-forward classifier with persisted state.
    Neural,
}
