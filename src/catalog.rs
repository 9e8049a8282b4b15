//! Intent catalog and training set builder.
//!
//! The catalog is the static table of intents that both classification
//! strategies share as ground truth: each intent has a unique tag, example
//! patterns, and candidate responses. [`IntentCatalog::flatten`] derives the
//! training rows that feed the statistical classifier, one row per
//! (intent, pattern) pair with the response pinned to the intent's first
//! response.
//!
//! Catalog invariants (unique tags, non-empty patterns and responses, no use
//! of the reserved sentinel tags) are checked once at load time; a violation
//! is a [`CarelineError::Configuration`] and should abort startup.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CarelineError, Result};

/// Sentinel tag returned when no tier of the rule-based classifier matches.
pub const DEFAULT_TAG: &str = "default";

/// Sentinel tag reported when a predict call fails internally.
pub const ERROR_TAG: &str = "error";

/// A labeled topic with example phrasings and candidate responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Unique identifier for this intent.
    pub tag: String,
    /// Example phrasings that should map to this intent.
    pub patterns: Vec<String>,
    /// Candidate responses served when this intent matches.
    pub responses: Vec<String>,
}

/// One derived training example: a pattern, its owning tag, and the intent's
/// first response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    /// Pattern text.
    pub text: String,
    /// Owning intent tag.
    pub intent: String,
    /// First response of the owning intent.
    pub response: String,
}

/// Wire format of a catalog file: `{"intents": [...]}`.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    intents: Vec<Intent>,
}

/// The ordered set of intents the service answers from.
///
/// Iteration order is the declared order of the catalog file; the rule-based
/// classifier's first-match tie-break depends on it.
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    intents: Vec<Intent>,
}

impl IntentCatalog {
    /// Build a catalog from intents, validating invariants.
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        if intents.is_empty() {
            return Err(CarelineError::configuration("catalog has no intents"));
        }

        let mut seen = HashSet::new();
        for intent in &intents {
            if intent.tag.is_empty() {
                return Err(CarelineError::configuration("intent with empty tag"));
            }
            if intent.tag == DEFAULT_TAG || intent.tag == ERROR_TAG {
                return Err(CarelineError::configuration(format!(
                    "intent tag '{}' is reserved",
                    intent.tag
                )));
            }
            if !seen.insert(intent.tag.as_str()) {
                return Err(CarelineError::configuration(format!(
                    "duplicate intent tag '{}'",
                    intent.tag
                )));
            }
            if intent.patterns.is_empty() {
                return Err(CarelineError::configuration(format!(
                    "intent '{}' has no patterns",
                    intent.tag
                )));
            }
            if intent.responses.is_empty() {
                return Err(CarelineError::configuration(format!(
                    "intent '{}' has no responses",
                    intent.tag
                )));
            }
        }

        Ok(Self { intents })
    }

    /// Load a catalog from a JSON file of the form `{"intents": [...]}`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| CarelineError::configuration(format!("invalid catalog JSON: {e}")))?;
        Self::new(file.intents)
    }

    /// Iterate the intents in declared order.
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Look up an intent by tag.
    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    /// Number of intents in the catalog.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Whether the catalog is empty. Cannot happen for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Flatten the catalog into training rows, one per (intent, pattern)
    /// pair, with the response fixed to the intent's first response.
    pub fn flatten(&self) -> Vec<TrainingRow> {
        let mut rows = Vec::new();
        for intent in &self.intents {
            for pattern in &intent.patterns {
                rows.push(TrainingRow {
                    text: pattern.clone(),
                    intent: intent.tag.clone(),
                    response: intent.responses[0].clone(),
                });
            }
        }
        rows
    }
}
