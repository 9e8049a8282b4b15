//! Durable trained state for the statistical classifier.
//!
//! A training run produces four mutually-consistent parts: the fitted
//! tokenizer, the label bijection plus response lookup, the network weights,
//! and a metadata manifest. [`ModelStore`] persists them as one unit with a
//! write-then-publish directory swap, so serving never observes a partially
//! written state, and reloads them as one unit, reporting a distinct
//! [`CarelineError::StateNotFound`] when any part is missing.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{CarelineError, Result};

use super::network::FeedForwardNetwork;
use super::tokenizer::BoundedTokenizer;

const TOKENIZER_FILE: &str = "tokenizer.json";
const NETWORK_FILE: &str = "network.json";
const LABELS_FILE: &str = "labels.json";
const METADATA_FILE: &str = "metadata.json";

/// Bijective label index plus the per-tag response lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelTable {
    /// Class index -> intent tag. Position in the vector is the class index.
    pub index_to_tag: Vec<String>,
    /// Intent tag -> canned response (the intent's first response).
    pub response_lookup: HashMap<String, String>,
}

impl LabelTable {
    /// The tag for a class index, if in range.
    pub fn tag_for(&self, index: usize) -> Option<&str> {
        self.index_to_tag.get(index).map(String::as_str)
    }

    /// The class index for a tag, if known.
    pub fn index_for(&self, tag: &str) -> Option<usize> {
        self.index_to_tag.iter().position(|t| t == tag)
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.index_to_tag.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.index_to_tag.is_empty()
    }
}

/// Manifest describing the training run that produced a state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMetadata {
    /// When the training run completed.
    pub trained_at: chrono::DateTime<chrono::Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Final training accuracy.
    pub accuracy: f64,
    /// Final training loss.
    pub loss: f64,
}

/// Everything a training run produces and a predict call needs.
///
/// Created whole by training, replaced whole by retraining, never mutated in
/// place.
#[derive(Debug, Clone)]
pub struct TrainedState {
    /// Fitted tokenizer.
    pub tokenizer: BoundedTokenizer,
    /// Trained network weights.
    pub network: FeedForwardNetwork,
    /// Label bijection and response lookup.
    pub labels: LabelTable,
    /// Training-run manifest.
    pub metadata: StateMetadata,
}

/// Filesystem persistence for [`TrainedState`].
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Create a store rooted at the given model directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The model directory this store publishes to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a published state exists on disk.
    pub fn exists(&self) -> bool {
        [TOKENIZER_FILE, NETWORK_FILE, LABELS_FILE, METADATA_FILE]
            .iter()
            .all(|f| self.dir.join(f).is_file())
    }

    /// Persist a state atomically.
    ///
    /// All parts are written into a staging directory which is then renamed
    /// over the published one. A failure at any point leaves the previously
    /// published state (or no state) active.
    pub fn save(&self, state: &TrainedState) -> Result<()> {
        let staging = self.dir.with_extension("staging");
        let retired = self.dir.with_extension("retired");

        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        write_json(&staging.join(TOKENIZER_FILE), &state.tokenizer)?;
        write_json(&staging.join(NETWORK_FILE), &state.network)?;
        write_json(&staging.join(LABELS_FILE), &state.labels)?;
        write_json(&staging.join(METADATA_FILE), &state.metadata)?;

        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        if self.dir.exists() {
            fs::rename(&self.dir, &retired)?;
        }
        fs::rename(&staging, &self.dir)?;
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }

        Ok(())
    }

    /// Load the published state.
    ///
    /// Returns [`CarelineError::StateNotFound`] when no complete state has
    /// been published.
    pub fn load(&self) -> Result<TrainedState> {
        if !self.exists() {
            return Err(CarelineError::state_not_found(format!(
                "no trained model at {}; run a training pass first",
                self.dir.display()
            )));
        }

        Ok(TrainedState {
            tokenizer: read_json(&self.dir.join(TOKENIZER_FILE))?,
            network: read_json(&self.dir.join(NETWORK_FILE))?,
            labels: read_json(&self.dir.join(LABELS_FILE))?,
            metadata: read_json(&self.dir.join(METADATA_FILE))?,
        })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_state() -> TrainedState {
        let mut tokenizer = BoundedTokenizer::new(50, 8);
        tokenizer.fit(&["hello there".to_string(), "chest pain".to_string()]);

        let mut rng = StdRng::seed_from_u64(3);
        let network = FeedForwardNetwork::new(50, 4, 4, 2, &mut rng);

        TrainedState {
            tokenizer,
            network,
            labels: LabelTable {
                index_to_tag: vec!["greeting".to_string(), "emergency".to_string()],
                response_lookup: HashMap::from([
                    ("greeting".to_string(), "Hello!".to_string()),
                    ("emergency".to_string(), "Call 911!".to_string()),
                ]),
            },
            metadata: StateMetadata {
                trained_at: chrono::Utc::now(),
                training_examples: 2,
                accuracy: 1.0,
                loss: 0.01,
            },
        }
    }

    #[test]
    fn test_label_table_bijection() {
        let state = sample_state();
        assert_eq!(state.labels.tag_for(0), Some("greeting"));
        assert_eq!(state.labels.index_for("emergency"), Some(1));
        assert_eq!(state.labels.tag_for(9), None);
        assert_eq!(state.labels.index_for("missing"), None);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().join("model"));

        assert!(!store.exists());
        store.save(&sample_state()).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.labels.index_to_tag.len(), 2);
        assert_eq!(loaded.metadata.training_examples, 2);
        assert_eq!(
            loaded.tokenizer.encode("hello there"),
            sample_state().tokenizer.encode("hello there")
        );
    }

    #[test]
    fn test_load_without_save_is_state_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().join("model"));

        let err = store.load().unwrap_err();
        assert!(matches!(err, CarelineError::StateNotFound(_)));
    }

    #[test]
    fn test_partial_state_is_state_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("model");
        let store = ModelStore::new(&dir);

        store.save(&sample_state()).unwrap();
        fs::remove_file(dir.join(NETWORK_FILE)).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, CarelineError::StateNotFound(_)));
    }

    #[test]
    fn test_resave_replaces_whole_state() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().join("model"));

        store.save(&sample_state()).unwrap();
        let mut second = sample_state();
        second.metadata.training_examples = 99;
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.metadata.training_examples, 99);
    }
}
