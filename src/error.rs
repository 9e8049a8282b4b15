//! Error types for the careline library.
//!
//! All errors are represented by the [`CarelineError`] enum. Each variant maps
//! to one of the failure classes the service distinguishes: catalog problems
//! are fatal at load time, inbound payload problems are answered in-session,
//! classification faults degrade to a fallback result, and a missing trained
//! model is its own clearly-identifiable condition.
//!
//! # Examples
//!
//! ```
//! use careline::error::{CarelineError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CarelineError::configuration("intent has no patterns"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for careline operations.
#[derive(Error, Debug)]
pub enum CarelineError {
    /// I/O errors (catalog files, model artifacts, network).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed intent catalog. Fatal at load time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or empty inbound payload. Recovered in-session.
    #[error("Input error: {0}")]
    Input(String),

    /// Unexpected fault inside a predict call.
    #[error("Classification error: {0}")]
    Classification(String),

    /// The statistical classifier has no persisted trained state.
    #[error("Model not trained: {0}")]
    StateNotFound(String),

    /// Channel-level disconnect or write failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with CarelineError.
pub type Result<T> = std::result::Result<T, CarelineError>;

impl CarelineError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        CarelineError::Configuration(msg.into())
    }

    /// Create a new input error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        CarelineError::Input(msg.into())
    }

    /// Create a new classification error.
    pub fn classification<S: Into<String>>(msg: S) -> Self {
        CarelineError::Classification(msg.into())
    }

    /// Create a new state-not-found error.
    pub fn state_not_found<S: Into<String>>(msg: S) -> Self {
        CarelineError::StateNotFound(msg.into())
    }

    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        CarelineError::Transport(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        CarelineError::Other(msg.into())
    }
}
