//! # careline
//!
//! A conversational intent-classification service: free-text user queries
//! arrive over persistent WebSocket sessions and are answered with a canned
//! response selected by matching the query against a fixed intent catalog.
//!
//! ## Features
//!
//! - Static intent catalog shared by both classification strategies
//! - Rule-based classifier: two-tier substring / token-overlap matching
//! - Statistical classifier: small trained feed-forward network with
//!   durable, atomically-replaced state
//! - Per-session message loop with in-order delivery and local error
//!   recovery
//! - Best-effort interaction recording

pub mod catalog;
pub mod classifier;
pub mod cli;
pub mod error;
pub mod server;
pub mod session;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
