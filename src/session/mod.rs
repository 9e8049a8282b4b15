//! Session management for live client channels.
//!
//! One WebSocket connection is one session. The [`registry`] owns the set of
//! live sessions and is its only writer; [`ws`] runs the per-session message
//! loop (parse, classify, deliver, record); [`recorder`] is the best-effort
//! seam to interaction logging, which the serving path never blocks on.

pub mod recorder;
pub mod registry;
pub mod ws;

pub use recorder::{InteractionRecorder, TracingRecorder};
pub use registry::{SessionId, SessionRegistry};
