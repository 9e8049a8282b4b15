//! Best-effort interaction recording.

use crate::classifier::ClassificationResult;
use crate::error::Result;

/// Receives (actor, query, result) tuples for auditing.
///
/// The serving path calls this fire-and-forget: a recording failure is
/// traced and swallowed, never surfaced to the client or the session loop.
pub trait InteractionRecorder: Send + Sync {
    /// Record one classified interaction.
    fn record(&self, actor: &str, query: &str, result: &ClassificationResult) -> Result<()>;
}

/// Recorder that writes interactions to the tracing log.
#[derive(Debug, Default)]
pub struct TracingRecorder;

impl TracingRecorder {
    /// Create a tracing-backed recorder.
    pub fn new() -> Self {
        Self
    }
}

impl InteractionRecorder for TracingRecorder {
    fn record(&self, actor: &str, query: &str, result: &ClassificationResult) -> Result<()> {
        tracing::info!(
            actor,
            query,
            intent = %result.intent,
            confidence = result.confidence,
            "interaction"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_recorder_never_fails() {
        let recorder = TracingRecorder::new();
        let result = ClassificationResult {
            response: "Hello!".to_string(),
            intent: "greeting".to_string(),
            confidence: 1.0,
        };

        assert!(recorder.record("anonymous", "hi", &result).is_ok());
    }
}
