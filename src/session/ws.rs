//! WebSocket session loop.
//!
//! Client -> Server (JSON):
//! ```json
//! {"message": "I have a headache"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"response": "...", "intent": "headache", "confidence": 1.0}
//! {"error": "Empty message received"}
//! ```
//!
//! Each connection runs one sequential loop: frames are parsed, classified,
//! and answered strictly in arrival order. Payload problems are answered
//! with an error payload and the session stays open; only transport faults
//! end the session, at which point it is removed from the registry exactly
//! once.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::classifier::{Classifier, ClassificationResult, ERROR_RESPONSE};
use crate::catalog::ERROR_TAG;
use crate::error::CarelineError;
use crate::server::AppState;

use super::recorder::InteractionRecorder;

/// Inbound query payload.
#[derive(Debug, Deserialize)]
pub struct WsIncoming {
    /// Free-text user query. Missing is treated the same as empty.
    #[serde(default)]
    pub message: String,
}

/// Outbound error payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable description of what was wrong with the request.
    pub error: String,
}

/// WebSocket handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Opaque actor identifier, used for interaction recording only.
    pub actor: Option<String>,
}

/// WebSocket upgrade handler. Completes the Connecting -> Open transition.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    let actor = params.actor.unwrap_or_else(|| "anonymous".to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, actor))
}

/// Run one session to completion.
async fn handle_socket(socket: WebSocket, state: AppState, actor: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Outbound channel for this session; the registry holds the handle.
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let session_id = state.registry.insert(tx.clone());

    let sender_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = ws_receiver.next().await {
        match frame {
            Message::Text(text) => {
                let outcome = handle_frame(state.classifier.as_ref(), &text);
                if tx.send(outcome.reply.clone()).await.is_err() {
                    // Sender side is gone; the channel is already closed.
                    break;
                }
                // Deliver first, then record.
                record_outcome(state.recorder.as_ref(), &actor, &outcome);
            }
            Message::Close(_) => break,
            // Binary frames are ignored; ping/pong is handled by the
            // protocol layer.
            _ => {}
        }
    }

    state.registry.remove(&session_id);
    sender_task.abort();
}

/// Outcome of processing one inbound frame.
#[derive(Debug)]
pub struct FrameOutcome {
    /// JSON payload to deliver on the session channel.
    pub reply: String,
    /// The (query, result) pair to record once the reply has been handed
    /// off for delivery. Absent for frames answered with an error payload.
    pub interaction: Option<(String, ClassificationResult)>,
}

/// Process one inbound frame and produce the JSON reply.
///
/// Never fails: every fault class maps to either an error payload or the
/// fixed fallback result, so the session loop keeps running.
pub fn handle_frame(classifier: &dyn Classifier, raw: &str) -> FrameOutcome {
    let incoming: WsIncoming = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "invalid inbound payload");
            return FrameOutcome {
                reply: error_payload("Invalid message format"),
                interaction: None,
            };
        }
    };

    if incoming.message.is_empty() {
        tracing::warn!("empty message received");
        return FrameOutcome {
            reply: error_payload("Empty message received"),
            interaction: None,
        };
    }

    let result = match classifier.predict(&incoming.message) {
        Ok(result) => result,
        Err(CarelineError::StateNotFound(msg)) => {
            tracing::warn!(%msg, "prediction requested before training");
            return FrameOutcome {
                reply: error_payload(&format!("Model not trained: {msg}")),
                interaction: None,
            };
        }
        Err(e) => {
            tracing::error!(error = %e, "prediction failed");
            ClassificationResult {
                response: ERROR_RESPONSE.to_string(),
                intent: ERROR_TAG.to_string(),
                confidence: 0.0,
            }
        }
    };

    let reply = serde_json::to_string(&result)
        .unwrap_or_else(|_| error_payload("Internal server error"));
    FrameOutcome {
        reply,
        interaction: Some((incoming.message, result)),
    }
}

/// Record a frame's interaction, best effort.
///
/// A recorder fault is traced and swallowed; it must never reach the client
/// or end the session.
pub fn record_outcome(recorder: &dyn InteractionRecorder, actor: &str, outcome: &FrameOutcome) {
    if let Some((query, result)) = &outcome.interaction {
        if let Err(e) = recorder.record(actor, query, result) {
            tracing::warn!(error = %e, "interaction recording failed");
        }
    }
}

fn error_payload(message: &str) -> String {
    serde_json::to_string(&ErrorPayload {
        error: message.to_string(),
    })
    .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct FixedClassifier;

    impl Classifier for FixedClassifier {
        fn predict(&self, _query: &str) -> Result<ClassificationResult> {
            Ok(ClassificationResult {
                response: "Hello!".to_string(),
                intent: "greeting".to_string(),
                confidence: 1.0,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct UntrainedClassifier;

    impl Classifier for UntrainedClassifier {
        fn predict(&self, _query: &str) -> Result<ClassificationResult> {
            Err(CarelineError::state_not_found("no model on disk"))
        }

        fn name(&self) -> &str {
            "untrained"
        }
    }

    struct FaultyClassifier;

    impl Classifier for FaultyClassifier {
        fn predict(&self, _query: &str) -> Result<ClassificationResult> {
            Err(CarelineError::classification("internal bug"))
        }

        fn name(&self) -> &str {
            "faulty"
        }
    }

    #[test]
    fn test_ws_incoming_deserializes() {
        let msg: WsIncoming = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(msg.message, "hi");

        // Missing field is the same as empty.
        let msg: WsIncoming = serde_json::from_str("{}").unwrap();
        assert!(msg.message.is_empty());
    }

    #[test]
    fn test_valid_frame_yields_result_payload() {
        let outcome = handle_frame(&FixedClassifier, r#"{"message": "hi"}"#);

        let result: ClassificationResult = serde_json::from_str(&outcome.reply).unwrap();
        assert_eq!(result.intent, "greeting");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_empty_message_yields_error_payload() {
        let outcome = handle_frame(&FixedClassifier, r#"{"message": ""}"#);

        let payload: ErrorPayload = serde_json::from_str(&outcome.reply).unwrap();
        assert_eq!(payload.error, "Empty message received");
    }

    #[test]
    fn test_malformed_frame_yields_error_payload() {
        let outcome = handle_frame(&FixedClassifier, "not json at all");

        let payload: ErrorPayload = serde_json::from_str(&outcome.reply).unwrap();
        assert_eq!(payload.error, "Invalid message format");
    }

    #[test]
    fn test_untrained_classifier_yields_distinct_error() {
        let outcome = handle_frame(&UntrainedClassifier, r#"{"message": "hi"}"#);

        let payload: ErrorPayload = serde_json::from_str(&outcome.reply).unwrap();
        assert!(payload.error.contains("Model not trained"));
    }

    #[test]
    fn test_classifier_fault_degrades_to_fallback_result() {
        let outcome = handle_frame(&FaultyClassifier, r#"{"message": "hi"}"#);

        let result: ClassificationResult = serde_json::from_str(&outcome.reply).unwrap();
        assert_eq!(result.intent, ERROR_TAG);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.response, ERROR_RESPONSE);
    }

    #[test]
    fn test_recording_is_separate_from_the_reply() {
        // A result frame carries its interaction for post-delivery
        // recording; error-payload frames carry none.
        let outcome = handle_frame(&FixedClassifier, r#"{"message": "hi"}"#);
        let (query, result) = outcome.interaction.as_ref().unwrap();
        assert_eq!(query, "hi");
        assert_eq!(result.intent, "greeting");

        let outcome = handle_frame(&FixedClassifier, r#"{"message": ""}"#);
        assert!(outcome.interaction.is_none());

        let outcome = handle_frame(&UntrainedClassifier, r#"{"message": "hi"}"#);
        assert!(outcome.interaction.is_none());

        // The fallback result is still an answered classification and is
        // recorded like any other.
        let outcome = handle_frame(&FaultyClassifier, r#"{"message": "hi"}"#);
        assert!(outcome.interaction.is_some());
    }

    #[test]
    fn test_recorder_fault_is_swallowed() {
        struct FailingRecorder;

        impl InteractionRecorder for FailingRecorder {
            fn record(
                &self,
                _actor: &str,
                _query: &str,
                _result: &ClassificationResult,
            ) -> crate::error::Result<()> {
                Err(CarelineError::other("audit store offline"))
            }
        }

        let outcome = handle_frame(&FixedClassifier, r#"{"message": "hi"}"#);
        // Must not panic or propagate.
        record_outcome(&FailingRecorder, "anonymous", &outcome);
    }
}
