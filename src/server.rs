//! WebSocket server built on axum.
//!
//! Sets up routes and shared state for the serving path. One route carries
//! the session channel (`GET /ws`); `GET /health` is a liveness check for
//! process supervisors.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use crate::classifier::Classifier;
use crate::error::{CarelineError, Result};
use crate::session::recorder::InteractionRecorder;
use crate::session::registry::SessionRegistry;
use crate::session::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live-session registry, written only by the session manager.
    pub registry: Arc<SessionRegistry>,
    /// The classifier strategy backing every session of this server.
    pub classifier: Arc<dyn Classifier>,
    /// Best-effort interaction recorder.
    pub recorder: Arc<dyn InteractionRecorder>,
}

/// Server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

async fn get_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "classifier": state.classifier.name(),
        "active_sessions": state.registry.len(),
    }))
}

/// Build the router for the service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(get_health))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CarelineError::transport(format!("failed to bind to {addr}: {e}")))?;

    tracing::info!("careline listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CarelineError::transport(format!("server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IntentCatalog;
    use crate::classifier::RuleBasedClassifier;
    use crate::session::recorder::TracingRecorder;

    #[test]
    fn test_build_router() {
        let catalog = Arc::new(
            IntentCatalog::from_json_str(
                r#"{"intents": [{"tag": "greeting", "patterns": ["hi"], "responses": ["Hello!"]}]}"#,
            )
            .unwrap(),
        );
        let state = AppState {
            registry: Arc::new(SessionRegistry::new()),
            classifier: Arc::new(RuleBasedClassifier::new(catalog)),
            recorder: Arc::new(TracingRecorder::new()),
        };

        // Router construction itself must not panic.
        let _router = build_router(state);
    }
}
