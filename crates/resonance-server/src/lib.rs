//! Resonance server library logic.

pub mod api_ws;
pub mod config;
pub mod metrics;
pub mod orchestrator;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use resonance_profile::ProfileRegistry;
use resonance_voice::{ReplyGenerator, SpeechSynthesizer, SpeechToText};

use metrics::MetricsRecorder;

/// Application state shared across all connections.
#[derive(Clone)]
pub struct AppState {
    /// Durable per-user profiles.
    pub registry: Arc<ProfileRegistry>,
    /// Speech-to-text collaborator.
    pub stt: Arc<dyn SpeechToText>,
    /// Reply-generation collaborator.
    pub reply: Arc<dyn ReplyGenerator>,
    /// Text-to-speech collaborator.
    pub tts: Arc<dyn SpeechSynthesizer>,
    /// Turn latency recorder.
    pub metrics: Arc<MetricsRecorder>,
    /// Delay before the spoken greeting.
    pub greeting_delay: Duration,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // The browser client connects from a file:// or localhost origin; the
    // WebSocket endpoint carries no credentials, so a permissive CORS policy
    // is acceptable here.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(api_ws::ws_handler))
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use resonance_profile::JsonFileStore;
    use resonance_voice::VoiceError;

    struct NoopStt;
    struct NoopReply;
    struct NoopTts;

    #[async_trait::async_trait]
    impl SpeechToText for NoopStt {
        async fn transcribe(&self, _audio: &[u8]) -> Result<String, VoiceError> {
            Ok(String::new())
        }
    }

    #[async_trait::async_trait]
    impl ReplyGenerator for NoopReply {
        async fn generate(
            &self,
            _transcript: &str,
            _history: &[resonance_types::ChatTurn],
            _system: &str,
        ) -> Result<String, VoiceError> {
            Ok(String::new())
        }
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for NoopTts {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, VoiceError> {
            Ok(Vec::new())
        }
    }

    async fn test_state(dir: &tempfile::TempDir) -> AppState {
        let store = Arc::new(JsonFileStore::new(dir.path().join("profiles.json")));
        AppState {
            registry: Arc::new(ProfileRegistry::load(store).await),
            stt: Arc::new(NoopStt),
            reply: Arc::new(NoopReply),
            tts: Arc::new(NoopTts),
            metrics: Arc::new(MetricsRecorder::new()),
            greeting_delay: Duration::from_millis(0),
        }
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(test_state(&dir).await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
