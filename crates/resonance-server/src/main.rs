//! Resonance server binary — the voice agent backend entry point.
//!
//! Starts an axum HTTP server with structured logging, profile store loading,
//! and graceful shutdown on SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use resonance_profile::{JsonFileStore, ProfileRegistry};
use resonance_server::config;
use resonance_server::metrics::MetricsRecorder;
use resonance_server::{app, AppState};
use resonance_voice::{ReplyClient, SynthesisClient, TranscriptionClient};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("RESONANCE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Load the profile store
    let store = Arc::new(JsonFileStore::new(&config.store.path));
    let registry = ProfileRegistry::load(store).await;
    tracing::info!(
        path = %config.store.path,
        profiles = registry.len().await,
        "profile store loaded"
    );

    // Construct collaborator clients. API keys come from the environment.
    let stt = TranscriptionClient::from_config(&config.voice.stt)
        .expect("failed to construct transcription client — is OPENAI_API_KEY set?");
    let reply = ReplyClient::from_config(&config.voice.reply)
        .expect("failed to construct reply client — is ANTHROPIC_API_KEY set?");
    let tts = SynthesisClient::from_config(&config.voice.tts)
        .expect("failed to construct synthesis client — is OPENAI_API_KEY set?");

    let state = AppState {
        registry: Arc::new(registry),
        stt: Arc::new(stt),
        reply: Arc::new(reply),
        tts: Arc::new(tts),
        metrics: Arc::new(MetricsRecorder::new()),
        greeting_delay: Duration::from_millis(config.session.greeting_delay_ms),
    };

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting resonance server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("resonance server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
