//! WebSocket API handler and per-connection session loop.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use resonance_types::{InterventionKind, VoiceNote};

use crate::orchestrator::{self, ConnectionContext, FOLLOW_UP_TEXT, GREETING_TEXT};
use crate::AppState;

/// Maximum allowed length for a saved note's text field (2 KiB). Notes are
/// embedded verbatim into future system prompts; limiting input size keeps
/// the prompt bounded.
const MAX_NOTE_TEXT_LEN: usize = 2_048;

/// Incoming WebSocket message types.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// One recorded utterance, base64-encoded audio.
    #[serde(rename = "audio")]
    Audio { audio: String },

    /// The client finished a physical intervention.
    #[serde(rename = "intervention_complete")]
    InterventionComplete {
        #[serde(default)]
        intervention: Option<String>,
        #[serde(default)]
        duration: Option<f64>,
    },

    /// The user's answer to a frequency offer.
    #[serde(rename = "sound_choice")]
    SoundChoice {
        enabled: bool,
        #[serde(default)]
        frequency: Option<u16>,
    },

    /// The session ended; persist a summary to the profile.
    #[serde(rename = "session_complete")]
    SessionComplete {
        #[serde(default)]
        state: Option<String>,
        #[serde(default)]
        frequency: Option<u16>,
        #[serde(default)]
        duration: f64,
        outcome: String,
    },

    /// Persist a verbatim note to the profile.
    #[serde(rename = "save_note")]
    SaveNote {
        text: String,
        #[serde(default)]
        state: Option<String>,
    },
}

/// Outgoing WebSocket message types.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// What the user said, as transcribed.
    #[serde(rename = "transcript")]
    Transcript { text: String },

    /// What the agent says, as text.
    #[serde(rename = "response")]
    Response { text: String },

    /// The reply prescribed a physical intervention.
    #[serde(rename = "physical_intervention")]
    PhysicalIntervention {
        intervention: InterventionKind,
        instructions: String,
    },

    /// The reply offered a healing frequency.
    #[serde(rename = "frequency_offer")]
    FrequencyOffer { frequency: u16, description: String },

    /// Synthesized speech for the latest response, base64-encoded.
    #[serde(rename = "audio")]
    Audio { audio: String },

    /// Something went wrong with the previous client message.
    #[serde(rename = "error")]
    Error { message: String },
}

/// Serializes and sends an outgoing message over the session channel.
/// Backpressure drops are logged, never propagated.
pub(crate) fn send_event(tx: &mpsc::Sender<String>, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(json) => {
            if let Err(e) = tx.try_send(json) {
                tracing::warn!("dropping WebSocket event for slow consumer: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("failed to serialize WebSocket event: {}", e);
        }
    }
}

/// Sends a JSON-serialized error message over the session channel.
fn send_ws_error(tx: &mpsc::Sender<String>, message: String) {
    send_event(tx, &ServerMessage::Error { message });
}

/// WebSocket handler: `GET /ws`.
///
/// Connections are anonymous. Each one is assigned a fresh random identity,
/// so profile accumulation happens within a connection but not across
/// reconnects.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles the WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let identity = format!("user_{}", Uuid::new_v4().simple());
    tracing::info!(identity = %identity, "client connected");

    let (mut sender, mut receiver) = socket.split();

    // Create a bounded channel for this session to prevent unbounded memory
    // growth from slow consumers. 256 messages provides sufficient buffer for
    // normal operation; beyond that the client is too slow and messages are
    // dropped.
    let (tx, mut rx) = mpsc::channel::<String>(256);

    // Spawn a task to forward messages from rx to the websocket sender
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(AxumMessage::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Ensure the profile exists before the first turn reads it.
    state.registry.get_or_create(&identity).await;

    let mut ctx = ConnectionContext::new(identity.clone());

    // Initial greeting, delayed so the client can finish audio setup.
    let greet_task = {
        let state = state.clone();
        let tx = tx.clone();
        let delay = state.greeting_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            orchestrator::speak_line(&state, GREETING_TEXT, &tx).await;
        })
    };

    // Handle incoming messages. One at a time: turns within a connection are
    // serialized by this loop.
    while let Some(Ok(msg)) = receiver.next().await {
        if let AxumMessage::Text(text) = msg {
            let incoming = match serde_json::from_str::<IncomingMessage>(&text) {
                Ok(incoming) => incoming,
                Err(_) => {
                    tracing::warn!(identity = %identity, "failed to parse incoming WebSocket message");
                    send_ws_error(&tx, "invalid message format".to_string());
                    continue;
                }
            };

            match incoming {
                IncomingMessage::Audio { audio } => {
                    match orchestrator::run_turn(&state, &mut ctx, &audio, &tx).await {
                        Ok(timings) => state.metrics.record(timings),
                        Err(e) => {
                            tracing::error!(identity = %identity, "voice turn failed: {}", e);
                            send_ws_error(&tx, e.to_string());
                        }
                    }
                }
                IncomingMessage::InterventionComplete { .. } => {
                    ctx.session.intervention_complete();
                    orchestrator::speak_line(&state, FOLLOW_UP_TEXT, &tx).await;
                }
                IncomingMessage::SoundChoice { enabled, .. } => {
                    ctx.session.set_sound_enabled(enabled);
                }
                IncomingMessage::SessionComplete {
                    state: emotional_state,
                    frequency,
                    duration,
                    outcome,
                } => {
                    let summary =
                        ctx.session
                            .build_summary(emotional_state, frequency, duration, outcome);
                    state
                        .registry
                        .record_session_complete(&identity, summary)
                        .await;
                }
                IncomingMessage::SaveNote {
                    text,
                    state: emotional_state,
                } => {
                    if text.len() > MAX_NOTE_TEXT_LEN {
                        send_ws_error(
                            &tx,
                            format!(
                                "note text exceeds maximum length of {} bytes",
                                MAX_NOTE_TEXT_LEN
                            ),
                        );
                        continue;
                    }
                    let note = VoiceNote {
                        timestamp: Utc::now(),
                        text,
                        state: emotional_state,
                    };
                    state.registry.record_note(&identity, note).await;
                }
            }
        } else if let AxumMessage::Close(_) = msg {
            break;
        }
    }

    // Cleanup: transient session state drops with the context; only what an
    // explicit session_complete already persisted survives.
    greet_task.abort();
    send_task.abort();
    tracing::info!(identity = %identity, "client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_message_parses() {
        let incoming: IncomingMessage =
            serde_json::from_str(r#"{"type":"audio","audio":"aGVsbG8="}"#)
                .expect("parse audio message");
        assert!(matches!(incoming, IncomingMessage::Audio { audio } if audio == "aGVsbG8="));
    }

    #[test]
    fn session_complete_tolerates_missing_optionals() {
        let incoming: IncomingMessage =
            serde_json::from_str(r#"{"type":"session_complete","outcome":"helpful"}"#)
                .expect("parse session_complete");
        match incoming {
            IncomingMessage::SessionComplete {
                state,
                frequency,
                duration,
                outcome,
            } => {
                assert!(state.is_none());
                assert!(frequency.is_none());
                assert_eq!(duration, 0.0);
                assert_eq!(outcome, "helpful");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn intervention_complete_tolerates_client_extras() {
        let incoming: IncomingMessage = serde_json::from_str(
            r#"{"type":"intervention_complete","intervention":"movement","duration":20}"#,
        )
        .expect("parse intervention_complete");
        assert!(matches!(
            incoming,
            IncomingMessage::InterventionComplete { .. }
        ));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let result = serde_json::from_str::<IncomingMessage>(r#"{"type":"telemetry"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn physical_intervention_serializes_with_type_tag() {
        let out = ServerMessage::PhysicalIntervention {
            intervention: InterventionKind::Movement,
            instructions: "Want to shake it out?".to_string(),
        };

        let json = serde_json::to_value(&out).expect("serialization should not fail");
        assert_eq!(
            json.get("type").and_then(|v| v.as_str()),
            Some("physical_intervention")
        );
        assert_eq!(
            json.get("intervention").and_then(|v| v.as_str()),
            Some("movement")
        );
        assert_eq!(
            json.get("instructions").and_then(|v| v.as_str()),
            Some("Want to shake it out?")
        );
    }

    #[test]
    fn frequency_offer_serializes_expected_fields() {
        let out = ServerMessage::FrequencyOffer {
            frequency: 432,
            description: "slows racing thoughts".to_string(),
        };

        let json = serde_json::to_value(&out).expect("serialization should not fail");
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("frequency_offer"));
        assert_eq!(json.get("frequency").and_then(|v| v.as_u64()), Some(432));
    }
}
