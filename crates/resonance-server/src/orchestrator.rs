//! The per-turn voice pipeline: audio in, transcript + reply + audio out.
//!
//! Stages run strictly in order. Events for a turn are only emitted once the
//! stage that produced them has succeeded, so a failed turn produces a single
//! error event and leaves the session consistent.

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;
use tokio::sync::mpsc;

use resonance_classify::{classify_frequency_offer, classify_intervention};
use resonance_session::SessionState;
use resonance_types::ChatTurn;
use resonance_voice::VoiceError;

use crate::api_ws::{send_event, ServerMessage};
use crate::metrics::TurnTimings;
use crate::AppState;

/// Base persona prompt for every reply-generation call. Per-user context and
/// per-turn hints are appended to it.
pub const SYSTEM_PROMPT: &str = r#"You are Resonance. You're a companion for people going through hard moments.

How you are:
- Short responses. Usually 1-2 sentences. Sometimes just one.
- Conversational. Like texting a friend who gets it.
- You don't diagnose or explain their nervous system to them.
- You don't use therapy language unless they do.
- You ask more than you tell.

When someone's struggling:
- Acknowledge: "That sounds hard" or "I hear you"
- Reflect: "Sounds like a lot of uncertainty"
- Simple body check: "Where do you feel that?"
- Not: lectures about chronic activation patterns

Physical interventions (use when talk isn't working):
- Assess their physical state first: "How's your body? Heart racing? Dizzy?"
- Based on their answer, suggest appropriate action:
  * Hyperactivated/panic: "Want to try cold water on your wrists? Sometimes helps."
  * Frozen/stuck: "Want to shake it out? Just shake your hands hard for 20 seconds."
  * Numb/disconnected: "Hum with me? Low and long."
  * Overwhelmed: "Lie down if you can. Feel the floor."
- Keep it simple. Don't explain WHY.
- If they seem unsafe (dizzy, faint), suggest grounding not movement.
- Guide them: "I'll count. Ready? 1... 2... 3..."

When they're circling:
- "We're going over the same ground. Want to try something different?"
- Not: explanations about repetitive thinking patterns

Sound:
- "Want some 432Hz? Might help slow things down."
- Not: technical explanations

Be present. Be brief. Be real."#;

/// Spoken greeting sent shortly after connect.
pub const GREETING_TEXT: &str = "Hey. What's going on?";

/// Spoken follow-up after the client acknowledges an intervention.
pub const FOLLOW_UP_TEXT: &str = "How's that feel?";

/// Maximum accepted base64 audio payload (14 MiB of text, ~10 MiB decoded).
/// Matches the transcription client's own input cap.
const MAX_AUDIO_B64_LEN: usize = 14 * 1024 * 1024;

/// Why a voice turn failed.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The audio payload was not valid base64 or was too large.
    #[error("invalid audio payload: {0}")]
    MalformedAudio(String),

    /// A collaborator call failed or timed out.
    #[error(transparent)]
    Service(#[from] VoiceError),
}

/// Everything a connection carries between turns: who the caller is, the
/// live session state, and the conversation history sent to the generator.
pub(crate) struct ConnectionContext {
    pub identity: String,
    pub session: SessionState,
    pub history: Vec<ChatTurn>,
}

impl ConnectionContext {
    pub fn new(identity: String) -> Self {
        Self {
            identity,
            session: SessionState::new(),
            history: Vec::new(),
        }
    }
}

/// Runs one full voice turn.
///
/// Pipeline: decode → transcribe → observe → generate → classify →
/// synthesize. Side-channel events (intervention, frequency offer) are
/// emitted between the response and audio events, in that order.
pub(crate) async fn run_turn(
    state: &Arc<AppState>,
    ctx: &mut ConnectionContext,
    audio_b64: &str,
    tx: &mpsc::Sender<String>,
) -> Result<TurnTimings, TurnError> {
    let turn_start = Instant::now();

    if audio_b64.len() > MAX_AUDIO_B64_LEN {
        return Err(TurnError::MalformedAudio(format!(
            "audio payload exceeds maximum length of {} bytes",
            MAX_AUDIO_B64_LEN
        )));
    }
    let audio = BASE64
        .decode(audio_b64)
        .map_err(|e| TurnError::MalformedAudio(e.to_string()))?;

    // 1. Transcribe, and let the client render the transcript immediately.
    let stage = Instant::now();
    let transcript = state.stt.transcribe(&audio).await?;
    let transcription = stage.elapsed();
    tracing::info!(
        identity = %ctx.identity,
        chars = transcript.len(),
        "utterance transcribed"
    );
    send_event(tx, &ServerMessage::Transcript {
        text: transcript.clone(),
    });

    // 2. Fold the utterance into session state before generating, so the
    // hints for this turn see the previous utterance.
    let observation = ctx.session.observe_utterance(&transcript, Instant::now());

    // 3. Assemble the system prompt: persona, then cross-session digest,
    // then per-turn hints.
    let digest = state.registry.context_summary(&ctx.identity).await;
    let system = format!("{}{}{}", SYSTEM_PROMPT, digest, observation.hints);

    // 4. Generate the reply; history grows only after success.
    let stage = Instant::now();
    let reply = state
        .reply
        .generate(&transcript, &ctx.history, &system)
        .await?;
    let generation = stage.elapsed();
    ctx.history.push(ChatTurn::user(&transcript));
    ctx.history.push(ChatTurn::assistant(&reply));

    send_event(tx, &ServerMessage::Response { text: reply.clone() });

    // 5. Classify the reply for side-channel events.
    if let Some(kind) = classify_intervention(&reply) {
        ctx.session.note_intervention(kind);
        send_event(tx, &ServerMessage::PhysicalIntervention {
            intervention: kind,
            instructions: reply.clone(),
        });
    }

    if let Some(offer) = classify_frequency_offer(&reply) {
        send_event(tx, &ServerMessage::FrequencyOffer {
            frequency: offer.hz,
            description: offer.description,
        });
    }

    // 6. Synthesize and ship the audio.
    let stage = Instant::now();
    let spoken = state.tts.synthesize(&reply).await?;
    let synthesis = stage.elapsed();
    send_event(tx, &ServerMessage::Audio {
        audio: BASE64.encode(&spoken),
    });

    Ok(TurnTimings {
        transcription,
        generation,
        synthesis,
        total: turn_start.elapsed(),
        word_count: observation.word_count,
        session_age_secs: ctx.session.age_secs(Instant::now()),
    })
}

/// Speaks a fixed line: a response event followed by its audio. Used for the
/// greeting and the intervention follow-up, which skip the full pipeline.
pub(crate) async fn speak_line(state: &Arc<AppState>, text: &str, tx: &mpsc::Sender<String>) {
    send_event(tx, &ServerMessage::Response {
        text: text.to_string(),
    });

    match state.tts.synthesize(text).await {
        Ok(spoken) => {
            send_event(tx, &ServerMessage::Audio {
                audio: BASE64.encode(&spoken),
            });
        }
        Err(e) => {
            tracing::warn!("failed to synthesize fixed line: {}", e);
        }
    }
}
