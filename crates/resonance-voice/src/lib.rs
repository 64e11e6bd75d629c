//! External speech and language collaborators for Resonance.
//!
//! The turn pipeline talks to three services: speech-to-text for inbound
//! audio, reply generation for the conversational response, and
//! text-to-speech for the outbound voice. Each sits behind a trait so the
//! orchestrator (and its tests) never depend on a concrete vendor.
//!
//! The HTTP implementations target OpenAI-compatible transcription and
//! speech endpoints and an Anthropic-style messages endpoint. Every call
//! carries a bounded timeout; hitting it maps to
//! [`VoiceError::Unavailable`] rather than hanging a turn.

use async_trait::async_trait;

use resonance_types::ChatTurn;

pub mod config;
pub mod error;
pub mod reply;
pub mod stt;
pub mod tts;

pub use config::{ReplyConfig, SttConfig, TtsConfig, VoiceConfig};
pub use error::VoiceError;
pub use reply::ReplyClient;
pub use stt::TranscriptionClient;
pub use tts::SynthesisClient;

/// Turns raw audio bytes into transcript text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError>;
}

/// Generates a short reply from the transcript, the running history, and
/// the assembled system context.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        transcript: &str,
        history: &[ChatTurn],
        system: &str,
    ) -> Result<String, VoiceError>;
}

/// Turns reply text into encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError>;
}
