//! Text-to-speech over an OpenAI-style speech endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{resolve_api_key, TtsConfig};
use crate::error::VoiceError;
use crate::SpeechSynthesizer;

/// Maximum text input size (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Request body for the speech endpoint.
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// HTTP client for `POST /v1/audio/speech`.
#[derive(Debug, Clone)]
pub struct SynthesisClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
    timeout: Duration,
}

impl SynthesisClient {
    /// Builds a client from config, resolving the API key from the
    /// environment immediately.
    pub fn from_config(config: &TtsConfig) -> Result<Self, VoiceError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/audio/speech", config.base_url),
            api_key: resolve_api_key(&config.api_key_env)?,
            model: config.model.clone(),
            voice: config.voice.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for SynthesisClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let body = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
        };

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| VoiceError::Unavailable {
                service: "speech synthesis",
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Synthesis(format!(
                "speech endpoint returned {}: {}",
                status, body
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;

        tracing::debug!(bytes = audio.len(), "speech synthesis complete");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_text_is_rejected_before_any_request() {
        let client = SynthesisClient {
            client: reqwest::Client::new(),
            endpoint: "http://127.0.0.1:9/v1/audio/speech".to_string(),
            api_key: "test".to_string(),
            model: "tts-1".to_string(),
            voice: "nova".to_string(),
            timeout: Duration::from_secs(1),
        };

        let oversized = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        let err = client.synthesize(&oversized).await.unwrap_err();
        assert!(matches!(err, VoiceError::Synthesis(_)));
    }

    #[test]
    fn speech_request_serializes_expected_fields() {
        let body = SpeechRequest {
            model: "tts-1",
            voice: "nova",
            input: "How's that feel?",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["voice"], "nova");
        assert_eq!(json["input"], "How's that feel?");
    }
}
