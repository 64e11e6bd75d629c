//! Speech-to-text over a Whisper-style transcription endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{resolve_api_key, SttConfig};
use crate::error::VoiceError;
use crate::SpeechToText;

/// Maximum audio input size (10 MiB). Prevents OOM from oversized payloads.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Response body of the transcription endpoint.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for `POST /v1/audio/transcriptions`.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl TranscriptionClient {
    /// Builds a client from config, resolving the API key from the
    /// environment immediately.
    pub fn from_config(config: &SttConfig) -> Result<Self, VoiceError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/audio/transcriptions", config.base_url),
            api_key: resolve_api_key(&config.api_key_env)?,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl SpeechToText for TranscriptionClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError> {
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Transcription(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("utterance.webm")
            .mime_str("audio/webm")
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| VoiceError::Unavailable {
                service: "transcription",
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Transcription(format!(
                "transcription endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;

        tracing::debug!(chars = parsed.text.len(), "transcription complete");
        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_audio_is_rejected_before_any_request() {
        let client = TranscriptionClient {
            client: reqwest::Client::new(),
            endpoint: "http://127.0.0.1:9/v1/audio/transcriptions".to_string(),
            api_key: "test".to_string(),
            model: "whisper-1".to_string(),
            timeout: Duration::from_secs(1),
        };

        let oversized = vec![0u8; MAX_STT_INPUT_BYTES + 1];
        let err = client.transcribe(&oversized).await.unwrap_err();
        assert!(matches!(err, VoiceError::Transcription(_)));
        assert!(err.to_string().contains("maximum size"));
    }
}
