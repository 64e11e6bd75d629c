//! Reply generation over an Anthropic-style messages endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use resonance_types::ChatTurn;

use crate::config::{resolve_api_key, ReplyConfig};
use crate::error::VoiceError;
use crate::ReplyGenerator;

/// API version header value expected by the messages endpoint.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request body for the messages endpoint.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireTurn<'a>>,
}

#[derive(Debug, Serialize)]
struct WireTurn<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// HTTP client for `POST /v1/messages`.
#[derive(Debug, Clone)]
pub struct ReplyClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl ReplyClient {
    /// Builds a client from config, resolving the API key from the
    /// environment immediately.
    pub fn from_config(config: &ReplyConfig) -> Result<Self, VoiceError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/messages", config.base_url),
            api_key: resolve_api_key(&config.api_key_env)?,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn build_messages<'a>(transcript: &'a str, history: &'a [ChatTurn]) -> Vec<WireTurn<'a>> {
        history
            .iter()
            .map(|turn| WireTurn {
                role: turn.role.as_str(),
                content: &turn.content,
            })
            .chain(std::iter::once(WireTurn {
                role: "user",
                content: transcript,
            }))
            .collect()
    }
}

#[async_trait]
impl ReplyGenerator for ReplyClient {
    async fn generate(
        &self,
        transcript: &str,
        history: &[ChatTurn],
        system: &str,
    ) -> Result<String, VoiceError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: Self::build_messages(transcript, history),
        };

        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| VoiceError::Unavailable {
                service: "reply generation",
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| VoiceError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Generation(format!(
                "messages endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Generation(e.to_string()))?;

        let reply = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty())
            .ok_or_else(|| VoiceError::Generation("empty reply from model".to_string()))?;

        tracing::debug!(chars = reply.len(), "reply generation complete");
        Ok(reply)
    }
}
