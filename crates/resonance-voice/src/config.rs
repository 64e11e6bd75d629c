//! Collaborator endpoint configuration.
//!
//! API keys are resolved from environment variables at client construction
//! time and are never stored in the configuration file itself.

use serde::Deserialize;

use crate::error::VoiceError;

/// Configuration for all three collaborator services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub stt: SttConfig,

    #[serde(default)]
    pub reply: ReplyConfig,

    #[serde(default)]
    pub tts: TtsConfig,
}

/// Speech-to-text (Whisper-style transcription endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct SttConfig {
    /// API base URL, without a trailing slash.
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    /// Transcription model identifier.
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Reply generation (Anthropic-style messages endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// API base URL, without a trailing slash.
    #[serde(default = "default_anthropic_base")]
    pub base_url: String,

    /// Generation model identifier.
    #[serde(default = "default_reply_model")]
    pub model: String,

    /// Maximum tokens per reply. Kept small; the agent speaks in one or two
    /// sentences.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Environment variable holding the API key.
    #[serde(default = "default_anthropic_key_env")]
    pub api_key_env: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Text-to-speech (OpenAI-style speech endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// API base URL, without a trailing slash.
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    /// Synthesis model identifier.
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Voice identifier.
    #[serde(default = "default_tts_voice")]
    pub voice: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_openai_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_anthropic_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_reply_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_tts_voice() -> String {
    "nova".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_anthropic_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            model: default_stt_model(),
            api_key_env: default_openai_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base(),
            model: default_reply_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_anthropic_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            model: default_tts_model(),
            voice: default_tts_voice(),
            api_key_env: default_openai_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Resolves an API key from the named environment variable.
pub(crate) fn resolve_api_key(env_var: &str) -> Result<String, VoiceError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(VoiceError::Config(format!(
            "API key environment variable {} is not set",
            env_var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = VoiceConfig::default();
        assert_eq!(config.stt.model, "whisper-1");
        assert_eq!(config.reply.max_tokens, 150);
        assert_eq!(config.tts.voice, "nova");
        assert_eq!(config.stt.timeout_secs, 30);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let toml_str = r#"
            [reply]
            model = "claude-haiku-4"
            max_tokens = 200
        "#;

        let config: VoiceConfig = toml::from_str(toml_str).expect("parse TOML");
        assert_eq!(config.reply.model, "claude-haiku-4");
        assert_eq!(config.reply.max_tokens, 200);
        // Untouched sections keep their defaults.
        assert_eq!(config.stt.model, "whisper-1");
        assert_eq!(config.tts.model, "tts-1");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = resolve_api_key("RESONANCE_TEST_NO_SUCH_KEY").unwrap_err();
        assert!(matches!(err, VoiceError::Config(_)));
    }
}
