//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

use resonance_voice::VoiceConfig;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Profile store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Session behavior settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Collaborator endpoint settings (transcription, reply, synthesis).
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Profile persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON profile file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

/// Session behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Delay before the spoken greeting is sent, in milliseconds. The pause
    /// lets the client finish audio setup before the first event arrives.
    #[serde(default = "default_greeting_delay_ms")]
    pub greeting_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "resonance_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3001
}

fn default_store_path() -> String {
    "profiles.json".to_string()
}

fn default_greeting_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            greeting_delay_ms: default_greeting_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `RESONANCE_HOST` overrides `server.host`
/// - `RESONANCE_PORT` overrides `server.port`
/// - `RESONANCE_PROFILE_PATH` overrides `store.path`
/// - `RESONANCE_LOG_LEVEL` overrides `logging.level`
/// - `RESONANCE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("RESONANCE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("RESONANCE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(store_path) = std::env::var("RESONANCE_PROFILE_PATH") {
        config.store.path = store_path;
    }
    if let Ok(level) = std::env::var("RESONANCE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("RESONANCE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_every_section() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.store.path, "profiles.json");
        assert_eq!(config.session.greeting_delay_ms, 1000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.voice.reply.max_tokens, 150);
    }

    #[test]
    fn partial_toml_parses_with_defaults() {
        let toml_str = r#"
            [server]
            port = 8080

            [store]
            path = "/var/lib/resonance/profiles.json"

            [voice.tts]
            voice = "alloy"
        "#;

        let config: Config = toml::from_str(toml_str).expect("parse TOML");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.path, "/var/lib/resonance/profiles.json");
        assert_eq!(config.voice.tts.voice, "alloy");
        // Untouched sections keep their defaults.
        assert_eq!(config.session.greeting_delay_ms, 1000);
        assert_eq!(config.voice.stt.model, "whisper-1");
    }
}
