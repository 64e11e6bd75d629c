use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("reply generation failed: {0}")]
    Generation(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("{service} service unavailable: no response within {timeout_secs}s")]
    Unavailable {
        service: &'static str,
        timeout_secs: u64,
    },

    #[error("invalid voice configuration: {0}")]
    Config(String),
}
