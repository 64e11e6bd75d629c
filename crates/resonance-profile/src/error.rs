use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("profile store task failed: {0}")]
    Task(String),
}
