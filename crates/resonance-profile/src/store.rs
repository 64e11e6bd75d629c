//! Durable storage behind the profile registry.
//!
//! The storage contract is deliberately small: load the whole identity →
//! profile mapping at startup, save the whole mapping after a mutation.
//! The registry guarantees saves are observable before the next read of
//! the same identity; the engine behind the trait is free to change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ProfileError;
use crate::profile::UserProfile;

/// Key/value persistence for user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Reads the full store. A missing store is empty, not an error.
    async fn load(&self) -> Result<HashMap<String, UserProfile>, ProfileError>;

    /// Writes the full store.
    async fn save(&self, profiles: &HashMap<String, UserProfile>) -> Result<(), ProfileError>;
}

/// Stores all profiles as one pretty-printed JSON document.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated store. File I/O runs on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    async fn load(&self) -> Result<HashMap<String, UserProfile>, ProfileError> {
        let path = self.path.clone();

        let contents = tokio::task::spawn_blocking(move || std::fs::read_to_string(&path))
            .await
            .map_err(|e| ProfileError::Task(e.to_string()))?;

        match contents {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ProfileError::Io(e)),
        }
    }

    async fn save(&self, profiles: &HashMap<String, UserProfile>) -> Result<(), ProfileError> {
        let json = serde_json::to_string_pretty(profiles)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let tmp = path.with_extension("tmp");
            std::fs::write(&tmp, json)?;
            std::fs::rename(&tmp, &path)
        })
        .await
        .map_err(|e| ProfileError::Task(e.to_string()))?
        .map_err(ProfileError::Io)
    }
}
