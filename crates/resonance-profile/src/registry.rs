//! The in-memory profile aggregator.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use resonance_types::{SessionSummary, VoiceNote};

use crate::profile::UserProfile;
use crate::store::ProfileStore;

/// Owns every [`UserProfile`] in memory and mediates all reads and writes.
///
/// The map lives behind one async mutex that stays held across store
/// flushes. That single-writer discipline is what keeps two connections
/// completing sessions for the same identity from losing updates.
pub struct ProfileRegistry {
    profiles: Mutex<HashMap<String, UserProfile>>,
    store: Arc<dyn ProfileStore>,
}

impl ProfileRegistry {
    /// Loads the registry from the store at startup.
    ///
    /// A load failure degrades to an empty registry — the process starts
    /// serving sessions either way.
    pub async fn load(store: Arc<dyn ProfileStore>) -> Self {
        let profiles = match store.load().await {
            Ok(profiles) => {
                tracing::info!(count = profiles.len(), "loaded user profiles");
                profiles
            }
            Err(e) => {
                tracing::warn!("failed to load profile store, starting empty: {}", e);
                HashMap::new()
            }
        };

        Self {
            profiles: Mutex::new(profiles),
            store,
        }
    }

    /// Returns the profile for `identity`, creating a zero-valued one on
    /// first sight. The creation itself is not persisted until the first
    /// mutation.
    pub async fn get_or_create(&self, identity: &str) -> UserProfile {
        let mut profiles = self.profiles.lock().await;
        profiles.entry(identity.to_string()).or_default().clone()
    }

    /// Folds a completed session into `identity`'s profile and flushes the
    /// store.
    pub async fn record_session_complete(&self, identity: &str, summary: SessionSummary) {
        let mut profiles = self.profiles.lock().await;
        profiles
            .entry(identity.to_string())
            .or_default()
            .record_session(summary);
        self.flush(&profiles).await;
    }

    /// Appends a voice note to `identity`'s profile and flushes the store.
    pub async fn record_note(&self, identity: &str, note: VoiceNote) {
        let mut profiles = self.profiles.lock().await;
        profiles
            .entry(identity.to_string())
            .or_default()
            .record_note(note);
        self.flush(&profiles).await;
    }

    /// Builds the context digest for `identity`. Empty for unknown
    /// identities and for profiles with no completed sessions.
    pub async fn context_summary(&self, identity: &str) -> String {
        let profiles = self.profiles.lock().await;
        profiles
            .get(identity)
            .map(UserProfile::context_summary)
            .unwrap_or_default()
    }

    /// Number of known identities. Mostly useful to tests and logs.
    pub async fn len(&self) -> usize {
        self.profiles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.lock().await.is_empty()
    }

    /// Writes the full map through the store. A failure is logged and the
    /// in-memory state is kept; it is not retried and not rolled back.
    async fn flush(&self, profiles: &HashMap<String, UserProfile>) {
        if let Err(e) = self.store.save(profiles).await {
            tracing::warn!("failed to persist profiles, keeping state in memory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileError;
    use crate::store::JsonFileStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use resonance_types::InterventionKind;

    /// Store whose every operation fails, for degradation tests.
    struct BrokenStore;

    #[async_trait]
    impl ProfileStore for BrokenStore {
        async fn load(&self) -> Result<HashMap<String, UserProfile>, ProfileError> {
            Err(ProfileError::Task("broken".to_string()))
        }

        async fn save(&self, _: &HashMap<String, UserProfile>) -> Result<(), ProfileError> {
            Err(ProfileError::Task("broken".to_string()))
        }
    }

    fn summary(state: &str, outcome: &str, used: Vec<InterventionKind>) -> SessionSummary {
        SessionSummary {
            timestamp: Utc::now(),
            state: Some(state.to_string()),
            frequency: None,
            duration: 30.0,
            outcome: outcome.to_string(),
            interventions_used: used,
        }
    }

    async fn file_registry(dir: &tempfile::TempDir) -> ProfileRegistry {
        let store = Arc::new(JsonFileStore::new(dir.path().join("profiles.json")));
        ProfileRegistry::load(store).await
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = file_registry(&dir).await;

        let first = registry.get_or_create("user_1").await;
        let second = registry.get_or_create("user_1").await;

        assert_eq!(first, second);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn session_complete_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();

        {
            let registry = file_registry(&dir).await;
            registry
                .record_session_complete(
                    "user_1",
                    summary("anxiety", "helpful", vec![InterventionKind::Vagal]),
                )
                .await;
        }

        let reloaded = file_registry(&dir).await;
        let profile = reloaded.get_or_create("user_1").await;
        assert_eq!(profile.total_sessions, 1);
        assert_eq!(profile.patterns.get("anxiety"), 1);
        assert_eq!(profile.effective_interventions.get("vagal"), 1);
    }

    #[tokio::test]
    async fn saved_note_appears_verbatim_in_digest() {
        let dir = tempfile::tempdir().unwrap();
        let registry = file_registry(&dir).await;

        registry
            .record_session_complete("user_1", summary("stuck", "helpful", vec![]))
            .await;
        registry
            .record_note(
                "user_1",
                VoiceNote {
                    timestamp: Utc::now(),
                    text: "shaking it out actually helped".to_string(),
                    state: Some("stuck".to_string()),
                },
            )
            .await;

        let digest = registry.context_summary("user_1").await;
        assert!(digest.contains("shaking it out actually helped"));
        assert!(digest.contains("stuck (1x)"));
    }

    #[tokio::test]
    async fn unknown_identity_has_empty_digest() {
        let dir = tempfile::tempdir().unwrap();
        let registry = file_registry(&dir).await;

        assert_eq!(registry.context_summary("nobody").await, "");
    }

    #[tokio::test]
    async fn broken_store_degrades_without_losing_memory_state() {
        let registry = ProfileRegistry::load(Arc::new(BrokenStore)).await;
        assert!(registry.is_empty().await);

        registry
            .record_session_complete("user_1", summary("fear", "helpful", vec![]))
            .await;

        // The save failed but the mutation stayed in memory.
        let profile = registry.get_or_create("user_1").await;
        assert_eq!(profile.total_sessions, 1);
    }
}
