//! Durable per-user behavioral profiles.
//!
//! A [`UserProfile`] aggregates what a user's sessions have shown over
//! time: completed-session summaries, per-state occurrence counts, which
//! physical interventions were used in sessions that turned out helpful,
//! and saved voice notes.
//!
//! The [`ProfileRegistry`] owns all profiles in memory and is the only
//! writer. Every mutation goes through it and is flushed to the configured
//! [`ProfileStore`] while the registry lock is held, which serializes store
//! writes across connections.
//!
//! Persistence failures never propagate: a failed load starts the registry
//! empty, a failed save keeps the mutation in memory. Both are logged.

pub mod count_map;
pub mod error;
pub mod profile;
pub mod registry;
pub mod store;

pub use count_map::CountMap;
pub use error::ProfileError;
pub use profile::UserProfile;
pub use registry::ProfileRegistry;
pub use store::{JsonFileStore, ProfileStore};
