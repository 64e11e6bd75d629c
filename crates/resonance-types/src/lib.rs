//! Shared types and constants for the Resonance backend.
//!
//! This crate provides the foundational domain types used across all
//! Resonance crates: conversation turns, physical-intervention categories,
//! frequency offers, and the persisted session records.
//!
//! No crate in the workspace depends on anything *except* `resonance-types`
//! for cross-cutting type definitions. This keeps the dependency graph
//! clean and prevents circular dependencies.

use serde::{Deserialize, Serialize};

pub mod session;

pub use session::{SessionSummary, VoiceNote};

/// Role of one turn in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person speaking to the agent.
    User,
    /// The agent's reply.
    Assistant,
}

impl ChatRole {
    /// Returns the wire label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of the in-memory conversation history.
///
/// Histories are append-only for the life of a connection and are never
/// persisted — they are discarded on disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A physical self-regulation action the agent can ask for.
///
/// The set is closed: the classifier maps reply text onto exactly these
/// categories, and the per-user effectiveness counters are keyed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    /// Cold water on the wrists, for hyperactivation.
    ColdWater,
    /// Shaking it out or jumping jacks, for frozen states.
    Movement,
    /// Humming, low and long, for numbness.
    Vagal,
    /// Lying down and feeling the floor, for overwhelm.
    Grounding,
}

impl InterventionKind {
    /// Returns the wire label for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColdWater => "cold_water",
            Self::Movement => "movement",
            Self::Vagal => "vagal",
            Self::Grounding => "grounding",
        }
    }
}

impl std::fmt::Display for InterventionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposal to play a specific calming tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyOffer {
    /// Tone frequency in hertz.
    pub hz: u16,
    /// Human-readable description of what the tone is for.
    pub description: String,
}
