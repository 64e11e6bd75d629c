//! Persisted per-session records.
//!
//! These are the only pieces of transient session data that outlive a
//! connection: a summary appended on an explicit `session_complete` signal,
//! and free-text notes saved by the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::InterventionKind;

/// Outcome label under which a session was closed.
///
/// The client reports this as a free string; only `"helpful"` carries
/// semantics (it gates the effectiveness counters), so everything else is
/// kept verbatim as [`SessionSummary::outcome`].
pub const OUTCOME_HELPFUL: &str = "helpful";

/// Summary of one completed session, appended to the user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// When the session was closed out.
    pub timestamp: DateTime<Utc>,
    /// Emotional-state label the client detected, if any.
    pub state: Option<String>,
    /// Calming frequency that was playing when the session ended, if any.
    pub frequency: Option<u16>,
    /// Session duration in seconds, as reported by the client.
    pub duration: f64,
    /// Outcome label reported by the client (e.g. "helpful").
    pub outcome: String,
    /// Physical interventions triggered during the session, in order.
    pub interventions_used: Vec<InterventionKind>,
}

impl SessionSummary {
    /// True when the client marked the session as helpful.
    pub fn is_helpful(&self) -> bool {
        self.outcome == OUTCOME_HELPFUL
    }
}

/// A free-text note saved by the user, kept with their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceNote {
    /// When the note was saved.
    pub timestamp: DateTime<Utc>,
    /// The note text, verbatim.
    pub text: String,
    /// Emotional-state label associated with the note, if any.
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcome: &str) -> SessionSummary {
        SessionSummary {
            timestamp: Utc::now(),
            state: Some("anxiety".to_string()),
            frequency: Some(432),
            duration: 120.0,
            outcome: outcome.to_string(),
            interventions_used: vec![InterventionKind::Movement],
        }
    }

    #[test]
    fn helpful_outcome_is_recognized() {
        assert!(summary("helpful").is_helpful());
        assert!(!summary("not helpful").is_helpful());
        assert!(!summary("").is_helpful());
    }

    #[test]
    fn summary_serializes_interventions_as_labels() {
        let json = serde_json::to_value(summary("helpful")).unwrap();
        assert_eq!(json["interventions_used"][0], "movement");
        assert_eq!(json["state"], "anxiety");
        assert_eq!(json["frequency"], 432);
    }
}
