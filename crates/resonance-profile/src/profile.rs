//! The per-user aggregate record and its mutation rules.

use serde::{Deserialize, Serialize};

use resonance_types::{SessionSummary, VoiceNote};

use crate::count_map::CountMap;

/// How many of the most frequent patterns the context digest surfaces.
const DIGEST_TOP_PATTERNS: usize = 2;

/// Everything Resonance remembers about one user identity across sessions.
///
/// Invariants: `total_sessions == sessions.len()`, and the counters in
/// `patterns` / `effective_interventions` never decrease. Profiles are
/// created zero-valued on first sight of an identity and never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Completed-session summaries, append-only, oldest first.
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,

    /// Occurrence count per detected emotional state, one per completed
    /// session with a known state.
    #[serde(default)]
    pub patterns: CountMap,

    /// Per intervention category, how many times it was used in a session
    /// the user marked helpful.
    #[serde(default)]
    pub effective_interventions: CountMap,

    /// Saved voice notes, append-only, oldest first.
    #[serde(default)]
    pub voice_notes: Vec<VoiceNote>,

    /// Count of completed sessions.
    #[serde(default)]
    pub total_sessions: u64,
}

impl UserProfile {
    /// Folds a completed session into the aggregate counters.
    ///
    /// The pattern counter only moves when the session carried a detected
    /// state; the effectiveness counters only move when the outcome was
    /// helpful, once per use of each category.
    pub fn record_session(&mut self, summary: SessionSummary) {
        if let Some(state) = &summary.state {
            self.patterns.increment(state);
        }

        if summary.is_helpful() {
            for kind in &summary.interventions_used {
                self.effective_interventions.increment(kind.as_str());
            }
        }

        self.sessions.push(summary);
        self.total_sessions += 1;
    }

    /// Appends a voice note.
    pub fn record_note(&mut self, note: VoiceNote) {
        self.voice_notes.push(note);
    }

    /// Builds the natural-language digest injected into the generation
    /// context: the top patterns by frequency (ties first-seen-first) and
    /// the most recently saved note.
    ///
    /// Empty when the profile has no prior sessions.
    pub fn context_summary(&self) -> String {
        if self.total_sessions == 0 {
            return String::new();
        }

        let recent: Vec<String> = self
            .patterns
            .top(DIGEST_TOP_PATTERNS)
            .into_iter()
            .map(|(state, count)| format!("{} ({}x)", state, count))
            .collect();

        let mut digest = format!("\n\nPatterns: {}.", recent.join(", "));

        if let Some(note) = self.voice_notes.last() {
            digest.push_str(&format!(" They once said: \"{}\"", note.text));
        }

        digest
    }
}
