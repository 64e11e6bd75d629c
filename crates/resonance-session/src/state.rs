//! The session state machine and hint accumulation rules.

use std::time::Instant;

use chrono::Utc;

use resonance_classify::{is_long_message, is_repetitive};
use resonance_types::{InterventionKind, SessionSummary};

/// Hard cap on counted hints per session.
const MAX_HINTS: u8 = 2;

/// Session age in seconds past which the wrap-up hint becomes eligible.
const WRAP_UP_AFTER_SECS: u64 = 900;

/// Hint injected when the user is talking a lot.
const HINT_LONG_MESSAGE: &str =
    "\n\nThey're talking a lot. Might need physical intervention more than conversation.";

/// Hint injected when the user is circling the same ground.
const HINT_REPETITIVE: &str =
    "\n\nThey're circling the same thing. Consider suggesting something physical.";

/// Hint injected late in a long session.
///
/// Deliberately uncounted, so it can recur on every qualifying turn. That
/// unboundedness is inherited behavior, kept as-is.
const HINT_WRAP_UP: &str =
    "\n\nLong session. If they seem stuck, you can check if they want to wrap up.";

/// Conversational phase of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, no utterance processed yet.
    Greeting,
    /// Processing turns normally.
    Active,
    /// A physical intervention was emitted and not yet acknowledged.
    Intervening,
}

/// What one utterance contributed to the turn: the hint text to append to
/// the generation context, and the utterance's word count (for metrics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnObservation {
    pub hints: String,
    pub word_count: usize,
}

/// Transient state for one connection, created on connect and discarded on
/// disconnect.
///
/// The hint counter only ever increases and never exceeds [`MAX_HINTS`].
#[derive(Debug)]
pub struct SessionState {
    started_at: Instant,
    phase: SessionPhase,
    message_count: u64,
    user_word_count: u64,
    last_user_message: String,
    sound_enabled: Option<bool>,
    hint_count: u8,
    interventions_used: Vec<InterventionKind>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            phase: SessionPhase::Greeting,
            message_count: 0,
            user_word_count: 0,
            last_user_message: String::new(),
            sound_enabled: None,
            hint_count: 0,
            interventions_used: Vec::new(),
        }
    }

    /// Folds one user utterance into the session counters and computes the
    /// contextual hints for the upcoming reply-generation call.
    ///
    /// Hints compare against the *previous* utterance, so
    /// `last_user_message` is updated only after hint computation. This
    /// must run strictly before the generation call for the same turn.
    pub fn observe_utterance(&mut self, transcript: &str, now: Instant) -> TurnObservation {
        if self.phase == SessionPhase::Greeting {
            self.phase = SessionPhase::Active;
        }

        let word_count = transcript.split_whitespace().count();
        self.message_count += 1;
        self.user_word_count += word_count as u64;

        let mut hints = String::new();

        if is_long_message(word_count) && self.hint_count == 0 {
            hints.push_str(HINT_LONG_MESSAGE);
            self.hint_count += 1;
        }

        if is_repetitive(transcript, &self.last_user_message) && self.hint_count < MAX_HINTS {
            hints.push_str(HINT_REPETITIVE);
            self.hint_count += 1;
        }

        let session_secs = now.duration_since(self.started_at).as_secs();
        if session_secs > WRAP_UP_AFTER_SECS && self.hint_count < MAX_HINTS {
            hints.push_str(HINT_WRAP_UP);
        }

        self.last_user_message = transcript.to_string();

        if !hints.is_empty() {
            tracing::debug!(
                message_count = self.message_count,
                hint_count = self.hint_count,
                "accumulated contextual hints for turn"
            );
        }

        TurnObservation { hints, word_count }
    }

    /// Records that the reply triggered a physical intervention.
    pub fn note_intervention(&mut self, kind: InterventionKind) {
        self.interventions_used.push(kind);
        self.phase = SessionPhase::Intervening;
    }

    /// The client acknowledged the intervention; back to normal turns.
    pub fn intervention_complete(&mut self) {
        self.phase = SessionPhase::Active;
    }

    /// Records the user's answer to a frequency offer.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = Some(enabled);
    }

    /// Assembles the durable summary for an explicit session-complete
    /// signal. This is the only path from transient state to the profile.
    pub fn build_summary(
        &self,
        state: Option<String>,
        frequency: Option<u16>,
        duration: f64,
        outcome: String,
    ) -> SessionSummary {
        SessionSummary {
            timestamp: Utc::now(),
            state,
            frequency,
            duration,
            outcome,
            interventions_used: self.interventions_used.clone(),
        }
    }

    /// Seconds since the connection opened.
    pub fn age_secs(&self, now: Instant) -> u64 {
        now.duration_since(self.started_at).as_secs()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn user_word_count(&self) -> u64 {
        self.user_word_count
    }

    pub fn hint_count(&self) -> u8 {
        self.hint_count
    }

    pub fn sound_enabled(&self) -> Option<bool> {
        self.sound_enabled
    }

    pub fn interventions_used(&self) -> &[InterventionKind] {
        &self.interventions_used
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
