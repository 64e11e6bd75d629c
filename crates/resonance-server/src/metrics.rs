//! Per-turn latency metrics.
//!
//! Every completed voice turn is logged with its stage timings and recorded
//! in a bounded in-memory ring for aggregate stats.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Maximum number of turns retained for aggregate stats.
const MAX_RECORDED_TURNS: usize = 1000;

/// Stage timings for one completed voice turn.
#[derive(Debug, Clone)]
pub struct TurnTimings {
    /// Time spent in speech-to-text.
    pub transcription: Duration,
    /// Time spent generating the reply.
    pub generation: Duration,
    /// Time spent in text-to-speech.
    pub synthesis: Duration,
    /// Wall time from audio receipt to synthesized audio ready.
    pub total: Duration,
    /// Word count of the user's utterance.
    pub word_count: usize,
    /// Session age at the time of the turn, in seconds.
    pub session_age_secs: u64,
}

/// Aggregate latency statistics over the retained turns.
#[derive(Debug, Clone)]
pub struct TurnStats {
    pub turns: usize,
    pub avg_total_ms: f64,
    pub min_total_ms: u128,
    pub max_total_ms: u128,
}

/// Bounded recorder for turn timings.
///
/// Uses `std::sync::Mutex` intentionally: all lock acquisitions are brief
/// VecDeque operations that never span `.await` points, making a synchronous
/// lock safe and more efficient than `tokio::sync::Mutex`.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    turns: Mutex<VecDeque<TurnTimings>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs the turn and appends it to the ring, evicting the oldest entry
    /// once the ring is full.
    pub fn record(&self, timings: TurnTimings) {
        tracing::info!(
            transcription_ms = timings.transcription.as_millis() as u64,
            generation_ms = timings.generation.as_millis() as u64,
            synthesis_ms = timings.synthesis.as_millis() as u64,
            total_ms = timings.total.as_millis() as u64,
            word_count = timings.word_count,
            session_age_secs = timings.session_age_secs,
            "voice turn complete"
        );

        let mut turns = match self.turns.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("metrics lock poisoned: {}", e);
                return;
            }
        };
        turns.push_back(timings);
        if turns.len() > MAX_RECORDED_TURNS {
            turns.pop_front();
        }
    }

    /// Aggregate stats over the retained turns, or `None` when no turn has
    /// completed yet.
    pub fn stats(&self) -> Option<TurnStats> {
        let turns = match self.turns.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("metrics lock poisoned: {}", e);
                return None;
            }
        };

        if turns.is_empty() {
            return None;
        }

        let totals: Vec<u128> = turns.iter().map(|t| t.total.as_millis()).collect();
        let sum: u128 = totals.iter().sum();

        Some(TurnStats {
            turns: totals.len(),
            avg_total_ms: sum as f64 / totals.len() as f64,
            min_total_ms: *totals.iter().min().unwrap_or(&0),
            max_total_ms: *totals.iter().max().unwrap_or(&0),
        })
    }
}
