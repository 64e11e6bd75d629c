//! Per-connection session state.
//!
//! One [`SessionState`] exists per live connection, owned exclusively by
//! that connection's socket task. It tracks the transient counters and the
//! conversational phase, decides which contextual hints to inject before
//! each reply-generation call, and assembles the summary that is folded
//! into the durable profile when the client closes a session out.
//!
//! Nothing here is persisted directly — the state is discarded wholesale
//! on disconnect.

pub mod state;

pub use state::{SessionPhase, SessionState, TurnObservation};
