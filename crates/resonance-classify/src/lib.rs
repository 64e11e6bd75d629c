//! Pure text classification for Resonance replies and utterances.
//!
//! Two concerns live here, both deterministic and side-effect free:
//!
//! - [`rules`] maps a generated reply onto side-channel signals: an optional
//!   physical-intervention category and an optional frequency offer. The
//!   intervention rules are an explicit ordered table so the priority and
//!   tie-break behavior stays auditable.
//! - [`speech`] flags conversational patterns in user utterances: circling
//!   over the same ground, and over-long messages.
//!
//! Absence of a match is a normal outcome everywhere in this crate, never
//! an error.

pub mod rules;
pub mod speech;

pub use rules::{classify_frequency_offer, classify_intervention, FREQUENCIES};
pub use speech::{is_long_message, is_repetitive};
