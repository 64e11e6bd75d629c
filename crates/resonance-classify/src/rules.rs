//! Ordered rule tables for reply classification.
//!
//! [`classify_intervention`] only fires when the reply explicitly asks the
//! user to *do* something physical. The phrase groups are chosen so that an
//! incidental mention of a calming frequency ("Want some 432Hz?") never
//! reads as a physical instruction.

use resonance_types::{FrequencyOffer, InterventionKind};

/// One row of the intervention rule table.
///
/// A rule matches when any of its `groups` has every phrase present in the
/// lower-cased reply text.
struct InterventionRule {
    kind: InterventionKind,
    groups: &'static [&'static [&'static str]],
}

/// Intervention rules in priority order; the first matching rule wins.
///
/// Order is fixed: cold-water cues, movement cues, vagal/humming cues,
/// grounding cues.
const INTERVENTION_RULES: &[InterventionRule] = &[
    InterventionRule {
        kind: InterventionKind::ColdWater,
        groups: &[&["cold water on your wrists"], &["go ", "cold"]],
    },
    InterventionRule {
        kind: InterventionKind::Movement,
        groups: &[&["shake", "hands"], &["jumping jacks"]],
    },
    InterventionRule {
        kind: InterventionKind::Vagal,
        groups: &[&["hum with me"]],
    },
    InterventionRule {
        kind: InterventionKind::Grounding,
        groups: &[&["lie down", "floor"]],
    },
];

/// One entry of the frequency table: an emotional state, its tone, and the
/// one-line description surfaced with an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub state: &'static str,
    pub hz: u16,
    pub description: &'static str,
}

/// The fixed table of calming tones, keyed by emotional state.
pub const FREQUENCIES: &[FrequencyEntry] = &[
    FrequencyEntry {
        state: "anxiety",
        hz: 432,
        description: "slows racing thoughts",
    },
    FrequencyEntry {
        state: "fear",
        hz: 396,
        description: "grounds fear",
    },
    FrequencyEntry {
        state: "numb",
        hz: 528,
        description: "gently wakes things up",
    },
    FrequencyEntry {
        state: "stuck",
        hz: 417,
        description: "helps shift stuck feelings",
    },
    FrequencyEntry {
        state: "anger",
        hz: 639,
        description: "settles frustration",
    },
];

/// Maps a reply to the physical-intervention category it requests, if any.
///
/// Case-insensitive substring matching against [`INTERVENTION_RULES`],
/// evaluated in table order; the first matching rule wins.
pub fn classify_intervention(reply: &str) -> Option<InterventionKind> {
    let lower = reply.to_lowercase();

    INTERVENTION_RULES
        .iter()
        .find(|rule| {
            rule.groups
                .iter()
                .any(|group| group.iter().all(|phrase| lower.contains(phrase)))
        })
        .map(|rule| rule.kind)
}

/// Finds a frequency offer in a reply, if any.
///
/// Matches the verbatim token `<hz>Hz` or `<hz> Hz` for each entry of
/// [`FREQUENCIES`]. Matching is exact on the numeric token; "529Hz" offers
/// nothing.
pub fn classify_frequency_offer(reply: &str) -> Option<FrequencyOffer> {
    FREQUENCIES
        .iter()
        .find(|entry| {
            reply.contains(&format!("{}Hz", entry.hz))
                || reply.contains(&format!("{} Hz", entry.hz))
        })
        .map(|entry| FrequencyOffer {
            hz: entry.hz,
            description: entry.description.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_and_hands_is_movement_in_either_order() {
        assert_eq!(
            classify_intervention("Want to shake it out? Shake your hands hard for 20 seconds."),
            Some(InterventionKind::Movement)
        );
        assert_eq!(
            classify_intervention("Hands loose — now SHAKE."),
            Some(InterventionKind::Movement)
        );
    }

    #[test]
    fn jumping_jacks_is_movement() {
        assert_eq!(
            classify_intervention("Try ten jumping jacks."),
            Some(InterventionKind::Movement)
        );
    }

    #[test]
    fn cold_water_phrase_matches() {
        assert_eq!(
            classify_intervention("Want to try cold water on your wrists? Sometimes helps."),
            Some(InterventionKind::ColdWater)
        );
        assert_eq!(
            classify_intervention("Go run your arms under something cold."),
            Some(InterventionKind::ColdWater)
        );
    }

    #[test]
    fn humming_is_vagal() {
        assert_eq!(
            classify_intervention("Hum with me? Low and long."),
            Some(InterventionKind::Vagal)
        );
    }

    #[test]
    fn lie_down_on_floor_is_grounding() {
        assert_eq!(
            classify_intervention("Lie down if you can. Feel the floor."),
            Some(InterventionKind::Grounding)
        );
    }

    #[test]
    fn lie_down_without_floor_is_not_grounding() {
        assert_eq!(classify_intervention("Maybe lie down for a bit."), None);
    }

    #[test]
    fn frequency_mention_is_not_an_intervention() {
        assert_eq!(classify_intervention("Want some 432Hz? Might help slow things down."), None);
    }

    #[test]
    fn plain_reply_matches_nothing() {
        assert_eq!(classify_intervention("That sounds hard. Where do you feel it?"), None);
    }

    #[test]
    fn rule_order_gives_cold_water_priority() {
        // A contrived reply that satisfies both the cold-water and movement
        // rules must resolve to the earlier table row.
        let reply = "Go splash cold water, then shake your hands out.";
        assert_eq!(classify_intervention(reply), Some(InterventionKind::ColdWater));
    }

    #[test]
    fn frequency_offer_matches_both_spellings() {
        let offer = classify_frequency_offer("Want some 528Hz?").unwrap();
        assert_eq!(offer.hz, 528);
        assert_eq!(offer.description, "gently wakes things up");

        let offer = classify_frequency_offer("How about 528 Hz for a minute?").unwrap();
        assert_eq!(offer.hz, 528);
    }

    #[test]
    fn unknown_frequency_offers_nothing() {
        assert_eq!(classify_frequency_offer("Want some 529Hz?"), None);
        assert_eq!(classify_frequency_offer("No tones here."), None);
    }

    #[test]
    fn every_table_entry_is_detectable() {
        for entry in FREQUENCIES {
            let reply = format!("Want some {}Hz?", entry.hz);
            let offer = classify_frequency_offer(&reply).unwrap();
            assert_eq!(offer.hz, entry.hz);
            assert_eq!(offer.description, entry.description);
        }
    }
}
