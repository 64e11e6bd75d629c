//! Detectors for conversational patterns in user utterances.

/// Tokens this short carry little signal and are excluded from the
/// repetition comparison.
const MIN_TOKEN_LEN: usize = 4;

/// Shared long-token count must exceed this for two utterances to count as
/// repetitive.
const REPETITION_THRESHOLD: usize = 5;

/// Word count must exceed this for an utterance to count as long.
const LONG_MESSAGE_WORDS: usize = 100;

/// True when the current utterance circles the same ground as the previous
/// one.
///
/// Both utterances are split on whitespace and lower-cased; tokens longer
/// than four characters are compared as sets, and the intersection must
/// exceed the threshold. The first turn (empty previous) is never
/// repetitive.
pub fn is_repetitive(current: &str, previous: &str) -> bool {
    if previous.is_empty() {
        return false;
    }

    let long_tokens = |text: &str| {
        text.split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| token.len() > MIN_TOKEN_LEN)
            .collect::<std::collections::HashSet<_>>()
    };

    let current_tokens = long_tokens(current);
    let previous_tokens = long_tokens(previous);

    current_tokens.intersection(&previous_tokens).count() > REPETITION_THRESHOLD
}

/// True when the utterance exceeds the long-message word threshold.
pub fn is_long_message(word_count: usize) -> bool {
    word_count > LONG_MESSAGE_WORDS
}
