//! Lexical feature extraction for a single utterance.

use serde::{Deserialize, Serialize};

use super::lexicon::{
    is_standalone_completion, tokenize, EMOTION_WORDS, ISSUE_VERBS, SUBJECT_WORDS, VALUE_WORDS,
};

/// Fatigue: at most this many words after one prior turn...
const FATIGUE_WORDS_AFTER_ONE_TURN: usize = 3;
/// ...or at most this many words after two prior turns.
const FATIGUE_WORDS_AFTER_TWO_TURNS: usize = 5;

/// Signals derived from one user utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceFeatures {
    pub word_count: usize,
    pub sentence_count: usize,
    pub has_emotion_word: bool,
    pub has_value_word: bool,
    pub has_subject_reference: bool,
    pub has_named_issue_verb: bool,
    pub has_explicit_completion_signal: bool,
    pub has_fatigue_signal: bool,
}

impl UtteranceFeatures {
    /// Extracts features from `text`.
    ///
    /// `prior_turns` is the number of utterances already processed in the
    /// current phase; fatigue can only be detected after at least one.
    pub fn extract(text: &str, prior_turns: usize) -> Self {
        let word_count = word_count(text);
        if word_count == 0 {
            return Self::default();
        }

        let tokens = tokenize(text);
        Self {
            word_count,
            sentence_count: sentence_count(text),
            has_emotion_word: EMOTION_WORDS.matches(&tokens),
            has_value_word: VALUE_WORDS.matches(&tokens),
            has_subject_reference: SUBJECT_WORDS.matches(&tokens),
            has_named_issue_verb: ISSUE_VERBS.matches(&tokens),
            has_explicit_completion_signal: is_standalone_completion(text),
            has_fatigue_signal: is_fatigued(word_count, prior_turns),
        }
    }

    /// True if the utterance carries any completion-relevant signal.
    pub fn has_any_signal(&self) -> bool {
        self.has_emotion_word
            || self.has_value_word
            || self.has_subject_reference
            || self.has_explicit_completion_signal
            || self.has_fatigue_signal
    }
}

fn is_fatigued(word_count: usize, prior_turns: usize) -> bool {
    (word_count <= FATIGUE_WORDS_AFTER_ONE_TURN && prior_turns >= 1)
        || (word_count <= FATIGUE_WORDS_AFTER_TWO_TURNS && prior_turns >= 2)
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of non-empty runs between `.`, `!` and `?`.
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod counts {
        use super::*;

        #[test]
        fn counts_words_on_whitespace() {
            assert_eq!(word_count("  my ex   keeps cancelling "), 4);
        }

        #[test]
        fn counts_sentences_on_terminators() {
            assert_eq!(sentence_count("He left. I cried!! Why?"), 3);
            assert_eq!(sentence_count("no terminator"), 1);
            assert_eq!(sentence_count("..."), 0);
        }
    }

    mod extraction {
        use super::*;

        #[test]
        fn empty_text_yields_all_false() {
            let features = UtteranceFeatures::extract("", 4);
            assert_eq!(features, UtteranceFeatures::default());
            assert_eq!(features.word_count, 0);
        }

        #[test]
        fn whitespace_only_counts_as_empty() {
            assert_eq!(UtteranceFeatures::extract(" \n\t ", 2), UtteranceFeatures::default());
        }

        #[test]
        fn detects_emotion_value_and_subject() {
            let features =
                UtteranceFeatures::extract("I feel anxious because my co-parent is late", 0);
            assert!(features.has_emotion_word);
            assert!(features.has_value_word);
            assert!(features.has_subject_reference);
            assert!(features.has_named_issue_verb);
            assert!(!features.has_explicit_completion_signal);
        }

        #[test]
        fn emotion_matching_is_case_insensitive() {
            assert!(UtteranceFeatures::extract("OVERWHELMED", 0).has_emotion_word);
        }

        #[test]
        fn embedded_affirmation_is_not_a_completion_signal() {
            let features = UtteranceFeatures::extract(
                "my answer is ok for now but here's more context",
                0,
            );
            assert!(!features.has_explicit_completion_signal);
        }

        #[test]
        fn standalone_affirmations_are_completion_signals() {
            for text in ["that's it", "yes", "ok"] {
                assert!(
                    UtteranceFeatures::extract(text, 0).has_explicit_completion_signal,
                    "{text:?}"
                );
            }
        }
    }

    mod fatigue {
        use super::*;

        #[test]
        fn never_fatigued_on_first_turn() {
            assert!(!UtteranceFeatures::extract("idk", 0).has_fatigue_signal);
        }

        #[test]
        fn short_reply_after_one_turn_is_fatigue() {
            assert!(UtteranceFeatures::extract("fine", 1).has_fatigue_signal);
            assert!(UtteranceFeatures::extract("I guess so", 1).has_fatigue_signal);
            assert!(!UtteranceFeatures::extract("I guess so really", 1).has_fatigue_signal);
        }

        #[test]
        fn five_words_after_two_turns_is_fatigue() {
            assert!(UtteranceFeatures::extract("I really do not know", 2).has_fatigue_signal);
            assert!(!UtteranceFeatures::extract("I really do not know that", 2).has_fatigue_signal);
        }
    }

    proptest! {
        #[test]
        fn extraction_never_panics(text in ".{0,200}", prior in 0usize..10) {
            let features = UtteranceFeatures::extract(&text, prior);
            prop_assert_eq!(features.word_count, word_count(&text));
        }

        #[test]
        fn long_utterances_are_never_fatigue(words in 6usize..40, prior in 0usize..10) {
            let text = vec!["word"; words].join(" ");
            prop_assert!(!UtteranceFeatures::extract(&text, prior).has_fatigue_signal);
        }
    }
}
