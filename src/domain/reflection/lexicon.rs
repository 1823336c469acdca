//! Word lists and whole-word matching.
//!
//! Matching is done on normalized tokens, never on raw substrings: "ok"
//! must not fire inside "okra", and "ex" must not fire inside "next".

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// A fixed list of lowercase words or multi-word phrases.
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    entries: &'static [&'static str],
}

impl Lexicon {
    pub const fn new(entries: &'static [&'static str]) -> Self {
        Self { entries }
    }

    /// True if any entry appears as a whole word (or consecutive words).
    pub fn matches(&self, tokens: &[String]) -> bool {
        self.entries.iter().any(|entry| contains_phrase(tokens, entry))
    }
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split(' ').collect();
    if words.is_empty() || words.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| t == w))
}

/// Splits text into lowercase word tokens.
///
/// Apostrophes and hyphens stay inside words ("that's", "co-parent");
/// curly apostrophes are folded to straight ones.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub static EMOTION_WORDS: Lexicon = Lexicon::new(&[
    "feel", "feels", "felt", "feeling", "feelings", "angry", "sad", "frustrated", "hurt",
    "worried", "scared", "happy", "anxious", "overwhelmed", "disappointed", "trapped",
    "unseen", "grateful", "afraid", "upset", "stressed", "exhausted", "resentful", "guilty",
    "lonely", "helpless", "ashamed", "nervous", "furious", "heartbroken",
]);

pub static VALUE_WORDS: Lexicon = Lexicon::new(&[
    "protect", "advocate", "support", "family", "future", "long-term", "security",
    "resources", "strength", "sustainable", "maintain", "preserve", "ensure", "provide",
    "care", "love", "loved", "safe", "safety", "stability", "stable", "important", "value",
    "values", "matters", "believe", "need", "want", "hope", "why", "because", "purpose",
    "goal", "priority", "faith", "respect", "trust", "consistency", "peace", "connection",
    "legacy", "mission", "calling", "sacred", "grounded", "rooted",
]);

pub static SUBJECT_WORDS: Lexicon = Lexicon::new(&[
    "co-parent", "coparent", "co-parents", "ex", "they", "he", "she", "mother", "father",
    "mom", "dad", "partner", "attorney", "lawyer", "mediator", "court", "judge", "gal",
    "custody", "visitation", "parenting time", "counselor", "therapist", "school", "teacher",
    "child", "children", "kid", "kids", "son", "daughter",
]);

pub static ISSUE_VERBS: Lexicon = Lexicon::new(&[
    "is", "are", "was", "were", "keeps", "won't", "doesn't", "always", "never", "refuses",
    "insists", "demands", "wants", "needs", "struggling", "feeling", "not",
]);

/// Phrases that, standing alone, mean "I'm ready to move on".
static COMPLETION_PHRASES: &[&str] = &[
    "that's it", "thats it", "that's really it", "thats really it", "that's all",
    "thats all", "that's enough", "thats enough", "that is it", "that is all",
    "i'm done", "im done", "i am done", "i'm finished", "im finished", "i'm ready",
    "im ready", "i am ready", "let's move on", "lets move on", "move on", "next",
    "move forward", "let's keep going", "that works", "finished", "complete", "done",
    "enough", "nothing else", "nothing more",
];

/// Short affirmations that only count when they are the whole clause.
static AFFIRMATIONS: &[&str] = &[
    "yes", "yep", "yup", "yeah", "ok", "okay", "sure", "exactly", "precisely", "correct",
    "right",
];

static STANDALONE_SIGNALS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    COMPLETION_PHRASES
        .iter()
        .chain(AFFIRMATIONS.iter())
        .copied()
        .collect()
});

/// True if every clause of the utterance is a standalone completion signal.
///
/// "Yes. That's it." qualifies; "my answer is ok for now" does not.
pub fn is_standalone_completion(text: &str) -> bool {
    let mut clauses = text
        .split([',', '.', '!', '?', ';'])
        .map(|clause| tokenize(clause).join(" "))
        .filter(|clause| !clause.is_empty())
        .peekable();

    if clauses.peek().is_none() {
        return false;
    }
    clauses.all(|clause| STANDALONE_SIGNALS.contains(clause.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod tokenizer {
        use super::*;

        #[test]
        fn lowercases_and_strips_punctuation() {
            assert_eq!(tokenize("He NEVER calls!"), vec!["he", "never", "calls"]);
        }

        #[test]
        fn keeps_apostrophes_and_hyphens_inside_words() {
            assert_eq!(
                tokenize("My co-parent won't answer"),
                vec!["my", "co-parent", "won't", "answer"]
            );
        }

        #[test]
        fn folds_curly_apostrophes() {
            assert_eq!(tokenize("That\u{2019}s it"), vec!["that's", "it"]);
        }

        #[test]
        fn empty_text_has_no_tokens() {
            assert!(tokenize("   ").is_empty());
            assert!(tokenize("...").is_empty());
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn matches_whole_words_only() {
            assert!(SUBJECT_WORDS.matches(&tokenize("my ex is late")));
            assert!(!SUBJECT_WORDS.matches(&tokenize("next exit please")));
        }

        #[test]
        fn matches_multi_word_phrases() {
            assert!(SUBJECT_WORDS.matches(&tokenize("We argue about parenting time")));
            assert!(!SUBJECT_WORDS.matches(&tokenize("parenting is a long time")));
        }
    }

    mod standalone_completion {
        use super::*;

        #[test]
        fn accepts_standalone_phrases() {
            for text in ["that's it", "Yes", "ok", "OK.", "Let's move on!", "done"] {
                assert!(is_standalone_completion(text), "{text:?} should signal");
            }
        }

        #[test]
        fn accepts_chains_of_signals() {
            assert!(is_standalone_completion("Yes. That's it."));
            assert!(is_standalone_completion("ok, let's move on"));
        }

        #[test]
        fn rejects_signals_embedded_in_longer_text() {
            assert!(!is_standalone_completion(
                "my answer is ok for now but here's more context"
            ));
            assert!(!is_standalone_completion("yes, and he keeps cancelling"));
            assert!(!is_standalone_completion("I'm done waiting for him"));
        }

        #[test]
        fn rejects_empty_text() {
            assert!(!is_standalone_completion(""));
            assert!(!is_standalone_completion(" . , "));
        }
    }
}
