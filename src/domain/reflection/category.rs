//! Reviewer categories for user responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// How a user responded to a prompt, as tagged by an admin reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    DirectAnswer,
    ShortFormResponse,
    PartialIndirectAnswer,
    ConversationalSocial,
    MetaAppDirected,
    OffTopicNonSequitur,
    RefusalAvoidance,
    EmotionalExpressive,
}

impl ResponseCategory {
    pub const ALL: [ResponseCategory; 8] = [
        ResponseCategory::DirectAnswer,
        ResponseCategory::ShortFormResponse,
        ResponseCategory::PartialIndirectAnswer,
        ResponseCategory::ConversationalSocial,
        ResponseCategory::MetaAppDirected,
        ResponseCategory::OffTopicNonSequitur,
        ResponseCategory::RefusalAvoidance,
        ResponseCategory::EmotionalExpressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCategory::DirectAnswer => "direct_answer",
            ResponseCategory::ShortFormResponse => "short_form_response",
            ResponseCategory::PartialIndirectAnswer => "partial_indirect_answer",
            ResponseCategory::ConversationalSocial => "conversational_social",
            ResponseCategory::MetaAppDirected => "meta_app_directed",
            ResponseCategory::OffTopicNonSequitur => "off_topic_non_sequitur",
            ResponseCategory::RefusalAvoidance => "refusal_avoidance",
            ResponseCategory::EmotionalExpressive => "emotional_expressive",
        }
    }

    /// True if a response of this kind is enough to close a phase.
    pub fn is_sufficient(&self) -> bool {
        matches!(
            self,
            ResponseCategory::DirectAnswer
                | ResponseCategory::ShortFormResponse
                | ResponseCategory::EmotionalExpressive
        )
    }
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("category", format!("unknown category '{}'", s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_categories() {
        let sufficient: Vec<_> = ResponseCategory::ALL
            .into_iter()
            .filter(ResponseCategory::is_sufficient)
            .collect();
        assert_eq!(
            sufficient,
            vec![
                ResponseCategory::DirectAnswer,
                ResponseCategory::ShortFormResponse,
                ResponseCategory::EmotionalExpressive,
            ]
        );
    }

    #[test]
    fn parses_from_wire_name() {
        for category in ResponseCategory::ALL {
            assert_eq!(category.as_str().parse::<ResponseCategory>(), Ok(category));
        }
        assert!("sarcasm".parse::<ResponseCategory>().is_err());
    }

    #[test]
    fn serde_matches_wire_name() {
        let json = serde_json::to_string(&ResponseCategory::OffTopicNonSequitur).unwrap();
        assert_eq!(json, "\"off_topic_non_sequitur\"");
    }
}
