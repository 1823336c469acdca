//! The seven reflection phases.
//!
//! Every phase carries the exact prompt text shown to the user. Prompts are
//! rendered verbatim; nothing downstream may rewrite them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Identifier of a reflection phase, always in `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PhaseId(u8);

impl PhaseId {
    /// Name the issue.
    pub const FIRST: PhaseId = PhaseId(1);
    /// Choose and communicate. Has no successor.
    pub const LAST: PhaseId = PhaseId(7);

    /// Creates a phase id, rejecting anything outside `1..=7`.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::FIRST.0..=Self::LAST.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::out_of_range(
                "phase_id",
                Self::FIRST.0 as i64,
                Self::LAST.0 as i64,
                value as i64,
            ))
        }
    }

    /// Returns the raw number.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Returns the following phase, or `None` for the last one.
    pub fn next(&self) -> Option<PhaseId> {
        if self.is_last() {
            None
        } else {
            Some(PhaseId(self.0 + 1))
        }
    }

    pub fn is_last(&self) -> bool {
        *self == Self::LAST
    }

    /// Iterates all phases in curriculum order.
    pub fn all() -> impl Iterator<Item = PhaseId> {
        (Self::FIRST.0..=Self::LAST.0).map(PhaseId)
    }

    /// Returns the static definition for this phase.
    pub fn definition(&self) -> &'static Phase {
        &PHASES[(self.0 - 1) as usize]
    }
}

impl TryFrom<u8> for PhaseId {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhaseId> for u8 {
    fn from(id: PhaseId) -> Self {
        id.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default completion rule for a phase.
///
/// A phase is complete when *any* populated condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRule {
    /// Complete once the utterance reaches this many words.
    pub min_words: Option<usize>,
    /// Complete when the utterance names a feeling.
    pub emotion_suffices: bool,
    /// Complete once the turn index reaches this value.
    pub min_turn_index: usize,
}

/// Static definition of one reflection phase.
#[derive(Debug)]
pub struct Phase {
    pub id: PhaseId,
    pub title: &'static str,
    pub goal: &'static str,
    /// Rendered verbatim when the phase opens.
    pub initial_prompt: &'static str,
    /// Follow-up questions, selected by clamped index.
    pub probes: &'static [&'static str],
    /// Reflection instruction handed to the text generator.
    pub guidance: &'static str,
    /// Human-readable only; never evaluated.
    pub completion_description: &'static str,
    pub transition_line: &'static str,
    /// Used when the generator comes back empty.
    pub fallback_response: &'static str,
    pub default_rule: DefaultRule,
}

impl Phase {
    /// Clamps `index` to the last available probe.
    pub fn clamp_probe_index(&self, index: usize) -> usize {
        index.min(self.probes.len().saturating_sub(1))
    }

    /// Returns the probe at `index`, repeating the last probe once exhausted.
    pub fn probe(&self, index: usize) -> &'static str {
        self.probes[self.clamp_probe_index(index)]
    }
}

/// All seven phases, in curriculum order.
pub static PHASES: [Phase; 7] = [
    Phase {
        id: PhaseId(1),
        title: "LET'S NAME IT",
        goal: "Invite the user to name one issue that's been on their mind",
        initial_prompt: "What's the situation that's been sticking with you lately?",
        probes: &[
            "Can you tell me more about what specifically is happening?",
            "How often does this situation come up?",
            "What's the impact this is having on your daily life?",
        ],
        guidance: "Reflect what they share and thank them for naming it.",
        completion_description: "When user has clearly described a specific situation or pattern",
        transition_line: "Thank you for naming that. I can hear that this is really affecting you.",
        fallback_response: "I hear that this has been weighing on you. Can you tell me more about how often this happens and how it affects you and your child?",
        default_rule: DefaultRule {
            min_words: Some(5),
            emotion_suffices: false,
            min_turn_index: 1,
        },
    },
    Phase {
        id: PhaseId(2),
        title: "WHAT'S BENEATH THAT?",
        goal: "Help them explore surface and core emotions",
        initial_prompt: "What feelings come up when you think about this?",
        probes: &[
            "Sometimes anger masks hurt or control masks fear. What might be underneath that?",
            "What does that feeling say about what matters to you here?",
            "Those are important feelings. What might be underneath those emotions?",
        ],
        guidance: "Invite insight about what these feelings say about what matters to them.",
        completion_description: "When user has identified both surface and deeper emotions",
        transition_line: "Thank you for being so open about your feelings. It takes courage to explore what's really going on underneath.",
        fallback_response: "Thank you for sharing that. What emotions come up for you when this happens?",
        default_rule: DefaultRule {
            min_words: None,
            emotion_suffices: true,
            min_turn_index: 1,
        },
    },
    Phase {
        id: PhaseId(3),
        title: "YOUR WHY",
        goal: "Help the user clarify their deeper purpose or values",
        initial_prompt: "What is it about this that feels important to you?",
        probes: &[
            "What are you hoping for — for your child, for yourself, or for the relationship?",
            "What's your bigger why here? What do you care about that's showing up in this?",
            "What value or principle feels threatened here?",
        ],
        guidance: "Help them identify what they're hoping for — for their child, for themselves, or for the relationship.",
        completion_description: "When user has identified their core values or deeper 'why'",
        transition_line: "Your values are so clear. Holding onto those, let's take a brave step and consider your co-parent's perspective.",
        fallback_response: "What matters most to you in this situation? What values feel at stake?",
        default_rule: DefaultRule {
            min_words: Some(8),
            emotion_suffices: false,
            min_turn_index: 1,
        },
    },
    Phase {
        id: PhaseId(4),
        title: "STEP INTO YOUR CO-PARENT'S SHOES",
        goal: "Encourage empathy without justification",
        initial_prompt: "If your co-parent described this, how might they see it?",
        probes: &[
            "Even if you don't agree, what do you imagine they're feeling or needing?",
            "What might be driving their reaction? What do they care about, in their own way?",
            "What needs might they be trying to meet?",
        ],
        guidance: "Help the user name their co-parent's possible 'why.' Encourage empathy without justification.",
        completion_description: "When user has genuinely considered co-parent's perspective",
        transition_line: "That took real courage to see things from their perspective. Now let's center your child's experience.",
        fallback_response: "How do you think your co-parent might see this situation?",
        default_rule: DefaultRule {
            min_words: Some(5),
            emotion_suffices: false,
            min_turn_index: 1,
        },
    },
    Phase {
        id: PhaseId(5),
        title: "SEE THROUGH YOUR CHILD'S EYES",
        goal: "Help the user center the child's experience",
        initial_prompt: "What might your child be noticing about this?",
        probes: &[
            "How might they be feeling? What might they need right now — not from either parent, but in general?",
            "What might your child hope you both do next?",
            "What would help them feel safe and loved by both parents?",
        ],
        guidance: "Focus on what the child needs in general, not from either parent specifically.",
        completion_description: "When user has identified child's needs and experience",
        transition_line: "You've done beautiful work centering your child's needs.",
        fallback_response: "What do you think your child notices when this happens?",
        default_rule: DefaultRule {
            min_words: Some(5),
            emotion_suffices: false,
            min_turn_index: 1,
        },
    },
    Phase {
        id: PhaseId(6),
        title: "EXPLORE ALIGNED OPTIONS",
        goal: "Help them generate 2–3 ideas that honor all three perspectives",
        initial_prompt: "Given everything we've explored — your why, your co-parent's possible why, your child's needs — what ideas come to mind?",
        probes: &[
            "What's another way this could work?",
            "How might you modify that to honor everyone's needs?",
            "What would a creative solution look like that works for all three perspectives?",
        ],
        guidance: "Offer to help summarize if they're unsure. Generate 2-3 options that honor all perspectives.",
        completion_description: "When user has generated at least 2-3 viable options that honor all perspectives",
        transition_line: "These are some really thoughtful options. You've found ways to honor everyone's needs.",
        fallback_response: "What are some ways this could work better for everyone?",
        default_rule: DefaultRule {
            min_words: None,
            emotion_suffices: false,
            min_turn_index: 0,
        },
    },
    Phase {
        id: PhaseId(7),
        title: "CHOOSE + COMMUNICATE",
        goal: "Use the CLEAR framework to guide the message",
        initial_prompt: "Which of these feels most aligned with everyone's needs?",
        probes: &[
            "Would you like help crafting a message that reflects shared purpose and CLEAR communication?",
            "How could you make that more concise while keeping it warm?",
            "What would make this easier for your co-parent to hear and engage with?",
        ],
        guidance: "Use CLEAR framework: Concise, Listener-Ready, Essential, Appropriate, Relevant.",
        completion_description: "When user has drafted a clear, respectful message that reflects shared purpose",
        transition_line: "You've done incredible work through all seven phases! Remember, alignment doesn't mean agreement — it means being centered on what matters most.",
        fallback_response: "How would you like to communicate this to your co-parent?",
        default_rule: DefaultRule {
            min_words: None,
            emotion_suffices: false,
            min_turn_index: 0,
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    mod phase_id {
        use super::*;

        #[test]
        fn accepts_one_through_seven() {
            for n in 1..=7 {
                assert_eq!(PhaseId::new(n).unwrap().get(), n);
            }
        }

        #[test]
        fn rejects_out_of_range() {
            assert!(PhaseId::new(0).is_err());
            assert!(PhaseId::new(8).is_err());
        }

        #[test]
        fn last_phase_has_no_successor() {
            assert_eq!(PhaseId::LAST.next(), None);
            assert_eq!(PhaseId::FIRST.next(), Some(PhaseId::new(2).unwrap()));
        }

        #[test]
        fn deserialization_validates_range() {
            let ok: PhaseId = serde_json::from_str("3").unwrap();
            assert_eq!(ok.get(), 3);
            assert!(serde_json::from_str::<PhaseId>("9").is_err());
        }

        #[test]
        fn serializes_as_plain_number() {
            assert_eq!(serde_json::to_string(&PhaseId::LAST).unwrap(), "7");
        }
    }

    mod table {
        use super::*;

        #[test]
        fn ids_form_contiguous_range() {
            for (i, phase) in PHASES.iter().enumerate() {
                assert_eq!(phase.id.get() as usize, i + 1);
            }
            assert_eq!(PhaseId::all().count(), 7);
        }

        #[test]
        fn every_phase_has_prompts_and_probes() {
            for id in PhaseId::all() {
                let phase = id.definition();
                assert!(!phase.initial_prompt.is_empty());
                assert!(!phase.probes.is_empty());
                assert!(!phase.transition_line.is_empty());
                assert!(!phase.fallback_response.is_empty());
            }
        }

        #[test]
        fn options_and_message_phases_complete_on_first_turn() {
            assert_eq!(PhaseId::new(6).unwrap().definition().default_rule.min_turn_index, 0);
            assert_eq!(PhaseId::LAST.definition().default_rule.min_turn_index, 0);
        }
    }

    mod probes {
        use super::*;

        #[test]
        fn probe_index_clamps_to_last() {
            let phase = PhaseId::new(2).unwrap().definition();
            assert_eq!(phase.probes.len(), 3);
            for turn in [5, 6, 7] {
                assert_eq!(phase.clamp_probe_index(turn), 2);
                assert_eq!(phase.probe(turn), phase.probes[2]);
            }
        }

        #[test]
        fn probe_index_within_range_is_unchanged() {
            let phase = PhaseId::FIRST.definition();
            assert_eq!(phase.clamp_probe_index(1), 1);
            assert_eq!(phase.probe(0), phase.probes[0]);
        }
    }
}
