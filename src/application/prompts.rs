//! Prompt construction for the text generator.
//!
//! The generator sees a fixed system prompt plus the current phase's goal
//! and guidance, what the user said in earlier phases, the exchange so far
//! in this phase, and an instruction specific to the render action. Every
//! instruction embeds the verbatim phase prompt in bold.

use chrono::Timelike;

use crate::domain::foundation::Timestamp;
use crate::domain::reflection::{
    CompletionReason, ConversationState, PhaseId, RenderAction, Transition,
};
use crate::ports::{GenerationRequest, TurnRecord, DEFAULT_MAX_TOKENS};

/// Completion budget for the closing synthesis.
pub const SYNTHESIS_MAX_TOKENS: u32 = 400;

/// Summary calls are short and nearly deterministic.
pub const SUMMARY_MAX_TOKENS: u32 = 25;
pub const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Builds the request for the assistant's reply to a planned transition.
///
/// `phase_turns` are the committed turns of the current phase, oldest first.
pub fn turn_request(
    state: &ConversationState,
    transition: &Transition,
    phase_turns: &[TurnRecord],
) -> GenerationRequest {
    let phase = transition.phase_id.definition();

    let previous_context = state
        .earlier_utterances()
        .map(|(phase_id, u)| format!("Step {}: {}", phase_id, u.text))
        .collect::<Vec<_>>()
        .join("\n");

    let step_history = phase_turns
        .iter()
        .filter(|t| t.transition.utterance.is_some())
        .map(|t| format!("User: {}\nGuide: {}", t.user_text(), t.assistant_text))
        .collect::<Vec<_>>()
        .join("\n");

    let system_context = format!(
        "{}\n\nCurrent step {}: {}\nGuidance: {}\n\nPrevious context:\n{}",
        SYSTEM_PROMPT,
        transition.phase_id,
        phase.goal,
        phase.guidance,
        or_none(&previous_context),
    );

    let latest = transition
        .utterance
        .as_ref()
        .map(|u| u.text.as_str())
        .unwrap_or("");

    let user_context = format!(
        "Step history:\n{}\n\nLatest response: \"{}\"\n\n{}\n\n{}",
        or_none(&step_history),
        latest,
        action_instruction(transition),
        CRITICAL_INSTRUCTIONS,
    );

    let max_tokens = match transition.action {
        RenderAction::TerminalSynthesis => SYNTHESIS_MAX_TOKENS,
        _ => DEFAULT_MAX_TOKENS,
    };

    GenerationRequest::new(system_context, user_context).with_max_tokens(max_tokens)
}

/// Builds the request for a sealed phase's sidebar headline.
pub fn summary_request(phase_id: PhaseId, utterances: &[&str]) -> GenerationRequest {
    let user_context = format!(
        "Phase {} ({}): The user shared: \"{}\"\n\nCreate a compact summary phrase (5-12 words max).",
        phase_id,
        phase_id.definition().title,
        utterances.join(" "),
    );
    GenerationRequest::new(SUMMARY_SYSTEM_PROMPT, user_context)
        .with_max_tokens(SUMMARY_MAX_TOKENS)
        .with_temperature(SUMMARY_TEMPERATURE)
}

/// Reply used when the generator returns nothing.
pub fn fallback_reply(transition: &Transition) -> String {
    let phase = transition.phase_id.definition();
    format!("{}\n\n**{}**", phase.fallback_response, transition.prompt_text)
}

/// Opening message for a new conversation.
pub fn opening_message(at: Timestamp) -> String {
    let first = PhaseId::FIRST.definition();
    format!(
        "{}\n\n**{}. {}**\n**{}**",
        welcome_message(at),
        first.id,
        first.title,
        first.initial_prompt
    )
}

fn welcome_message(at: Timestamp) -> String {
    let dt = at.as_datetime();
    let greeting = match dt.hour() {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        17..=20 => "Good evening",
        _ => "Hello",
    };
    let template = WELCOME_MESSAGES[dt.minute() as usize % WELCOME_MESSAGES.len()];
    template.replace("{greeting}", greeting)
}

fn action_instruction(transition: &Transition) -> String {
    let phase = transition.phase_id.definition();
    let prompt = &transition.prompt_text;

    match transition.action {
        RenderAction::AcknowledgeAndAdvance { next_phase } => {
            let opener = match transition.evaluation.map(|e| e.reason) {
                Some(CompletionReason::ExplicitSignal) => {
                    "Acknowledge their readiness to move forward"
                }
                Some(CompletionReason::Fatigue) => {
                    "Honor their brief response"
                }
                _ => "Validate",
            };
            format!(
                "PHASE TRANSITION - Be CONCISE per BeH2O CLEAR principles.\n\n\
                 {}: \"{}\"\n\n\
                 Brief synthesis connecting this phase to their journey. Reference ONE specific thing they said.\n\n\
                 ---\n\n\
                 **{}. {}**\n**{}**\n\n\
                 BE CONCISE: 2-3 sentences MAX before the separator. Use the EXACT prompt shown above - copy it VERBATIM, do NOT paraphrase.",
                opener,
                phase.transition_line,
                next_phase,
                next_phase.definition().title,
                prompt,
            )
        }
        RenderAction::TerminalSynthesis => SYNTHESIS_INSTRUCTIONS.replace("{closing}", prompt),
        RenderAction::Probe { .. } | RenderAction::InitialPrompt { deepen: true } => format!(
            "DEEPER EXPLORATION - Be CONCISE:\n\nValidate briefly (1 sentence). {}\n\n**{}**",
            phase.guidance, prompt
        ),
        RenderAction::InitialPrompt { deepen: false } => format!(
            "FIRST RESPONSE - Be CONCISE:\n\n{} Acknowledge what you heard (1-2 sentences).\n\n**{}**",
            phase.guidance, prompt
        ),
        RenderAction::AcknowledgeAndProbe { .. } => format!(
            "CONTINUING EXPLORATION - Be CONCISE:\n\nReflect and validate (1-2 sentences). {}\n\n**{}**",
            phase.guidance, prompt
        ),
    }
}

fn or_none(s: &str) -> &str {
    if s.is_empty() {
        "None"
    } else {
        s
    }
}

// ============================================================================
// Templates
// ============================================================================

const SYSTEM_PROMPT: &str = r#"You are BeAligned™ Beta Lite — a warm, grounded, nonjudgmental reflection bot built to support one co-parent in thinking through a current challenge. Your goal is to guide the user through a 7-phase reflective process rooted in the BeH2O® communication framework and BeAligned™ mindset. You help the user uncover their deeper purpose ("why"), consider the perspectives of others, and move toward aligned, child-centered communication.

You are NOT a therapist, mediator, or legal advisor. You do not make decisions or take sides. You do not use robotic scripts or generic advice. Your job is to invite clarity, calm, and compassion — step by step.

CONVERSATIONAL APPROACH:
- Respond naturally and warmly in your validation and reflections
- Use the EXACT BeAligned prompts provided - DO NOT paraphrase or modify them
- Acknowledge what the user shares with genuine validation before asking the exact prompt
- Be conversational in your reflections but use prompts VERBATIM
- Stay present with their emotions and reflect back what you're hearing
- SYNTHESIZE themes from across phases - connect current insights to earlier emotions and values
- Be CONCISE per BeH2O CLEAR principles - 2-3 sentences maximum

PHASE PROGRESSION:
- When transitioning, use warm acknowledgment + natural bridge to next phase
- Don't announce phase changes - let them flow naturally
- Ask one thoughtful question at a time

Key principles:
- Always respond with warmth, neutrality, and reflection
- Remind the user that alignment doesn't mean agreement — it means being centered on what matters most
- Invite emotional regulation or pause if the user seems escalated
- You don't have to solve the problem — you help the user uncover the path forward
- Never judge or take sides - stay curious and supportive"#;

const CRITICAL_INSTRUCTIONS: &str = r#"CRITICAL INSTRUCTIONS:
1. Be CONCISE per BeH2O CLEAR principles - Use 2-3 sentences MAX for validation/reflection
2. ALWAYS use the EXACT prompt text provided above in bold - DO NOT paraphrase or create your own questions
3. The bold prompt must be VERBATIM as shown - copy it exactly word-for-word
4. Get to the point quickly while remaining warm and professional"#;

const SYNTHESIS_INSTRUCTIONS: &str = r#"FINAL PHASE COMPLETION - Create a well-formatted response that synthesizes their entire 7-phase journey.

Begin with this line, verbatim:

**{closing}**

Then:
1. Reflect the issue they named, the emotions beneath it, and their deeper why.
2. Reflect what they saw from their co-parent's perspective and their child's needs.
3. Offer their CLEAR message to their co-parent: "I feel [emotion] when [situation] because [child-centered shared outcome]. [Collaborative invitation]"
4. Close by reminding them that alignment doesn't mean agreement — it means staying centered on what matters most.

Use short sections separated by horizontal lines (---)."#;

const SUMMARY_SYSTEM_PROMPT: &str = "You are creating ultra-compact phase summaries for a sidebar. Create a single, concise phrase (5-12 words max) that captures the essence of what the user shared. Be empathetic but extremely brief - like a headline or key insight.";

const WELCOME_MESSAGES: [&str; 4] = [
    "{greeting}, and welcome. I'm here to support you through whatever's on your mind today. This is your space to explore, reflect, and find clarity.",
    "{greeting}. Thank you for being here. Taking time to reflect on challenging situations shows real strength and care for your family's wellbeing.",
    "{greeting}, friend. I know it takes courage to work through difficult co-parenting moments. You're in a safe space here to explore your thoughts and feelings.",
    "{greeting}. I'm glad you're here. Sometimes the path forward becomes clearer when we take a moment to pause and reflect together.",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use crate::domain::reflection::ProgressionController;
    use chrono::{TimeZone, Utc};

    fn plan(state: &ConversationState, text: &str) -> Transition {
        ProgressionController::default().plan(state, text, None).unwrap()
    }

    fn fresh() -> ConversationState {
        ConversationState::start(ConversationId::new(), Timestamp::now())
    }

    #[test]
    fn advance_embeds_next_prompt_verbatim() {
        let state = fresh();
        let t = plan(&state, "My ex keeps showing up late for pickups");
        let request = turn_request(&state, &t, &[]);

        let next = PhaseId::new(2).unwrap().definition().initial_prompt;
        assert!(request.user_context.contains(&format!("**{}**", next)));
        assert!(request.user_context.contains("PHASE TRANSITION"));
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn system_context_carries_goal_and_guidance() {
        let state = fresh();
        let t = plan(&state, "he is late");
        let request = turn_request(&state, &t, &[]);

        let phase = PhaseId::FIRST.definition();
        assert!(request.system_context.contains(phase.goal));
        assert!(request.system_context.contains(phase.guidance));
        assert!(request.system_context.ends_with("Previous context:\nNone"));
        assert!(request.user_context.contains("FIRST RESPONSE"));
    }

    #[test]
    fn earlier_phases_feed_previous_context() {
        let mut state = fresh();
        let t = plan(&state, "My ex keeps showing up late for pickups");
        state.commit(&t, None, Timestamp::now()).unwrap();

        let t = plan(&state, "idk");
        let request = turn_request(&state, &t, &[]);
        assert!(request
            .system_context
            .contains("Step 1: My ex keeps showing up late for pickups"));
        assert!(request.user_context.contains("DEEPER EXPLORATION"));
    }

    #[test]
    fn terminal_synthesis_uses_larger_budget() {
        let controller = ProgressionController::default();
        let mut state = fresh();
        while state.current_phase_id() != PhaseId::LAST {
            let t = controller.plan(&state, "that's it", None).unwrap();
            state.commit(&t, None, Timestamp::now()).unwrap();
        }
        let t = plan(&state, "Could we swap the first weekend of May?");
        let request = turn_request(&state, &t, &[]);

        assert_eq!(request.max_tokens, SYNTHESIS_MAX_TOKENS);
        assert!(request
            .user_context
            .contains(PhaseId::LAST.definition().transition_line));
    }

    #[test]
    fn fallback_ends_with_verbatim_prompt() {
        let state = fresh();
        let t = plan(&state, "he is late");
        let reply = fallback_reply(&t);
        assert!(reply.starts_with(PhaseId::FIRST.definition().fallback_response));
        assert!(reply.ends_with(&format!("**{}**", PhaseId::FIRST.definition().initial_prompt)));
    }

    #[test]
    fn summary_request_is_short_and_cool() {
        let request = summary_request(PhaseId::FIRST, &["late pickups", "every week"]);
        assert_eq!(request.max_tokens, SUMMARY_MAX_TOKENS);
        assert_eq!(request.temperature, Some(SUMMARY_TEMPERATURE));
        assert!(request.user_context.contains("late pickups every week"));
    }

    #[test]
    fn opening_message_greets_by_time_of_day() {
        let morning = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let message = opening_message(morning);
        assert!(message.starts_with("Good morning"));
        assert!(message.ends_with(&format!("**{}**", PhaseId::FIRST.definition().initial_prompt)));

        let late = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 1, 23, 1, 0).unwrap());
        assert!(opening_message(late).starts_with("Hello"));
    }
}
