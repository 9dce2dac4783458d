//! Context assembly and the drift guard.
//!
//! The context handed to the completion provider is an ordered stack of
//! system blocks followed by a bounded history window. The drift guard is
//! an injectable predicate so the vocabulary can change without touching
//! the engine's control flow.

use legion_core::{ChatMessage, MessageRole, Mission, Thread, ThreadStage};
use legion_llm::ChatTurn;

/// Default persona block for the orchestrator.
pub const DEFAULT_PERSONA: &str = "You are Praefectus, the orchestrator for the Legion \
    mission control system. Hold a helpful, expert, collaborative tone. Respond in clear, \
    concise prose. No JSON unless explicitly requested.";

const ANTI_DRIFT_DIRECTIVE: &str = "Stay strictly on the thread's stated goal. Do not \
    introduce promotional language, sales pressure, or topics outside that goal.";

/// Tuning knobs for the conversation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub persona: String,
    /// Number of prior turns included in the context window.
    pub history_window: usize,
    pub temperature: f32,
    pub max_tokens: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            history_window: 6,
            temperature: 0.3,
            max_tokens: 800,
        }
    }
}

// ============================================================================
// DRIFT POLICY
// ============================================================================

/// Predicate deciding whether generated text has drifted off the thread's
/// goal. Implementations must be cheap; the engine calls this on every
/// generated reply.
pub trait DriftPolicy: Send + Sync {
    fn is_off_course(&self, text: &str) -> bool;
}

/// Fixed-lexicon drift detection: case-insensitive substring match against
/// a closed term list.
pub struct LexiconDriftPolicy {
    terms: Vec<String>,
}

impl LexiconDriftPolicy {
    pub const DEFAULT_TERMS: &'static [&'static str] = &[
        "buy now",
        "limited time offer",
        "act fast",
        "guaranteed results",
        "special discount",
        "promo code",
        "giveaway",
        "click here",
    ];

    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.into().to_lowercase()).collect(),
        }
    }
}

impl Default for LexiconDriftPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TERMS.iter().copied())
    }
}

impl DriftPolicy for LexiconDriftPolicy {
    fn is_off_course(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.terms.iter().any(|term| lowered.contains(term))
    }
}

// ============================================================================
// CONTEXT ASSEMBLY
// ============================================================================

fn stage_directive(stage: ThreadStage) -> &'static str {
    match stage {
        ThreadStage::Brainstorm => {
            "We are brainstorming. Explore options broadly, surface trade-offs, and ask \
             clarifying questions where the goal is underspecified."
        }
        ThreadStage::Consolidate => {
            "We are consolidating. Synthesize the prior discussion into a short, decisive \
             summary and a concrete plan."
        }
        ThreadStage::Execute => {
            "We are executing. Give direct, actionable next steps only; no open-ended \
             exploration."
        }
    }
}

fn thread_metadata_block(thread: &Thread, mission: Option<&Mission>) -> String {
    let mut block = format!("Thread: {}", thread.title);
    if let Some(goal) = &thread.goal {
        block.push_str(&format!("\nGoal: {}", goal));
    }
    block.push_str(&format!("\nStage: {}", thread.stage));
    if let Some(synopsis) = &thread.synopsis {
        block.push_str(&format!("\nSynopsis: {}", synopsis));
    }
    if let Some(mission) = mission {
        block.push_str(&format!(
            "\nLinked mission: {} (state: {}, posture: {})",
            mission.title, mission.state, mission.posture
        ));
    }
    block
}

/// Assemble the ordered context for one completion call.
///
/// Order: persona, product brief (if configured), thread metadata, stage
/// directive, anti-drift directive, the most recent prior turns in
/// chronological order, then the new human turn.
pub fn assemble_context(
    config: &EngineConfig,
    brief: Option<&str>,
    thread: &Thread,
    mission: Option<&Mission>,
    history: &[ChatMessage],
    text: &str,
) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 6);
    turns.push(ChatTurn::system(config.persona.clone()));
    if let Some(brief) = brief {
        turns.push(ChatTurn::system(format!("Product brief: {}", brief)));
    }
    turns.push(ChatTurn::system(thread_metadata_block(thread, mission)));
    turns.push(ChatTurn::system(stage_directive(thread.stage)));
    turns.push(ChatTurn::system(ANTI_DRIFT_DIRECTIVE));

    let window_start = history.len().saturating_sub(config.history_window);
    for message in &history[window_start..] {
        turns.push(match message.role {
            MessageRole::Human => ChatTurn::user(message.text.clone()),
            MessageRole::Assistant => ChatTurn::assistant(message.text.clone()),
        });
    }
    turns.push(ChatTurn::user(text.to_string()));
    turns
}

/// Build the single corrective call issued after a drift hit.
pub fn corrective_turns(config: &EngineConfig, thread: &Thread, reply: &str) -> Vec<ChatTurn> {
    let goal = thread.goal.as_deref().unwrap_or(&thread.title);
    vec![
        ChatTurn::system(config.persona.clone()),
        ChatTurn::user(format!(
            "Rewrite the reply below so it stays strictly aligned to the goal \"{}\" and \
             the {} stage. Remove anything off-topic or promotional. Return only the \
             rewritten reply.\n\n{}",
            goal, thread.stage, reply
        )),
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use legion_llm::ChatRole;

    fn thread_with_stage(stage: ThreadStage) -> Thread {
        let mut t = Thread::new("Outreach planning", None, Utc::now());
        t.goal = Some("find design partners".to_string());
        t.stage = stage;
        t
    }

    #[test]
    fn test_lexicon_hits_are_case_insensitive() {
        let policy = LexiconDriftPolicy::default();
        assert!(policy.is_off_course("BUY NOW while supplies last"));
        assert!(policy.is_off_course("Use promo code LEGION10"));
        assert!(!policy.is_off_course("Here is a summary of candidate forums."));
    }

    #[test]
    fn test_custom_lexicon_replaces_default() {
        let policy = LexiconDriftPolicy::new(["quantum"]);
        assert!(policy.is_off_course("A Quantum leap"));
        assert!(!policy.is_off_course("buy now"));
    }

    #[test]
    fn test_context_order_and_window() {
        let config = EngineConfig {
            history_window: 2,
            ..Default::default()
        };
        let thread = thread_with_stage(ThreadStage::Consolidate);
        let now = Utc::now();
        let history: Vec<ChatMessage> = (0..5)
            .map(|i| {
                ChatMessage::new(
                    thread.thread_id,
                    None,
                    if i % 2 == 0 { MessageRole::Human } else { MessageRole::Assistant },
                    format!("turn {}", i),
                    now,
                )
            })
            .collect();

        let turns = assemble_context(&config, Some("CLI-first observability"), &thread, None, &history, "next?");

        assert_eq!(turns[0].role, ChatRole::System);
        assert_eq!(turns[0].content, config.persona);
        assert!(turns[1].content.contains("CLI-first observability"));
        assert!(turns[2].content.contains("Outreach planning"));
        assert!(turns[2].content.contains("find design partners"));
        assert!(turns[3].content.contains("consolidating"));
        assert!(turns[4].content.contains("stated goal"));
        // Window of 2: only turns 3 and 4 survive, then the new turn
        assert_eq!(turns.len(), 8);
        assert_eq!(turns[5].content, "turn 3");
        assert_eq!(turns[6].content, "turn 4");
        assert_eq!(turns[7].content, "next?");
        assert_eq!(turns[7].role, ChatRole::User);
    }

    #[test]
    fn test_context_without_brief_or_mission() {
        let config = EngineConfig::default();
        let thread = thread_with_stage(ThreadStage::Brainstorm);
        let turns = assemble_context(&config, None, &thread, None, &[], "hello");
        // persona, metadata, stage, anti-drift, new turn
        assert_eq!(turns.len(), 5);
        assert!(!turns.iter().any(|t| t.content.contains("Product brief")));
    }

    #[test]
    fn test_stage_directives_are_distinct() {
        let texts: Vec<&str> = [ThreadStage::Brainstorm, ThreadStage::Consolidate, ThreadStage::Execute]
            .iter()
            .map(|s| stage_directive(*s))
            .collect();
        assert_ne!(texts[0], texts[1]);
        assert_ne!(texts[1], texts[2]);
    }

    #[test]
    fn test_metadata_block_includes_mission_posture() {
        let thread = thread_with_stage(ThreadStage::Execute);
        let mission = Mission::new(
            "M",
            "obj",
            "research_only",
            legion_core::MissionState::Scanning,
            Utc::now(),
        );
        let block = thread_metadata_block(&thread, Some(&mission));
        assert!(block.contains("posture: research_only"));
        assert!(block.contains("state: scanning"));
    }

    #[test]
    fn test_corrective_turns_reference_goal_and_stage() {
        let config = EngineConfig::default();
        let thread = thread_with_stage(ThreadStage::Execute);
        let turns = corrective_turns(&config, &thread, "BUY NOW");
        assert_eq!(turns.len(), 2);
        assert!(turns[1].content.contains("find design partners"));
        assert!(turns[1].content.contains("execute"));
        assert!(turns[1].content.contains("BUY NOW"));
    }
}
