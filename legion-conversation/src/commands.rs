//! Command Trigger Dispatcher phrase table.
//!
//! Matching is deliberately brittle: exact phrases on trimmed, case-folded
//! text. Free-form intent parsing would change observable behavior, so the
//! table stays literal and closed.

/// Action bound to a recognized phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandIntent {
    CreateMission,
    RunMission,
    PauseMission,
    StopMission,
    AbortMission,
}

/// The full phrase table. Every entry is already lowercase.
pub const TRIGGER_TABLE: &[(&str, CommandIntent)] = &[
    ("create mission now", CommandIntent::CreateMission),
    ("approve and create mission now", CommandIntent::CreateMission),
    ("create & start mission now", CommandIntent::CreateMission),
    ("run mission now", CommandIntent::RunMission),
    ("pause mission", CommandIntent::PauseMission),
    ("stop mission", CommandIntent::StopMission),
    ("abort mission", CommandIntent::AbortMission),
];

/// Trim and case-fold inbound text before table lookup.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Exact match against the trigger table on the normalized text.
pub fn match_command(text: &str) -> Option<CommandIntent> {
    let normalized = normalize(text);
    TRIGGER_TABLE
        .iter()
        .find(|(phrase, _)| *phrase == normalized)
        .map(|(_, intent)| *intent)
}

// ============================================================================
// TESTS
// ============================================================================
