//! LEGION Conversation - Chat Orchestration
//!
//! Per inbound message: persist the human turn, try the command trigger
//! table, otherwise assemble context and call the completion provider with
//! a single drift-triggered redraft. Commands delegate to the mission
//! lifecycle and never invoke the provider.

pub mod commands;
pub mod context;
pub mod engine;

pub use commands::{match_command, normalize, CommandIntent, TRIGGER_TABLE};
pub use context::{
    assemble_context, corrective_turns, DriftPolicy, EngineConfig, LexiconDriftPolicy,
    DEFAULT_PERSONA,
};
pub use engine::{ChatReply, ConversationEngine, DEFAULT_THREAD_TITLE};
