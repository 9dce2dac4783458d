//! LEGION Storage - store traits and in-memory backend
//!
//! This crate defines the async store traits the service layers depend on,
//! plus `InMemoryStore`, a thread-safe implementation used for development
//! and tests. The traits are the seam: a durable backend can replace the
//! in-memory one without touching the service crates.

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{
    AgentStatusStore, EventFilter, EventSink, GuardrailStore, HotLeadStore, MessageStore,
    MissionStore, ThreadStore,
};
