//! Agent Memory
//!
//! Long-term memory the agent runtime saves to and recalls from.
//! Backed by any `MemoryStore`; remote failures never reach the caller.

pub mod zep_memory;

pub use zep_memory::{MemoryDescriptor, ZepMemory};

use async_trait::async_trait;

/// Memory hooks the agent runtime calls during a conversation
#[async_trait]
pub trait AgentMemory: Send + Sync {
    /// Persist one message; failures are logged and dropped
    async fn save_message(&self, role: &str, message: &str);

    /// Relevant memories for `query`, newline-joined; empty on failure
    async fn retrieve_memories(&self, query: &str) -> String;

    fn to_dict(&self) -> MemoryDescriptor;
}
