//! Zep Agent Memory
//!
//! Long-term conversation memory for agents, backed by the Zep service:
//! - `ZepConversableAgent` recalls and stores chat history under the agent's name
//! - `ZepMemory` saves role-tagged messages and recalls relevant ones as text
//! - Both forward to a `MemoryStore` and never surface remote failures
//!
//! FLOW:
//! AGENT → ADAPTER → MEMORY STORE → ZEP API

pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod store;
pub mod zep;

pub use error::{MemoryError, Result};

// Re-export common types
pub use models::*;
pub use agent::{HistoryProvider, ZepConversableAgent};
pub use config::{MemorySettings, ZepConfig};
pub use memory::{AgentMemory, MemoryDescriptor, ZepMemory};
pub use store::{InMemoryStore, MemoryStore};
pub use zep::ZepClient;
