//! Zep-backed agent memory
//!
//! Saves role-tagged messages under one session and recalls the
//! top-k relevant ones as plain text for prompt context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{MemorySettings, ZepConfig};
use crate::memory::AgentMemory;
use crate::models::{ChatMessage, MemoryRecord, MessageRole, SearchQuery, SessionId};
use crate::store::MemoryStore;
use crate::zep::ZepClient;

/// Serializable description of a memory's configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryDescriptor {
    pub session_id: String,
    pub memory_type: String,
    pub memory_retrieval: String,
}

pub struct ZepMemory {
    session_id: SessionId,
    store: Arc<dyn MemoryStore>,
    settings: MemorySettings,
}

impl ZepMemory {
    pub fn new(
        session_id: impl Into<String>,
        store: Arc<dyn MemoryStore>,
        settings: MemorySettings,
    ) -> crate::Result<Self> {
        let session_id = SessionId::new(session_id)?;
        info!(session = %session_id, "ZepMemory initialized");

        Ok(Self {
            session_id,
            store,
            settings,
        })
    }

    /// Build against the hosted service using `ZEP_*` environment settings
    pub fn from_env(session_id: impl Into<String>, settings: MemorySettings) -> crate::Result<Self> {
        let client = ZepClient::from_config(&ZepConfig::from_env())?;
        Self::new(session_id, Arc::new(client), settings)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    /// Last `last_n` stored messages, oldest first; empty on failure
    pub async fn recent_messages(&self, last_n: usize) -> Vec<ChatMessage> {
        match self.store.get_memory(&self.session_id, last_n).await {
            Ok(records) => records.into_iter().map(ChatMessage::from).collect(),
            Err(e) => {
                warn!(session = %self.session_id, "Zep memory fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Drop everything stored for this session
    pub async fn clear(&self) {
        if let Err(e) = self.store.delete_memory(&self.session_id).await {
            warn!(session = %self.session_id, "Zep memory delete failed: {}", e);
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.to_dict()).unwrap_or(serde_json::Value::Null)
    }
}

#[async_trait]
impl AgentMemory for ZepMemory {

    async fn save_message(&self, role: &str, message: &str) {
        debug!(session = %self.session_id, role, message, "Saving message to Zep");

        let role = match MessageRole::from_str(role) {
            Ok(role) => role,
            Err(e) => {
                warn!(session = %self.session_id, "Zep memory storage skipped: {}", e);
                return;
            }
        };

        let record = MemoryRecord::new(role, message);
        if let Err(e) = self.store.add_memory(&self.session_id, vec![record]).await {
            warn!(session = %self.session_id, "Zep memory storage failed: {}", e);
        }
    }

    async fn retrieve_memories(&self, query: &str) -> String {
        debug!(session = %self.session_id, query, "Retrieving memory");

        let search = SearchQuery::new(query, self.settings.top_k)
            .with_min_score(self.settings.relevance_threshold);

        match self.store.search_memory(&self.session_id, &search).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| hit.record.content)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!(session = %self.session_id, "Zep memory search failed: {}", e);
                String::new()
            }
        }
    }

    fn to_dict(&self) -> MemoryDescriptor {
        MemoryDescriptor {
            session_id: self.session_id.to_string(),
            memory_type: self.settings.memory_type.clone(),
            memory_retrieval: self.settings.memory_retrieval.clone(),
        }
    }
}
