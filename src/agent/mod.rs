//! Conversable agent with Zep-backed history
//!
//! The agent's name doubles as its Zep session id. History is recalled
//! from the store only when the runtime hands over no messages of its own.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::DEFAULT_TOP_K;
use crate::models::{ChatMessage, MemoryRecord, SearchQuery, SessionId};
use crate::store::MemoryStore;

/// History hooks the agent runtime calls around each turn
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn retrieve_history(&self, messages: Option<Vec<ChatMessage>>) -> Vec<ChatMessage>;
    async fn store_message(&self, message: &ChatMessage);
}

pub struct ZepConversableAgent {
    name: SessionId,
    store: Arc<dyn MemoryStore>,
    memory_retrieval: bool,
    top_k: usize,
}

impl ZepConversableAgent {
    pub fn new(name: impl Into<String>, store: Arc<dyn MemoryStore>) -> crate::Result<Self> {
        let name = SessionId::new(name)?;
        info!(agent = %name, "Zep conversable agent created");

        Ok(Self {
            name,
            store,
            memory_retrieval: true,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub fn with_memory_retrieval(mut self, enabled: bool) -> Self {
        self.memory_retrieval = enabled;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn memory_retrieval(&self) -> bool {
        self.memory_retrieval
    }
}

#[async_trait]
impl HistoryProvider for ZepConversableAgent {

    async fn retrieve_history(&self, messages: Option<Vec<ChatMessage>>) -> Vec<ChatMessage> {
        if let Some(messages) = messages {
            return messages;
        }

        if !self.memory_retrieval {
            return Vec::new();
        }

        let query = SearchQuery::new("", self.top_k);

        match self.store.search_memory(&self.name, &query).await {
            // Recalled memories are presented to the model as its own prior turns
            Ok(hits) => hits
                .into_iter()
                .map(|hit| ChatMessage::assistant(hit.record.content))
                .collect(),
            Err(e) => {
                warn!(agent = %self.name, "Zep memory search failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn store_message(&self, message: &ChatMessage) {
        let record = MemoryRecord::from(message);

        if let Err(e) = self.store.add_memory(&self.name, vec![record]).await {
            warn!(agent = %self.name, "Zep memory storage failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;
    use crate::models::{MessageRole, SearchHit};
    use crate::store::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails every one of them
    #[derive(Default)]
    struct BrokenStore {
        calls: AtomicUsize,
    }

    impl BrokenStore {
        fn fail(&self) -> MemoryError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MemoryError::Remote { status: 500, body: "boom".to_string() }
        }
    }

    #[async_trait]
    impl MemoryStore for BrokenStore {
        async fn add_memory(&self, _: &SessionId, _: Vec<MemoryRecord>) -> crate::Result<()> {
            Err(self.fail())
        }

        async fn search_memory(&self, _: &SessionId, _: &SearchQuery) -> crate::Result<Vec<SearchHit>> {
            Err(self.fail())
        }

        async fn get_memory(&self, _: &SessionId, _: usize) -> crate::Result<Vec<MemoryRecord>> {
            Err(self.fail())
        }

        async fn delete_memory(&self, _: &SessionId) -> crate::Result<()> {
            Err(self.fail())
        }
    }

    #[tokio::test]
    async fn test_supplied_messages_skip_the_store() {
        let store = Arc::new(BrokenStore::default());
        let agent = ZepConversableAgent::new("planner", store.clone()).unwrap();

        let supplied = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let history = agent.retrieve_history(Some(supplied.clone())).await;

        assert_eq!(history, supplied);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_are_masked() {
        let store = Arc::new(BrokenStore::default());
        let agent = ZepConversableAgent::new("planner", store.clone()).unwrap();

        agent.store_message(&ChatMessage::user("remember this")).await;
        assert!(agent.retrieve_history(None).await.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_recalled_history_is_assistant_role() {
        let agent = ZepConversableAgent::new("planner", Arc::new(InMemoryStore::new()))
            .unwrap()
            .with_top_k(2);

        for text in ["one", "two", "three"] {
            agent.store_message(&ChatMessage::user(text)).await;
        }

        let history = agent.retrieve_history(None).await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.role == MessageRole::Assistant));
        assert_eq!(history[0].content, "three");
    }

    #[tokio::test]
    async fn test_retrieval_disabled() {
        let store = Arc::new(BrokenStore::default());
        let agent = ZepConversableAgent::new("planner", store.clone())
            .unwrap()
            .with_memory_retrieval(false);

        assert!(!agent.memory_retrieval());
        assert!(agent.retrieve_history(None).await.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }
}
