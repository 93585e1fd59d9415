//! Memory store layer
//!
//! Session-scoped add/search operations the adapters forward to.
//! `ZepClient` talks to the hosted service; `InMemoryStore` is for development.

use crate::models::{MemoryRecord, SearchHit, SearchQuery, SessionId};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for remote memory persistence
#[async_trait::async_trait]
pub trait MemoryStore: Send + Sync {
    async fn add_memory(&self, session: &SessionId, records: Vec<MemoryRecord>) -> Result<()>;
    async fn search_memory(&self, session: &SessionId, query: &SearchQuery) -> Result<Vec<SearchHit>>;
    /// Most recent `last_n` records, oldest first
    async fn get_memory(&self, session: &SessionId, last_n: usize) -> Result<Vec<MemoryRecord>>;
    async fn delete_memory(&self, session: &SessionId) -> Result<()>;
}

/// In-memory store for development and tests
pub struct InMemoryStore {
    sessions: Arc<RwLock<HashMap<SessionId, Vec<MemoryRecord>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MemoryStore for InMemoryStore {

    async fn add_memory(&self, session: &SessionId, records: Vec<MemoryRecord>) -> Result<()> {
        let now = chrono::Utc::now();

        let mut sessions = self.sessions.write().await;
        let stored = sessions.entry(session.clone()).or_default();

        for mut record in records {
            record.uuid.get_or_insert_with(uuid::Uuid::new_v4);
            record.created_at.get_or_insert(now);
            stored.push(record);
        }

        Ok(())
    }

    /// Substring match, newest first. No scoring: `min_score` is ignored.
    async fn search_memory(&self, session: &SessionId, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let needle = query.text.to_lowercase();
        let sessions = self.sessions.read().await;

        let Some(records) = sessions.get(session) else {
            return Ok(Vec::new());
        };

        Ok(records
            .iter()
            .rev()
            .filter(|r| needle.is_empty() || r.content.to_lowercase().contains(&needle))
            .take(query.limit)
            .map(|r| SearchHit {
                record: r.clone(),
                score: None,
            })
            .collect())
    }

    async fn get_memory(&self, session: &SessionId, last_n: usize) -> Result<Vec<MemoryRecord>> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .get(session)
            .map(|records| {
                let skip = records.len().saturating_sub(last_n);
                records[skip..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn delete_memory(&self, session: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    fn session(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_remote_fields() {
        let store = InMemoryStore::new();
        let s = session("s1");

        store
            .add_memory(&s, vec![MemoryRecord::new(MessageRole::User, "hello")])
            .await
            .unwrap();

        let records = store.get_memory(&s, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].uuid.is_some());
        assert!(records[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_search_filters_and_limits() {
        let store = InMemoryStore::new();
        let s = session("s1");

        let records = (0..6)
            .map(|i| MemoryRecord::new(MessageRole::User, format!("note {} about RSI", i)))
            .chain(std::iter::once(MemoryRecord::new(MessageRole::Assistant, "unrelated")))
            .collect();
        store.add_memory(&s, records).await.unwrap();

        let hits = store
            .search_memory(&s, &SearchQuery::new("rsi", 3))
            .await
            .unwrap();
        let contents: Vec<_> = hits.iter().map(|h| h.record.content.as_str()).collect();
        assert_eq!(contents, vec!["note 5 about RSI", "note 4 about RSI", "note 3 about RSI"]);

        let all = store
            .search_memory(&s, &SearchQuery::new("", 50))
            .await
            .unwrap();
        assert_eq!(all.len(), 7);
    }

    #[test]
    fn test_sessions_are_isolated() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let a = session("a");
            let b = session("b");

            store
                .add_memory(&a, vec![MemoryRecord::new(MessageRole::User, "only in a")])
                .await
                .unwrap();

            assert!(store.get_memory(&b, 5).await.unwrap().is_empty());
            assert!(store
                .search_memory(&b, &SearchQuery::new("", 5))
                .await
                .unwrap()
                .is_empty());
        });
    }

    #[tokio::test]
    async fn test_get_memory_returns_tail_oldest_first() {
        let store = InMemoryStore::new();
        let s = session("s1");

        let records = (0..5)
            .map(|i| MemoryRecord::new(MessageRole::User, format!("m{}", i)))
            .collect();
        store.add_memory(&s, records).await.unwrap();

        let tail = store.get_memory(&s, 2).await.unwrap();
        let contents: Vec<_> = tail.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);

        store.delete_memory(&s).await.unwrap();
        assert!(store.get_memory(&s, 2).await.unwrap().is_empty());
    }
}
