//! Core data models shared by the memory adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MemoryError;

//
// ================= Session =================
//

/// Identifier scoping memory reads and writes in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MemoryError::InvalidSession(
                "session id must not be empty".to_string(),
            ));
        }
        // URL path resolution would drop these segments
        if id == "." || id == ".." {
            return Err(MemoryError::InvalidSession(format!(
                "session id {:?} is a relative path segment",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = MemoryError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ================= Roles =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
    Function,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
            MessageRole::Tool => "tool",
            MessageRole::Function => "function",
        }
    }
}

impl FromStr for MessageRole {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            "tool" => Ok(MessageRole::Tool),
            "function" => Ok(MessageRole::Function),
            other => Err(MemoryError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ================= Messages =================
//

/// A role-tagged message as persisted by the memory service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub role: MessageRole,
    pub content: String,
    /// Assigned by the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            uuid: None,
            created_at: None,
        }
    }
}

/// Role/content pair in the shape the agent runtime exchanges
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl From<&ChatMessage> for MemoryRecord {
    fn from(message: &ChatMessage) -> Self {
        MemoryRecord::new(message.role, message.content.clone())
    }
}

impl From<MemoryRecord> for ChatMessage {
    fn from(record: MemoryRecord) -> Self {
        ChatMessage {
            role: record.role,
            content: record.content,
        }
    }
}

//
// ================= Search =================
//

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub limit: usize,
    /// Relevance threshold, interpreted by the remote service
    pub min_score: Option<f32>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            metadata: serde_json::Map::new(),
            limit,
            min_score: None,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: MemoryRecord,
    pub score: Option<f64>,
}
