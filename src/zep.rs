//! Zep API client
//!
//! Session-scoped memory calls against the Zep v2 HTTP API.
//! Uses a long-lived reqwest::Client for connection pooling.

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::ZepConfig;
use crate::error::MemoryError;
use crate::models::{MemoryRecord, MessageRole, SearchHit, SearchQuery, SessionId};
use crate::store::MemoryStore;

/// Reusable Zep client (connection-pooled)
pub struct ZepClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl ZepClient {
    pub fn from_config(config: &ZepConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MemoryError::Config("ZEP_API_KEY not configured".to_string()))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MemoryError::Config(format!("Invalid Zep base URL {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::Config(format!(
                "Zep base URL cannot carry a path: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        info!(base_url = %base_url, "Zep client initialized");

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// `{base}/api/v2/sessions/{session}/{tail}` with the session id as one escaped segment
    fn session_url(&self, session: &SessionId, tail: &str) -> crate::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MemoryError::Config("Zep base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "v2", "sessions", session.as_str(), tail]);
        Ok(url)
    }

    fn auth_header(&self) -> String {
        format!("Api-Key {}", self.api_key)
    }

    async fn check_status(response: Response, operation: &str) -> crate::Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(operation, status = status.as_u16(), "Zep API error response: {}", body);
        Err(MemoryError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl MemoryStore for ZepClient {

    async fn add_memory(&self, session: &SessionId, records: Vec<MemoryRecord>) -> crate::Result<()> {
        let url = self.session_url(session, "memory")?;
        let request = AddMemoryRequest {
            messages: records.iter().map(WireMessage::from).collect(),
        };

        debug!(session = %session, count = request.messages.len(), "Adding memory to Zep");

        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&request)
            .send()
            .await?;

        Self::check_status(response, "add_memory").await?;
        Ok(())
    }

    async fn search_memory(
        &self,
        session: &SessionId,
        query: &SearchQuery,
    ) -> crate::Result<Vec<SearchHit>> {
        let url = self.session_url(session, "search")?;
        let request = SearchRequest {
            text: &query.text,
            metadata: &query.metadata,
            limit: query.limit,
            min_score: query.min_score,
        };

        debug!(session = %session, limit = query.limit, "Searching Zep memory");

        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&request)
            .send()
            .await?;

        let response = Self::check_status(response, "search_memory").await?;
        let body = response.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&body)?;

        Ok(parsed
            .into_hits()
            .into_iter()
            .filter_map(|hit| {
                let score = hit.score.or(hit.dist);
                hit.message.map(|message| SearchHit {
                    record: message.into(),
                    score,
                })
            })
            .collect())
    }

    async fn get_memory(&self, session: &SessionId, last_n: usize) -> crate::Result<Vec<MemoryRecord>> {
        let mut url = self.session_url(session, "memory")?;
        url.query_pairs_mut()
            .append_pair("lastn", &last_n.to_string());

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        let response = Self::check_status(response, "get_memory").await?;
        let body = response.bytes().await?;
        let parsed: GetMemoryResponse = serde_json::from_slice(&body)?;

        Ok(parsed.messages.into_iter().map(MemoryRecord::from).collect())
    }

    async fn delete_memory(&self, session: &SessionId) -> crate::Result<()> {
        let url = self.session_url(session, "memory")?;

        let response = self
            .client
            .delete(url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        Self::check_status(response, "delete_memory").await?;
        Ok(())
    }
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
struct AddMemoryRequest {
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    text: &'a str,
    metadata: &'a serde_json::Map<String, serde_json::Value>,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_score: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role_type: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl From<&MemoryRecord> for WireMessage {
    fn from(record: &MemoryRecord) -> Self {
        Self {
            role_type: record.role.as_str().to_string(),
            content: record.content.clone(),
            uuid: None,
            created_at: None,
        }
    }
}

impl From<WireMessage> for MemoryRecord {
    fn from(message: WireMessage) -> Self {
        // Zep also emits "norole"; treat anything outside our set as the model's voice
        let role = MessageRole::from_str(&message.role_type).unwrap_or(MessageRole::Assistant);

        MemoryRecord {
            role,
            content: message.content,
            uuid: message.uuid,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireHit {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    dist: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped {
        #[serde(default)]
        results: Vec<WireHit>,
    },
    Bare(Vec<WireHit>),
}

impl SearchResponse {
    fn into_hits(self) -> Vec<WireHit> {
        match self {
            SearchResponse::Wrapped { results } => results,
            SearchResponse::Bare(hits) => hits,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetMemoryResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ZepClient {
        let config = ZepConfig::default()
            .with_api_key("test-key")
            .with_base_url(base_url);
        ZepClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_missing_api_key() {
        let result = ZepClient::from_config(&ZepConfig::default());
        let err = result.err().expect("client should not build without a key");
        assert!(err.to_string().to_lowercase().contains("zep_api_key"));
    }

    #[test]
    fn test_session_url_escapes_session_id() {
        let zep = client("http://localhost:8000/");
        let session = SessionId::new("team/alpha beta").unwrap();

        let url = zep.session_url(&session, "search").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v2/sessions/team%2Falpha%20beta/search"
        );
    }

    #[test]
    fn test_session_url_dotted_ids_stay_in_path() {
        let zep = client("http://localhost:8000/");

        for id in ["..", "."] {
            assert!(SessionId::new(id).is_err());
        }

        for (id, expected) in [
            ("...", "http://localhost:8000/api/v2/sessions/.../memory"),
            ("a..b", "http://localhost:8000/api/v2/sessions/a..b/memory"),
            ("../memory", "http://localhost:8000/api/v2/sessions/..%2Fmemory/memory"),
        ] {
            let session = SessionId::new(id).unwrap();
            let url = zep.session_url(&session, "memory").unwrap();
            assert_eq!(url.as_str(), expected);
        }
    }

    #[test]
    fn test_session_url_keeps_base_path() {
        let zep = client("https://proxy.example.com/zep");
        let session = SessionId::new("s1").unwrap();

        let url = zep.session_url(&session, "memory").unwrap();
        assert_eq!(url.as_str(), "https://proxy.example.com/zep/api/v2/sessions/s1/memory");
    }

    #[test]
    fn test_search_request_serialization() {
        let metadata = serde_json::Map::new();
        let request = SearchRequest {
            text: "portfolio",
            metadata: &metadata,
            limit: 5,
            min_score: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["limit"], 5);
        assert!(json.get("min_score").is_none());
    }

    #[test]
    fn test_search_response_shapes() {
        let wrapped: SearchResponse = serde_json::from_str(
            r#"{"results":[{"message":{"role_type":"user","content":"a"},"score":0.9}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_hits().len(), 1);

        let bare: SearchResponse = serde_json::from_str(
            r#"[{"message":{"role_type":"norole","content":"b"},"dist":0.4},{"summary":{"content":"s"}}]"#,
        )
        .unwrap();
        let hits = bare.into_hits();
        assert_eq!(hits.len(), 2);
        assert!(hits[1].message.is_none());
    }

    #[test]
    fn test_unknown_role_type_maps_to_assistant() {
        let message: WireMessage =
            serde_json::from_str(r#"{"role_type":"norole","content":"x"}"#).unwrap();
        let record = MemoryRecord::from(message);
        assert_eq!(record.role, MessageRole::Assistant);
    }
}
