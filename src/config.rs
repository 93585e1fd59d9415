//! Environment-driven configuration for the Zep client and memory adapters

use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_ZEP_API_URL: &str = "https://api.getzep.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOP_K: usize = 5;

/// Connection settings for the Zep API
#[derive(Debug, Clone)]
pub struct ZepConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ZepConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_ZEP_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ZepConfig {
    /// Load from `.env` and the process environment
    ///
    /// Reads `ZEP_API_KEY`, `ZEP_API_URL` and `ZEP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = read("ZEP_API_KEY");

        let base_url = read("ZEP_API_URL").unwrap_or_else(|| DEFAULT_ZEP_API_URL.to_string());

        let timeout_secs = match read("ZEP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                // A zero timeout fails every request
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!(value = %raw, "Invalid ZEP_TIMEOUT_SECS, using default");
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Per-adapter memory behaviour forwarded to the service
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySettings {
    pub memory_type: String,
    pub memory_retrieval: String,
    pub relevance_threshold: f32,
    pub summary_instruction: String,
    pub top_k: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            memory_type: "permanent".to_string(),
            memory_retrieval: "default".to_string(),
            relevance_threshold: 0.3,
            summary_instruction: String::new(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl MemorySettings {
    pub fn with_memory_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = memory_type.into();
        self
    }

    pub fn with_memory_retrieval(mut self, memory_retrieval: impl Into<String>) -> Self {
        self.memory_retrieval = memory_retrieval.into();
        self
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn with_summary_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.summary_instruction = instruction.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
