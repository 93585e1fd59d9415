//! Error types for the memory adapters

use thiserror::Error;

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Error, Debug)]
pub enum MemoryError {

    // =============================
    // Adapter Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Invalid message role: {0}")]
    InvalidRole(String),

    #[error("Zep API returned {status}: {body}")]
    Remote { status: u16, body: String },

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
