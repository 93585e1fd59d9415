use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zep_agent_memory::{
    memory::{AgentMemory, ZepMemory},
    store::{InMemoryStore, MemoryStore},
    MemorySettings, ZepClient, ZepConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Loads .env as well
    let config = ZepConfig::from_env();

    let session_id = std::env::var("ZEP_SESSION_ID").unwrap_or_else(|_| "demo-session".to_string());

    let store: Arc<dyn MemoryStore> = match ZepClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("{}; falling back to in-memory store", e);
            Arc::new(InMemoryStore::new())
        }
    };

    let memory = ZepMemory::new(session_id, store, MemorySettings::default())?;
    info!(memory = %memory.to_json(), "Memory ready");

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let query = if message.is_empty() {
        String::new()
    } else {
        memory.save_message("user", &message).await;
        message
    };

    let recalled = memory.retrieve_memories(&query).await;

    println!("\n=== RECALLED MEMORIES ===");
    if recalled.is_empty() {
        println!("(none)");
    } else {
        for (i, line) in recalled.lines().enumerate() {
            println!("  {}: {}", i + 1, line);
        }
    }

    Ok(())
}
