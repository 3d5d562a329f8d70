mod memory;

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::cli::Args;
use crate::models::chat::{ ChatMessage, Conversation };

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Creates a fresh conversation and returns its id.
    async fn create(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Appends a message. `Ok(false)` means the conversation id is unknown
    /// (a soft miss, not an error).
    async fn append(
        &self,
        conversation_id: &str,
        message: ChatMessage
    ) -> Result<bool, Box<dyn Error + Send + Sync>>;

    async fn get(
        &self,
        conversation_id: &str
    ) -> Result<Option<Conversation>, Box<dyn Error + Send + Sync>>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(memory::MemoryHistoryStore::new(args.max_conversations))),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    if args.max_conversations == 0 {
        info!("Chat history kept in: {} (unbounded)", args.history_type);
    } else {
        info!(
            "Chat history kept in: {} (capped at {} conversations)",
            args.history_type,
            args.max_conversations
        );
    }
    create_history_store(args)
}
