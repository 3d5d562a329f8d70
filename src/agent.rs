use std::error::Error;
use std::sync::Arc;

use log::{ info, warn };
use rand::Rng;

use crate::cli::Args;
use crate::config::complexity::ComplexityConfig;
use crate::generation::{ ReplyPlan, ReplyPlanner };
use crate::history::{ initialize_history_store, HistoryStore };
use crate::models::chat::ChatMessage;

/// Ties the reply pipeline to the conversation store. Shared across
/// connections; all methods take `&self`.
pub struct CatAgent {
    planner: ReplyPlanner,
    history: Arc<dyn HistoryStore>,
}

impl CatAgent {
    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = ComplexityConfig::load(args.complexity_config.as_deref())?;
        info!(
            "Complexity scoring ready: {} patterns, {} keyword categories, bounds [{}, {}]",
            config.patterns.len(),
            config.keyword_categories.len(),
            config.scoring.min_score,
            config.scoring.max_score
        );
        let planner = ReplyPlanner::new(config)?;
        let history = initialize_history_store(args)?;
        Ok(Self { planner, history })
    }

    pub async fn open_conversation(&self) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.history.create().await
    }

    pub fn plan_reply<R: Rng>(&self, message: &str, hour: u32, rng: &mut R) -> ReplyPlan {
        self.planner.plan(message, hour, rng)
    }

    pub fn welcome_line<R: Rng>(&self, rng: &mut R) -> String {
        self.planner.welcome_line(rng)
    }

    /// Stores a finalized message. Unknown conversation ids are a soft miss:
    /// logged and skipped, never an error for the caller.
    pub async fn record_message(&self, conversation_id: &str, message: ChatMessage) {
        match self.history.append(conversation_id, message).await {
            Ok(true) => {}
            Ok(false) => warn!("Dropping message for unknown conversation {}", conversation_id),
            Err(e) => warn!("History write failed for {}: {}", conversation_id, e),
        }
    }

    /// Full message log for a conversation; unknown ids yield an empty list.
    pub async fn conversation_messages(&self, conversation_id: &str) -> Vec<ChatMessage> {
        match self.history.get(conversation_id).await {
            Ok(Some(conversation)) => conversation.messages,
            Ok(None) => {
                warn!("No conversation found for id {}", conversation_id);
                Vec::new()
            }
            Err(e) => {
                warn!("History read failed for {}: {}", conversation_id, e);
                Vec::new()
            }
        }
    }
}
