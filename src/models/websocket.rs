use serde::{ Serialize, Deserialize };

use crate::models::chat::{ ChatMessage, Role };

/// Wall-clock hint supplied by the browser so mood adjustments follow the
/// user's local time rather than the server's.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientTime {
    pub hour: u32,
    pub timezone: String,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "send-message")] SendMessage {
        message: String,
        #[serde(rename = "conversationId")]
        conversation_id: String,
        #[serde(rename = "clientTime", default, skip_serializing_if = "Option::is_none")]
        client_time: Option<ClientTime>,
    },
    #[serde(rename = "get-conversation")] GetConversation(String),
    #[serde(rename = "request-welcome-meows")]
    RequestWelcomeMeows,
}

/// Assistant message as it appears on the wire while a reply is in flight.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StreamingMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
    pub streaming: bool,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "conversation-id")] ConversationId(String),
    #[serde(rename = "welcome-meows")] WelcomeMeows(String),
    #[serde(rename = "user-message")] UserMessage(ChatMessage),
    #[serde(rename = "ai-message-start")] AiMessageStart(StreamingMessage),
    #[serde(rename = "ai-message-chunk")] AiMessageChunk {
        content: String,
        #[serde(rename = "isComplete")]
        is_complete: bool,
    },
    #[serde(rename = "ai-message-complete")] AiMessageComplete(StreamingMessage),
    #[serde(rename = "conversation-history")] ConversationHistory(Vec<ChatMessage>),
    #[serde(rename = "error")] Error {
        message: String,
    },
}
