use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use log::info;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::HistoryStore;
use crate::models::chat::{ ChatMessage, Conversation };

struct Entry {
    conversation: Conversation,
    last_active: u64,
}

struct Inner {
    conversations: HashMap<String, Entry>,
    clock: u64,
}

/// Process-local conversation store. With `max_conversations > 0` the least
/// recently active conversation is evicted once the cap is exceeded; with 0
/// the map grows for the lifetime of the process.
pub struct MemoryHistoryStore {
    inner: Mutex<Inner>,
    max_conversations: usize,
}

impl MemoryHistoryStore {
    pub fn new(max_conversations: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { conversations: HashMap::new(), clock: 0 }),
            max_conversations,
        }
    }

    fn evict_if_needed(&self, inner: &mut Inner) {
        if self.max_conversations == 0 {
            return;
        }
        while inner.conversations.len() > self.max_conversations {
            let Some(oldest) = inner.conversations
                .iter()
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| id.clone()) else {
                break;
            };
            inner.conversations.remove(&oldest);
            info!("Evicted least recently active conversation {}", oldest);
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn create(&self) -> Result<String, Box<dyn Error + Send + Sync>> {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let tick = inner.clock;
        inner.conversations.insert(id.clone(), Entry {
            conversation: Conversation { id: id.clone(), messages: Vec::new() },
            last_active: tick,
        });
        self.evict_if_needed(&mut inner);
        Ok(id)
    }

    async fn append(
        &self,
        conversation_id: &str,
        message: ChatMessage
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let tick = inner.clock;
        match inner.conversations.get_mut(conversation_id) {
            Some(entry) => {
                entry.conversation.messages.push(message);
                entry.last_active = tick;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(
        &self,
        conversation_id: &str
    ) -> Result<Option<Conversation>, Box<dyn Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let tick = inner.clock;
        match inner.conversations.get_mut(conversation_id) {
            Some(entry) => {
                entry.last_active = tick;
                Ok(Some(entry.conversation.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[tokio::test]
    async fn create_append_get_round_trip() {
        let store = MemoryHistoryStore::new(0);
        let id = store.create().await.unwrap();

        assert!(store.append(&id, ChatMessage::now(Role::User, "hi")).await.unwrap());
        assert!(store.append(&id, ChatMessage::now(Role::Assistant, "meow mrow.")).await.unwrap());

        let conversation = store.get(&id).await.unwrap().unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[1].content, "meow mrow.");
    }

    #[tokio::test]
    async fn unknown_id_is_a_soft_miss() {
        let store = MemoryHistoryStore::new(0);
        assert!(!store.append("missing", ChatMessage::now(Role::User, "hi")).await.unwrap());
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cap_evicts_least_recently_active() {
        let store = MemoryHistoryStore::new(2);
        let first = store.create().await.unwrap();
        let second = store.create().await.unwrap();

        // Touch the first so the second becomes the eviction candidate.
        store.append(&first, ChatMessage::now(Role::User, "still here")).await.unwrap();
        let third = store.create().await.unwrap();

        assert!(store.get(&first).await.unwrap().is_some());
        assert!(store.get(&second).await.unwrap().is_none());
        assert!(store.get(&third).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unbounded_store_keeps_everything() {
        let store = MemoryHistoryStore::new(0);
        let ids: Vec<String> = {
            let mut ids = Vec::new();
            for _ in 0..50 {
                ids.push(store.create().await.unwrap());
            }
            ids
        };
        for id in &ids {
            assert!(store.get(id).await.unwrap().is_some());
        }
    }
}
