//! MemoryStore — in-process store for tests and local development.

use crate::error::Result;
use crate::store::{ConversationStore, StoredMessage, StoredRole};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    order_states: HashMap<String, serde_json::Value>,
    messages: HashMap<String, Vec<StoredMessage>>,
    handoff: HashSet<String>,
    sent_photos: HashSet<(String, String)>,
    nudge_counts: HashMap<String, u32>,
}

/// In-memory conversation store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored turns for a conversation (test helper)
    pub async fn message_count(&self, chat_id: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.messages.get(chat_id).map_or(0, Vec::len)
    }
}

#[async_trait::async_trait]
impl ConversationStore for MemoryStore {
    async fn load_order_state(&self, chat_id: &str) -> Result<serde_json::Value> {
        let inner = self.inner.lock().await;
        Ok(inner
            .order_states
            .get(chat_id)
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())))
    }

    async fn save_order_state(&self, chat_id: &str, state: &serde_json::Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.order_states.insert(chat_id.to_string(), state.clone());
        Ok(())
    }

    async fn save_message(
        &self,
        chat_id: &str,
        role: StoredRole,
        content: &str,
        _sender_name: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .messages
            .entry(chat_id.to_string())
            .or_default()
            .push(StoredMessage::new(role, content));
        Ok(())
    }

    async fn history(&self, chat_id: &str, limit: u32) -> Result<Vec<StoredMessage>> {
        let inner = self.inner.lock().await;
        let messages = inner.messages.get(chat_id).cloned().unwrap_or_default();
        let skip = messages.len().saturating_sub(limit as usize);
        Ok(messages.into_iter().skip(skip).collect())
    }

    async fn is_handoff(&self, chat_id: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.handoff.contains(chat_id))
    }

    async fn set_handoff(&self, chat_id: &str, enabled: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if enabled {
            inner.handoff.insert(chat_id.to_string());
        } else {
            inner.handoff.remove(chat_id);
        }
        Ok(())
    }

    async fn has_sent_photos(&self, chat_id: &str, product_key: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sent_photos
            .contains(&(chat_id.to_string(), product_key.to_string())))
    }

    async fn mark_photos_sent(&self, chat_id: &str, product_key: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .sent_photos
            .insert((chat_id.to_string(), product_key.to_string()));
        Ok(())
    }

    async fn reset_nudge_state(&self, chat_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.nudge_counts.insert(chat_id.to_string(), 0);
        Ok(())
    }
}
