//! Store - conversation store trait and row types

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Role of a stored conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredRole {
    /// Client message
    User,
    /// Bot reply
    Assistant,
}

impl StoredRole {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse from the stored string form; unknown values map to `User`
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// One persisted conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Who wrote the turn
    pub role: StoredRole,
    /// Message text
    pub content: String,
}

impl StoredMessage {
    /// Create a message row
    #[must_use]
    pub fn new(role: StoredRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Durable per-conversation store.
///
/// The order state is persisted as an opaque JSON blob; the core crate owns
/// the typed shape and the merge semantics. Read-after-write consistency is
/// required per conversation (the orchestrator serializes access, so no
/// additional row locking is needed here).
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load the accumulated order state for a conversation (empty object when absent)
    async fn load_order_state(&self, chat_id: &str) -> Result<serde_json::Value>;

    /// Persist the accumulated order state for a conversation
    async fn save_order_state(&self, chat_id: &str, state: &serde_json::Value) -> Result<()>;

    /// Append a conversation turn
    async fn save_message(
        &self,
        chat_id: &str,
        role: StoredRole,
        content: &str,
        sender_name: &str,
    ) -> Result<()>;

    /// Most recent turns, oldest first
    async fn history(&self, chat_id: &str, limit: u32) -> Result<Vec<StoredMessage>>;

    /// Whether a human operator has taken over this conversation
    async fn is_handoff(&self, chat_id: &str) -> Result<bool>;

    /// Set the handoff flag
    async fn set_handoff(&self, chat_id: &str, enabled: bool) -> Result<()>;

    /// Whether a product showcase was already sent in this conversation
    async fn has_sent_photos(&self, chat_id: &str, product_key: &str) -> Result<bool>;

    /// Record that a product showcase was sent
    async fn mark_photos_sent(&self, chat_id: &str, product_key: &str) -> Result<()>;

    /// Clear re-engagement counters when the client writes back
    async fn reset_nudge_state(&self, chat_id: &str) -> Result<()>;
}
