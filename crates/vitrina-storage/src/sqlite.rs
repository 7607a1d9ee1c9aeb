//! SqliteStore — SQLite persistence for conversations and order state.
//!
//! Tables: `conversations`, `clients`, `sent_photos`.

use crate::error::{Error, Result};
use crate::store::{ConversationStore, StoredMessage, StoredRole};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

/// SQLite-backed conversation store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub async fn from_path(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Internal(format!("mkdir: {e}")))?;
        }
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        // Enable WAL for read/write concurrency
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("Conversation store initialized at {}", db_path.display());
        Ok(store)
    }

    /// In-memory store (for tests).
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        debug!("In-memory conversation store initialized");
        Ok(store)
    }

    // ── Migrations ──────────────────────────────────────────────

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS conversations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id     TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                sender_name TEXT NOT NULL DEFAULT '',
                created_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_conv_chat ON conversations(chat_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS clients (
                chat_id                TEXT PRIMARY KEY,
                name                   TEXT NOT NULL DEFAULT '',
                last_client_message_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                last_bot_message_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                nudge_count            INTEGER NOT NULL DEFAULT 0,
                handoff                INTEGER NOT NULL DEFAULT 0,
                order_state            TEXT NOT NULL DEFAULT '{}',
                message_count          INTEGER NOT NULL DEFAULT 0,
                created_at             TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sent_photos (
                chat_id     TEXT NOT NULL,
                product_key TEXT NOT NULL,
                sent_at     TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (chat_id, product_key)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ensure_client(&self, chat_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO clients (chat_id) VALUES (?)")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ConversationStore for SqliteStore {
    async fn load_order_state(&self, chat_id: &str) -> Result<serde_json::Value> {
        let row = sqlx::query("SELECT order_state FROM clients WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(serde_json::Value::Object(Default::default()));
        };
        let raw: String = row.get("order_state");
        // A corrupted blob must not wedge the conversation
        Ok(serde_json::from_str(&raw)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default())))
    }

    async fn save_order_state(&self, chat_id: &str, state: &serde_json::Value) -> Result<()> {
        self.ensure_client(chat_id).await?;
        sqlx::query("UPDATE clients SET order_state = ? WHERE chat_id = ?")
            .bind(serde_json::to_string(state)?)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_message(
        &self,
        chat_id: &str,
        role: StoredRole,
        content: &str,
        sender_name: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO conversations (chat_id, role, content, sender_name) VALUES (?, ?, ?, ?)",
        )
        .bind(chat_id)
        .bind(role.as_str())
        .bind(content)
        .bind(sender_name)
        .execute(&self.pool)
        .await?;

        self.ensure_client(chat_id).await?;
        let timestamp_column = match role {
            StoredRole::User => "last_client_message_at",
            StoredRole::Assistant => "last_bot_message_at",
        };
        let sql = format!(
            "UPDATE clients SET {timestamp_column} = CURRENT_TIMESTAMP,
                 message_count = message_count + 1,
                 name = CASE WHEN ? != '' THEN ? ELSE name END
             WHERE chat_id = ?"
        );
        sqlx::query(&sql)
            .bind(sender_name)
            .bind(sender_name)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn history(&self, chat_id: &str, limit: u32) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT role, content FROM conversations
             WHERE chat_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<StoredMessage> = rows
            .into_iter()
            .map(|row| {
                let role: String = row.get("role");
                StoredMessage::new(StoredRole::parse(&role), row.get::<String, _>("content"))
            })
            .collect();
        messages.reverse();
        Ok(messages)
    }

    async fn is_handoff(&self, chat_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT handoff FROM clients WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("handoff") != 0).unwrap_or(false))
    }

    async fn set_handoff(&self, chat_id: &str, enabled: bool) -> Result<()> {
        self.ensure_client(chat_id).await?;
        sqlx::query("UPDATE clients SET handoff = ? WHERE chat_id = ?")
            .bind(i64::from(enabled))
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn has_sent_photos(&self, chat_id: &str, product_key: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS present FROM sent_photos WHERE chat_id = ? AND product_key = ?",
        )
        .bind(chat_id)
        .bind(product_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn mark_photos_sent(&self, chat_id: &str, product_key: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO sent_photos (chat_id, product_key) VALUES (?, ?)")
            .bind(chat_id)
            .bind(product_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_nudge_state(&self, chat_id: &str) -> Result<()> {
        self.ensure_client(chat_id).await?;
        sqlx::query("UPDATE clients SET nudge_count = 0 WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_order_state_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let empty = store.load_order_state("1@c.us").await.unwrap();
        assert!(empty.as_object().unwrap().is_empty());

        let state = json!({"city": "Алматы", "product": "Chanel Jumbo"});
        store.save_order_state("1@c.us", &state).await.unwrap();
        let loaded = store.load_order_state("1@c.us").await.unwrap();
        assert_eq!(loaded["city"], "Алматы");
    }

    #[tokio::test]
    async fn test_history_order_and_limit() {
        let store = SqliteStore::in_memory().await.unwrap();
        for i in 0..5 {
            store
                .save_message("1@c.us", StoredRole::User, &format!("msg {i}"), "Айгерим")
                .await
                .unwrap();
        }
        let history = store.history("1@c.us", 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "msg 2");
        assert_eq!(history[2].content, "msg 4");
    }

    #[tokio::test]
    async fn test_handoff_flag() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(!store.is_handoff("1@c.us").await.unwrap());
        store.set_handoff("1@c.us", true).await.unwrap();
        assert!(store.is_handoff("1@c.us").await.unwrap());
        store.set_handoff("1@c.us", false).await.unwrap();
        assert!(!store.is_handoff("1@c.us").await.unwrap());
    }

    #[tokio::test]
    async fn test_sent_photos_marker() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(!store.has_sent_photos("1@c.us", "chanel|jumbo").await.unwrap());
        store.mark_photos_sent("1@c.us", "chanel|jumbo").await.unwrap();
        // Idempotent
        store.mark_photos_sent("1@c.us", "chanel|jumbo").await.unwrap();
        assert!(store.has_sent_photos("1@c.us", "chanel|jumbo").await.unwrap());
        assert!(!store.has_sent_photos("2@c.us", "chanel|jumbo").await.unwrap());
    }
}
