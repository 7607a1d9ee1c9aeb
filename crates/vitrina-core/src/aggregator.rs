//! Debounced per-chat message aggregation
//!
//! Clients often split one thought across several rapid messages ("привет",
//! "есть джумбо?", "черная"). Each incoming message restarts a per-chat
//! timer; when the chat goes quiet for the configured window, the buffered
//! messages are joined and handed downstream as a single turn.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Receives the combined text once a chat's buffer flushes
#[async_trait]
pub trait AggregatedHandler: Send + Sync {
    /// Handle one aggregated turn for a chat
    async fn handle(&self, chat_id: &str, sender_name: &str, text: &str);
}

struct Buffer {
    sender_name: String,
    messages: Vec<String>,
    timer: Option<JoinHandle<()>>,
}

/// Per-chat debounce buffer in front of the orchestrator
pub struct MessageAggregator {
    handler: Arc<dyn AggregatedHandler>,
    delay: Duration,
    buffers: DashMap<String, Buffer>,
}

impl MessageAggregator {
    /// Create an aggregator; a zero `delay` passes messages straight through
    #[must_use]
    pub fn new(handler: Arc<dyn AggregatedHandler>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            handler,
            delay,
            buffers: DashMap::new(),
        })
    }

    /// Buffer one incoming message and (re)start the chat's flush timer
    pub async fn submit(self: &Arc<Self>, chat_id: &str, sender_name: &str, text: &str) {
        if self.delay.is_zero() {
            self.handler.handle(chat_id, sender_name, text).await;
            return;
        }
        let mut entry = self
            .buffers
            .entry(chat_id.to_string())
            .or_insert_with(|| Buffer {
                sender_name: sender_name.to_string(),
                messages: Vec::new(),
                timer: None,
            });
        entry.messages.push(text.to_string());
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        let this = Arc::clone(self);
        let chat = chat_id.to_string();
        entry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(this.delay).await;
            // Flush in a fresh task: a restart can only abort the sleep, never
            // a flush that already removed the buffer.
            let flusher = Arc::clone(&this);
            tokio::spawn(async move {
                flusher.flush(&chat).await;
            });
        }));
    }

    async fn flush(&self, chat_id: &str) {
        let Some((_, buffer)) = self.buffers.remove(chat_id) else {
            return;
        };
        if buffer.messages.is_empty() {
            return;
        }
        if buffer.messages.len() > 1 {
            info!(chat_id, count = buffer.messages.len(), "aggregated messages");
        }
        let combined = buffer.messages.join("\n");
        self.handler
            .handle(chat_id, &buffer.sender_name, &combined)
            .await;
    }
}
