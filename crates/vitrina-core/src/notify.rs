//! Detached side-effect tasks and manager order notifications
//!
//! Order notifications run off the reply path: once a confirmation is
//! queued, the notification is spawned as a detached task whose failure is
//! logged and otherwise ignored, so a broken manager channel can never fail
//! or delay the client's reply.

use crate::error::Result;
use crate::order::OrderContext;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use vitrina_channels::ChannelAdapter;

/// Run a side-effect future detached from the calling turn.
///
/// Errors are logged under `task`; nothing propagates back.
pub fn spawn_detached<F>(task: &'static str, future: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = future.await {
            warn!(task, %err, "detached task failed");
        }
    });
}

/// Flattened order facts for a manager notification
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    /// Product ordered
    pub product: String,
    /// Size, "-" when not applicable
    pub size: String,
    /// Color, "-" when not chosen
    pub color: String,
    /// Delivery city
    pub city: String,
    /// Delivery address
    pub address: String,
    /// Client phone derived from the chat id
    pub client_phone: String,
}

impl OrderSummary {
    /// Build a summary from a completed order context
    #[must_use]
    pub fn from_context(ctx: &OrderContext, chat_id: &str) -> Self {
        let or_dash = |s: &str| {
            if s.trim().is_empty() {
                "-".to_string()
            } else {
                s.trim().to_string()
            }
        };
        let phone = chat_id.split('@').next().unwrap_or(chat_id);
        Self {
            product: or_dash(&ctx.product),
            size: or_dash(&ctx.size),
            color: or_dash(&ctx.color),
            city: or_dash(&ctx.city),
            address: or_dash(&ctx.address),
            client_phone: format!("+{phone}"),
        }
    }

    /// Text of the notification sent to the manager group
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "🛍 Новый заказ!\n\n\
             Товар: {}\n\
             Размер: {}\n\
             Цвет: {}\n\
             Город: {}\n\
             Адрес: {}\n\
             Телефон клиента: {}",
            self.product, self.size, self.color, self.city, self.address, self.client_phone
        )
    }
}

/// Sends order summaries to the manager group chat
pub struct OrderNotifier {
    channel: Arc<dyn ChannelAdapter>,
    group_chat_id: Option<String>,
}

impl OrderNotifier {
    /// Create a notifier; `group_chat_id` of `None` disables notifications
    #[must_use]
    pub fn new(channel: Arc<dyn ChannelAdapter>, group_chat_id: Option<String>) -> Self {
        Self {
            channel,
            group_chat_id,
        }
    }

    /// Deliver one order summary to the manager group
    pub async fn notify(&self, summary: &OrderSummary) -> Result<()> {
        let Some(group) = &self.group_chat_id else {
            return Ok(());
        };
        self.channel.send_text(group, &summary.format()).await?;
        info!(product = %summary.product, "order sent to manager group");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::ProductKind;

    fn ctx() -> OrderContext {
        OrderContext {
            city: "Алматы".to_string(),
            product: "Chanel Jumbo Classic Flap".to_string(),
            product_type: ProductKind::Bag,
            size: String::new(),
            color: "черный".to_string(),
            address: "ул. Абая 10".to_string(),
            ready_to_order: true,
        }
    }

    #[test]
    fn test_summary_formatting() {
        let summary = OrderSummary::from_context(&ctx(), "77001234567@c.us");
        assert_eq!(summary.client_phone, "+77001234567");
        assert_eq!(summary.size, "-");
        let text = summary.format();
        assert!(text.starts_with("🛍 Новый заказ!"));
        assert!(text.contains("Товар: Chanel Jumbo Classic Flap"));
        assert!(text.contains("Адрес: ул. Абая 10"));
    }

    #[tokio::test]
    async fn test_spawn_detached_swallows_errors() {
        spawn_detached("test", async {
            Err(crate::error::Error::Internal("boom".to_string()))
        });
        // Nothing to assert beyond "does not propagate"; give the task a tick
        tokio::task::yield_now().await;
    }
}
