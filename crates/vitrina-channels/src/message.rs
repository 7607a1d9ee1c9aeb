//! Message - channel-neutral message types and the adapter trait

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A normalized incoming chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Conversation identifier (e.g. `77011234567@c.us`)
    pub chat_id: String,
    /// Sender display name (may be empty)
    pub sender_name: String,
    /// Message text
    pub text: String,
}

impl IncomingMessage {
    /// Create an incoming message
    #[must_use]
    pub fn new(
        chat_id: impl Into<String>,
        sender_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            sender_name: sender_name.into(),
            text: text.into(),
        }
    }
}

/// A photo queued for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingPhoto {
    /// Stable file identifier in the photo index
    pub file_id: String,
    /// Original file name (color and model are encoded in it)
    pub filename: String,
    /// Caption shown under the photo
    pub caption: String,
}

/// Outbound chat channel.
///
/// Sends are fire-and-forget from the orchestrator's perspective: a failure
/// is reported as an error but carries no delivery receipt semantics.
#[async_trait::async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Channel name for logging
    fn name(&self) -> &str;

    /// Send a text message
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Send a single photo with caption
    async fn send_photo(&self, chat_id: &str, photo: &OutgoingPhoto) -> Result<()>;

    /// Send several photos in order
    async fn send_photos(&self, chat_id: &str, photos: &[OutgoingPhoto]) -> Result<()> {
        for photo in photos {
            self.send_photo(chat_id, photo).await?;
        }
        Ok(())
    }
}
