//! Green API - WhatsApp adapter
//!
//! REST adapter for the Green API WhatsApp gateway: `sendMessage` for text,
//! `sendFileByUrl` for photos, plus webhook payload decoding for inbound
//! notifications. Sends retry with exponential backoff since the gateway
//! occasionally returns transient 5xx responses.

use crate::error::{Error, Result};
use crate::message::{ChannelAdapter, IncomingMessage, OutgoingPhoto};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://api.green-api.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SEND_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Green API configuration
#[derive(Clone)]
pub struct GreenApiConfig {
    /// Instance identifier
    pub instance_id: String,
    /// API token
    pub token: String,
    /// Base URL (override for tests/proxies)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl fmt::Debug for GreenApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenApiConfig")
            .field("instance_id", &self.instance_id)
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GreenApiConfig {
    /// Create a configuration
    #[must_use]
    pub fn new(instance_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from `GREEN_API_INSTANCE_ID` / `GREEN_API_TOKEN`
    pub fn from_env() -> Result<Self> {
        let instance_id = std::env::var("GREEN_API_INSTANCE_ID")
            .map_err(|_| Error::NotConfigured("GREEN_API_INSTANCE_ID not set".to_string()))?;
        let token = std::env::var("GREEN_API_TOKEN")
            .map_err(|_| Error::NotConfigured("GREEN_API_TOKEN not set".to_string()))?;
        Ok(Self::new(instance_id, token))
    }
}

// ── Webhook payload ─────────────────────────────────────────────

/// Sender block of an inbound notification
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderData {
    /// Conversation identifier
    #[serde(default)]
    pub chat_id: String,
    /// Sender display name
    #[serde(default)]
    pub sender_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextMessageData {
    #[serde(default)]
    text_message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendedTextMessageData {
    #[serde(default)]
    text: String,
}

/// Message block of an inbound notification
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    /// Platform message type tag
    #[serde(default)]
    pub type_message: String,
    #[serde(default)]
    text_message_data: Option<TextMessageData>,
    #[serde(default)]
    extended_text_message_data: Option<ExtendedTextMessageData>,
}

/// An inbound Green API webhook notification
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    /// Webhook kind (`incomingMessageReceived`, `outgoingMessageReceived`, ...)
    #[serde(default)]
    pub type_webhook: String,
    /// Sender block
    #[serde(default)]
    pub sender_data: SenderData,
    /// Message block
    #[serde(default)]
    pub message_data: MessageData,
}

impl WebhookNotification {
    /// Whether this notification is an inbound client message
    #[must_use]
    pub fn is_incoming(&self) -> bool {
        self.type_webhook == "incomingMessageReceived"
    }

    /// Extract the message text, if this is a text-bearing notification
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self.message_data.type_message.as_str() {
            "textMessage" => self
                .message_data
                .text_message_data
                .as_ref()
                .map(|d| d.text_message.as_str()),
            "extendedTextMessage" => self
                .message_data
                .extended_text_message_data
                .as_ref()
                .map(|d| d.text.as_str()),
            _ => None,
        }
    }

    /// Convert into a normalized incoming message.
    ///
    /// Returns `None` for non-incoming notifications, group chats and
    /// non-text message types.
    #[must_use]
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        if !self.is_incoming() {
            return None;
        }
        let chat_id = self.sender_data.chat_id.clone();
        if chat_id.is_empty() || chat_id.contains("@g.us") {
            return None;
        }
        let text = self.text()?.trim().to_string();
        if text.is_empty() {
            return None;
        }
        Some(IncomingMessage::new(
            chat_id,
            self.sender_data.sender_name,
            text,
        ))
    }
}

// ── Adapter ─────────────────────────────────────────────────────

/// Green API WhatsApp adapter
pub struct GreenApiAdapter {
    config: GreenApiConfig,
    client: reqwest::Client,
}

impl GreenApiAdapter {
    /// Create a new adapter from configuration
    pub fn new(config: GreenApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/waInstance{}/{}/{}",
            self.config.base_url, self.config.instance_id, method, self.config.token
        )
    }

    async fn post_with_retry(&self, method: &str, body: serde_json::Value) -> Result<()> {
        let url = self.endpoint(method);
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut last_err = Error::Api("no attempts made".to_string());

        for attempt in 1..=SEND_RETRIES {
            let result = self.client.post(&url).json(&body).send().await;
            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    last_err = Error::Api(format!("{method} status {status}: {text}"));
                }
                Err(e) => last_err = e.into(),
            }
            if attempt < SEND_RETRIES {
                warn!(method, attempt, "send failed, retrying: {last_err}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
        Err(last_err)
    }
}

#[async_trait::async_trait]
impl ChannelAdapter for GreenApiAdapter {
    fn name(&self) -> &str {
        "greenapi"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.post_with_retry(
            "sendMessage",
            json!({"chatId": chat_id, "message": text}),
        )
        .await?;
        info!(chat_id, "sent text ({} chars)", text.chars().count());
        Ok(())
    }

    async fn send_photo(&self, chat_id: &str, photo: &OutgoingPhoto) -> Result<()> {
        // Photo index entries carry a direct download URL as the file id
        self.post_with_retry(
            "sendFileByUrl",
            json!({
                "chatId": chat_id,
                "urlFile": photo.file_id,
                "fileName": photo.filename,
                "caption": photo.caption,
            }),
        )
        .await?;
        debug!(chat_id, filename = %photo.filename, "sent photo");
        Ok(())
    }

    async fn send_photos(&self, chat_id: &str, photos: &[OutgoingPhoto]) -> Result<()> {
        for photo in photos {
            if let Err(e) = self.send_photo(chat_id, photo).await {
                // One broken photo must not abort the rest of the batch
                warn!(chat_id, filename = %photo.filename, "photo send failed: {e}");
                continue;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Ok(())
    }
}
