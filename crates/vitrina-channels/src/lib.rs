//! Vitrina Channels - Chat channel adapters
//!
//! This crate provides the outbound channel abstraction and the Green API
//! WhatsApp adapter (the transport the shop runs on). The orchestrator only
//! sees the `ChannelAdapter` trait; the wire protocol stays here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod greenapi;
pub mod message;

pub use error::{Error, Result};
pub use greenapi::{GreenApiAdapter, GreenApiConfig, WebhookNotification};
pub use message::{ChannelAdapter, IncomingMessage, OutgoingPhoto};
