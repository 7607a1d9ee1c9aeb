//! Vitrina Storage - Durable conversation state
//!
//! This crate persists everything the assistant accumulates per conversation:
//! - Message history (user and assistant turns)
//! - Order state (the merged order-context JSON blob)
//! - Handoff flag (human operator took over, bot stays silent)
//! - Sent-photo keys (avoid re-sending the same product showcase)
//!
//! Two backends are provided: `SqliteStore` (sqlx) for production and
//! `MemoryStore` for tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{ConversationStore, StoredMessage, StoredRole};
