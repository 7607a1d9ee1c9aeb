//! Vitrina Core - Orchestration Engine
//!
//! This crate provides the per-conversation processing pipeline for the
//! Vitrina sales assistant, including:
//! - Serializer: at-most-one in-flight processing pass per conversation
//! - Order: context merge, product-switch detection, missing-field resolution
//! - Intent: purchase-intent detection and checkout-prompt stripping
//! - Photos: multi-stage photo resolution with color-variety shaping
//! - Requirement: time-bounded "is color required" cache
//! - Orchestrator: the message loop tying everything together
//!
//! External collaborators (extraction, retrieval, inventory, photo index)
//! are consumed through the traits in [`services`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod config;
pub mod error;
pub mod extract;
pub mod notify;
pub mod orchestrator;
pub mod order;
pub mod photos;
pub mod requirement;
pub mod serializer;
pub mod services;
pub mod tokenize;

pub use aggregator::{AggregatedHandler, MessageAggregator};
pub use config::CoreConfig;
pub use error::{apology_text, Error, Result};
pub use extract::LlmFieldExtractor;
pub use notify::{spawn_detached, OrderNotifier, OrderSummary};
pub use orchestrator::{Orchestrator, TurnReply};
pub use order::{
    merge_order_context, missing_fields, ExtractedFields, MissingField, OrderContext, ProductKind,
};
pub use photos::{PhotoResolver, ResolvedPhoto, ResolveRequest};
pub use requirement::ColorRequirementCache;
pub use serializer::ConversationLocks;
pub use services::{
    Availability, FieldExtractor, Inventory, PhotoIndex, PhotoRef, Retrieval, RetrievedDoc,
};
