//! Orchestrator core structure
//!
//! Contains the `Orchestrator` struct and its builder methods.

use crate::aggregator::AggregatedHandler;
use crate::config::CoreConfig;
use crate::notify::OrderNotifier;
use crate::photos::PhotoResolver;
use crate::requirement::ColorRequirementCache;
use crate::serializer::ConversationLocks;
use crate::services::{FieldExtractor, Inventory, PhotoIndex, Retrieval};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use vitrina_channels::ChannelAdapter;
use vitrina_llm::CompletionProvider;
use vitrina_storage::ConversationStore;

/// Coordinates one processing pass per aggregated client message
pub struct Orchestrator {
    pub(crate) extractor: Arc<dyn FieldExtractor>,
    pub(crate) retrieval: Arc<dyn Retrieval>,
    pub(crate) inventory: Arc<dyn Inventory>,
    pub(crate) provider: Arc<dyn CompletionProvider>,
    pub(crate) store: Arc<dyn ConversationStore>,
    pub(crate) channel: Arc<dyn ChannelAdapter>,
    pub(crate) resolver: PhotoResolver,
    pub(crate) requirement: ColorRequirementCache,
    pub(crate) locks: ConversationLocks,
    pub(crate) notifier: Option<Arc<OrderNotifier>>,
    pub(crate) config: CoreConfig,
}

impl Orchestrator {
    /// Create an orchestrator over the given collaborators
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn FieldExtractor>,
        retrieval: Arc<dyn Retrieval>,
        inventory: Arc<dyn Inventory>,
        photo_index: Arc<dyn PhotoIndex>,
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ConversationStore>,
        channel: Arc<dyn ChannelAdapter>,
        config: CoreConfig,
    ) -> Self {
        let resolver = PhotoResolver::new(
            Arc::clone(&photo_index),
            config.max_photos_per_message,
            config.max_photos_showcase,
        );
        let requirement = ColorRequirementCache::new(photo_index, config.requirement_ttl());
        let locks = ConversationLocks::new(Duration::from_secs(config.lock_idle_secs));
        Self {
            extractor,
            retrieval,
            inventory,
            provider,
            store,
            channel,
            resolver,
            requirement,
            locks,
            notifier: None,
            config,
        }
    }

    /// Set the manager-group order notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: OrderNotifier) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Drop per-conversation locks idle past the configured window
    pub fn evict_idle_locks(&self) {
        self.locks.evict_idle();
    }
}

#[async_trait]
impl AggregatedHandler for Orchestrator {
    async fn handle(&self, chat_id: &str, sender_name: &str, text: &str) {
        self.handle_message(chat_id, sender_name, text).await;
    }
}
