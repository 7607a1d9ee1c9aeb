//! Per-conversation critical-section locks
//!
//! One message per conversation is processed at a time; waiters for the same
//! conversation queue up in arrival order while different conversations run
//! fully in parallel. The guard releases on drop, so every exit path of a
//! processing pass, including errors and panics, frees the conversation.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

struct LockEntry {
    lock: Arc<Mutex<()>>,
    last_used: Instant,
}

/// Registry of per-conversation locks with idle eviction
pub struct ConversationLocks {
    entries: DashMap<String, LockEntry>,
    idle: Duration,
}

/// Exclusive hold on a conversation; dropping it admits the next waiter
pub struct ConversationGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ConversationLocks {
    /// Create a registry whose locks may be evicted after `idle` without use
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            idle,
        }
    }

    /// Acquire the lock for one conversation, waiting behind any in-flight
    /// pass for the same conversation.
    pub async fn acquire(&self, conversation_id: &str) -> ConversationGuard {
        let lock = {
            let mut entry = self
                .entries
                .entry(conversation_id.to_string())
                .or_insert_with(|| LockEntry {
                    lock: Arc::new(Mutex::new(())),
                    last_used: Instant::now(),
                });
            entry.last_used = Instant::now();
            Arc::clone(&entry.lock)
        };
        // The map reference is dropped before awaiting; holding it across the
        // await would block every other conversation hashing to the shard.
        let guard = lock.lock_owned().await;
        ConversationGuard { _guard: guard }
    }

    /// Drop lock entries idle past the configured window.
    ///
    /// An entry whose lock is currently held or waited on is never evicted,
    /// regardless of its age.
    pub fn evict_idle(&self) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| Arc::strong_count(&entry.lock) > 1 || entry.last_used.elapsed() < self.idle);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "evicted idle conversation locks");
        }
    }

    /// Number of tracked conversations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no conversation is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
