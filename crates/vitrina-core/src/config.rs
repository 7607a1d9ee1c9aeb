//! Configuration for the orchestration pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the core pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Photos attached to a regular reply
    #[serde(default = "default_max_photos_per_message")]
    pub max_photos_per_message: usize,
    /// Photos attached to an explicit showcase request
    #[serde(default = "default_max_photos_showcase")]
    pub max_photos_showcase: usize,
    /// Conversation turns fed to the completion prompt
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    /// Debounce window for combining rapid-fire client messages (0 = off)
    #[serde(default = "default_aggregation_delay_ms")]
    pub aggregation_delay_ms: u64,
    /// TTL for the color-requirement cache
    #[serde(default = "default_requirement_ttl_secs")]
    pub requirement_ttl_secs: u64,
    /// Idle window after which an unused conversation lock may be evicted
    #[serde(default = "default_lock_idle_secs")]
    pub lock_idle_secs: u64,
    /// Chat ids allowed to issue handoff commands
    #[serde(default)]
    pub manager_chat_ids: Vec<String>,
}

fn default_max_photos_per_message() -> usize {
    3
}

fn default_max_photos_showcase() -> usize {
    6
}

fn default_history_limit() -> u32 {
    30
}

fn default_aggregation_delay_ms() -> u64 {
    8000
}

fn default_requirement_ttl_secs() -> u64 {
    1800
}

fn default_lock_idle_secs() -> u64 {
    3600
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_photos_per_message: default_max_photos_per_message(),
            max_photos_showcase: default_max_photos_showcase(),
            history_limit: default_history_limit(),
            aggregation_delay_ms: default_aggregation_delay_ms(),
            requirement_ttl_secs: default_requirement_ttl_secs(),
            lock_idle_secs: default_lock_idle_secs(),
            manager_chat_ids: Vec::new(),
        }
    }
}

impl CoreConfig {
    /// Debounce window as a `Duration`
    #[must_use]
    pub fn aggregation_delay(&self) -> Duration {
        Duration::from_millis(self.aggregation_delay_ms)
    }

    /// Requirement-cache TTL as a `Duration`
    #[must_use]
    pub fn requirement_ttl(&self) -> Duration {
        Duration::from_secs(self.requirement_ttl_secs)
    }

    /// Whether the given chat id belongs to a manager
    #[must_use]
    pub fn is_manager(&self, chat_id: &str) -> bool {
        self.manager_chat_ids.iter().any(|id| id == chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.max_photos_per_message, 3);
        assert_eq!(config.max_photos_showcase, 6);
        assert_eq!(config.requirement_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"manager_chat_ids": ["7700@c.us"]}"#).unwrap();
        assert!(config.is_manager("7700@c.us"));
        assert!(!config.is_manager("7701@c.us"));
        assert_eq!(config.history_limit, 30);
    }
}
