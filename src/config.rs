//! Application configuration
//!
//! App-level settings come from the environment with a `VITRINA_` prefix
//! (e.g. `VITRINA_DATABASE_PATH`). Provider credentials (OpenAI, Green API)
//! are read by their own crates from their conventional variables.

use serde::Deserialize;
use vitrina_core::CoreConfig;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the webhook server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Product catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    /// Manager group chat that receives order summaries
    #[serde(default)]
    pub order_group_chat_id: Option<String>,
    /// Pipeline settings
    #[serde(default)]
    pub core: CoreConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_path() -> String {
    "vitrina.db".to_string()
}

fn default_catalog_path() -> String {
    "catalog.json".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: default_database_path(),
            catalog_path: default_catalog_path(),
            order_group_chat_id: None,
            core: CoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `VITRINA_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("VITRINA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("core.manager_chat_ids")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
