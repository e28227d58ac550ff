//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables. Nested keys
//! use `__`, so `SHOPEE__PARTNER_ID` fills [`ShopeeConfig::partner_id`].

use posh_support_integration::{OrderDirs, ShopeeConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Store rules resource.
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,

    /// Order record directories.
    #[serde(default)]
    pub orders: OrderDirs,

    /// Marketplace API credentials.
    pub shopee: ShopeeConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("rules/RegrasLoja.txt")
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
