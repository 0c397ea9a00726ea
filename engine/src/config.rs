//! Engine configuration.

use crate::view::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the page size for paginated stores.
pub const PAGE_SIZE_VAR: &str = "PANELSYNC_PAGE_SIZE";

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Entities per page for paginated stores
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(PAGE_SIZE_VAR) {
            config.page_size = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPageSize(raw.clone()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidPageSize(self.page_size.to_string()));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid page size '{0}': expected a positive integer")]
    InvalidPageSize(String),
}
