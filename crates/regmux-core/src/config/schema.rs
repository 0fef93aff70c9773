//! Configuration schema for config.toml

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Probe concurrency used when the document leaves it unset or below 1.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: i64 = 5;

/// Highest accepted probe concurrency.
pub const MAX_CONCURRENT_REQUESTS_LIMIT: i64 = 10;

/// Root configuration structure for config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// HTTP concurrency used by latency tests (1-10)
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: i64,

    /// User-defined registries keyed by name
    #[serde(default)]
    pub custom_registries: BTreeMap<String, CustomRegistry>,
}

/// A user-defined registry as stored in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRegistry {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_max_concurrent_requests() -> i64 {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryDocument {
    pub fn new() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            custom_registries: BTreeMap::new(),
        }
    }

    /// Normalize and validate the document.
    ///
    /// A concurrency below 1 is reset to the default; above the limit is an error.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests < 1 {
            self.max_concurrent_requests = DEFAULT_MAX_CONCURRENT_REQUESTS;
        } else if self.max_concurrent_requests > MAX_CONCURRENT_REQUESTS_LIMIT {
            return Err(ConfigError::invalid(
                "max_concurrent_requests",
                format!(
                    "value must be between 1 and {}, got {}",
                    MAX_CONCURRENT_REQUESTS_LIMIT, self.max_concurrent_requests
                ),
            ));
        }

        for (name, registry) in &self.custom_registries {
            registry.validate(name)?;
        }

        Ok(())
    }

    /// Probe concurrency as an unsigned count, after validation.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_requests
            .clamp(1, MAX_CONCURRENT_REQUESTS_LIMIT) as usize
    }
}

impl CustomRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            home: None,
            description: None,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let field = format!("custom_registries.{}.url", name);
        if self.url.trim().is_empty() {
            return Err(ConfigError::invalid(field, "url is required"));
        }
        url::Url::parse(&self.url)
            .map_err(|e| ConfigError::invalid(field, format!("invalid url format: {}", e)))?;
        Ok(())
    }
}
