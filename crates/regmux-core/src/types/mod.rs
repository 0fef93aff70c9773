//! Shared core types used across the catalog, resolver and CLI layers.

use serde::Serialize;

/// Where a registry entry comes from.
///
/// Never stored: derived from membership in the builtin catalog or the
/// custom section of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryOrigin {
    /// Shipped with regmux, immutable at runtime.
    Builtin,
    /// Added by the user and persisted in the config document.
    Custom,
    /// Active URL that matches no known entry.
    Unknown,
}

/// A named registry endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub origin: RegistryOrigin,
}

/// Name reported for an active registry that is not in the namespace.
pub const UNKNOWN_REGISTRY_NAME: &str = "unknown";

impl RegistryEntry {
    /// Create a custom entry with only the required fields.
    pub fn custom(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            home: None,
            description: None,
            origin: RegistryOrigin::Custom,
        }
    }

    /// Placeholder for an active URL that no entry claims.
    pub fn unknown(url: impl Into<String>) -> Self {
        Self {
            name: UNKNOWN_REGISTRY_NAME.to_string(),
            url: url.into(),
            home: None,
            description: Some("Current npm registry".to_string()),
            origin: RegistryOrigin::Unknown,
        }
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_builtin(&self) -> bool {
        self.origin == RegistryOrigin::Builtin
    }

    pub fn is_unknown(&self) -> bool {
        self.origin == RegistryOrigin::Unknown
    }

    /// Compare registry URLs, ignoring a single trailing slash.
    pub fn matches_url(&self, url: &str) -> bool {
        self.url.trim_end_matches('/') == url.trim_end_matches('/')
    }
}
