use thiserror::Error;

use crate::config::ConfigError;
use crate::manager::PackageManagerKind;

use super::validate::NAME_PATTERN;

/// Errors surfaced by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid registry name '{name}': must match {}", NAME_PATTERN)]
    InvalidName { name: String },

    #[error("invalid registry url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("registry '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("registry '{name}' is builtin and cannot be modified")]
    Builtin { name: String },

    #[error("name '{name}' is reserved by a builtin registry")]
    BuiltinName { name: String },

    #[error("registry '{name}' not found")]
    NotFound { name: String },

    #[error(transparent)]
    Persistence(#[from] ConfigError),

    /// Propagation stopped at `manager`; managers in `applied` keep the new URL.
    #[error("failed to apply registry '{url}' to {manager}{}", applied_suffix(.applied))]
    ApplyFailed {
        url: String,
        manager: PackageManagerKind,
        applied: Vec<PackageManagerKind>,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read active registry of {manager}")]
    ActiveRegistry {
        manager: PackageManagerKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("no reachable registry among {tested} tested")]
    NoReachableRegistry { tested: usize },

    #[error("failed to initialize latency prober")]
    Prober(#[source] anyhow::Error),
}

impl RegistryError {
    /// The configuration document does not exist yet.
    pub fn is_config_missing(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.is_not_found())
    }
}

fn applied_suffix(applied: &[PackageManagerKind]) -> String {
    if applied.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = applied.iter().map(|kind| kind.id()).collect();
    format!(" (already applied to: {})", names.join(", "))
}
