//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigStore, default_config_path};
use crate::manager::LocalAdapter;
use crate::registry::{BuiltinCatalog, RegistryError, RegistryResolver};

/// Paths and services shared by every command.
///
/// Frontends create this once and pass it to commands.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    config_path: PathBuf,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(home_dir: PathBuf, config_path: PathBuf) -> Self {
        Self {
            home_dir,
            config_path,
        }
    }

    /// Context for the current user, optionally overriding the config file.
    pub fn with_defaults(config_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let config_path = match config_override {
            Some(path) => path,
            None => default_config_path()?,
        };
        Ok(Self::new(home_dir, config_path))
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get a ConfigStore for the configured document.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::from_path(self.config_path.clone())
    }

    /// Get a LocalAdapter rooted at the home directory.
    pub fn adapter(&self) -> LocalAdapter {
        LocalAdapter::new(self.home_dir.clone())
    }

    /// Open a resolver over the builtin catalog and the configured document.
    pub fn resolver(&self) -> Result<RegistryResolver, RegistryError> {
        RegistryResolver::open(
            BuiltinCatalog::default(),
            Arc::new(self.config_store()),
            Arc::new(self.adapter()),
        )
    }
}
