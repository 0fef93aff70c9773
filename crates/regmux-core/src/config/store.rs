//! Config store for loading and saving config.toml.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ConfigError, RegistryDocument, parser, paths::default_config_path};

const DEFAULT_TEMPLATE: &str = include_str!("default_config.toml");

/// Persistence contract for the configuration document.
///
/// The document is always read and written as a whole.
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Load the document. Fails with [`ConfigError::NotFound`] if it was never initialized.
    fn load(&self) -> Result<RegistryDocument, ConfigError>;

    /// Replace the persisted document.
    fn save(&self, document: &RegistryDocument) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::from_path(default_config_path()?))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Write the commented default template.
    pub fn init(&self, force: bool) -> Result<(), ConfigError> {
        if self.exists() && !force {
            return Err(ConfigError::AlreadyExists {
                path: self.config_path.clone(),
            });
        }
        self.write(DEFAULT_TEMPLATE)
    }

    /// Raw file contents, for display.
    pub fn read_raw(&self) -> Result<String, ConfigError> {
        if !self.exists() {
            return Err(ConfigError::NotFound {
                path: self.config_path.clone(),
            });
        }
        std::fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Read {
            path: self.config_path.clone(),
            source,
        })
    }

    fn write(&self, content: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.config_path, content).map_err(|source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        })?;
        debug!(path = %self.config_path.display(), "wrote config document");
        Ok(())
    }
}

impl DocumentStore for ConfigStore {
    fn load(&self) -> Result<RegistryDocument, ConfigError> {
        parser::parse_document(&self.config_path)
    }

    fn save(&self, document: &RegistryDocument) -> Result<(), ConfigError> {
        let mut document = document.clone();
        document.validate()?;
        let content = parser::to_toml(&document)?;
        self.write(&content)
    }
}
