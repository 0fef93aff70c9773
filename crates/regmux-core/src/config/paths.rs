//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub fn config_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join("regmux").join(CONFIG_FILE_NAME)
}

/// Default location of the config document for the current user.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(config_path_in(&config_dir))
}
