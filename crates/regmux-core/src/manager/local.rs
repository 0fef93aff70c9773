//! Adapter operating on the user's home directory and installed binaries.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use tracing::debug;

use super::{ActiveRegistryUrl, PackageManagerAdapter, PackageManagerInfo, PackageManagerKind};

#[derive(Debug, Clone)]
pub struct LocalAdapter {
    home_dir: PathBuf,
    /// Skip binary probing and treat these managers as installed
    assumed_installed: Option<Vec<PackageManagerKind>>,
}

impl LocalAdapter {
    pub fn new(home_dir: PathBuf) -> Self {
        Self {
            home_dir,
            assumed_installed: None,
        }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self::new(home_dir))
    }

    /// Bypass `<manager> -v` detection.
    pub fn with_assumed_installed(mut self, kinds: Vec<PackageManagerKind>) -> Self {
        self.assumed_installed = Some(kinds);
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn config_path(&self, kind: PackageManagerKind) -> PathBuf {
        self.home_dir.join(kind.rc_file())
    }

    fn detect_one(&self, kind: PackageManagerKind) -> PackageManagerInfo {
        let version = match &self.assumed_installed {
            Some(kinds) if kinds.contains(&kind) => Ok(String::new()),
            Some(_) => Err(format!("{} not installed", kind)),
            None => query_version(kind),
        };

        let version = match version {
            Ok(version) => version,
            Err(e) => return PackageManagerInfo::not_installed(kind, e),
        };

        let mut info = PackageManagerInfo {
            kind,
            installed: true,
            version: (!version.is_empty()).then_some(version),
            registry_url: None,
            config_path: None,
            config_exists: false,
            error: None,
        };

        match self.active_registry(kind) {
            Ok(active) => {
                info.registry_url = Some(active.url);
                info.config_path = Some(active.config_path);
                info.config_exists = active.config_exists;
            }
            Err(e) => info.error = Some(format!("{:#}", e)),
        }

        info
    }
}

/// Executable names to try for `kind`, in order.
///
/// On Windows npm, pnpm and yarn are installed as `.cmd` shims that
/// `Command` does not resolve from the bare name.
fn version_command_names(kind: PackageManagerKind, windows: bool) -> Vec<String> {
    let mut names = vec![kind.id().to_string()];
    if windows {
        names.push(format!("{}.cmd", kind.id()));
    }
    names
}

fn query_version(kind: PackageManagerKind) -> Result<String, String> {
    let mut last_error = None;

    for program in version_command_names(kind, cfg!(windows)) {
        let output = match Command::new(&program).arg("-v").output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(manager = %kind, program = %program, "executable not found");
                last_error = Some(format!("{} -v: {}", program, e));
                continue;
            }
            Err(e) => return Err(format!("{} -v: {}", program, e)),
        };

        if !output.status.success() {
            return Err(format!("{} -v exited with {}", program, output.status));
        }
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }

    Err(last_error.unwrap_or_else(|| format!("{} not found", kind)))
}

impl PackageManagerAdapter for LocalAdapter {
    fn detect(&self) -> Vec<PackageManagerInfo> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = PackageManagerKind::ALL
                .into_iter()
                .map(|kind| (kind, scope.spawn(move || self.detect_one(kind))))
                .collect();

            handles
                .into_iter()
                .map(|(kind, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        PackageManagerInfo::not_installed(kind, "detection panicked")
                    })
                })
                .collect()
        })
    }

    fn active_registry(&self, kind: PackageManagerKind) -> anyhow::Result<ActiveRegistryUrl> {
        let config_path = self.config_path(kind);

        let content = match std::fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ActiveRegistryUrl {
                    url: kind.default_registry().to_string(),
                    config_path,
                    config_exists: false,
                });
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                });
            }
        };

        let url = kind
            .rc_format()
            .parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?
            .unwrap_or_else(|| kind.default_registry().to_string());

        Ok(ActiveRegistryUrl {
            url,
            config_path,
            config_exists: true,
        })
    }

    fn set_active_registry(&self, kind: PackageManagerKind, url: &str) -> anyhow::Result<()> {
        let config_path = self.config_path(kind);

        let existing = match std::fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                });
            }
        };

        let updated = kind
            .rc_format()
            .write(&existing, url)
            .with_context(|| format!("Failed to update config file: {}", config_path.display()))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&config_path, updated)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        debug!(manager = %kind, path = %config_path.display(), url, "set registry");
        Ok(())
    }
}
