//! Package manager adapter layer
//!
//! Provides abstraction over the package managers whose active registry
//! regmux switches:
//! - Detection of installed managers and their versions
//! - Reading and writing each manager's user-level registry setting
//! - Restoring managers to their stock registries

pub mod local;
pub mod rc_format;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

pub use local::LocalAdapter;
pub use rc_format::RcFormat;

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManagerKind {
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

impl PackageManagerKind {
    pub const ALL: [PackageManagerKind; 4] = [
        PackageManagerKind::Npm,
        PackageManagerKind::Yarn,
        PackageManagerKind::Pnpm,
        PackageManagerKind::Bun,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "npm",
            PackageManagerKind::Yarn => "yarn",
            PackageManagerKind::Pnpm => "pnpm",
            PackageManagerKind::Bun => "bun",
        }
    }

    /// Registry the manager uses when its config sets none.
    pub fn default_registry(self) -> &'static str {
        match self {
            PackageManagerKind::Yarn => "https://registry.yarnpkg.com/",
            PackageManagerKind::Npm | PackageManagerKind::Pnpm | PackageManagerKind::Bun => {
                "https://registry.npmjs.org/"
            }
        }
    }

    /// User config file, relative to the home directory.
    ///
    /// pnpm reads npm's `.npmrc`.
    pub fn rc_file(self) -> &'static str {
        match self {
            PackageManagerKind::Npm | PackageManagerKind::Pnpm => ".npmrc",
            PackageManagerKind::Yarn => ".yarnrc",
            PackageManagerKind::Bun => ".bunfig.toml",
        }
    }

    pub fn rc_format(self) -> RcFormat {
        match self {
            PackageManagerKind::Npm | PackageManagerKind::Pnpm => RcFormat::Npmrc,
            PackageManagerKind::Yarn => RcFormat::Yarnrc,
            PackageManagerKind::Bun => RcFormat::Bunfig,
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PackageManagerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageManagerKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unsupported package manager: '{}'. Use npm, yarn, pnpm or bun",
                    s
                )
            })
    }
}

/// Registry setting read from a manager's config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRegistryUrl {
    /// Configured URL, or the manager's default when none is set
    pub url: String,
    pub config_path: PathBuf,
    pub config_exists: bool,
}

/// Detection result for one package manager
#[derive(Debug, Clone)]
pub struct PackageManagerInfo {
    pub kind: PackageManagerKind,
    pub installed: bool,
    pub version: Option<String>,
    pub registry_url: Option<String>,
    pub config_path: Option<PathBuf>,
    pub config_exists: bool,
    /// Why detection failed, when it did
    pub error: Option<String>,
}

impl PackageManagerInfo {
    pub fn not_installed(kind: PackageManagerKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            installed: false,
            version: None,
            registry_url: None,
            config_path: None,
            config_exists: false,
            error: Some(error.into()),
        }
    }
}

/// Capability to inspect and reconfigure package managers.
///
/// The resolver only sees this trait; file syntax stays behind it.
pub trait PackageManagerAdapter: Send + Sync + fmt::Debug {
    /// Detect every supported manager, in [`PackageManagerKind::ALL`] order.
    fn detect(&self) -> Vec<PackageManagerInfo>;

    fn active_registry(&self, kind: PackageManagerKind) -> anyhow::Result<ActiveRegistryUrl>;

    fn set_active_registry(&self, kind: PackageManagerKind, url: &str) -> anyhow::Result<()>;

    /// Installed managers only.
    fn installed(&self) -> Vec<PackageManagerKind> {
        self.detect()
            .into_iter()
            .filter(|info| info.installed)
            .map(|info| info.kind)
            .collect()
    }
}

/// Outcome of resetting managers to their default registries
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: Vec<PackageManagerKind>,
    pub not_installed: Vec<PackageManagerKind>,
    pub failed: Vec<(PackageManagerKind, anyhow::Error)>,
}

/// Point each requested, installed manager back at its default registry.
///
/// Keeps going past individual failures.
pub fn restore_defaults(
    adapter: &dyn PackageManagerAdapter,
    kinds: &[PackageManagerKind],
) -> RestoreReport {
    let installed = adapter.installed();
    let mut report = RestoreReport::default();

    for &kind in kinds {
        if !installed.contains(&kind) {
            report.not_installed.push(kind);
            continue;
        }
        match adapter.set_active_registry(kind, kind.default_registry()) {
            Ok(()) => {
                info!(manager = %kind, "restored default registry");
                report.restored.push(kind);
            }
            Err(e) => {
                warn!(manager = %kind, error = %e, "failed to restore default registry");
                report.failed.push((kind, e));
            }
        }
    }

    report
}
