//! Regmux Core Library
//!
//! Provides the domain logic for discovering, switching between and
//! benchmarking package-registry mirrors across npm, yarn, pnpm and bun.

pub mod config;
pub mod context;
pub mod latency;
pub mod manager;
pub mod registry;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConfigError, ConfigStore, CustomRegistry, DocumentStore, RegistryDocument,
    };

    // Registries
    pub use crate::registry::{
        BuiltinCatalog, RegistryError, RegistryResolver, RemoveAllReport, RenameReport,
        SelectionReport, UseReport,
    };
    pub use crate::types::{RegistryEntry, RegistryOrigin};

    // Latency
    pub use crate::latency::{LatencyProber, LatencyResult, LatencyTarget, ProbeOptions};

    // Package managers
    pub use crate::manager::{LocalAdapter, PackageManagerAdapter, PackageManagerKind};

    // Context
    pub use crate::context::AppContext;
}
