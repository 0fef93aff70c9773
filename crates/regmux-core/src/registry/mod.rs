//! Registry namespace and selection
//!
//! Merges the builtin catalog with the user's custom registries:
//! - Lookup and sorted listing across both sources
//! - Add, remove and rename of custom registries with persistence
//! - Propagating the chosen registry to installed package managers
//! - Latency testing and fastest-registry selection

pub mod catalog;
pub mod error;
pub mod resolver;
pub mod selection;
pub mod validate;

pub use catalog::BuiltinCatalog;
pub use error::RegistryError;
pub use resolver::{
    PROBE_PATH, REFERENCE_MANAGER, RegistryResolver, RemoveAllReport, RenameReport, UseReport,
};
pub use selection::{SelectionReport, pick_winner, rank_results};
pub use validate::{NAME_PATTERN, validate_name, validate_url};
