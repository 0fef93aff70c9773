//! Configuration document management
//!
//! The document holds the user's custom registries and the probe
//! concurrency setting:
//! - Default location: `<config dir>/regmux/config.toml`
//! - Overridable per invocation (`--config <path>`)

pub mod error;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use error::ConfigError;
pub use parser::{parse_document, parse_document_str, to_toml};
pub use paths::default_config_path;
pub use schema::{
    CustomRegistry, DEFAULT_MAX_CONCURRENT_REQUESTS, MAX_CONCURRENT_REQUESTS_LIMIT,
    RegistryDocument,
};
pub use store::{ConfigStore, DocumentStore};
