//! Playground core library: domain types, metadata store, catalog, config, errors.
//!
//! - [`types`]: records, newtypes and live views
//! - [`store`]: [`MetadataStore`] over `meta.json`
//! - [`catalog`]: the static app catalog
//! - [`config`]: optional `config.yaml`
//! - [`tools`]: resolving and running external tools
//! - [`error`]: [`PlaygroundError`] and [`ErrorKind`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod paths;
pub mod store;
pub mod tools;
pub mod types;

pub use catalog::Catalog;
pub use config::{Config, ToolConfig};
pub use error::{ErrorKind, PlaygroundError};
pub use store::MetadataStore;
pub use types::{
    AppId, CatalogApp, ContainerPlayground, ContainerStatus, DevLog, PlaygroundId,
    PlaygroundRecord, PlaygroundView, RepoPlayground,
};
