//! Pluggable connectors to external systems and the registry that owns their
//! lifecycle: initialize → validate → connect on registration (all or
//! nothing), disconnect on removal, concurrent disconnect on shutdown.

pub mod adapter;
pub mod catalog;
pub mod registry;

pub use adapter::{IntegrationAdapter, IntegrationCapability, IntegrationConfig};
pub use catalog::CatalogAdapter;
pub use registry::{AdapterState, IntegrationRegistry};
