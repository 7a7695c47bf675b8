//! clientgen - lazily constructed clients for cluster backend APIs
//!
//! Resolves credentials for a cluster API server from an explicit
//! kubeconfig, the default kubeconfig, or the in-cluster service account,
//! and hands out one shared client per backend (core cluster, service
//! mesh, gateway), each built on first use.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): connection models, the transport port, errors
//! - **Service Layer** (`services`): the lazy client registry
//! - **Infrastructure Layer** (`infrastructure`): credentials, transport,
//!   backend clients, configuration, logging
//! - **CLI Layer** (`cli`): the `clientgen` binary
//!
//! # Example
//!
//! ```no_run
//! use clientgen::{BackendKind, ClientRegistry, ConnectionConfig};
//! use std::time::Duration;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ConnectionConfig::new().with_timeout(Duration::from_secs(30));
//! let registry = ClientRegistry::new(config);
//!
//! let cluster = registry.cluster()?;
//! println!("{}", cluster.version().await?.git_version);
//!
//! let gateway = registry.get_client(BackendKind::Gateway)?;
//! println!("{}", gateway.discover().await?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    BackendKind, ConnectionConfig, CredentialSource, RequestMetrics, ResolvedConfig,
};
pub use domain::ports::Transport;
pub use domain::{ClientConstructionError, ClientError, ConfigError, TransportError};
pub use infrastructure::backends::{
    BackendClient, ClientFactories, ClusterClient, ClusterClientFactory, ExtensionClient,
    ExtensionClientFactory,
};
pub use infrastructure::config::{Settings, SettingsLoader};
pub use infrastructure::credentials::{resolve, CredentialResolver};
pub use services::ClientRegistry;
