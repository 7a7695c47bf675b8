//! Credentials management infrastructure
//!
//! Layered credential resolution for cluster backends:
//! - Explicit kubeconfig path (with optional server override)
//! - Default kubeconfig location (`$HOME/.kube/config`)
//! - In-cluster service account identity

pub mod in_cluster;
pub mod kubeconfig;
pub mod resolver;

pub use kubeconfig::Kubeconfig;
pub use resolver::{default_kubeconfig_path, resolve, CredentialResolver};

use reqwest::Url;

use crate::domain::errors::ConfigError;
use crate::domain::models::{ClusterEndpoint, CredentialSource, Credentials};

/// Endpoint and authentication material loaded from one credential source,
/// before any transport is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCredentials {
    /// Source the material came from.
    pub source: CredentialSource,
    /// Server, TLS settings and namespace.
    pub endpoint: ClusterEndpoint,
    /// Authentication material.
    pub credentials: Credentials,
}

/// Check that `server` is an absolute http(s) URL with a host.
pub(crate) fn validate_server(
    server: &str,
    attempted: &CredentialSource,
) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        attempted: attempted.clone(),
        endpoint: server.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(server).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(server.trim_end_matches('/').to_string())
}
