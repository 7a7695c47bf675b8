//! Credential resolution in priority order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::in_cluster::{self, DEFAULT_SERVICE_ACCOUNT_DIR};
use super::{kubeconfig, LoadedCredentials};
use crate::domain::errors::ConfigError;
use crate::domain::models::{ConnectionConfig, CredentialSource, RequestMetrics, ResolvedConfig};
use crate::infrastructure::transport::{HttpTransport, InstrumentedTransport};

/// Well-known per-user kubeconfig location, `$HOME/.kube/config`.
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".kube").join("config"))
}

/// Resolves a [`ConnectionConfig`] into credentials and a ready transport.
///
/// Resolution order, first match wins:
/// 1. explicit kubeconfig path from the config
/// 2. the default kubeconfig file, if it exists
/// 3. the in-cluster service account
///
/// The endpoint override is applied whenever a kubeconfig file is used.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    default_kubeconfig: Option<PathBuf>,
    service_account_dir: PathBuf,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver {
    /// Resolver probing `$HOME/.kube/config` and the standard service account mount.
    pub fn new() -> Self {
        Self {
            default_kubeconfig: default_kubeconfig_path(),
            service_account_dir: PathBuf::from(DEFAULT_SERVICE_ACCOUNT_DIR),
        }
    }

    /// Probe `path` instead of `$HOME/.kube/config`.
    #[must_use]
    pub fn with_default_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_kubeconfig = Some(path.into());
        self
    }

    /// Never probe a default kubeconfig file.
    #[must_use]
    pub fn without_default_kubeconfig(mut self) -> Self {
        self.default_kubeconfig = None;
        self
    }

    /// Read the service account from `dir` instead of the standard mount.
    #[must_use]
    pub fn with_service_account_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.service_account_dir = dir.into();
        self
    }

    /// Default kubeconfig path probed when no explicit path is given.
    pub fn default_kubeconfig(&self) -> Option<&Path> {
        self.default_kubeconfig.as_deref()
    }

    /// Pick the credential source without reading it.
    pub fn locate(&self, config: &ConnectionConfig) -> CredentialSource {
        if let Some(path) = config.credential_source() {
            return CredentialSource::Explicit(path.to_path_buf());
        }

        match &self.default_kubeconfig {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "using default kubeconfig");
                CredentialSource::DefaultFile(path.clone())
            }
            Some(path) => {
                debug!(path = %path.display(), "no default kubeconfig, assuming in-cluster");
                CredentialSource::InCluster
            }
            None => CredentialSource::InCluster,
        }
    }

    /// Load endpoint and credentials, without building a transport.
    pub fn load(&self, config: &ConnectionConfig) -> Result<LoadedCredentials, ConfigError> {
        match self.locate(config) {
            CredentialSource::InCluster => {
                if let Some(endpoint) = config.endpoint_override() {
                    warn!(endpoint, "endpoint override ignored for in-cluster credentials");
                }
                in_cluster::load(&self.service_account_dir)
            }
            source => {
                let path = source.path().map(Path::to_path_buf).unwrap_or_default();
                kubeconfig::load(&path, &source, config.endpoint_override())
            }
        }
    }

    /// Resolve credentials and wrap the resulting transport with request
    /// instrumentation and the configured timeout.
    #[instrument(
        skip(self, config),
        fields(source = tracing::field::Empty, server = tracing::field::Empty)
    )]
    pub fn resolve(&self, config: &ConnectionConfig) -> Result<ResolvedConfig, ConfigError> {
        let loaded = self.load(config)?;
        let timeout = config.request_timeout();

        let span = tracing::Span::current();
        span.record("source", tracing::field::display(&loaded.source));
        span.record("server", loaded.endpoint.server.as_str());

        let transport = HttpTransport::new(&loaded.endpoint, &loaded.credentials, timeout)
            .map_err(|e| ConfigError::Transport {
                attempted: loaded.source.clone(),
                reason: e.to_string(),
            })?;
        let metrics = Arc::new(RequestMetrics::new());
        let transport = Arc::new(InstrumentedTransport::new(transport, Arc::clone(&metrics)));

        info!(
            auth = loaded.credentials.kind(),
            namespace = %loaded.endpoint.namespace,
            timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            "credentials resolved"
        );

        Ok(ResolvedConfig::new(
            loaded.source,
            loaded.endpoint,
            loaded.credentials,
            timeout,
            transport,
            metrics,
        ))
    }
}

/// Resolve with the default resolver from the three raw inputs.
///
/// An empty path or override means "not set"; a zero timeout means no timeout.
pub fn resolve(
    credential_source: &str,
    endpoint_override: &str,
    request_timeout: Duration,
) -> Result<ResolvedConfig, ConfigError> {
    let config = ConnectionConfig::from_parts(credential_source, endpoint_override, request_timeout);
    CredentialResolver::new().resolve(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins_over_default_file() {
        let default = tempfile::NamedTempFile::new().unwrap();
        let resolver = CredentialResolver::new().with_default_kubeconfig(default.path());
        let config = ConnectionConfig::new().with_credential_source("/tmp/cfg");

        assert_eq!(
            resolver.locate(&config),
            CredentialSource::Explicit(PathBuf::from("/tmp/cfg"))
        );
    }

    #[test]
    fn test_existing_default_file_wins_over_in_cluster() {
        let default = tempfile::NamedTempFile::new().unwrap();
        let resolver = CredentialResolver::new().with_default_kubeconfig(default.path());

        assert_eq!(
            resolver.locate(&ConnectionConfig::new()),
            CredentialSource::DefaultFile(default.path().to_path_buf())
        );
    }

    #[test]
    fn test_missing_default_file_falls_back_to_in_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CredentialResolver::new().with_default_kubeconfig(dir.path().join("config"));
        assert_eq!(resolver.locate(&ConnectionConfig::new()), CredentialSource::InCluster);

        let resolver = CredentialResolver::new().without_default_kubeconfig();
        assert_eq!(resolver.locate(&ConnectionConfig::new()), CredentialSource::InCluster);
    }

    #[test]
    fn test_default_path_is_under_home() {
        let path = temp_env::with_var("HOME", Some("/home/dev"), default_kubeconfig_path);
        assert_eq!(path, Some(PathBuf::from("/home/dev/.kube/config")));
    }
}
