use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared inputs every backend is configured from.
///
/// Immutable once built. Empty strings are treated as "not set" so callers
/// can pass raw flag values straight through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    credential_source: Option<PathBuf>,
    endpoint_override: Option<String>,
    request_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create a config with no explicit source, no override and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the three raw inputs.
    ///
    /// A zero `request_timeout` means no timeout.
    pub fn from_parts(
        credential_source: impl AsRef<str>,
        endpoint_override: impl AsRef<str>,
        request_timeout: Duration,
    ) -> Self {
        Self::new()
            .with_credential_source(credential_source.as_ref())
            .with_endpoint_override(endpoint_override.as_ref())
            .with_timeout(request_timeout)
    }

    /// Path of a kubeconfig file to load credentials from. Empty means
    /// "probe the default locations".
    pub fn with_credential_source(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.credential_source = if path.as_os_str().is_empty() {
            None
        } else {
            Some(path.to_path_buf())
        };
        self
    }

    /// Server address that replaces the one recorded in the credential source.
    pub fn with_endpoint_override(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let endpoint = endpoint.trim();
        self.endpoint_override = if endpoint.is_empty() {
            None
        } else {
            Some(endpoint.to_string())
        };
        self
    }

    /// Per-request timeout. `Duration::ZERO` disables the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    /// Per-request timeout in signed seconds. Zero or negative disables the timeout.
    pub fn with_timeout_secs(mut self, secs: i64) -> Self {
        self.request_timeout = u64::try_from(secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        self
    }

    /// Explicit kubeconfig path, if one was given.
    pub fn credential_source(&self) -> Option<&Path> {
        self.credential_source.as_deref()
    }

    /// Server address replacing the one in the kubeconfig.
    pub fn endpoint_override(&self) -> Option<&str> {
        self.endpoint_override.as_deref()
    }

    /// `None` means requests run without a deadline.
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

/// Where a set of credentials came from (or was attempted from).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Kubeconfig path supplied by the caller.
    Explicit(PathBuf),
    /// Kubeconfig found at the well-known default location.
    DefaultFile(PathBuf),
    /// Service-account identity of a pod running inside the cluster.
    InCluster,
}

impl CredentialSource {
    /// Kubeconfig path, when the source is file based.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::DefaultFile(path) => Some(path),
            Self::InCluster => None,
        }
    }

    /// Short label for logs and tables.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "explicit",
            Self::DefaultFile(_) => "default-file",
            Self::InCluster => "in-cluster",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) => write!(f, "kubeconfig {}", path.display()),
            Self::DefaultFile(path) => write!(f, "default kubeconfig {}", path.display()),
            Self::InCluster => f.write_str("in-cluster service account"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs_are_unset() {
        let config = ConnectionConfig::from_parts("", "  ", Duration::ZERO);
        assert_eq!(config.credential_source(), None);
        assert_eq!(config.endpoint_override(), None);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_from_parts_keeps_values() {
        let config =
            ConnectionConfig::from_parts("/tmp/cfg", "https://override:6443", Duration::from_secs(30));
        assert_eq!(config.credential_source(), Some(Path::new("/tmp/cfg")));
        assert_eq!(config.endpoint_override(), Some("https://override:6443"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_non_positive_timeout_secs_disable_timeout() {
        assert_eq!(ConnectionConfig::new().with_timeout_secs(0).request_timeout(), None);
        assert_eq!(ConnectionConfig::new().with_timeout_secs(-5).request_timeout(), None);
        assert_eq!(
            ConnectionConfig::new().with_timeout_secs(45).request_timeout(),
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    fn test_source_display_names_the_path() {
        let source = CredentialSource::Explicit(PathBuf::from("/etc/kube/admin.conf"));
        assert_eq!(source.to_string(), "kubeconfig /etc/kube/admin.conf");
        assert_eq!(source.path(), Some(Path::new("/etc/kube/admin.conf")));
        assert_eq!(CredentialSource::InCluster.path(), None);
    }
}
