//! Error taxonomy for credential resolution, client construction and requests.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::models::{BackendKind, CredentialSource};

/// Credential source missing, unreadable or malformed.
///
/// Every variant records the source that was being resolved so the first
/// failure can be reported verbatim.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Kubeconfig, token or certificate file could not be read.
    #[error("failed to read {} while loading {attempted}: {error}", .path.display())]
    Read {
        /// Source being resolved.
        attempted: CredentialSource,
        /// File that failed to read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        error: std::io::Error,
    },

    /// Kubeconfig is not valid YAML for the expected schema.
    #[error("failed to parse {attempted}: {error}")]
    Parse {
        /// Source being resolved.
        attempted: CredentialSource,
        /// YAML failure.
        #[source]
        error: serde_yaml::Error,
    },

    /// Kubeconfig does not select a context.
    #[error("{attempted} has no current-context set")]
    NoCurrentContext {
        /// Source being resolved.
        attempted: CredentialSource,
    },

    /// `current-context` names a context that is not defined.
    #[error("context '{context}' not found in {attempted}")]
    ContextNotFound {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Context name.
        context: String,
    },

    /// The context references an undefined cluster.
    #[error("cluster '{cluster}' not found in {attempted}")]
    ClusterNotFound {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Cluster name.
        cluster: String,
    },

    /// The context references an undefined user.
    #[error("user '{user}' not found in {attempted}")]
    UserNotFound {
        /// Source being resolved.
        attempted: CredentialSource,
        /// User name.
        user: String,
    },

    /// Cluster entry without a server and no override given.
    #[error("cluster '{cluster}' in {attempted} has no server address")]
    MissingServer {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Cluster name.
        cluster: String,
    },

    /// Server address that is not an absolute http(s) URL.
    #[error("invalid server address '{endpoint}' for {attempted}: {reason}")]
    InvalidEndpoint {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Rejected address.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An inline `*-data` field failed to decode.
    #[error("field '{field}' in {attempted} is not valid base64: {error}")]
    InvalidBase64 {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Kubeconfig field name.
        field: String,
        /// Decoder failure.
        #[source]
        error: base64::DecodeError,
    },

    /// In-cluster fallback without the service environment.
    #[error("not running inside a cluster: {variable} is not set")]
    NotInCluster {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Missing environment variable.
        variable: String,
    },

    /// TLS material or auth values the HTTP client rejected.
    #[error("cannot build a transport from {attempted}: {reason}")]
    Transport {
        /// Source being resolved.
        attempted: CredentialSource,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// The credential source whose resolution failed.
    pub fn attempted(&self) -> &CredentialSource {
        match self {
            Self::Read { attempted, .. }
            | Self::Parse { attempted, .. }
            | Self::NoCurrentContext { attempted }
            | Self::ContextNotFound { attempted, .. }
            | Self::ClusterNotFound { attempted, .. }
            | Self::UserNotFound { attempted, .. }
            | Self::MissingServer { attempted, .. }
            | Self::InvalidEndpoint { attempted, .. }
            | Self::InvalidBase64 { attempted, .. }
            | Self::NotInCluster { attempted, .. }
            | Self::Transport { attempted, .. } => attempted,
        }
    }
}

/// A backend factory failed after configuration was available.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to construct {backend} client from {attempted}: {reason}")]
pub struct ClientConstructionError {
    /// Slot whose factory failed.
    pub backend: BackendKind,
    /// Human-readable credential source the factory worked from.
    pub attempted: String,
    /// What went wrong.
    pub reason: String,
}

impl ClientConstructionError {
    /// Construction failure for `backend`, built from `attempted`.
    pub fn new(
        backend: BackendKind,
        attempted: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            attempted: attempted.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error returned by registry accessors.
///
/// Clonable so one cached failure can be handed to every caller of a slot.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The credential source could not be resolved.
    #[error("credential resolution for the {backend} client failed: {source}")]
    Config {
        /// Slot that was being built.
        backend: BackendKind,
        /// Resolution failure.
        #[source]
        source: Arc<ConfigError>,
    },

    /// The factory failed after a usable source was found.
    #[error(transparent)]
    Construction(Arc<ClientConstructionError>),
}

impl ClientError {
    /// Slot the error belongs to.
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Config { backend, .. } => *backend,
            Self::Construction(error) => error.backend,
        }
    }

    /// Whether credential resolution failed.
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Whether the factory itself failed.
    pub const fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }
}

impl From<ClientConstructionError> for ClientError {
    fn from(error: ClientConstructionError) -> Self {
        Self::Construction(Arc::new(error))
    }
}

/// Request-time failures. Never produced while building clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received.
    #[error("request to {path} failed: {message}")]
    Request {
        /// Request path.
        path: String,
        /// Underlying client error.
        message: String,
    },

    /// The per-request timeout elapsed.
    #[error("request to {path} timed out")]
    Timeout {
        /// Request path.
        path: String,
    },

    /// Non-2xx status where a success was required.
    #[error("request to {path} returned HTTP {status}: {body}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The body was not the expected JSON.
    #[error("failed to decode response from {path}: {message}")]
    Decode {
        /// Request path.
        path: String,
        /// Decoder error.
        message: String,
    },
}
