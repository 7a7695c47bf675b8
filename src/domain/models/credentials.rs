use std::fmt;

/// Default namespace when neither the kubeconfig context nor the service
/// account names one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Address and TLS settings of an API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEndpoint {
    /// Base URL of the API server, without a trailing slash.
    pub server: String,
    /// PEM bundle used to verify the server certificate.
    pub ca_pem: Option<Vec<u8>>,
    /// Skip server certificate verification.
    pub insecure_skip_tls_verify: bool,
    /// Namespace used when a request does not name one.
    pub namespace: String,
}

impl ClusterEndpoint {
    /// Endpoint for `server` in the default namespace; a trailing `/` is dropped.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            ca_pem: None,
            insecure_skip_tls_verify: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Set the namespace; blank values keep the current one.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !namespace.trim().is_empty() {
            self.namespace = namespace.trim().to_string();
        }
        self
    }

    /// Trust `pem` when verifying the server.
    pub fn with_ca_pem(mut self, pem: Vec<u8>) -> Self {
        self.ca_pem = Some(pem);
        self
    }
}

/// How requests authenticate to the API server.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No authentication material.
    #[default]
    Anonymous,
    /// `Authorization: Bearer <token>`.
    BearerToken(String),
    /// HTTP basic authentication.
    Basic {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// Mutual TLS with a PEM client certificate and key.
    ClientCertificate {
        /// PEM certificate chain presented to the server.
        certificate_pem: Vec<u8>,
        /// PEM private key for `certificate_pem`.
        key_pem: Vec<u8>,
    },
}

impl Credentials {
    /// Authentication method name, safe to log.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::BearerToken(_) => "bearer-token",
            Self::Basic { .. } => "basic",
            Self::ClientCertificate { .. } => "client-certificate",
        }
    }
}

// Secrets never reach logs or panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::BearerToken(_) => f.debug_tuple("BearerToken").field(&"[REDACTED]").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::ClientCertificate {
                certificate_pem, ..
            } => f
                .debug_struct("ClientCertificate")
                .field("certificate_bytes", &certificate_pem.len())
                .field("key_pem", &"[REDACTED]")
                .finish(),
        }
    }
}
