//! Kubeconfig file loading.
//!
//! Only the subset needed to reach one API server is modelled: clusters,
//! users, contexts and `current-context`. Exec and auth-provider plugins
//! are not supported.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{validate_server, LoadedCredentials};
use crate::domain::errors::ConfigError;
use crate::domain::models::{ClusterEndpoint, CredentialSource, Credentials};

/// Parsed kubeconfig document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kubeconfig {
    /// Named API servers.
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    /// Named identities.
    #[serde(default)]
    pub users: Vec<NamedUser>,
    /// Cluster/user/namespace triples.
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    /// Context selected when none is named explicitly.
    #[serde(default)]
    pub current_context: Option<String>,
}

/// `clusters[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedCluster {
    /// Name referenced by contexts.
    pub name: String,
    /// Connection details.
    #[serde(default)]
    pub cluster: ClusterEntry,
}

/// How to reach and verify one API server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterEntry {
    /// Base URL of the API server.
    pub server: Option<String>,
    /// CA bundle file, relative to the kubeconfig directory.
    pub certificate_authority: Option<PathBuf>,
    /// Base64 CA bundle; wins over `certificate_authority`.
    pub certificate_authority_data: Option<String>,
    /// Skip server certificate verification.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

/// `users[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedUser {
    /// Name referenced by contexts.
    pub name: String,
    /// Authentication material.
    #[serde(default)]
    pub user: UserEntry,
}

/// Static authentication material for one user.
///
/// Checked in field order: token, token file, client certificate, basic.
/// `*-data` fields are base64 and win over their file counterparts.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserEntry {
    /// Bearer token.
    pub token: Option<String>,
    /// File holding a bearer token.
    #[serde(rename = "tokenFile")]
    pub token_file: Option<PathBuf>,
    /// Basic auth user.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// PEM client certificate file.
    pub client_certificate: Option<PathBuf>,
    /// Base64 PEM client certificate.
    pub client_certificate_data: Option<String>,
    /// PEM private key file.
    pub client_key: Option<PathBuf>,
    /// Base64 PEM private key.
    pub client_key_data: Option<String>,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_file", &self.token_file)
            .field("username", &self.username)
            .field("client_certificate", &self.client_certificate)
            .field("client_key", &self.client_key)
            .finish_non_exhaustive()
    }
}

/// `contexts[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedContext {
    /// Name matched against `current-context`.
    pub name: String,
    /// What the context selects.
    pub context: ContextEntry,
}

/// Cluster, user and namespace selected by a context.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextEntry {
    /// Name of a `clusters[]` entry.
    pub cluster: String,
    /// Name of a `users[]` entry; `None` connects anonymously.
    #[serde(default)]
    pub user: Option<String>,
    /// Default namespace for requests.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Kubeconfig {
    /// Read and parse the kubeconfig at `path`.
    pub fn read(path: &Path, attempted: &CredentialSource) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            attempted: attempted.clone(),
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse(&contents, attempted)
    }

    /// Parse kubeconfig YAML; `attempted` labels errors.
    pub fn parse(contents: &str, attempted: &CredentialSource) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|error| ConfigError::Parse {
            attempted: attempted.clone(),
            error,
        })
    }

    /// Look up the current context and the cluster and user it points at.
    pub fn current(
        &self,
        attempted: &CredentialSource,
    ) -> Result<(&ContextEntry, &ClusterEntry, Option<&UserEntry>), ConfigError> {
        let context_name = self
            .current_context
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ConfigError::NoCurrentContext {
                attempted: attempted.clone(),
            })?;

        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .map(|c| &c.context)
            .ok_or_else(|| ConfigError::ContextNotFound {
                attempted: attempted.clone(),
                context: context_name.to_string(),
            })?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| ConfigError::ClusterNotFound {
                attempted: attempted.clone(),
                cluster: context.cluster.clone(),
            })?;

        let user = match context.user.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => Some(
                self.users
                    .iter()
                    .find(|u| u.name == name)
                    .map(|u| &u.user)
                    .ok_or_else(|| ConfigError::UserNotFound {
                        attempted: attempted.clone(),
                        user: name.to_string(),
                    })?,
            ),
            None => None,
        };

        Ok((context, cluster, user))
    }
}

/// Load endpoint and credentials from a kubeconfig file, replacing the
/// recorded server with `endpoint_override` when one is given.
pub fn load(
    path: &Path,
    attempted: &CredentialSource,
    endpoint_override: Option<&str>,
) -> Result<LoadedCredentials, ConfigError> {
    let kubeconfig = Kubeconfig::read(path, attempted)?;
    let (context, cluster, user) = kubeconfig.current(attempted)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let server = match endpoint_override {
        Some(endpoint) => endpoint.to_string(),
        None => cluster
            .server
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingServer {
                attempted: attempted.clone(),
                cluster: context.cluster.clone(),
            })?,
    };
    let server = validate_server(&server, attempted)?;

    let mut endpoint = ClusterEndpoint::new(server);
    if let Some(namespace) = &context.namespace {
        endpoint = endpoint.with_namespace(namespace.clone());
    }
    endpoint.insecure_skip_tls_verify = cluster.insecure_skip_tls_verify;
    endpoint.ca_pem = load_material(
        cluster.certificate_authority_data.as_deref(),
        cluster.certificate_authority.as_deref(),
        "certificate-authority-data",
        base_dir,
        attempted,
    )?;

    let credentials = match user {
        Some(user) => user_credentials(user, base_dir, attempted)?,
        None => Credentials::Anonymous,
    };

    Ok(LoadedCredentials {
        source: attempted.clone(),
        endpoint,
        credentials,
    })
}

/// Token auth wins over client certificates, which win over basic auth.
fn user_credentials(
    user: &UserEntry,
    base_dir: &Path,
    attempted: &CredentialSource,
) -> Result<Credentials, ConfigError> {
    if let Some(token) = user.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Credentials::BearerToken(token.trim().to_string()));
    }

    if let Some(token_file) = &user.token_file {
        let path = resolve_relative(base_dir, token_file);
        let token = std::fs::read_to_string(&path).map_err(|error| ConfigError::Read {
            attempted: attempted.clone(),
            path,
            error,
        })?;
        return Ok(Credentials::BearerToken(token.trim().to_string()));
    }

    let certificate = load_material(
        user.client_certificate_data.as_deref(),
        user.client_certificate.as_deref(),
        "client-certificate-data",
        base_dir,
        attempted,
    )?;
    let key = load_material(
        user.client_key_data.as_deref(),
        user.client_key.as_deref(),
        "client-key-data",
        base_dir,
        attempted,
    )?;
    match (certificate, key) {
        (Some(certificate_pem), Some(key_pem)) => Ok(Credentials::ClientCertificate {
            certificate_pem,
            key_pem,
        }),
        (Some(_), None) | (None, Some(_)) => Err(ConfigError::Transport {
            attempted: attempted.clone(),
            reason: "client certificate and client key must be set together".to_string(),
        }),
        (None, None) => Ok(match user.username.as_deref().filter(|u| !u.is_empty()) {
            Some(username) => Credentials::Basic {
                username: username.to_string(),
                password: user.password.clone().unwrap_or_default(),
            },
            None => Credentials::Anonymous,
        }),
    }
}

/// Inline base64 data takes precedence over a file reference.
fn load_material(
    data: Option<&str>,
    file: Option<&Path>,
    field: &str,
    base_dir: &Path,
    attempted: &CredentialSource,
) -> Result<Option<Vec<u8>>, ConfigError> {
    if let Some(data) = data.filter(|d| !d.trim().is_empty()) {
        let compact: String = data.split_whitespace().collect();
        return STANDARD
            .decode(compact)
            .map(Some)
            .map_err(|error| ConfigError::InvalidBase64 {
                attempted: attempted.clone(),
                field: field.to_string(),
                error,
            });
    }

    match file {
        Some(file) => {
            let path = resolve_relative(base_dir, file);
            std::fs::read(&path)
                .map(Some)
                .map_err(|error| ConfigError::Read {
                    attempted: attempted.clone(),
                    path,
                    error,
                })
        }
        None => Ok(None),
    }
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
