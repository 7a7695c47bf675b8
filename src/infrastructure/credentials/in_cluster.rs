//! In-cluster service account identity.

use std::path::{Path, PathBuf};

use super::{validate_server, LoadedCredentials};
use crate::domain::errors::ConfigError;
use crate::domain::models::{ClusterEndpoint, CredentialSource, Credentials};

/// Host of the in-cluster API service, set in every pod.
pub const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
/// Port of the in-cluster API service.
pub const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";
/// Where the service account token, CA and namespace are mounted.
pub const DEFAULT_SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

const TOKEN_FILE: &str = "token";
const CA_FILE: &str = "ca.crt";
const NAMESPACE_FILE: &str = "namespace";

/// Load the pod's service account credentials.
///
/// The API server address comes from the service environment variables
/// every pod receives; token, CA bundle and namespace come from the
/// mounted service account directory. The token is read once.
pub fn load(service_account_dir: &Path) -> Result<LoadedCredentials, ConfigError> {
    let attempted = CredentialSource::InCluster;

    let host = service_env(SERVICE_HOST_ENV)?;
    let port = service_env(SERVICE_PORT_ENV)?;
    let server = if host.contains(':') {
        format!("https://[{host}]:{port}")
    } else {
        format!("https://{host}:{port}")
    };
    let server = validate_server(&server, &attempted)?;

    let token = read_file(&service_account_dir.join(TOKEN_FILE))?;
    let token = String::from_utf8_lossy(&token).trim().to_string();

    let mut endpoint = ClusterEndpoint::new(server);
    let ca_path = service_account_dir.join(CA_FILE);
    if ca_path.exists() {
        endpoint = endpoint.with_ca_pem(read_file(&ca_path)?);
    }
    let namespace_path = service_account_dir.join(NAMESPACE_FILE);
    if namespace_path.exists() {
        let namespace = read_file(&namespace_path)?;
        endpoint = endpoint.with_namespace(String::from_utf8_lossy(&namespace).into_owned());
    }

    Ok(LoadedCredentials {
        source: attempted,
        endpoint,
        credentials: Credentials::BearerToken(token),
    })
}

fn service_env(variable: &str) -> Result<String, ConfigError> {
    std::env::var(variable)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::NotInCluster {
            attempted: CredentialSource::InCluster,
            variable: variable.to_string(),
        })
}

fn read_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|error| ConfigError::Read {
        attempted: CredentialSource::InCluster,
        path: PathBuf::from(path),
        error,
    })
}
