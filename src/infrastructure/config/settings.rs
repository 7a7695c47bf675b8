//! Settings tree shared by the CLI and library callers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::ConnectionConfig;
use crate::infrastructure::logging::LogConfig;

/// Application settings, merged from defaults, project files and
/// `CLIENTGEN_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Kubeconfig to load. Unset means default file, then in-cluster.
    pub kubeconfig: Option<PathBuf>,

    /// Replaces the server address recorded in the kubeconfig.
    pub api_server: Option<String>,

    /// Per-request timeout in seconds; zero or negative disables it.
    pub request_timeout_secs: i64,

    /// Diagnostic logging.
    pub logging: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            api_server: None,
            request_timeout_secs: 30,
            logging: LogConfig::default(),
        }
    }
}

impl Settings {
    /// Connection inputs shared by every backend client.
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new().with_timeout_secs(self.request_timeout_secs);
        if let Some(path) = &self.kubeconfig {
            config = config.with_credential_source(path);
        }
        if let Some(server) = &self.api_server {
            config = config.with_endpoint_override(server.as_str());
        }
        config
    }
}
