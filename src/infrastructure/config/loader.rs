//! figment-based settings loading.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use reqwest::Url;
use std::path::Path;
use thiserror::Error;

use super::settings::Settings;
use crate::infrastructure::logging::logger::parse_log_level;

/// Settings validation errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Level name `tracing` does not know.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Endpoint override that is not an absolute http(s) URL.
    #[error("Invalid api_server: {0}. Must be an absolute http or https URL")]
    InvalidApiServer(String),

    /// `kubeconfig` set to an empty string.
    #[error("kubeconfig path cannot be empty")]
    EmptyKubeconfigPath,
}

/// Settings loader with hierarchical merging
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .clientgen/config.yaml
    /// 3. .clientgen/local.yaml (optional local overrides)
    /// 4. Environment variables (CLIENTGEN_* prefix, `__` separates nesting)
    pub fn load() -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(".clientgen/config.yaml"))
            .merge(Yaml::file(".clientgen/local.yaml"))
            .merge(Env::prefixed("CLIENTGEN_").split("__"))
            .extract()
            .context("Failed to extract settings from figment")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("CLIENTGEN_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Validate settings after loading
    pub fn validate(settings: &Settings) -> Result<(), SettingsError> {
        if parse_log_level(&settings.logging.level).is_err() {
            return Err(SettingsError::InvalidLogLevel(settings.logging.level.clone()));
        }

        if settings
            .kubeconfig
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(SettingsError::EmptyKubeconfigPath);
        }

        if let Some(server) = settings.api_server.as_deref().filter(|s| !s.trim().is_empty()) {
            let valid = Url::parse(server)
                .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
            if !valid {
                return Err(SettingsError::InvalidApiServer(server.to_string()));
            }
        }

        Ok(())
    }
}
