//! Implementation of the `clientgen resolve` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::ConnectionConfig;
use crate::services::ClientRegistry;

/// Arguments for `clientgen resolve`.
#[derive(Args, Debug, Default)]
pub struct ResolveArgs {}

/// What `clientgen resolve` reports.
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    /// Winning credential source.
    pub source: String,
    /// API server URL.
    pub server: String,
    /// Default namespace.
    pub namespace: String,
    /// Authentication method.
    pub auth: &'static str,
    /// `None` when requests run without a deadline.
    pub timeout_secs: Option<f64>,
    /// Whether server certificates go unchecked.
    pub insecure_skip_tls_verify: bool,
}

impl CommandOutput for ResolveOutput {
    fn to_human(&self) -> String {
        let timeout = self
            .timeout_secs
            .map_or_else(|| "none".to_string(), |secs| format!("{secs}s"));
        let mut lines = vec![
            format!("Source:    {}", self.source),
            format!("Server:    {}", self.server),
            format!("Namespace: {}", self.namespace),
            format!("Auth:      {}", self.auth),
            format!("Timeout:   {timeout}"),
        ];
        if self.insecure_skip_tls_verify {
            lines.push("TLS verification is disabled".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Resolve credentials and print the outcome.
pub async fn execute(_args: ResolveArgs, config: ConnectionConfig, json_mode: bool) -> Result<()> {
    let registry = ClientRegistry::new(config);
    let resolved = registry
        .resolved_config()
        .context("Failed to resolve cluster credentials")?;

    let output_data = ResolveOutput {
        source: resolved.source().to_string(),
        server: resolved.server().to_string(),
        namespace: resolved.endpoint().namespace.clone(),
        auth: resolved.credentials().kind(),
        timeout_secs: resolved.timeout().map(|t| t.as_secs_f64()),
        insecure_skip_tls_verify: resolved.endpoint().insecure_skip_tls_verify,
    };
    output(&output_data, json_mode);
    Ok(())
}
