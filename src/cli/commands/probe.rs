//! Implementation of the `clientgen probe` command.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{BackendKind, ConnectionConfig, RequestOutcome};
use crate::services::ClientRegistry;

/// Arguments for `clientgen probe`.
#[derive(Args, Debug, Default)]
pub struct ProbeArgs {
    /// Backends to probe (cluster, service-mesh, gateway); all when omitted
    #[arg(long, short, value_delimiter = ',')]
    pub backend: Vec<BackendKind>,
}

/// Outcome of probing one backend.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// Probed backend.
    pub backend: BackendKind,
    /// Whether construction and discovery both succeeded.
    pub ok: bool,
    /// Discovery summary or the error.
    pub detail: String,
}

/// One request counter, flattened for JSON output.
#[derive(Debug, Serialize)]
pub struct RequestRow {
    /// HTTP verb.
    pub method: String,
    /// Last path segment.
    pub endpoint: String,
    /// Status code or error.
    pub outcome: RequestOutcome,
    /// Requests seen.
    pub count: u64,
    /// Summed latency in milliseconds.
    pub total_latency_ms: u64,
}

/// What `clientgen probe` reports.
#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    /// Per-backend outcomes.
    pub results: Vec<ProbeResult>,
    /// Requests seen by the primary cluster transport.
    pub requests: Vec<RequestRow>,
    #[serde(skip)]
    table: String,
}

impl CommandOutput for ProbeOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut sections = vec![formatter.format_probes(&self.results)];
        if !self.table.is_empty() {
            sections.push(format!("Cluster requests:\n{}", self.table));
        }
        sections.join("\n\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Probe the selected backends and print results plus request counters.
///
/// Fails when any backend probe failed, after printing.
pub async fn execute(args: ProbeArgs, config: ConnectionConfig, json_mode: bool) -> Result<()> {
    let backends = if args.backend.is_empty() {
        BackendKind::ALL.to_vec()
    } else {
        args.backend
    };

    let registry = ClientRegistry::new(config);
    let mut results = Vec::with_capacity(backends.len());

    for backend in backends {
        let outcome = match registry.get_client(backend) {
            Ok(client) => client.discover().await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        results.push(match outcome {
            Ok(detail) => ProbeResult {
                backend,
                ok: true,
                detail,
            },
            Err(detail) => ProbeResult {
                backend,
                ok: false,
                detail,
            },
        });
    }

    // Only the primary transport is instrumented; skip when it never resolved.
    let snapshot = if registry.is_initialized(BackendKind::Cluster) {
        registry
            .resolved_config()
            .map(|resolved| resolved.metrics().snapshot())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let table = if snapshot.is_empty() {
        String::new()
    } else {
        TableFormatter::new().format_metrics(&snapshot)
    };
    let requests = snapshot
        .into_iter()
        .map(|(key, stats)| RequestRow {
            method: key.method.to_string(),
            endpoint: key.endpoint,
            outcome: key.outcome,
            count: stats.count,
            total_latency_ms: u64::try_from(stats.total_latency.as_millis()).unwrap_or(u64::MAX),
        })
        .collect();

    let failed = results.iter().filter(|r| !r.ok).count();
    output(
        &ProbeOutput {
            results,
            requests,
            table,
        },
        json_mode,
    );

    if failed > 0 {
        bail!("{failed} backend probe(s) failed");
    }
    Ok(())
}
