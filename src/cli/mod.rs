//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::infrastructure::config::Settings;
use crate::infrastructure::logging::{LogFormat, RotationPolicy};
use commands::probe::ProbeArgs;
use commands::resolve::ResolveArgs;

/// Environment variable holding a kubeconfig path list.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Top-level `clientgen` arguments.
#[derive(Parser, Debug)]
#[command(name = "clientgen")]
#[command(about = "Resolve cluster credentials and probe backend APIs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Kubeconfig file to load credentials from [default: first existing entry of $KUBECONFIG]
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Replace the API server address recorded in the kubeconfig
    #[arg(long, global = true)]
    pub api_server: Option<String>,

    /// Per-request timeout in seconds; 0 disables the timeout
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Settings file to load instead of .clientgen/config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Format of diagnostics on stderr (pretty, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Also write JSON diagnostics to clientgen.log in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation (daily, hourly, never)
    #[arg(long, global = true, requires = "log_dir")]
    pub log_rotation: Option<RotationPolicy>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

impl Cli {
    /// Layer command-line flags, then `$KUBECONFIG`, over loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        let kubeconfig = self
            .kubeconfig
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| std::env::var_os(KUBECONFIG_ENV).and_then(|v| kubeconfig_from_list(&v)));
        if let Some(path) = kubeconfig {
            settings.kubeconfig = Some(path);
        }
        if let Some(server) = &self.api_server {
            settings.api_server = Some(server.clone());
        }
        if let Some(timeout) = self.timeout {
            settings.request_timeout_secs = timeout;
        }

        let logging = &mut settings.logging;
        if let Some(level) = &self.log_level {
            logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            logging.format = format;
        }
        if let Some(dir) = &self.log_dir {
            logging.log_dir = Some(dir.clone());
        }
        if let Some(rotation) = self.log_rotation {
            logging.rotation = rotation;
        }
    }
}

/// Pick one kubeconfig from a `KUBECONFIG`-style path list.
///
/// The first entry that exists wins. When none exists the first non-empty
/// entry is returned so the resulting error names it. Files are never merged.
pub fn kubeconfig_from_list(list: &OsStr) -> Option<PathBuf> {
    let entries: Vec<PathBuf> = std::env::split_paths(list)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    entries
        .iter()
        .find(|p| p.is_file())
        .or_else(|| entries.first())
        .cloned()
}

/// `clientgen` subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which credential source wins and what it resolves to
    Resolve(ResolveArgs),

    /// Build backend clients and issue their discovery requests
    Probe(ProbeArgs),
}

/// Print `err` and exit with status 1.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
