//! Logging settings as loaded from configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Diagnostic logging settings.
///
/// Events go to stderr so stdout stays free for command output. Setting
/// `log_dir` adds a JSON file sink rotated per `rotation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level; `RUST_LOG` directives refine it
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Rendering of stderr events
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for `clientgen.log`; `None` disables file output
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit events on stderr
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    /// Only consulted when `log_dir` is set
    #[serde(default)]
    pub rotation: RotationPolicy,
}

impl LogConfig {
    /// Whether events are also written to a file.
    pub const fn writes_file(&self) -> bool {
        self.log_dir.is_some()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Rendering of stderr events. File output is always JSON.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable events.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        })
    }
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day.
    #[default]
    Daily,
    /// New file every hour.
    Hourly,
    /// Single ever-growing file.
    Never,
}

impl FromStr for RotationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "unknown rotation '{other}' (expected daily, hourly or never)"
            )),
        }
    }
}

impl fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
            Self::Never => "never",
        })
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_stdout_clean() {
        let config = LogConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.enable_stderr);
        assert!(!config.writes_file());
        assert_eq!(config.rotation, RotationPolicy::Daily);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" hourly ".parse::<RotationPolicy>(), Ok(RotationPolicy::Hourly));
        assert!("weekly".parse::<RotationPolicy>().unwrap_err().contains("weekly"));
        assert!("xml".parse::<LogFormat>().is_err());

        for policy in [RotationPolicy::Daily, RotationPolicy::Hourly, RotationPolicy::Never] {
            assert_eq!(policy.to_string().parse::<RotationPolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: LogConfig =
            serde_yaml::from_str("log_dir: /var/log/clientgen\nrotation: never\n").unwrap();
        assert!(config.writes_file());
        assert_eq!(config.rotation, RotationPolicy::Never);
        assert_eq!(config.level, "warn");
    }
}
