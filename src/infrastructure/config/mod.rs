//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation

/// Layered loading and validation.
pub mod loader;
/// The settings tree.
pub mod settings;

pub use loader::{SettingsError, SettingsLoader};
pub use settings::Settings;
