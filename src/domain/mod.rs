//! Domain layer for clientgen
//!
//! Connection and credential models, the transport port, and the error
//! taxonomy shared by the resolver and the client registry.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ClientConstructionError, ClientError, ConfigError, TransportError};
