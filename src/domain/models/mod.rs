//! Domain models
//!
//! Plain data shared by the resolver, the transports and the registry.

/// Backend identities.
pub mod backend;
/// Caller-supplied connection inputs and credential sources.
pub mod connection;
/// Endpoint and authentication material.
pub mod credentials;
/// Request counters.
pub mod metrics;
/// Transport-level request and response.
pub mod request;
/// Outcome of credential resolution.
pub mod resolved;

pub use backend::BackendKind;
pub use connection::{ConnectionConfig, CredentialSource};
pub use credentials::{ClusterEndpoint, Credentials};
pub use metrics::{RequestKey, RequestMetrics, RequestOutcome, RequestStats};
pub use request::{ApiRequest, ApiResponse, Method};
pub use resolved::ResolvedConfig;
