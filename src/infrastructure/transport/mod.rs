//! HTTP transport for cluster APIs
//!
//! - `HttpTransport`: reqwest-backed transport carrying TLS, auth and timeout
//! - `InstrumentedTransport`: decorator recording bounded-cardinality request metrics

pub mod http;
/// Metrics decorator over any [`crate::domain::ports::Transport`].
pub mod instrumented;

pub use http::{HttpTransport, TransportBuildError};
pub use instrumented::{last_path_segment, InstrumentedTransport};
