//! Transport port - how backend clients reach an API server.

use async_trait::async_trait;

use crate::domain::errors::TransportError;
use crate::domain::models::{ApiRequest, ApiResponse};

/// Sends one request and returns the raw response.
///
/// Implementations must not interpret HTTP statuses: a 404 is a successful
/// round trip that yields an [`ApiResponse`]. Only failures to obtain a
/// response at all are reported as [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and wait for the response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
