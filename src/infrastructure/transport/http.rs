//! reqwest-backed [`Transport`](crate::domain::ports::Transport).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Certificate, Client as ReqwestClient, Identity};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::domain::errors::TransportError;
use crate::domain::models::{ApiRequest, ApiResponse, ClusterEndpoint, Credentials, Method};
use crate::domain::ports::Transport;

/// Errors raised while building an [`HttpTransport`].
#[derive(Error, Debug)]
pub enum TransportBuildError {
    /// CA bundle is not valid PEM.
    #[error("invalid CA certificate: {0}")]
    Certificate(#[source] reqwest::Error),

    /// Client certificate or key is not usable.
    #[error("invalid client certificate or key: {0}")]
    Identity(#[source] reqwest::Error),

    /// Token or basic credentials contain bytes not allowed in a header.
    #[error("credentials cannot be sent as an HTTP header: {0}")]
    Header(#[from] InvalidHeaderValue),

    /// reqwest refused the builder configuration.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// reqwest-backed transport for one API server.
///
/// One `reqwest::Client` per transport, so connections are reused across
/// requests made through the same backend client.
pub struct HttpTransport {
    http_client: ReqwestClient,
    base_url: String,
    authorization: Option<HeaderValue>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Build a transport for `endpoint` authenticating with `credentials`.
    ///
    /// `timeout` of `None` leaves requests without a deadline.
    pub fn new(
        endpoint: &ClusterEndpoint,
        credentials: &Credentials,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportBuildError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = ReqwestClient::builder()
            .user_agent(concat!("clientgen/", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .tcp_nodelay(true);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ca_pem) = &endpoint.ca_pem {
            let certificate =
                Certificate::from_pem(ca_pem).map_err(TransportBuildError::Certificate)?;
            builder = builder.add_root_certificate(certificate);
        }

        if endpoint.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let authorization = match credentials {
            Credentials::Anonymous => None,
            Credentials::BearerToken(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
                value.set_sensitive(true);
                Some(value)
            }
            Credentials::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))?;
                value.set_sensitive(true);
                Some(value)
            }
            Credentials::ClientCertificate {
                certificate_pem,
                key_pem,
            } => {
                let mut pem = key_pem.clone();
                pem.push(b'\n');
                pem.extend_from_slice(certificate_pem);
                let identity = Identity::from_pem(&pem).map_err(TransportBuildError::Identity)?;
                builder = builder.identity(identity);
                None
            }
        };

        let http_client = builder.build().map_err(TransportBuildError::Client)?;

        Ok(Self {
            http_client,
            base_url: endpoint.server.trim_end_matches('/').to_string(),
            authorization,
            timeout,
        })
    }

    /// Server URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Deadline applied to every request, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.authorization.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest_error(path: &str, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            path: path.to_string(),
        }
    } else {
        TransportError::Request {
            path: path.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .http_client
            .request(to_reqwest_method(request.method), self.url_for(&request.path));

        if let Some(authorization) = &self.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization.clone());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(&request.path, &e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&request.path, &e))?;

        Ok(ApiResponse { status, body })
    }
}
