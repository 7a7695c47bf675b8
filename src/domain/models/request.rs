use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::TransportError;

/// HTTP verbs used against the cluster APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case verb as sent on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against an API server, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute path, optionally with a query string (`/api/v1/pods?limit=5`).
    pub path: String,
    /// JSON payload; `None` sends no body.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// `GET` request for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Switch to `method` and attach a JSON body.
    pub fn with_body(mut self, method: Method, body: serde_json::Value) -> Self {
        self.method = method;
        self.body = Some(body);
        self
    }
}

/// Raw response as returned by the server. Non-2xx statuses are still
/// responses; turning them into errors is up to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, decoded as UTF-8.
    pub body: String,
}

impl ApiResponse {
    /// Response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Fail with [`TransportError::Status`] unless the status is 2xx.
    pub fn error_for_status(self, path: &str) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                path: path.to_string(),
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Decode the body as JSON; `path` only labels the error.
    pub fn json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status() {
        assert!(ApiResponse::new(200, "{}").error_for_status("/version").is_ok());

        let err = ApiResponse::new(403, "forbidden")
            .error_for_status("/api/v1/secrets")
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 403, .. }));
    }

    #[test]
    fn test_json_decode_error_names_path() {
        let err = ApiResponse::new(200, "not json")
            .json::<serde_json::Value>("/version")
            .unwrap_err();
        match err {
            TransportError::Decode { path, .. } => assert_eq!(path, "/version"),
            other => panic!("Expected Decode error, got {other:?}"),
        }
    }
}
