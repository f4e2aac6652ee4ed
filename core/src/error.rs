//! Error types for the session client.
//!
//! # Design
//! `Unauthorized` gets a dedicated variant because it is the only status the
//! client rejects: the inbound stage redirects to the login page on it and
//! callers still receive the full response. Every other status resolves as a
//! normal `HttpResponse`. `Transport` means no response was obtained at all.

use thiserror::Error;

use crate::http::HttpResponse;

pub const UNAUTHORIZED: u16 = 401;

/// Errors returned by `ApiClient` requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The outbound request could not be constructed (bad header, bad url).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// No response was obtained: DNS, connection refused, reset.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The server returned 401. The session is missing or expired.
    #[error("HTTP 401: {}", .response.body)]
    Unauthorized { response: HttpResponse },
}

impl ApiError {
    /// The HTTP status carried by this failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { response } => Some(response.status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED)
    }
}
