//! The network exchange behind the interceptor pipeline.
//!
//! # Design
//! A `Transport` turns an `HttpRequest` into an `HttpResponse`. Every
//! completed exchange is `Ok`, whatever its status; status policy lives in
//! the client. `Err` means no response was obtained.
//!
//! `ReqwestTransport` keeps two `reqwest` clients: one wired to a shared
//! cookie jar for `Credentials::Include`, and one with no cookie store for
//! `Credentials::Omit`. An omitted request never carries the session.

use std::future::Future;
use std::sync::Arc;

use reqwest::cookie::Jar;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{Credentials, HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP exchange.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest)
        -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

pub struct ReqwestTransport {
    with_cookies: reqwest::Client,
    without_cookies: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let with_cookies = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(transport_error)?;
        let without_cookies = reqwest::Client::builder().build().map_err(transport_error)?;
        Ok(Self {
            with_cookies,
            without_cookies,
            jar,
        })
    }

    /// The cookie jar holding the session.
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let client = match request.credentials {
            Credentials::Include => &self.with_cookies,
            Credentials::Omit => &self.without_cookies,
        };

        let mut builder = client.request(reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                return ApiError::InvalidRequest(e.to_string());
            }
            warn!(method = request.method.as_str(), url = %request.url, error = %e, "request failed");
            transport_error(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), value)
            })
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        debug!(method = request.method.as_str(), url = %request.url, status, "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Transport {
        message: err.to_string(),
    }
}
