//! Session-aware HTTP client for the backend API.
//!
//! # Overview
//! One shared `ApiClient` carries the base url, JSON content negotiation and
//! session cookies on every request, and sends the user to the login page
//! when the backend answers 401.
//!
//! # Design
//! - Requests and responses are plain data (`http`), built and inspected by
//!   two interceptor stages (`interceptor`) around a `Transport`.
//! - The outbound stage always includes credentials, whatever the caller
//!   asked for.
//! - The inbound stage classifies results without side effects, then
//!   dispatches the login redirect to an injected `Navigator`. The failure is
//!   still returned to the caller.
//! - `ReqwestTransport` is the production transport; tests substitute their
//!   own.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod navigation;
pub mod transport;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{Credentials, HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::RequestOptions;
pub use navigation::{LogNavigator, Navigator, RecordingNavigator};
pub use transport::{ReqwestTransport, Transport};
