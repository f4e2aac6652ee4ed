//! The shared HTTP client every call site uses.
//!
//! # Design
//! `ApiClient` holds one `Arc` of configuration, transport and navigator.
//! Cloning it hands out another handle to the same instance, so the
//! composition root builds it once and distributes clones; there is no
//! module-global client. Nothing is written through the handle after
//! construction, so concurrent calls share no mutable state.
//!
//! Each call runs `prepare_request`, `enforce_credentials`, the transport,
//! the status check and finally `settle`. Only 401 is rejected by the status
//! check; every other status resolves as a normal response for the caller to
//! inspect.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, UNAUTHORIZED};
use crate::http::{HttpMethod, HttpResponse};
use crate::interceptor::{self, RequestOptions};
use crate::navigation::Navigator;
use crate::transport::Transport;

pub struct ApiClient<T, N> {
    inner: Arc<Inner<T, N>>,
}

struct Inner<T, N> {
    config: ClientConfig,
    transport: T,
    navigator: N,
}

impl<T, N> Clone for ApiClient<T, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, N> ApiClient<T, N>
where
    T: Transport,
    N: Navigator,
{
    pub fn new(config: ClientConfig, transport: T, navigator: N) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                navigator,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn navigator(&self) -> &N {
        &self.inner.navigator
    }

    /// True when both handles point at the same client instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Issue one request through both interceptor stages.
    ///
    /// Resolves with the response for any completed exchange except 401.
    /// A 401 triggers the login redirect and is returned as
    /// `ApiError::Unauthorized`; transport failures are returned unchanged.
    pub async fn request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let inner = &self.inner;
        let request = interceptor::prepare_request(&inner.config, method, path, body, options)?;
        let request = interceptor::enforce_credentials(request);

        debug!(method = method.as_str(), url = %request.url, "dispatching request");
        let result = inner.transport.send(request).await.and_then(check_status);
        interceptor::settle(result, &inner.navigator, &inner.config.login_path)
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.get_with(path, RequestOptions::default()).await
    }

    pub async fn get_with(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, ApiError> {
        self.request::<()>(HttpMethod::Get, path, None, options).await
    }

    pub async fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.delete_with(path, RequestOptions::default()).await
    }

    pub async fn delete_with(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, ApiError> {
        self.request::<()>(HttpMethod::Delete, path, None, options).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.post_with(path, body, RequestOptions::default()).await
    }

    pub async fn post_with<B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, Some(body), options).await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.put_with(path, body, RequestOptions::default()).await
    }

    pub async fn put_with<B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, Some(body), options).await
    }

    pub async fn patch<B>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.patch_with(path, body, RequestOptions::default()).await
    }

    pub async fn patch_with<B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Patch, path, Some(body), options).await
    }
}

/// Reject 401 so the inbound stage sees it as a failure; resolve the rest.
fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.status == UNAUTHORIZED {
        return Err(ApiError::Unauthorized { response });
    }
    Ok(response)
}
