//! Outbound and inbound interceptor stages.
//!
//! # Design
//! Every request passes through the same linear pipeline:
//!
//! ```text
//! prepare_request -> enforce_credentials -> Transport::send -> settle
//! ```
//!
//! `prepare_request` stamps the configured base url and default headers and
//! merges the caller's options on top. `enforce_credentials` runs after the
//! caller's options are applied, so no call site can turn credentials off.
//! On the way back, `classify` decides what to do with a result without
//! touching anything, and `settle` dispatches the one side effect (the login
//! redirect) to a `Navigator` and hands the result back unchanged.

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use serde::Serialize;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Credentials, HttpMethod, HttpRequest, HttpResponse};
use crate::navigation::Navigator;

/// Per-call additions to the configured request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub credentials: Option<Credentials>,
}

impl RequestOptions {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Accepted for parity with browser fetch options. The outbound stage
    /// overrides it.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// What the inbound stage does with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Forward,
    RedirectToLogin,
}

/// Build the outbound context for one call.
///
/// Default headers go in first; caller headers are merged on top, replacing
/// a default of the same name. Credentials start out as the caller asked,
/// or `Omit` when unspecified.
pub fn prepare_request<B>(
    config: &ClientConfig,
    method: HttpMethod,
    path: &str,
    body: Option<&B>,
    options: RequestOptions,
) -> Result<HttpRequest, ApiError>
where
    B: Serialize + ?Sized,
{
    let mut headers = Vec::with_capacity(config.default_headers.len() + options.headers.len());
    for (name, value) in config.default_headers.iter().chain(options.headers.iter()) {
        validate_header(name, value)?;
        merge_header(&mut headers, name, value);
    }

    let body = body
        .map(|b| serde_json::to_string(b).map_err(|e| ApiError::SerializationError(e.to_string())))
        .transpose()?;

    Ok(HttpRequest {
        method,
        url: build_url(&config.base_url, path)?,
        headers,
        body,
        credentials: options.credentials.unwrap_or(Credentials::Omit),
    })
}

/// The outbound stage: credentials are always included.
pub fn enforce_credentials(mut request: HttpRequest) -> HttpRequest {
    request.credentials = Credentials::Include;
    request
}

/// Classify a settled exchange. Only a failure carrying status 401 redirects.
pub fn classify(result: &Result<HttpResponse, ApiError>) -> Disposition {
    match result {
        Err(err) if err.is_unauthorized() => Disposition::RedirectToLogin,
        _ => Disposition::Forward,
    }
}

/// The inbound stage: navigate to the login page on 401, then return the
/// result exactly as received.
pub fn settle<N>(
    result: Result<HttpResponse, ApiError>,
    navigator: &N,
    login_path: &str,
) -> Result<HttpResponse, ApiError>
where
    N: Navigator + ?Sized,
{
    if classify(&result) == Disposition::RedirectToLogin {
        info!(login_path, "session rejected, redirecting to login");
        navigator.navigate(login_path);
    }
    result
}

/// Append `path` to the base url and parse the result as an absolute url.
fn build_url(base_url: &str, path: &str) -> Result<String, ApiError> {
    let joined = if path.is_empty() || path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    };
    Url::parse(&joined)
        .map(String::from)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid url {joined:?}: {e}")))
}

fn merge_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Reject anything the transport could not put on the wire.
fn validate_header(name: &str, value: &str) -> Result<(), ApiError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ApiError::InvalidRequest(format!("invalid header name {name:?}: {e}")))?;
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid value for header {name}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::navigation::RecordingNavigator;

    fn config() -> ClientConfig {
        ClientConfig::with_base_url("http://localhost:8000")
    }

    fn get(path: &str, options: RequestOptions) -> Result<HttpRequest, ApiError> {
        prepare_request::<()>(&config(), HttpMethod::Get, path, None, options)
    }

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    fn unauthorized() -> ApiError {
        ApiError::Unauthorized {
            response: response(401),
        }
    }

    #[test]
    fn prepare_stamps_base_url_and_json_headers() {
        let req = get("/api/profile", RequestOptions::default()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/profile");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn relative_path_without_slash_is_joined() {
        let req = get("api/profile", RequestOptions::default()).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/profile");
    }

    #[test]
    fn caller_headers_merge_on_top_of_defaults() {
        let options = RequestOptions::default()
            .header("X-Request-Id", "abc")
            .header("accept", "text/plain");
        let req = get("/x", options).unwrap();
        assert_eq!(req.headers.len(), 3);
        assert_eq!(req.header("X-Request-Id"), Some("abc"));
        assert_eq!(req.header("Accept"), Some("text/plain"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn body_is_serialized_as_json() {
        let mut body = HashMap::new();
        body.insert("name", "Ada");
        let req = prepare_request(
            &config(),
            HttpMethod::Put,
            "/api/user/me",
            Some(&body),
            RequestOptions::default(),
        )
        .unwrap();
        let sent: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["name"], "Ada");
    }

    #[test]
    fn malformed_header_name_fails_construction() {
        let err = get("/x", RequestOptions::default().header("Bad Header", "v")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn header_value_with_newline_fails_construction() {
        let err = get("/x", RequestOptions::default().header("X-Id", "a\r\nb")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn header_value_with_control_char_fails_construction() {
        for value in ["a\x01b", "a\x7fb", "\x1b[0m"] {
            let err = get("/x", RequestOptions::default().header("X-Id", value)).unwrap_err();
            assert!(matches!(err, ApiError::InvalidRequest(_)), "value {value:?}");
        }
    }

    #[test]
    fn header_value_with_tab_is_accepted() {
        let req = get("/x", RequestOptions::default().header("X-Id", "a\tb")).unwrap();
        assert_eq!(req.header("X-Id"), Some("a\tb"));
    }

    #[test]
    fn unparsable_base_url_fails_construction() {
        let config = ClientConfig::with_base_url("not a url");
        let err = prepare_request::<()>(&config, HttpMethod::Get, "/x", None, RequestOptions::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn unserializable_body_fails_construction() {
        let mut body = HashMap::new();
        body.insert(vec![1u8], "non-string key");
        let err = prepare_request(
            &config(),
            HttpMethod::Post,
            "/x",
            Some(&body),
            RequestOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
    }

    #[test]
    fn enforce_credentials_overrides_every_caller_choice() {
        for choice in [None, Some(Credentials::Omit), Some(Credentials::Include)] {
            let options = RequestOptions {
                credentials: choice,
                ..RequestOptions::default()
            };
            let req = enforce_credentials(get("/x", options).unwrap());
            assert_eq!(req.credentials, Credentials::Include, "caller chose {choice:?}");
        }
    }

    #[test]
    fn classify_redirects_only_on_401_failures() {
        assert_eq!(classify(&Ok(response(200))), Disposition::Forward);
        assert_eq!(classify(&Ok(response(401))), Disposition::Forward);
        assert_eq!(classify(&Err(unauthorized())), Disposition::RedirectToLogin);
        let transport = ApiError::Transport {
            message: "refused".to_string(),
        };
        assert_eq!(classify(&Err(transport)), Disposition::Forward);
    }

    #[test]
    fn settle_navigates_once_and_keeps_the_failure() {
        let navigator = RecordingNavigator::new();
        let result = settle(Err(unauthorized()), &navigator, "/login");
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(navigator.hrefs(), vec!["/login"]);
    }

    #[test]
    fn settle_passes_responses_through_untouched() {
        let navigator = RecordingNavigator::new();
        for status in [200, 204, 404, 500] {
            let result = settle(Ok(response(status)), &navigator, "/login");
            assert_eq!(result.unwrap(), response(status));
        }
        assert_eq!(navigator.count(), 0);
    }
}
