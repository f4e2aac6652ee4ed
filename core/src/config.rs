//! Compiled-in client configuration.
//!
//! Nothing here reads the environment. A composition root builds one
//! `ClientConfig`, hands it to `ApiClient::new`, and every clone of that
//! client shares it for the life of the process.

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const LOGIN_PATH: &str = "/login";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Base address, default headers and login route shared by every request.
///
/// Credentials are not configurable here; the outbound stage always
/// includes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_headers: Vec<(String, String)>,
    pub login_path: String,
}

impl ClientConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: vec![
                ("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string()),
                ("Accept".to_string(), JSON_MEDIA_TYPE.to_string()),
            ],
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_json_on_localhost() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.login_path, "/login");
        assert_eq!(
            config.default_headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.default_headers, ClientConfig::default().default_headers);
    }
}
