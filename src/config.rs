//! Client configuration

use crate::error::{ClientError, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_PATH_PREFIX: &str = "/api/v1.0/blogsite";
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Configuration for the authenticated client
#[derive(Debug, Clone)]
pub struct AuthClientConfig {
    /// Backend origin, e.g. `http://localhost:8080`
    pub base_url: Url,

    /// Path prefix shared by every API endpoint
    /// Default: `/api/v1.0/blogsite`
    pub path_prefix: String,

    /// Where the client is sent after an unrecoverable authentication failure
    /// Default: `/login`
    pub login_path: String,

    /// Per-request timeout applied by the transport
    pub timeout: Option<Duration>,

    pub user_agent: String,
}

impl AuthClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            base_url,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            timeout: None,
            user_agent: format!("blogsite-client/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Build a configuration from `BLOGSITE_*` environment variables
    ///
    /// - `BLOGSITE_API_BASE` (default `http://localhost:8080`)
    /// - `BLOGSITE_API_PREFIX`
    /// - `BLOGSITE_LOGIN_PATH`
    /// - `BLOGSITE_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("BLOGSITE_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base)?;

        if let Ok(prefix) = std::env::var("BLOGSITE_API_PREFIX") {
            config.path_prefix = prefix;
        }
        if let Ok(login_path) = std::env::var("BLOGSITE_LOGIN_PATH") {
            config.login_path = login_path;
        }
        if let Ok(raw) = std::env::var("BLOGSITE_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Configuration(format!("BLOGSITE_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Absolute URL for an endpoint under the API prefix
    ///
    /// Each segment is percent-encoded as a single path component, so titles
    /// containing `/` or spaces stay one segment.
    pub fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::Configuration("base URL cannot carry a path".into()))?;
            path.pop_if_empty();
            path.extend(self.path_prefix.split('/').filter(|s| !s.is_empty()));
            path.extend(segments.iter().map(AsRef::as_ref));
        }
        Ok(url)
    }
}
