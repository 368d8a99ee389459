//! REST client configuration.
//!
//! Like the core configuration, this is resolved once at startup. Binaries read
//! `HMS_API_BASE_URL` and `HMS_API_TIMEOUT_MS` and pass the raw values through the
//! `*_from_env_value` helpers.

use crate::{ApiError, ApiResult};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Url,
    timeout: Duration,
}

/// Parses a base URL, normalising it to end in `/` so endpoint paths join beneath it.
fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".into()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl ApiConfig {
    /// Create a new `ApiConfig`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the REST API, e.g. `http://localhost:5000/api`.
    /// * `timeout` - Limit on each whole request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` is not an absolute http(s) URL, and
    /// [`ApiError::InvalidConfig`] for a zero timeout.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        if timeout.is_zero() {
            return Err(ApiError::InvalidConfig("timeout must be positive".into()));
        }
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL of `path` (no leading slash) under the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }
}

/// Parse the API base URL from an optional string value. Blank means the default.
pub fn base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Parse the request timeout in milliseconds from an optional string value.
///
/// # Errors
///
/// Returns [`ApiError::InvalidConfig`] if the value is not a positive integer.
pub fn timeout_from_env_value(value: Option<String>) -> ApiResult<Duration> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_TIMEOUT);
    };
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ApiError::InvalidConfig(format!(
            "timeout must be a positive number of milliseconds, got '{raw}'"
        ))),
    }
}
