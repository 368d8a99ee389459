#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid API configuration: {0}")]
    InvalidConfig(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response body at {path}: {message}")]
    Decode { path: String, message: String },

    #[error("fetched data rejected by the store: {0}")]
    Store(#[from] hms_core::CoreError),
}

impl ApiError {
    /// True when the server says the endpoint does not exist or is not implemented.
    pub fn is_endpoint_unavailable(&self) -> bool {
        matches!(self, ApiError::Server { status: 404 | 405 | 501, .. })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
