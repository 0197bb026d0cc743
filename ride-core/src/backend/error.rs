//! Backend error types.

/// Errors from talking to a remote backend (trip API, geocoding, directions).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Backend answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Credentials missing or rejected
    #[error("unauthorized (check API key or auth token)")]
    Unauthorized,

    /// Rate limited by the backend
    #[error("rate limited by backend")]
    RateLimited,

    /// Well-formed JSON whose content cannot be used
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Request could not be sent for a reason other than HTTP
    #[error("request failed: {0}")]
    Transport(String),
}

impl BackendError {
    /// Build a JSON error keeping a short excerpt of the offending body.
    pub(crate) fn json(err: serde_json::Error, body: &str) -> Self {
        BackendError::Json {
            message: err.to_string(),
            body: Some(body.chars().take(500).collect()),
        }
    }
}
