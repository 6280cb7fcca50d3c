//! DataMall client error types.

/// Errors from the DataMall HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    /// The account key was rejected (HTTP 401).
    #[error("authentication failed, check the API account key")]
    Authentication,

    /// API returned any other non-200 status.
    #[error("API call to {endpoint} failed with status {status}")]
    General { endpoint: String, status: u16 },

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error from {endpoint}: {message}")]
    Json { endpoint: String, message: String },

    /// The account key cannot be sent as a header value.
    #[error("invalid API key format")]
    InvalidApiKey,
}

impl TransitError {
    /// Returns true if a new credential is needed before retrying.
    pub fn is_authentication(&self) -> bool {
        matches!(self, TransitError::Authentication)
    }
}
