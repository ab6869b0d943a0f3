//! Nearby-POI error types.

/// Errors from the nearby-POI collaborator.
#[derive(Debug, thiserror::Error)]
pub enum NearbyError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Rate limited by the API
    #[error("rate limited by nearby-POI API")]
    RateLimited,
}
