//! Geocoding error types.

/// Errors from the geocoding collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The address produced no results
    #[error("address not found: {query}")]
    NotFound { query: String },

    /// The best match falls outside the supported area
    #[error("address resolves outside Australia: {query}")]
    OutsideCoverage { query: String },

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GeocodeError::NotFound {
            query: "1 Nowhere St".into(),
        };
        assert_eq!(err.to_string(), "address not found: 1 Nowhere St");

        let err = GeocodeError::Api {
            status: 503,
            message: "down".into(),
        };
        assert_eq!(err.to_string(), "API error 503: down");
    }
}
