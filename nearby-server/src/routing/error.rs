//! Routing client error types.

/// Errors from the routing collaborator.
///
/// `RateLimited` is deliberately distinct from the other failures: the
/// sequencer short-circuits the rest of a batch on it, while a generic
/// upstream failure only fails the one request.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// No route exists between the endpoints
    #[error("no route found")]
    NoRoute,

    /// Rate limited by the routing API
    #[error("rate limited by routing API")]
    RateLimited,

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid routing API key)")]
    Unauthorized,
}

impl RoutingError {
    /// Whether this error is the rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RoutingError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_distinct() {
        assert!(RoutingError::RateLimited.is_rate_limited());
        assert!(!RoutingError::NoRoute.is_rate_limited());
        assert!(
            !RoutingError::Api {
                status: 500,
                message: String::new()
            }
            .is_rate_limited()
        );
    }
}
