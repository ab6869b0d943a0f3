//! Region dataset error types.

use crate::domain::RegionCode;

/// Errors from the region dataset source.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dataset host returned an error status
    #[error("dataset error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a dataset file
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// No usable data for this region.
    ///
    /// The caller decides whether to retry or degrade to the categories
    /// that did load.
    #[error("dataset unavailable for region {region}: {message}")]
    Unavailable { region: RegionCode, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_names_the_region() {
        let err = DatasetError::Unavailable {
            region: RegionCode::Vic,
            message: "404".into(),
        };
        assert_eq!(err.to_string(), "dataset unavailable for region VIC: 404");
    }
}
