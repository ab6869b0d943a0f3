//! Nominatim-compatible geocoding client.

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Coordinate, RegionCode};

use super::error::GeocodeError;

/// Default base URL for the geocoding API.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim requires an identifying User-Agent.
const DEFAULT_USER_AGENT: &str = "nearby-server/0.1 (+https://github.com/nearby/nearby-server)";

/// A resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub coordinate: Coordinate,
    pub region: RegionCode,
    pub display_name: String,
}

/// Abstraction over location resolution.
///
/// Lets the orchestrator be tested without network access. Dropping the
/// returned future cancels the underlying request, which is how a newer
/// search supersedes an older one.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<GeocodedPlace, GeocodeError>> + Send;
}

/// Configuration for the geocoding client.
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Base URL for the API
    pub base_url: String,
    /// User-Agent header value (mandatory for Nominatim)
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeocodeConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom User-Agent.
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One search result from the geocoding API.
#[derive(Debug, Deserialize)]
struct PlaceDto {
    /// Nominatim serialises coordinates as strings.
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: Option<AddressDto>,
}

#[derive(Debug, Deserialize)]
struct AddressDto {
    #[serde(default)]
    state: Option<String>,
}

/// Client for a Nominatim-compatible geocoding API.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    /// Create a new geocoding client.
    pub fn new(config: GeocodeConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(&config.user_agent).map_err(|_| GeocodeError::Api {
            status: 0,
            message: "Invalid User-Agent value".to_string(),
        })?;
        headers.insert(USER_AGENT, ua);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Resolve a free-text address to a coordinate and region.
    ///
    /// Queries are restricted to Australia; the best (first) match is
    /// used. The region comes from the address details when present,
    /// falling back to a bounding-box lookup on the coordinate.
    pub async fn geocode(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("countrycodes", "au"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let places: Vec<PlaceDto> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Json {
                message: e.to_string(),
            })?;

        let Some(place) = places.into_iter().next() else {
            return Err(GeocodeError::NotFound {
                query: query.to_string(),
            });
        };

        let lat: f64 = place.lat.parse().map_err(|_| GeocodeError::Json {
            message: format!("unparseable latitude: {}", place.lat),
        })?;
        let lon: f64 = place.lon.parse().map_err(|_| GeocodeError::Json {
            message: format!("unparseable longitude: {}", place.lon),
        })?;

        let coordinate =
            Coordinate::australian(lat, lon).map_err(|_| GeocodeError::OutsideCoverage {
                query: query.to_string(),
            })?;

        let region = place
            .address
            .as_ref()
            .and_then(|a| a.state.as_deref())
            .and_then(|s| RegionCode::parse(s).ok())
            .or_else(|| RegionCode::for_coordinate(&coordinate))
            .ok_or_else(|| GeocodeError::OutsideCoverage {
                query: query.to_string(),
            })?;

        debug!(%coordinate, %region, "geocoded address");

        Ok(GeocodedPlace {
            coordinate,
            region,
            display_name: place.display_name,
        })
    }
}

impl Geocoder for GeocodeClient {
    async fn geocode(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
        GeocodeClient::geocode(self, query).await
    }
}
