//! Overpass-compatible client for supermarket lookup.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{Coordinate, PoiAttributes, PointOfInterest};

use super::error::NearbyError;

/// Default base URL for the Overpass API.
const DEFAULT_BASE_URL: &str = "https://overpass-api.de/api";

const DEFAULT_USER_AGENT: &str = "nearby-server/0.1 (+https://github.com/nearby/nearby-server)";

/// Overpass asks for at least a second between queries.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1100);

/// Abstraction over supermarket lookup, for orchestrator tests.
pub trait NearbyPoiSource: Send + Sync {
    fn find_nearby(
        &self,
        center: Coordinate,
        radius_meters: u32,
    ) -> impl Future<Output = Result<Vec<PointOfInterest>, NearbyError>> + Send;
}

/// Configuration for the nearby-POI client.
#[derive(Debug, Clone)]
pub struct NearbyConfig {
    /// Base URL for the API
    pub base_url: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum gap between consecutive queries
    pub min_interval: Duration,
}

impl NearbyConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the minimum gap between queries.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<ElementDto>,
}

#[derive(Debug, Deserialize)]
struct ElementDto {
    id: u64,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    tags: Option<TagsDto>,
}

#[derive(Debug, Deserialize)]
struct TagsDto {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    brand: Option<String>,
}

/// Client for an Overpass-compatible nearby-POI API.
///
/// The pacing gate (last-call instant) is owned by this client rather
/// than shared module state, so every instance enforces its own minimum
/// interval between outbound queries.
pub struct NearbyClient {
    http: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl NearbyClient {
    /// Create a new nearby-POI client.
    pub fn new(config: NearbyConfig) -> Result<Self, NearbyError> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(&config.user_agent).map_err(|_| NearbyError::Api {
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
            min_interval: config.min_interval,
            last_call: Mutex::new(None),
        })
    }

    /// Find supermarkets within `radius_meters` of `center`.
    pub async fn find_nearby(
        &self,
        center: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<PointOfInterest>, NearbyError> {
        self.pace().await;

        let query = format!(
            "[out:json][timeout:25];node[\"shop\"=\"supermarket\"](around:{},{},{});out;",
            radius_meters,
            center.latitude(),
            center.longitude()
        );

        let url = format!("{}/interpreter", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NearbyError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NearbyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed: OverpassResponse =
            serde_json::from_str(&body).map_err(|e| NearbyError::Json {
                message: e.to_string(),
            })?;

        let pois: Vec<PointOfInterest> = parsed
            .elements
            .into_iter()
            .filter_map(convert_element)
            .collect();

        debug!(count = pois.len(), radius_meters, "nearby supermarkets");
        Ok(pois)
    }

    /// Wait out the remainder of the minimum interval since the last call.
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// behind it rather than racing past the gate.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl NearbyPoiSource for NearbyClient {
    async fn find_nearby(
        &self,
        center: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<PointOfInterest>, NearbyError> {
        NearbyClient::find_nearby(self, center, radius_meters).await
    }
}

fn convert_element(el: ElementDto) -> Option<PointOfInterest> {
    let (lat, lon) = (el.lat?, el.lon?);
    let coordinate = Coordinate::new(lat, lon).ok()?;
    let tags = el.tags?;
    let name = tags.name.or_else(|| tags.brand.clone())?;

    Some(PointOfInterest {
        id: el.id.to_string(),
        name,
        coordinate,
        attributes: PoiAttributes::Supermarket { chain: tags.brand },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = NearbyConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.min_interval, DEFAULT_MIN_INTERVAL);
    }

    #[test]
    fn overpass_response_parses() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 123, "lat": -33.87, "lon": 151.21,
                 "tags": {"shop": "supermarket", "name": "Woolworths Town Hall", "brand": "Woolworths"}},
                {"type": "node", "id": 456, "lat": -33.88, "lon": 151.22,
                 "tags": {"shop": "supermarket"}}
            ]
        }"#;

        let parsed: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.elements.len(), 2);

        let pois: Vec<_> = parsed
            .elements
            .into_iter()
            .filter_map(convert_element)
            .collect();

        // The unnamed element is dropped
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].name, "Woolworths Town Hall");
        assert_eq!(
            pois[0].attributes,
            PoiAttributes::Supermarket {
                chain: Some("Woolworths".into())
            }
        );
    }

    #[tokio::test]
    async fn pacing_enforces_min_interval() {
        let client = NearbyClient::new(
            NearbyConfig::new().with_min_interval(Duration::from_millis(200)),
        )
        .unwrap();

        let start = Instant::now();
        client.pace().await;
        // First call passes straight through
        let after_first = start.elapsed();
        assert!(after_first < Duration::from_millis(100));

        client.pace().await;
        // Second call had to wait out the interval
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
