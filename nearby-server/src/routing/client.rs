//! Walking-route client for an OpenRouteService-compatible API.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{Mutex, Semaphore};

use crate::domain::{Coordinate, WalkingRoute};

use super::error::RoutingError;

/// Default base URL for the routing API.
const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Default minimum gap between consecutive routing calls.
///
/// The free tier tolerates very little burst; anywhere in the
/// 500–1000 ms band keeps it happy.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(700);

/// Abstraction over walking-route lookup.
///
/// The sequencer and orchestrator are tested against mock providers
/// implementing this.
pub trait RoutingProvider: Send + Sync {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<WalkingRoute, RoutingError>> + Send;
}

/// Configuration for the routing client.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// API key for Authorization-header authentication
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum gap between consecutive calls
    pub min_interval: Duration,
}

impl RoutingConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the minimum gap between calls.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
struct RouteDto {
    summary: SummaryDto,
    /// Encoded polyline of the route geometry.
    geometry: String,
}

#[derive(Debug, Deserialize)]
struct SummaryDto {
    /// Metres
    distance: f64,
    /// Seconds
    duration: f64,
}

/// Client for an OpenRouteService-compatible directions API.
///
/// A single-permit semaphore bounds the whole process to one routing
/// call in flight at a time, and the pacing gate (an explicit field, not
/// module state) enforces the minimum interval between calls. Both
/// protections apply no matter which task is calling.
pub struct RoutingClient {
    http: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    single_flight: Arc<Semaphore>,
    last_call: Mutex<Option<Instant>>,
}

impl RoutingClient {
    /// Create a new routing client.
    pub fn new(config: RoutingConfig) -> Result<Self, RoutingError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| RoutingError::Api {
            status: 0,
            message: "Invalid API key format".to_string(),
        })?;
        headers.insert(AUTHORIZATION, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            min_interval: config.min_interval,
            single_flight: Arc::new(Semaphore::new(1)),
            last_call: Mutex::new(None),
        })
    }

    /// Fetch an accurate walking route for one origin/destination pair.
    ///
    /// There is no batch endpoint; one call covers exactly one pair.
    pub async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<WalkingRoute, RoutingError> {
        let _permit =
            self.single_flight
                .acquire()
                .await
                .map_err(|_| RoutingError::Api {
                    status: 0,
                    message: "Semaphore closed".to_string(),
                })?;

        self.pace().await;

        let url = format!("{}/v2/directions/foot-walking", self.base_url);
        let body = json!({
            "coordinates": [
                [origin.longitude(), origin.latitude()],
                [destination.longitude(), destination.latitude()],
            ],
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RoutingError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed: DirectionsResponse =
            serde_json::from_str(&body).map_err(|e| RoutingError::Json {
                message: e.to_string(),
            })?;

        let route = parsed.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        Ok(WalkingRoute {
            duration_minutes: route.summary.duration / 60.0,
            distance_meters: route.summary.distance,
            encoded_path: route.geometry,
        })
    }

    /// Wait out the remainder of the minimum interval since the last call.
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

impl RoutingProvider for RoutingClient {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<WalkingRoute, RoutingError> {
        RoutingClient::route(self, origin, destination).await
    }
}
