//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::warn;

use crate::dataset::RegionDataSource;
use crate::domain::Coordinate;
use crate::geocode::{GeocodeError, Geocoder};
use crate::nearby::NearbyPoiSource;
use crate::routing::RoutingProvider;
use crate::search::{FilterPreferences, SearchError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<G, D, N, R>(state: AppState<G, D, N, R>) -> Router
where
    G: Geocoder + 'static,
    D: RegionDataSource + 'static,
    N: NearbyPoiSource + 'static,
    R: RoutingProvider + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/select", post(select))
        .route("/route", get(selection_route))
        .route("/filters/school", post(set_school_filter))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Run a search from an address or device coordinates.
async fn search<G, D, N, R>(
    State(state): State<AppState<G, D, N, R>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError>
where
    G: Geocoder + 'static,
    D: RegionDataSource + 'static,
    N: NearbyPoiSource + 'static,
    R: RoutingProvider + 'static,
{
    let snapshot = match (query.q, query.lat, query.lon) {
        (Some(q), _, _) if !q.trim().is_empty() => state.search.search_address(q.trim()).await?,
        (_, Some(lat), Some(lon)) => {
            let coordinate = Coordinate::new(lat, lon).map_err(|e| AppError::BadRequest {
                message: e.to_string(),
            })?;
            state.search.search_coordinates(coordinate).await?
        }
        _ => {
            return Err(AppError::BadRequest {
                message: "provide either q or both lat and lon".to_string(),
            });
        }
    };

    Ok(Json(snapshot.into()))
}

/// Highlight a different result within a category.
async fn select<G, D, N, R>(
    State(state): State<AppState<G, D, N, R>>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<SelectionResponse>, AppError>
where
    G: Geocoder + 'static,
    D: RegionDataSource + 'static,
    N: NearbyPoiSource + 'static,
    R: RoutingProvider + 'static,
{
    let view = state.search.select(req.category, req.index).await?;
    Ok(Json(view.into()))
}

/// Fetch the accurate route for a category's current selection.
///
/// Waits for the route rather than polling; on routing failure the
/// response carries the estimate with a failed status.
async fn selection_route<G, D, N, R>(
    State(state): State<AppState<G, D, N, R>>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<SelectionResponse>, AppError>
where
    G: Geocoder + 'static,
    D: RegionDataSource + 'static,
    N: NearbyPoiSource + 'static,
    R: RoutingProvider + 'static,
{
    let view = state.search.resolve_selection(query.category).await?;
    Ok(Json(view.into()))
}

/// Replace the school filter and return the re-ranked state.
async fn set_school_filter<G, D, N, R>(
    State(state): State<AppState<G, D, N, R>>,
    Json(filters): Json<FilterPreferences>,
) -> Result<Json<SearchResponse>, AppError>
where
    G: Geocoder + 'static,
    D: RegionDataSource + 'static,
    N: NearbyPoiSource + 'static,
    R: RoutingProvider + 'static,
{
    let snapshot = state.search.set_school_filter(filters).await?;
    Ok(Json(snapshot.into()))
}

/// Application-level errors returned to the client.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Upstream { message: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Geocode(GeocodeError::NotFound { .. }) => AppError::NotFound {
                message: e.to_string(),
            },
            SearchError::Geocode(GeocodeError::OutsideCoverage { .. })
            | SearchError::OutsideCoverage => AppError::BadRequest {
                message: e.to_string(),
            },
            SearchError::Geocode(_) => AppError::Upstream {
                message: e.to_string(),
            },
            SearchError::Superseded => AppError::Conflict {
                message: e.to_string(),
            },
            SearchError::NoActiveSearch | SearchError::InvalidSelection { .. } => {
                AppError::BadRequest {
                    message: e.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
