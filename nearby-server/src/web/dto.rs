//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, PoiAttributes, RegionCode, SchoolLevel, SchoolSector, WalkingRoute};
use crate::ranking::RankedResult;
use crate::routing::{FailureKind, RouteStatus};
use crate::search::{CategorySnapshot, SearchSnapshot, SelectionView};

/// Query parameters for a search.
///
/// Either `q` (free-text address) or both `lat` and `lon` must be given.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text address
    pub q: Option<String>,

    /// Device latitude
    pub lat: Option<f64>,

    /// Device longitude
    pub lon: Option<f64>,
}

/// Request to highlight a different result.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub category: Category,
    pub index: usize,
}

/// Query parameters for fetching the selected result's route.
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub category: Category,
}

/// The full search state, one snapshot per category.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub phase: String,
    pub display_name: Option<String>,
    pub region: Option<RegionCode>,
    pub origin: Option<CoordinateDto>,
    pub schools: CategoryDto,
    pub stations: CategoryDto,
    pub supermarkets: CategoryDto,
}

impl From<SearchSnapshot> for SearchResponse {
    fn from(snapshot: SearchSnapshot) -> Self {
        Self {
            phase: snapshot.phase.as_str().to_string(),
            display_name: snapshot.display_name,
            region: snapshot.region,
            origin: snapshot.origin.map(|c| CoordinateDto {
                latitude: c.latitude(),
                longitude: c.longitude(),
            }),
            schools: snapshot.schools.into(),
            stations: snapshot.stations.into(),
            supermarkets: snapshot.supermarkets.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CoordinateDto {
    pub latitude: f64,
    pub longitude: f64,
}

/// One category's ranked results.
#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub results: Vec<ResultDto>,
    pub selected: usize,
    /// Present when this category's data source failed.
    pub error: Option<String>,
}

impl From<CategorySnapshot> for CategoryDto {
    fn from(snapshot: CategorySnapshot) -> Self {
        Self {
            results: snapshot.results.iter().map(ResultDto::from).collect(),
            selected: snapshot.selected,
            error: snapshot.error,
        }
    }
}

/// A ranked result with its distance-based estimate.
#[derive(Debug, Serialize)]
pub struct ResultDto {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub estimated_walk_minutes: u32,

    /// School sector, schools only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<SchoolSector>,

    /// School level, schools only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<SchoolLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,

    /// Supermarket chain, supermarkets only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

impl From<&RankedResult> for ResultDto {
    fn from(result: &RankedResult) -> Self {
        let (sector, level, suburb, chain) = match &result.poi.attributes {
            PoiAttributes::School {
                sector,
                level,
                suburb,
            } => (Some(*sector), Some(*level), suburb.clone(), None),
            PoiAttributes::Station { suburb } => (None, None, suburb.clone(), None),
            PoiAttributes::Supermarket { chain } => (None, None, None, chain.clone()),
        };

        Self {
            id: result.poi.id.clone(),
            name: result.poi.name.clone(),
            latitude: result.poi.coordinate.latitude(),
            longitude: result.poi.coordinate.longitude(),
            distance_km: result.distance_km,
            estimated_walk_minutes: result.estimated_walk_minutes,
            sector,
            level,
            suburb,
            chain,
        }
    }
}

/// An accurate walking route.
#[derive(Debug, Serialize)]
pub struct RouteDto {
    pub duration_minutes: f64,
    pub distance_meters: f64,
    pub encoded_path: String,
}

impl From<WalkingRoute> for RouteDto {
    fn from(route: WalkingRoute) -> Self {
        Self {
            duration_minutes: route.duration_minutes,
            distance_meters: route.distance_meters,
            encoded_path: route.encoded_path,
        }
    }
}

/// The highlighted result for a category, with whatever enrichment is
/// available. When `route` is absent the estimate stands in for it.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub category: Category,
    pub index: usize,
    pub result: ResultDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDto>,
    pub route_status: String,
}

impl From<SelectionView> for SelectionResponse {
    fn from(view: SelectionView) -> Self {
        Self {
            category: view.category,
            index: view.index,
            result: ResultDto::from(&view.result),
            route: view.route.map(RouteDto::from),
            route_status: route_status_label(view.status).to_string(),
        }
    }
}

/// Wire label for a route's enrichment progress.
pub fn route_status_label(status: Option<RouteStatus>) -> &'static str {
    match status {
        None => "estimate",
        Some(RouteStatus::Pending) => "pending",
        Some(RouteStatus::InFlight) => "in-flight",
        Some(RouteStatus::Cached) => "confirmed",
        Some(RouteStatus::Failed(FailureKind::RateLimited)) => "failed-rate-limited",
        Some(RouteStatus::Failed(FailureKind::Upstream)) => "failed",
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
