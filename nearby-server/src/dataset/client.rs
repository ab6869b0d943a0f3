//! HTTP client for the static, pre-partitioned region dataset.

use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    Coordinate, PoiAttributes, PointOfInterest, RegionCode, SchoolLevel, SchoolSector,
};

use super::error::DatasetError;

/// Default base URL for the dataset host.
const DEFAULT_BASE_URL: &str = "https://data.nearby.example.com/datasets";

/// Which half of a region's dataset to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Schools,
    Stations,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schools => "schools",
            Self::Stations => "stations",
        }
    }
}

/// Configuration for the dataset client.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Base URL for the dataset host
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DatasetConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One school row in a region file.
#[derive(Debug, Deserialize)]
struct SchoolDto {
    id: String,
    name: String,
    lat: f64,
    lon: f64,
    sector: String,
    level: String,
    #[serde(default)]
    suburb: Option<String>,
}

/// One station row in a region file.
#[derive(Debug, Deserialize)]
struct StationDto {
    id: String,
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    suburb: Option<String>,
}

/// Client for the static dataset files.
///
/// Files are served as plain JSON at `{base_url}/{region}/{kind}.json`,
/// one file per (region, kind). No pagination.
#[derive(Debug, Clone)]
pub struct DatasetClient {
    http: reqwest::Client,
    base_url: String,
}

impl DatasetClient {
    /// Create a new dataset client.
    pub fn new(config: DatasetConfig) -> Result<Self, DatasetError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Fetch one region file and convert it to domain POIs.
    ///
    /// Rows with invalid coordinates or unknown sector/level strings are
    /// skipped rather than failing the whole file; the dataset is
    /// machine-converted and the odd bad row is expected.
    pub async fn fetch(
        &self,
        region: RegionCode,
        kind: DatasetKind,
    ) -> Result<Vec<PointOfInterest>, DatasetError> {
        let url = format!("{}/{}/{}.json", self.base_url, region, kind.as_str());

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DatasetError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        match kind {
            DatasetKind::Schools => {
                let rows: Vec<SchoolDto> =
                    serde_json::from_str(&body).map_err(|e| DatasetError::Json {
                        message: e.to_string(),
                    })?;
                Ok(rows.into_iter().filter_map(convert_school).collect())
            }
            DatasetKind::Stations => {
                let rows: Vec<StationDto> =
                    serde_json::from_str(&body).map_err(|e| DatasetError::Json {
                        message: e.to_string(),
                    })?;
                Ok(rows.into_iter().filter_map(convert_station).collect())
            }
        }
    }
}

fn convert_school(row: SchoolDto) -> Option<PointOfInterest> {
    let coordinate = match Coordinate::new(row.lat, row.lon) {
        Ok(c) => c,
        Err(e) => {
            warn!(id = %row.id, %e, "skipping school with invalid coordinate");
            return None;
        }
    };

    let sector = match SchoolSector::parse(&row.sector) {
        Ok(s) => s,
        Err(e) => {
            warn!(id = %row.id, %e, "skipping school with unknown sector");
            return None;
        }
    };

    let level = match SchoolLevel::parse(&row.level) {
        Ok(l) => l,
        Err(e) => {
            warn!(id = %row.id, %e, "skipping school with unknown level");
            return None;
        }
    };

    Some(PointOfInterest {
        id: row.id,
        name: row.name,
        coordinate,
        attributes: PoiAttributes::School {
            sector,
            level,
            suburb: row.suburb,
        },
    })
}

fn convert_station(row: StationDto) -> Option<PointOfInterest> {
    let coordinate = match Coordinate::new(row.lat, row.lon) {
        Ok(c) => c,
        Err(e) => {
            warn!(id = %row.id, %e, "skipping station with invalid coordinate");
            return None;
        }
    };

    Some(PointOfInterest {
        id: row.id,
        name: row.name,
        coordinate,
        attributes: PoiAttributes::Station { suburb: row.suburb },
    })
}
