//! Region codes partitioning the static dataset.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Error returned when parsing an unknown region code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region code: {code}")]
pub struct InvalidRegion {
    pub code: String,
}

/// An Australian state or territory.
///
/// The static school/station dataset is pre-partitioned by region, so
/// every dataset fetch is keyed by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionCode {
    Nsw,
    Vic,
    Qld,
    Sa,
    Wa,
    Tas,
    Nt,
    Act,
}

impl RegionCode {
    /// Parse a region code from its standard abbreviation, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, InvalidRegion> {
        match s.to_ascii_uppercase().as_str() {
            "NSW" | "NEW SOUTH WALES" => Ok(Self::Nsw),
            "VIC" | "VICTORIA" => Ok(Self::Vic),
            "QLD" | "QUEENSLAND" => Ok(Self::Qld),
            "SA" | "SOUTH AUSTRALIA" => Ok(Self::Sa),
            "WA" | "WESTERN AUSTRALIA" => Ok(Self::Wa),
            "TAS" | "TASMANIA" => Ok(Self::Tas),
            "NT" | "NORTHERN TERRITORY" => Ok(Self::Nt),
            "ACT" | "AUSTRALIAN CAPITAL TERRITORY" => Ok(Self::Act),
            _ => Err(InvalidRegion {
                code: s.to_string(),
            }),
        }
    }

    /// The standard uppercase abbreviation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nsw => "NSW",
            Self::Vic => "VIC",
            Self::Qld => "QLD",
            Self::Sa => "SA",
            Self::Wa => "WA",
            Self::Tas => "TAS",
            Self::Nt => "NT",
            Self::Act => "ACT",
        }
    }

    /// Derive a region from a coordinate by bounding box.
    ///
    /// Coarse fallback for when the geocoder response carries no state.
    /// Boxes overlap at the borders; the more specific region wins where
    /// it matters (ACT inside NSW).
    pub fn for_coordinate(coord: &Coordinate) -> Option<Self> {
        let (lat, lon) = (coord.latitude(), coord.longitude());

        // ACT sits entirely inside the NSW box, so test it first.
        if (-35.95..=-35.1).contains(&lat) && (148.75..=149.4).contains(&lon) {
            return Some(Self::Act);
        }
        if (-37.6..=-28.1).contains(&lat) && (140.9..=153.7).contains(&lon) {
            return Some(Self::Nsw);
        }
        if (-39.2..=-33.9).contains(&lat) && (140.9..=150.1).contains(&lon) {
            return Some(Self::Vic);
        }
        if (-29.2..=-9.0).contains(&lat) && (138.0..=153.6).contains(&lon) {
            return Some(Self::Qld);
        }
        if (-38.1..=-25.9).contains(&lat) && (129.0..=141.1).contains(&lon) {
            return Some(Self::Sa);
        }
        if (-35.2..=-13.6).contains(&lat) && (112.9..=129.1).contains(&lon) {
            return Some(Self::Wa);
        }
        if (-43.7..=-39.5).contains(&lat) && (143.8..=148.5).contains(&lon) {
            return Some(Self::Tas);
        }
        if (-26.1..=-10.9).contains(&lat) && (129.0..=138.1).contains(&lon) {
            return Some(Self::Nt);
        }
        None
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
