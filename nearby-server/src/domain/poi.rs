//! Point-of-interest types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// The three POI categories the search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    School,
    Station,
    Supermarket,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 3] = [Category::School, Category::Station, Category::Supermarket];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Station => "station",
            Self::Supermarket => "supermarket",
        }
    }

    /// Parse a category from its lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "school" => Some(Self::School),
            "station" => Some(Self::Station),
            "supermarket" => Some(Self::Supermarket),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown sector or level string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field}: {value}")]
pub struct InvalidAttribute {
    pub field: &'static str,
    pub value: String,
}

/// School governance sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchoolSector {
    Government,
    Catholic,
    Independent,
}

impl SchoolSector {
    /// Parse from the dataset's sector strings.
    pub fn parse(s: &str) -> Result<Self, InvalidAttribute> {
        match s.trim().to_ascii_lowercase().as_str() {
            "government" | "gov" => Ok(Self::Government),
            "catholic" => Ok(Self::Catholic),
            "independent" | "non-government" => Ok(Self::Independent),
            _ => Err(InvalidAttribute {
                field: "school sector",
                value: s.to_string(),
            }),
        }
    }
}

/// School level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchoolLevel {
    Primary,
    Secondary,
    Combined,
    Special,
}

impl SchoolLevel {
    /// Parse from the dataset's level strings.
    pub fn parse(s: &str) -> Result<Self, InvalidAttribute> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "combined" | "pri/sec" => Ok(Self::Combined),
            "special" => Ok(Self::Special),
            _ => Err(InvalidAttribute {
                field: "school level",
                value: s.to_string(),
            }),
        }
    }
}

/// Category-specific attributes carried by a POI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PoiAttributes {
    School {
        sector: SchoolSector,
        level: SchoolLevel,
        suburb: Option<String>,
    },
    Station {
        suburb: Option<String>,
    },
    Supermarket {
        chain: Option<String>,
    },
}

impl PoiAttributes {
    /// The category implied by these attributes.
    pub fn category(&self) -> Category {
        match self {
            Self::School { .. } => Category::School,
            Self::Station { .. } => Category::Station,
            Self::Supermarket { .. } => Category::Supermarket,
        }
    }
}

/// A candidate location: school, station or supermarket.
///
/// Immutable once loaded; identity is `id` within a (category, dataset)
/// pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub attributes: PoiAttributes,
}

impl PointOfInterest {
    pub fn category(&self) -> Category {
        self.attributes.category()
    }
}
