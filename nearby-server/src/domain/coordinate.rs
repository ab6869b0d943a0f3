//! Geographic coordinate type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Continental-Australia bounding box used for input validation.
///
/// Deliberately loose: it covers Tasmania and the coastal islands but
/// rejects obviously foreign coordinates before they hit any collaborator.
const AU_LAT_RANGE: (f64, f64) = (-44.0, -9.0);
const AU_LON_RANGE: (f64, f64) = (112.0, 154.0);

/// Error returned when constructing an invalid coordinate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
pub struct InvalidCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    reason: &'static str,
}

/// A latitude/longitude pair in decimal degrees.
///
/// Guaranteed finite and within [-90, 90] / [-180, 180] by construction.
///
/// # Examples
///
/// ```
/// use nearby_server::domain::Coordinate;
///
/// let sydney = Coordinate::new(-33.8688, 151.2093).unwrap();
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Construct a coordinate, rejecting NaN/infinite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "latitude must be in [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "longitude must be in [-180, 180]",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Construct a coordinate that must fall inside continental Australia.
    ///
    /// User-supplied search origins go through this; dataset rows use
    /// [`Coordinate::new`] since some records sit slightly outside the box.
    pub fn australian(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        let coord = Self::new(latitude, longitude)?;
        if !coord.is_in_australia() {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "outside the Australian bounding box",
            });
        }
        Ok(coord)
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Whether this coordinate falls inside the Australian bounding box.
    pub fn is_in_australia(&self) -> bool {
        (AU_LAT_RANGE.0..=AU_LAT_RANGE.1).contains(&self.latitude)
            && (AU_LON_RANGE.0..=AU_LON_RANGE.1).contains(&self.longitude)
    }

    /// The coordinate in fixed-point micro-degree form, rounded to six
    /// decimal places (~0.1 m).
    ///
    /// Repeated geocoding of the same address jitters in the low decimals;
    /// rounding makes the pair usable as a structured cache key.
    pub fn rounded_e6(&self) -> (i64, i64) {
        (
            (self.latitude * 1e6).round() as i64,
            (self.longitude * 1e6).round() as i64,
        )
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}
