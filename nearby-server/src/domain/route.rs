//! Walking-route types produced by the routing collaborator.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// An accurate walking route between two points.
///
/// Only ever produced by the routing collaborator; local code computes
/// estimates (see [`crate::geo`]) rather than routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkingRoute {
    /// Walking duration in minutes.
    pub duration_minutes: f64,
    /// Route length in metres.
    pub distance_meters: f64,
    /// Encoded polyline of the route geometry.
    pub encoded_path: String,
}

/// Structured cache key for a routed origin/destination pair.
///
/// Both endpoints are rounded to six decimal places (~0.1 m) so repeated
/// geocoding jitter for the same address still hits the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: (i64, i64),
    destination: (i64, i64),
}

impl RouteKey {
    pub fn new(origin: &Coordinate, destination: &Coordinate) -> Self {
        Self {
            origin: origin.rounded_e6(),
            destination: destination.rounded_e6(),
        }
    }
}
