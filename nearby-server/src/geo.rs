//! Great-circle distance and walking-time estimation.
//!
//! The straight-line distance is a fast local pre-filter; the estimated
//! walking time derived from it is only a placeholder until the routing
//! collaborator supplies an accurate route.

use crate::domain::Coordinate;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Walking paths are rarely straight lines; scale the crow-flies distance
/// up before converting to time.
const PATH_INEFFICIENCY: f64 = 1.4;

/// Nominal walking speed in km/h.
const WALKING_SPEED_KMH: f64 = 5.0;

/// Great-circle (haversine) distance between two coordinates, in km.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimated walking time for a straight-line distance, in whole minutes.
///
/// Applies the path-inefficiency multiplier over the nominal walking
/// speed and rounds to the nearest minute.
pub fn estimate_walking_minutes(distance_km: f64) -> u32 {
    (distance_km * PATH_INEFFICIENCY / WALKING_SPEED_KMH * 60.0).round() as u32
}
