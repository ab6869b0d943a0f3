//! Address geocoding via a Nominatim-compatible API.
//!
//! Resolves free-text addresses to coordinates and a region code. Queries
//! are restricted to Australia since the static dataset only covers
//! Australian regions.

mod client;
mod error;

pub use client::{GeocodeClient, GeocodeConfig, GeocodedPlace, Geocoder};
pub use error::GeocodeError;
