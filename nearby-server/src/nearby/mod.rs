//! Supermarket lookup via an Overpass-compatible API.
//!
//! Unlike schools and stations, supermarkets have no static dataset; they
//! are queried live around the search origin. The client owns its own
//! pacing gate to respect the API's one-query-per-second guidance.

mod client;
mod error;

pub use client::{NearbyClient, NearbyConfig, NearbyPoiSource};
pub use error::NearbyError;
