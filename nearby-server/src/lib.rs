//! Nearby-amenity search server.
//!
//! A web application that answers: "from this address, how far is the
//! nearest school, train station and supermarket, on foot?"

pub mod dataset;
pub mod domain;
pub mod geo;
pub mod geocode;
pub mod nearby;
pub mod ranking;
pub mod routing;
pub mod search;
pub mod web;
