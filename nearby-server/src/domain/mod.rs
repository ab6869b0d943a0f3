//! Domain types for the location search.
//!
//! Core model types representing validated search data. Invariants are
//! enforced at construction time, so code receiving these types can trust
//! their validity.

mod coordinate;
mod poi;
mod region;
mod route;

pub use coordinate::{Coordinate, InvalidCoordinate};
pub use poi::{
    Category, InvalidAttribute, PoiAttributes, PointOfInterest, SchoolLevel, SchoolSector,
};
pub use region::{InvalidRegion, RegionCode};
pub use route::{RouteKey, WalkingRoute};
