//! Application state for the web layer.

use std::sync::Arc;

use crate::dataset::RegionDataSource;
use crate::geocode::Geocoder;
use crate::nearby::NearbyPoiSource;
use crate::routing::RoutingProvider;
use crate::search::SearchOrchestrator;

/// Shared application state.
///
/// Generic over the four collaborator seams so the router can be built
/// against stubs in tests and the real clients in `main`.
pub struct AppState<G, D, N, R> {
    pub search: Arc<SearchOrchestrator<G, D, N, R>>,
}

impl<G, D, N, R> AppState<G, D, N, R>
where
    G: Geocoder,
    D: RegionDataSource,
    N: NearbyPoiSource,
    R: RoutingProvider,
{
    pub fn new(search: SearchOrchestrator<G, D, N, R>) -> Self {
        Self {
            search: Arc::new(search),
        }
    }
}

// Derived Clone would require the type parameters to be Clone.
impl<G, D, N, R> Clone for AppState<G, D, N, R> {
    fn clone(&self) -> Self {
        Self {
            search: Arc::clone(&self.search),
        }
    }
}
