//! Cache of fetched walking routes, keyed by rounded endpoint pairs.

use moka::future::Cache as MokaCache;

use crate::domain::{Coordinate, RouteKey, WalkingRoute};

/// Upper bound on cached routes.
///
/// A session only ever routes to a handful of POIs, so this is far more
/// than enough; the bound exists so a long-running process cannot grow
/// without limit.
const DEFAULT_MAX_CAPACITY: u64 = 4096;

/// Cache for accurate walking routes.
///
/// Keys are origin/destination pairs rounded to six decimal places, so
/// repeated geocoding jitter for the same address still hits. Entries
/// never expire within a session; routes between fixed points don't go
/// stale on that timescale.
#[derive(Clone)]
pub struct RouteCache {
    routes: MokaCache<RouteKey, WalkingRoute>,
}

impl RouteCache {
    /// Create a cache with the default capacity bound.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Create a cache with a custom capacity bound.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            routes: MokaCache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Look up a route for an origin/destination pair.
    pub async fn get(&self, origin: &Coordinate, destination: &Coordinate) -> Option<WalkingRoute> {
        self.routes.get(&RouteKey::new(origin, destination)).await
    }

    /// Store a fetched route.
    pub async fn insert(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        route: WalkingRoute,
    ) {
        self.routes
            .insert(RouteKey::new(origin, destination), route)
            .await;
    }

    /// Number of cached routes.
    pub fn entry_count(&self) -> u64 {
        self.routes.entry_count()
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}
