//! Top-level search coordination.
//!
//! Drives a search through its lifecycle: resolve the location, load the
//! region dataset and live supermarkets, rank each category locally, then
//! kick off background route enrichment for the top results. Reaching
//! `Ready` never waits on the routing collaborator; accurate routes
//! arrive later and replace the estimates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::dataset::{RegionDataSource, RegionDataset};
use crate::domain::{Category, Coordinate, PointOfInterest, RegionCode, RouteKey, WalkingRoute};
use crate::geocode::{GeocodeError, Geocoder};
use crate::nearby::NearbyPoiSource;
use crate::ranking::{CategoryFilter, RankConfig, RankedResult, rank};
use crate::routing::{RouteRequest, RouteSequencer, RouteStatus, RoutingProvider};

use super::filters::FilterPreferences;
use super::prefs::PreferenceStore;

/// Radius for the live supermarket query, matching the ranking ceiling.
const SUPERMARKET_RADIUS_METERS: u32 = 2500;

/// Search lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    ResolvingLocation,
    LoadingRegionData,
    Ranking,
    Ready,
    Error,
}

impl SearchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingLocation => "resolving-location",
            Self::LoadingRegionData => "loading-region-data",
            Self::Ranking => "ranking",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

/// Errors from the orchestrator itself.
///
/// Collaborator failures that can degrade to a single category never
/// appear here; they are recorded on the category snapshot instead.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Location resolution failed; nothing to show.
    #[error("location resolution failed: {0}")]
    Geocode(#[from] GeocodeError),

    /// Coordinates fall outside the covered regions.
    #[error("coordinates outside supported coverage")]
    OutsideCoverage,

    /// A newer search started while this one was resolving.
    #[error("superseded by a newer search")]
    Superseded,

    /// No search has completed yet.
    #[error("no completed search")]
    NoActiveSearch,

    /// Selection index out of range for the category's ranked list.
    #[error("no result at index {index} for category {category}")]
    InvalidSelection { category: Category, index: usize },
}

/// One category's ranked results and selection.
#[derive(Debug, Clone, Default)]
pub struct CategorySnapshot {
    /// Ranked results, best first. Empty is valid.
    pub results: Vec<RankedResult>,
    /// Index of the highlighted result.
    pub selected: usize,
    /// Category-scoped failure, if its collaborator failed.
    pub error: Option<String>,
}

impl CategorySnapshot {
    fn ranked(results: Vec<RankedResult>) -> Self {
        Self {
            results,
            selected: 0,
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            results: Vec::new(),
            selected: 0,
            error: Some(message),
        }
    }
}

/// Read-only view of the whole search state.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    pub origin: Option<Coordinate>,
    pub display_name: Option<String>,
    pub region: Option<RegionCode>,
    pub schools: CategorySnapshot,
    pub stations: CategorySnapshot,
    pub supermarkets: CategorySnapshot,
}

impl SearchSnapshot {
    pub fn category(&self, category: Category) -> &CategorySnapshot {
        match category {
            Category::School => &self.schools,
            Category::Station => &self.stations,
            Category::Supermarket => &self.supermarkets,
        }
    }
}

/// A selected result with whatever enrichment is available.
#[derive(Debug, Clone)]
pub struct SelectionView {
    pub category: Category,
    pub index: usize,
    pub result: RankedResult,
    /// Accurate route, if already fetched.
    pub route: Option<WalkingRoute>,
    /// Enrichment progress for the result's route key.
    pub status: Option<RouteStatus>,
}

struct Inner {
    phase: SearchPhase,
    origin: Option<Coordinate>,
    display_name: Option<String>,
    region: Option<RegionCode>,
    dataset: Option<Arc<RegionDataset>>,
    supermarkets: Vec<Arc<PointOfInterest>>,
    schools: CategorySnapshot,
    stations: CategorySnapshot,
    markets: CategorySnapshot,
    filters: FilterPreferences,
}

impl Inner {
    fn category_mut(&mut self, category: Category) -> &mut CategorySnapshot {
        match category {
            Category::School => &mut self.schools,
            Category::Station => &mut self.stations,
            Category::Supermarket => &mut self.markets,
        }
    }
}

/// The search orchestrator.
///
/// Owns selection state and the current ranked lists exclusively; the
/// route cache is shared with the sequencer.
pub struct SearchOrchestrator<G, D, N, R> {
    geocoder: G,
    datasets: D,
    nearby: N,
    routing: Arc<R>,
    sequencer: RouteSequencer,
    prefs: Box<dyn PreferenceStore>,
    rank_config: RankConfig,
    generation: AtomicU64,
    inner: RwLock<Inner>,
}

impl<G, D, N, R> SearchOrchestrator<G, D, N, R>
where
    G: Geocoder,
    D: RegionDataSource,
    N: NearbyPoiSource,
    R: RoutingProvider,
{
    /// Create an orchestrator, rehydrating filter preferences from the
    /// store.
    pub fn new(
        geocoder: G,
        datasets: D,
        nearby: N,
        routing: Arc<R>,
        sequencer: RouteSequencer,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        let filters = match prefs.load() {
            Ok(Some(p)) => p,
            Ok(None) => FilterPreferences::default(),
            Err(e) => {
                warn!(%e, "failed to load filter preferences; using defaults");
                FilterPreferences::default()
            }
        };

        Self {
            geocoder,
            datasets,
            nearby,
            routing,
            sequencer,
            prefs,
            rank_config: RankConfig::default(),
            generation: AtomicU64::new(0),
            inner: RwLock::new(Inner {
                phase: SearchPhase::Idle,
                origin: None,
                display_name: None,
                region: None,
                dataset: None,
                supermarkets: Vec::new(),
                schools: CategorySnapshot::default(),
                stations: CategorySnapshot::default(),
                markets: CategorySnapshot::default(),
                filters,
            }),
        }
    }

    /// Search from a free-text address.
    pub async fn search_address(&self, query: &str) -> Result<SearchSnapshot, SearchError> {
        let generation = self.begin_search().await;

        let place = match self.geocoder.geocode(query).await {
            Ok(place) => place,
            Err(e) => {
                self.fail_if_current(generation).await;
                return Err(e.into());
            }
        };
        self.check_current(generation)?;

        self.run_search(
            generation,
            place.coordinate,
            place.region,
            Some(place.display_name),
        )
        .await
    }

    /// Search from GPS coordinates.
    pub async fn search_coordinates(
        &self,
        coordinate: Coordinate,
    ) -> Result<SearchSnapshot, SearchError> {
        let generation = self.begin_search().await;

        let Some(region) = RegionCode::for_coordinate(&coordinate) else {
            self.fail_if_current(generation).await;
            return Err(SearchError::OutsideCoverage);
        };

        self.run_search(generation, coordinate, region, None).await
    }

    /// Highlight an alternative result within a category.
    ///
    /// On a cache miss a single enrichment request is queued for exactly
    /// this result, not the whole list.
    pub async fn select(
        &self,
        category: Category,
        index: usize,
    ) -> Result<SelectionView, SearchError> {
        let (origin, result) = {
            let mut inner = self.inner.write().await;
            let origin = inner.origin.ok_or(SearchError::NoActiveSearch)?;
            let snapshot = inner.category_mut(category);
            if index >= snapshot.results.len() {
                return Err(SearchError::InvalidSelection { category, index });
            }
            snapshot.selected = index;
            (origin, snapshot.results[index].clone())
        };

        let destination = result.poi.coordinate;
        let route = self.sequencer.cache().get(&origin, &destination).await;
        if route.is_none() {
            self.sequencer
                .enqueue(vec![RouteRequest {
                    origin,
                    destination,
                }])
                .await;
        }

        let status = self
            .sequencer
            .status(&RouteKey::new(&origin, &destination))
            .await;

        Ok(SelectionView {
            category,
            index,
            result,
            route,
            status,
        })
    }

    /// The current selection for a category, with any enrichment.
    pub async fn selection(&self, category: Category) -> Result<SelectionView, SearchError> {
        let (origin, index, result) = {
            let inner = self.inner.read().await;
            let origin = inner.origin.ok_or(SearchError::NoActiveSearch)?;
            let snapshot = match category {
                Category::School => &inner.schools,
                Category::Station => &inner.stations,
                Category::Supermarket => &inner.markets,
            };
            let index = snapshot.selected;
            let result = snapshot
                .results
                .get(index)
                .cloned()
                .ok_or(SearchError::InvalidSelection { category, index })?;
            (origin, index, result)
        };

        let destination = result.poi.coordinate;
        let route = self.sequencer.cache().get(&origin, &destination).await;
        let status = self
            .sequencer
            .status(&RouteKey::new(&origin, &destination))
            .await;

        Ok(SelectionView {
            category,
            index,
            result,
            route,
            status,
        })
    }

    /// Fetch the accurate route for the current selection, bypassing the
    /// queue.
    ///
    /// A routing failure degrades to the estimate rather than erroring:
    /// the view comes back with no route and a failed status.
    pub async fn resolve_selection(
        &self,
        category: Category,
    ) -> Result<SelectionView, SearchError> {
        let mut view = self.selection(category).await?;
        if view.route.is_some() {
            return Ok(view);
        }

        let origin = {
            let inner = self.inner.read().await;
            inner.origin.ok_or(SearchError::NoActiveSearch)?
        };
        let destination = view.result.poi.coordinate;

        match self
            .sequencer
            .fetch_one(self.routing.as_ref(), origin, destination)
            .await
        {
            Ok(route) => view.route = route,
            Err(e) => {
                debug!(%e, "route fetch for selection failed; keeping estimate");
            }
        }
        view.status = self
            .sequencer
            .status(&RouteKey::new(&origin, &destination))
            .await;

        Ok(view)
    }

    /// Replace the school filter, re-rank schools and persist the choice.
    ///
    /// Only the schools category is re-ranked; its selection resets to
    /// the new top result, which is queued for enrichment if uncached.
    pub async fn set_school_filter(
        &self,
        filters: FilterPreferences,
    ) -> Result<SearchSnapshot, SearchError> {
        if let Err(e) = self.prefs.save(&filters) {
            warn!(%e, "failed to persist filter preferences");
        }

        let top = {
            let mut inner = self.inner.write().await;
            inner.filters = filters.clone();

            match (inner.origin, inner.dataset.clone()) {
                (Some(origin), Some(dataset)) => {
                    let ranked = rank(
                        &dataset.schools,
                        &origin,
                        &filters.school_filter(),
                        &self.rank_config,
                    );
                    inner.schools = CategorySnapshot::ranked(ranked);
                    inner
                        .schools
                        .results
                        .first()
                        .map(|r| (origin, r.poi.coordinate))
                }
                _ => None,
            }
        };

        if let Some((origin, destination)) = top
            && self.sequencer.cache().get(&origin, &destination).await.is_none()
        {
            self.sequencer
                .enqueue(vec![RouteRequest {
                    origin,
                    destination,
                }])
                .await;
        }

        Ok(self.snapshot().await)
    }

    /// The current phase.
    pub async fn phase(&self) -> SearchPhase {
        self.inner.read().await.phase
    }

    /// A clone of the whole current state.
    pub async fn snapshot(&self) -> SearchSnapshot {
        let inner = self.inner.read().await;
        SearchSnapshot {
            phase: inner.phase,
            origin: inner.origin,
            display_name: inner.display_name.clone(),
            region: inner.region,
            schools: inner.schools.clone(),
            stations: inner.stations.clone(),
            supermarkets: inner.markets.clone(),
        }
    }

    /// Start a new search: bump both generations so stale work from the
    /// previous search is discarded wherever it lands.
    async fn begin_search(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sequencer.bump_generation();
        self.inner.write().await.phase = SearchPhase::ResolvingLocation;
        generation
    }

    fn check_current(&self, generation: u64) -> Result<(), SearchError> {
        if self.generation.load(Ordering::SeqCst) != generation {
            return Err(SearchError::Superseded);
        }
        Ok(())
    }

    /// Mark the error phase, unless a newer search already took over.
    async fn fail_if_current(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.inner.write().await.phase = SearchPhase::Error;
        }
    }

    async fn set_phase_if_current(
        &self,
        generation: u64,
        phase: SearchPhase,
    ) -> Result<(), SearchError> {
        self.check_current(generation)?;
        self.inner.write().await.phase = phase;
        Ok(())
    }

    async fn run_search(
        &self,
        generation: u64,
        origin: Coordinate,
        region: RegionCode,
        display_name: Option<String>,
    ) -> Result<SearchSnapshot, SearchError> {
        self.set_phase_if_current(generation, SearchPhase::LoadingRegionData)
            .await?;

        // Independent reads, issued concurrently. Each failure degrades
        // its own categories only.
        let (dataset, supermarkets) = tokio::join!(
            self.datasets.load(region),
            self.nearby.find_nearby(origin, SUPERMARKET_RADIUS_METERS),
        );

        self.set_phase_if_current(generation, SearchPhase::Ranking)
            .await?;

        let filters = self.inner.read().await.filters.clone();

        let (schools, stations, dataset) = match dataset {
            Ok(dataset) => {
                let schools = rank(
                    &dataset.schools,
                    &origin,
                    &filters.school_filter(),
                    &self.rank_config,
                );
                let stations = rank(
                    &dataset.stations,
                    &origin,
                    &CategoryFilter::Any,
                    &self.rank_config,
                );
                (
                    CategorySnapshot::ranked(schools),
                    CategorySnapshot::ranked(stations),
                    Some(dataset),
                )
            }
            Err(e) => {
                warn!(%region, %e, "region dataset unavailable");
                (
                    CategorySnapshot::failed(e.to_string()),
                    CategorySnapshot::failed(e.to_string()),
                    None,
                )
            }
        };

        let (markets, market_pois) = match supermarkets {
            Ok(pois) => {
                let pois: Vec<Arc<PointOfInterest>> = pois.into_iter().map(Arc::new).collect();
                let ranked = rank(&pois, &origin, &CategoryFilter::Any, &self.rank_config);
                (CategorySnapshot::ranked(ranked), pois)
            }
            Err(e) => {
                warn!(%e, "supermarket lookup failed");
                (CategorySnapshot::failed(e.to_string()), Vec::new())
            }
        };

        // Progressive enhancement: the top result of each category gets
        // one enrichment request, queued as a single sequential batch.
        let mut batch = Vec::new();
        for snapshot in [&schools, &stations, &markets] {
            if let Some(top) = snapshot.results.first() {
                batch.push(RouteRequest {
                    origin,
                    destination: top.poi.coordinate,
                });
            }
        }

        {
            let mut inner = self.inner.write().await;
            self.check_current(generation)?;
            inner.phase = SearchPhase::Ready;
            inner.origin = Some(origin);
            inner.display_name = display_name;
            inner.region = Some(region);
            inner.dataset = dataset;
            inner.supermarkets = market_pois;
            inner.schools = schools;
            inner.stations = stations;
            inner.markets = markets;
        }

        debug!(%origin, %region, "search ready");
        self.sequencer.enqueue(batch).await;

        Ok(self.snapshot().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::time::{sleep, timeout};

    use crate::dataset::DatasetError;
    use crate::domain::{PoiAttributes, SchoolLevel, SchoolSector};
    use crate::geocode::GeocodedPlace;
    use crate::nearby::NearbyError;
    use crate::routing::{RouteCache, RoutingError, SequencerConfig};
    use crate::search::prefs::MemoryPreferenceStore;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    /// Origin in Surry Hills, Sydney.
    fn origin() -> Coordinate {
        coord(-33.87, 151.21)
    }

    fn school(
        id: &str,
        lat: f64,
        sector: SchoolSector,
    ) -> Arc<PointOfInterest> {
        Arc::new(PointOfInterest {
            id: id.to_string(),
            name: id.to_string(),
            coordinate: coord(lat, 151.21),
            attributes: PoiAttributes::School {
                sector,
                level: SchoolLevel::Primary,
                suburb: None,
            },
        })
    }

    fn station(id: &str, lat: f64) -> Arc<PointOfInterest> {
        Arc::new(PointOfInterest {
            id: id.to_string(),
            name: id.to_string(),
            coordinate: coord(lat, 151.21),
            attributes: PoiAttributes::Station { suburb: None },
        })
    }

    /// Two schools and two stations inside the 2.5 km ceiling, one
    /// school well outside it.
    fn nsw_dataset() -> Arc<RegionDataset> {
        Arc::new(RegionDataset {
            region: RegionCode::Nsw,
            schools: vec![
                school("crown-st-public", -33.8745, SchoolSector::Government),
                school("st-peters-primary", -33.8763, SchoolSector::Catholic),
                school("far-away-public", -33.94, SchoolSector::Government),
            ],
            stations: vec![
                station("central", -33.8748),
                station("town-hall", -33.882),
            ],
        })
    }

    struct StubGeocoder {
        place: Option<GeocodedPlace>,
    }

    impl StubGeocoder {
        fn found() -> Self {
            Self {
                place: Some(GeocodedPlace {
                    coordinate: origin(),
                    region: RegionCode::Nsw,
                    display_name: "Surry Hills, Sydney, NSW".to_string(),
                }),
            }
        }

        fn not_found() -> Self {
            Self { place: None }
        }
    }

    impl Geocoder for StubGeocoder {
        async fn geocode(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
            match &self.place {
                Some(place) => Ok(place.clone()),
                None => Err(GeocodeError::NotFound {
                    query: query.to_string(),
                }),
            }
        }
    }

    struct StubDatasets {
        dataset: Option<Arc<RegionDataset>>,
    }

    impl RegionDataSource for StubDatasets {
        async fn load(&self, region: RegionCode) -> Result<Arc<RegionDataset>, DatasetError> {
            match &self.dataset {
                Some(dataset) => Ok(Arc::clone(dataset)),
                None => Err(DatasetError::Unavailable {
                    region,
                    message: "offline".to_string(),
                }),
            }
        }
    }

    struct StubNearby {
        fail: bool,
    }

    impl NearbyPoiSource for StubNearby {
        async fn find_nearby(
            &self,
            _center: Coordinate,
            _radius_meters: u32,
        ) -> Result<Vec<PointOfInterest>, NearbyError> {
            if self.fail {
                return Err(NearbyError::Api {
                    status: 504,
                    message: "gateway timeout".to_string(),
                });
            }
            Ok(vec![PointOfInterest {
                id: "iga-crown-st".to_string(),
                name: "IGA Crown St".to_string(),
                coordinate: coord(-33.872, 151.21),
                attributes: PoiAttributes::Supermarket {
                    chain: Some("IGA".to_string()),
                },
            }])
        }
    }

    /// Always-succeeding router that counts its calls.
    #[derive(Default)]
    struct CountingRouter {
        calls: AtomicUsize,
    }

    impl CountingRouter {
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RoutingProvider for CountingRouter {
        async fn route(
            &self,
            _origin: Coordinate,
            _destination: Coordinate,
        ) -> Result<WalkingRoute, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WalkingRoute {
                duration_minutes: 8.0,
                distance_meters: 600.0,
                encoded_path: "encoded".to_string(),
            })
        }
    }

    type TestOrchestrator =
        SearchOrchestrator<StubGeocoder, StubDatasets, StubNearby, CountingRouter>;

    fn orchestrator(
        geocoder: StubGeocoder,
        datasets: StubDatasets,
        nearby: StubNearby,
    ) -> (TestOrchestrator, Arc<CountingRouter>) {
        let provider = Arc::new(CountingRouter::default());
        let sequencer = RouteSequencer::spawn(
            Arc::clone(&provider),
            RouteCache::new(),
            SequencerConfig {
                inter_request_delay: Duration::ZERO,
            },
        );
        let orch = SearchOrchestrator::new(
            geocoder,
            datasets,
            nearby,
            Arc::clone(&provider),
            sequencer,
            Box::new(MemoryPreferenceStore::new()),
        );
        (orch, provider)
    }

    fn happy_orchestrator() -> (TestOrchestrator, Arc<CountingRouter>) {
        orchestrator(
            StubGeocoder::found(),
            StubDatasets {
                dataset: Some(nsw_dataset()),
            },
            StubNearby { fail: false },
        )
    }

    async fn wait_for_calls(provider: &CountingRouter, expected: usize) {
        timeout(Duration::from_secs(5), async {
            while provider.call_count() < expected {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("enrichment did not run in time");
    }

    #[tokio::test]
    async fn address_search_reaches_ready_with_ranked_categories() {
        let (orch, provider) = happy_orchestrator();

        let snapshot = orch.search_address("12 Crown St, Surry Hills").await.unwrap();

        assert_eq!(snapshot.phase, SearchPhase::Ready);
        assert_eq!(snapshot.region, Some(RegionCode::Nsw));
        assert_eq!(
            snapshot.display_name.as_deref(),
            Some("Surry Hills, Sydney, NSW")
        );

        // The far school was dropped by the distance ceiling.
        assert_eq!(snapshot.schools.results.len(), 2);
        assert_eq!(snapshot.schools.results[0].poi.id, "crown-st-public");
        assert_eq!(snapshot.stations.results.len(), 2);
        assert_eq!(snapshot.stations.results[0].poi.id, "central");
        assert_eq!(snapshot.supermarkets.results.len(), 1);

        // One enrichment request per category top result.
        wait_for_calls(&provider, 3).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.call_count(), 3);

        // The top school's accurate route landed in the cache.
        let view = orch.selection(Category::School).await.unwrap();
        assert!(view.route.is_some());
        assert_eq!(view.status, Some(RouteStatus::Cached));
    }

    #[tokio::test]
    async fn co_located_top_results_share_one_route_fetch() {
        let dataset = Arc::new(RegionDataset {
            region: RegionCode::Nsw,
            schools: vec![school("crown-st-public", -33.8745, SchoolSector::Government)],
            stations: vec![station("central", -33.8745)],
        });
        let (orch, provider) = orchestrator(
            StubGeocoder::found(),
            StubDatasets {
                dataset: Some(dataset),
            },
            StubNearby { fail: false },
        );

        orch.search_address("12 Crown St").await.unwrap();

        // The school and station sit at the same point, so their
        // enrichment requests share a route key; only the supermarket
        // needs a second network call.
        wait_for_calls(&provider, 2).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.call_count(), 2);

        let school_view = orch.selection(Category::School).await.unwrap();
        let station_view = orch.selection(Category::Station).await.unwrap();
        assert_eq!(school_view.status, Some(RouteStatus::Cached));
        assert_eq!(station_view.status, Some(RouteStatus::Cached));
        assert!(school_view.route.is_some());
        assert!(station_view.route.is_some());
    }

    #[tokio::test]
    async fn supermarket_failure_degrades_only_that_category() {
        let (orch, provider) = orchestrator(
            StubGeocoder::found(),
            StubDatasets {
                dataset: Some(nsw_dataset()),
            },
            StubNearby { fail: true },
        );

        let snapshot = orch.search_address("12 Crown St").await.unwrap();

        assert_eq!(snapshot.phase, SearchPhase::Ready);
        assert!(snapshot.supermarkets.error.is_some());
        assert!(snapshot.supermarkets.results.is_empty());
        assert_eq!(snapshot.schools.results.len(), 2);
        assert_eq!(snapshot.stations.results.len(), 2);

        // Only the two surviving categories get enrichment.
        wait_for_calls(&provider, 2).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn dataset_failure_degrades_schools_and_stations() {
        let (orch, _provider) = orchestrator(
            StubGeocoder::found(),
            StubDatasets { dataset: None },
            StubNearby { fail: false },
        );

        let snapshot = orch.search_address("12 Crown St").await.unwrap();

        assert_eq!(snapshot.phase, SearchPhase::Ready);
        assert!(snapshot.schools.error.is_some());
        assert!(snapshot.stations.error.is_some());
        assert_eq!(snapshot.supermarkets.results.len(), 1);
    }

    #[tokio::test]
    async fn failed_geocode_reports_error_phase() {
        let (orch, provider) = orchestrator(
            StubGeocoder::not_found(),
            StubDatasets {
                dataset: Some(nsw_dataset()),
            },
            StubNearby { fail: false },
        );

        let err = orch.search_address("nowhere at all").await.unwrap_err();
        assert!(matches!(err, SearchError::Geocode(_)));
        assert_eq!(orch.phase().await, SearchPhase::Error);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn coordinates_outside_coverage_are_rejected() {
        let (orch, _provider) = happy_orchestrator();

        // Paris.
        let err = orch
            .search_coordinates(coord(48.8566, 2.3522))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::OutsideCoverage));
        assert_eq!(orch.phase().await, SearchPhase::Error);
    }

    #[tokio::test]
    async fn coordinate_search_skips_geocoding() {
        let (orch, _provider) = orchestrator(
            StubGeocoder::not_found(),
            StubDatasets {
                dataset: Some(nsw_dataset()),
            },
            StubNearby { fail: false },
        );

        let snapshot = orch.search_coordinates(origin()).await.unwrap();
        assert_eq!(snapshot.phase, SearchPhase::Ready);
        assert_eq!(snapshot.region, Some(RegionCode::Nsw));
        assert!(snapshot.display_name.is_none());
    }

    #[tokio::test]
    async fn school_filter_re_ranks_and_resets_selection() {
        let (orch, _provider) = happy_orchestrator();
        orch.search_address("12 Crown St").await.unwrap();

        orch.select(Category::School, 1).await.unwrap();
        assert_eq!(orch.snapshot().await.schools.selected, 1);

        let filters = FilterPreferences {
            school_sectors: HashSet::from([SchoolSector::Government]),
            school_levels: HashSet::new(),
        };
        let snapshot = orch.set_school_filter(filters).await.unwrap();

        assert_eq!(snapshot.schools.results.len(), 1);
        assert_eq!(snapshot.schools.results[0].poi.id, "crown-st-public");
        assert_eq!(snapshot.schools.selected, 0);

        // Other categories are untouched.
        assert_eq!(snapshot.stations.results.len(), 2);
        assert_eq!(snapshot.supermarkets.results.len(), 1);
    }

    #[tokio::test]
    async fn selecting_uncached_result_queues_single_fetch() {
        let (orch, provider) = happy_orchestrator();
        orch.search_address("12 Crown St").await.unwrap();
        wait_for_calls(&provider, 3).await;

        let view = orch.select(Category::Station, 1).await.unwrap();
        assert!(view.route.is_none());

        wait_for_calls(&provider, 4).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn selecting_cached_result_skips_the_queue() {
        let (orch, provider) = happy_orchestrator();
        orch.search_address("12 Crown St").await.unwrap();
        wait_for_calls(&provider, 3).await;

        // Index 0 was enriched as the top result.
        let view = orch.select(Category::School, 0).await.unwrap();
        assert!(view.route.is_some());

        sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn select_before_any_search_is_rejected() {
        let (orch, _provider) = happy_orchestrator();
        let err = orch.select(Category::School, 0).await.unwrap_err();
        assert!(matches!(err, SearchError::NoActiveSearch));
    }

    #[tokio::test]
    async fn select_out_of_range_is_rejected() {
        let (orch, _provider) = happy_orchestrator();
        orch.search_address("12 Crown St").await.unwrap();

        let err = orch.select(Category::Supermarket, 5).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidSelection {
                category: Category::Supermarket,
                index: 5,
            }
        ));
    }

    #[tokio::test]
    async fn resolve_selection_returns_cached_route_without_refetching() {
        let (orch, provider) = happy_orchestrator();
        orch.search_address("12 Crown St").await.unwrap();
        wait_for_calls(&provider, 3).await;

        let view = orch.resolve_selection(Category::Supermarket).await.unwrap();
        assert!(view.route.is_some());
        assert_eq!(provider.call_count(), 3);
    }
}
