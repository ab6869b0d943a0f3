use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use nearby_server::dataset::{DatasetClient, DatasetConfig, RegionDatasets};
use nearby_server::geocode::{GeocodeClient, GeocodeConfig};
use nearby_server::nearby::{NearbyClient, NearbyConfig};
use nearby_server::routing::{
    RouteCache, RouteSequencer, RoutingClient, RoutingConfig, SequencerConfig,
};
use nearby_server::search::{JsonPreferenceStore, SearchOrchestrator};
use nearby_server::web::{AppState, create_router};

/// Identifies this service to the geocoding API, which requires one.
const USER_AGENT: &str = "nearby-server/0.1";

/// Where filter preferences persist across restarts.
const DEFAULT_PREFS_PATH: &str = "data/preferences.json";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Get the routing API key from the environment
    let routing_key = std::env::var("ROUTING_API_KEY").unwrap_or_else(|_| {
        eprintln!("Warning: ROUTING_API_KEY not set. Route enrichment will fail.");
        String::new()
    });

    // Geocoding client
    let mut geocode_config = GeocodeConfig::new().with_user_agent(USER_AGENT);
    if let Ok(url) = std::env::var("GEOCODE_BASE_URL") {
        geocode_config = geocode_config.with_base_url(url);
    }
    let geocoder = GeocodeClient::new(geocode_config).expect("Failed to create geocoding client");

    // Region dataset loader
    let mut dataset_config = DatasetConfig::new();
    if let Ok(url) = std::env::var("DATASET_BASE_URL") {
        dataset_config = dataset_config.with_base_url(url);
    }
    let dataset_client =
        DatasetClient::new(dataset_config).expect("Failed to create dataset client");
    let datasets = RegionDatasets::new(dataset_client);

    // Supermarket lookup client
    let mut nearby_config = NearbyConfig::new();
    if let Ok(url) = std::env::var("OVERPASS_BASE_URL") {
        nearby_config = nearby_config.with_base_url(url);
    }
    let nearby = NearbyClient::new(nearby_config).expect("Failed to create nearby-POI client");

    // Routing client, shared by the sequencer and on-demand fetches
    let mut routing_config = RoutingConfig::new(routing_key);
    if let Ok(url) = std::env::var("ROUTING_BASE_URL") {
        routing_config = routing_config.with_base_url(url);
    }
    let routing =
        Arc::new(RoutingClient::new(routing_config).expect("Failed to create routing client"));

    // Background route enrichment
    let sequencer = RouteSequencer::spawn(
        Arc::clone(&routing),
        RouteCache::new(),
        SequencerConfig::default(),
    );

    let prefs_path =
        std::env::var("PREFS_PATH").unwrap_or_else(|_| DEFAULT_PREFS_PATH.to_string());
    let prefs = JsonPreferenceStore::new(prefs_path);

    let orchestrator = SearchOrchestrator::new(
        geocoder,
        datasets,
        nearby,
        routing,
        sequencer,
        Box::new(prefs),
    );

    let state = AppState::new(orchestrator);
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    println!("Nearby-amenity search server listening on http://{addr}");
    println!();
    println!("API Endpoints:");
    println!("  GET  /health          - Health check");
    println!("  GET  /search          - Search by address (q) or coordinates (lat, lon)");
    println!("  POST /select          - Highlight a different result");
    println!("  GET  /route           - Accurate route for the current selection");
    println!("  POST /filters/school  - Update the school filter");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
