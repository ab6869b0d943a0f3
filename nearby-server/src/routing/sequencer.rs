//! Sequential route-enrichment worker.
//!
//! Routing calls must go out one at a time with a gap between them, so
//! enrichment requests are queued into batches and processed by a single
//! worker task in enqueue order. The worker never reorders requests and
//! never has more than one network call outstanding.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use crate::domain::{Coordinate, RouteKey, WalkingRoute};

use super::cache::RouteCache;
use super::client::RoutingProvider;
use super::error::RoutingError;

/// Default gap between consecutive network calls in a batch.
const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(700);

/// Why an enrichment request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The routing API signalled a rate limit. The rest of the batch was
    /// short-circuited to avoid compounding the violation.
    RateLimited,
    /// Any other upstream failure.
    Upstream,
}

/// Lifecycle of one enrichment request.
///
/// `Pending -> InFlight -> {Cached, Failed}`; a request satisfied by the
/// cache goes straight from `Pending` to `Cached`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    Pending,
    InFlight,
    Cached,
    Failed(FailureKind),
}

/// One route-enrichment request.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl RouteRequest {
    pub fn key(&self) -> RouteKey {
        RouteKey::new(&self.origin, &self.destination)
    }
}

/// Sequencer configuration.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Gap between consecutive network calls.
    pub inter_request_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
        }
    }
}

/// A batch of requests tagged with the search generation that queued it.
struct Batch {
    generation: u64,
    requests: Vec<RouteRequest>,
}

/// Handle to the route-enrichment worker.
///
/// `enqueue` is fire-and-forget; callers observe progress through
/// [`RouteSequencer::status`] and the shared [`RouteCache`].
#[derive(Clone)]
pub struct RouteSequencer {
    tx: mpsc::UnboundedSender<Batch>,
    statuses: Arc<RwLock<HashMap<RouteKey, RouteStatus>>>,
    generation: Arc<AtomicU64>,
    cache: RouteCache,
}

impl RouteSequencer {
    /// Spawn the worker task and return a handle to it.
    ///
    /// The provider is the sole network path; its own pacing and
    /// single-flight bounds apply underneath the sequencing done here.
    pub fn spawn<R>(provider: Arc<R>, cache: RouteCache, config: SequencerConfig) -> Self
    where
        R: RoutingProvider + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let statuses: Arc<RwLock<HashMap<RouteKey, RouteStatus>>> =
            Arc::new(RwLock::new(HashMap::new()));
        let generation = Arc::new(AtomicU64::new(0));

        tokio::spawn(worker(
            rx,
            provider,
            cache.clone(),
            Arc::clone(&statuses),
            Arc::clone(&generation),
            config,
        ));

        Self {
            tx,
            statuses,
            generation,
            cache,
        }
    }

    /// Queue a batch of enrichment requests (fire-and-forget).
    ///
    /// Requests are processed strictly in order. Keys already cached or
    /// in flight cost nothing extra.
    pub async fn enqueue(&self, requests: Vec<RouteRequest>) {
        if requests.is_empty() {
            return;
        }

        {
            let mut statuses = self.statuses.write().await;
            for request in &requests {
                statuses.entry(request.key()).or_insert(RouteStatus::Pending);
            }
        }

        let batch = Batch {
            generation: self.generation.load(Ordering::SeqCst),
            requests,
        };

        // The worker only stops when the last handle is dropped, so a
        // send failure here means shutdown; nothing to do about it.
        let _ = self.tx.send(batch);
    }

    /// Fetch one route immediately, bypassing the queue.
    ///
    /// Used when the user selects an alternative result: the cache is
    /// consulted first, and a key already being fetched by the worker is
    /// not fetched a second time (`Ok(None)` — the caller keeps showing
    /// the estimate until the status flips).
    pub async fn fetch_one<R>(
        &self,
        provider: &R,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<WalkingRoute>, RoutingError>
    where
        R: RoutingProvider,
    {
        let key = RouteKey::new(&origin, &destination);

        if let Some(route) = self.cache.get(&origin, &destination).await {
            self.set_status(key, RouteStatus::Cached).await;
            return Ok(Some(route));
        }

        // Request coalescing: don't double-fetch a key the worker holds.
        {
            let mut statuses = self.statuses.write().await;
            if statuses.get(&key) == Some(&RouteStatus::InFlight) {
                return Ok(None);
            }
            statuses.insert(key, RouteStatus::InFlight);
        }

        match provider.route(origin, destination).await {
            Ok(route) => {
                self.cache.insert(&origin, &destination, route.clone()).await;
                self.set_status(key, RouteStatus::Cached).await;
                Ok(Some(route))
            }
            Err(e) => {
                let kind = if e.is_rate_limited() {
                    FailureKind::RateLimited
                } else {
                    FailureKind::Upstream
                };
                self.set_status(key, RouteStatus::Failed(kind)).await;
                Err(e)
            }
        }
    }

    /// The current status of a request key, if it has ever been queued.
    pub async fn status(&self, key: &RouteKey) -> Option<RouteStatus> {
        self.statuses.read().await.get(key).copied()
    }

    /// Invalidate queued work from earlier searches.
    ///
    /// Batches enqueued before the bump are discarded by the worker, so
    /// a superseded search's enrichment never races into current state.
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The shared route cache.
    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    async fn set_status(&self, key: RouteKey, status: RouteStatus) {
        self.statuses.write().await.insert(key, status);
    }
}

/// The sequential worker loop.
async fn worker<R>(
    mut rx: mpsc::UnboundedReceiver<Batch>,
    provider: Arc<R>,
    cache: RouteCache,
    statuses: Arc<RwLock<HashMap<RouteKey, RouteStatus>>>,
    generation: Arc<AtomicU64>,
    config: SequencerConfig,
) where
    R: RoutingProvider,
{
    while let Some(batch) = rx.recv().await {
        if batch.generation < generation.load(Ordering::SeqCst) {
            debug!(
                batch_generation = batch.generation,
                "discarding stale enrichment batch"
            );
            clear_pending(&statuses, &batch.requests).await;
            continue;
        }

        let mut rate_limited = false;
        let mut made_network_call = false;

        for (i, request) in batch.requests.iter().enumerate() {
            let request = *request;
            let key = request.key();

            // Everything behind a rate-limit signal fails immediately;
            // retrying inside the batch would only make the limit worse.
            if rate_limited {
                statuses
                    .write()
                    .await
                    .insert(key, RouteStatus::Failed(FailureKind::RateLimited));
                continue;
            }

            // Cache hit: no network call, no delay.
            if cache.get(&request.origin, &request.destination).await.is_some() {
                statuses.write().await.insert(key, RouteStatus::Cached);
                continue;
            }

            // A newer search bumped the generation mid-batch: drop this
            // request and the rest of the batch, clearing their markers
            // so nothing reads as pending forever.
            if batch.generation < generation.load(Ordering::SeqCst) {
                clear_pending(&statuses, &batch.requests[i..]).await;
                break;
            }

            // Coalescing: skip keys already resolved or being fetched.
            {
                let mut guard = statuses.write().await;
                let current = guard.get(&key).copied();
                match current {
                    Some(RouteStatus::InFlight) | Some(RouteStatus::Cached) => continue,
                    _ => {
                        guard.insert(key, RouteStatus::InFlight);
                    }
                }
            }

            if made_network_call {
                tokio::time::sleep(config.inter_request_delay).await;
            }
            made_network_call = true;

            match provider.route(request.origin, request.destination).await {
                Ok(route) => {
                    cache
                        .insert(&request.origin, &request.destination, route)
                        .await;
                    statuses.write().await.insert(key, RouteStatus::Cached);
                }
                Err(e) if e.is_rate_limited() => {
                    warn!("routing API rate limit hit; failing the rest of the batch");
                    statuses
                        .write()
                        .await
                        .insert(key, RouteStatus::Failed(FailureKind::RateLimited));
                    rate_limited = true;
                }
                Err(e) => {
                    warn!(%e, "route fetch failed");
                    statuses
                        .write()
                        .await
                        .insert(key, RouteStatus::Failed(FailureKind::Upstream));
                }
            }
        }
    }
}

/// Remove `Pending` markers for requests a discarded batch never
/// reached. Statuses owned by other work (in-flight fetches, cached or
/// failed results) are left alone.
async fn clear_pending(
    statuses: &RwLock<HashMap<RouteKey, RouteStatus>>,
    requests: &[RouteRequest],
) {
    let mut guard = statuses.write().await;
    for request in requests {
        if matches!(guard.get(&request.key()), Some(RouteStatus::Pending)) {
            guard.remove(&request.key());
        }
    }
}
