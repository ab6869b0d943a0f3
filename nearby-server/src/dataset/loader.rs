//! Session-scoped, memoized region dataset loader.

use std::future::Future;
use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{PointOfInterest, RegionCode};

use super::client::{DatasetClient, DatasetKind};
use super::error::DatasetError;

/// A region's static POI data.
#[derive(Debug)]
pub struct RegionDataset {
    pub region: RegionCode,
    pub schools: Vec<Arc<PointOfInterest>>,
    pub stations: Vec<Arc<PointOfInterest>>,
}

/// Abstraction over region data loading, for orchestrator tests.
pub trait RegionDataSource: Send + Sync {
    fn load(
        &self,
        region: RegionCode,
    ) -> impl Future<Output = Result<Arc<RegionDataset>, DatasetError>> + Send;
}

/// Memoizing loader for region datasets.
///
/// Each region is fetched at most once per session; concurrent `load`
/// calls for the same region while a fetch is in flight are coalesced
/// into that single fetch. Failed loads are not cached, so a later call
/// can retry.
#[derive(Clone)]
pub struct RegionDatasets {
    client: DatasetClient,
    cache: MokaCache<RegionCode, Arc<RegionDataset>>,
}

impl RegionDatasets {
    /// Create a loader around the given client.
    pub fn new(client: DatasetClient) -> Self {
        // Eight regions exist; the capacity only has to cover them all.
        let cache = MokaCache::builder().max_capacity(16).build();
        Self { client, cache }
    }

    /// Load (or return the memoized) dataset for a region.
    ///
    /// Schools and stations are independent files and are fetched
    /// concurrently; the loader waits for both. Any underlying failure
    /// surfaces as [`DatasetError::Unavailable`] for the region.
    pub async fn load(&self, region: RegionCode) -> Result<Arc<RegionDataset>, DatasetError> {
        self.cache
            .try_get_with(region, self.fetch_region(region))
            .await
            .map_err(|e: Arc<DatasetError>| DatasetError::Unavailable {
                region,
                message: e.to_string(),
            })
    }

    /// Number of regions currently memoized.
    pub fn loaded_regions(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn fetch_region(&self, region: RegionCode) -> Result<Arc<RegionDataset>, DatasetError> {
        debug!(%region, "fetching region dataset");

        let (schools, stations) = futures::try_join!(
            self.client.fetch(region, DatasetKind::Schools),
            self.client.fetch(region, DatasetKind::Stations),
        )?;

        debug!(
            %region,
            schools = schools.len(),
            stations = stations.len(),
            "region dataset loaded"
        );

        Ok(Arc::new(RegionDataset {
            region,
            schools: schools.into_iter().map(Arc::new).collect(),
            stations: stations.into_iter().map(Arc::new).collect(),
        }))
    }
}

impl RegionDataSource for RegionDatasets {
    async fn load(&self, region: RegionCode) -> Result<Arc<RegionDataset>, DatasetError> {
        RegionDatasets::load(self, region).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::{Coordinate, PoiAttributes};

    /// In-memory source that counts loads, for de-duplication tests.
    struct CountingSource {
        loads: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail,
            }
        }

        fn dataset(region: RegionCode) -> Arc<RegionDataset> {
            let station = Arc::new(PointOfInterest {
                id: "st1".into(),
                name: "Central".into(),
                coordinate: Coordinate::new(-33.8832, 151.2070).unwrap(),
                attributes: PoiAttributes::Station { suburb: None },
            });
            Arc::new(RegionDataset {
                region,
                schools: Vec::new(),
                stations: vec![station],
            })
        }
    }

    impl RegionDataSource for CountingSource {
        async fn load(&self, region: RegionCode) -> Result<Arc<RegionDataset>, DatasetError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DatasetError::Unavailable {
                    region,
                    message: "boom".into(),
                });
            }
            Ok(Self::dataset(region))
        }
    }

    /// Memoizing wrapper over any source, mirroring `RegionDatasets`'
    /// caching behaviour so it can be tested without HTTP.
    struct MemoizedSource<S> {
        inner: S,
        cache: MokaCache<RegionCode, Arc<RegionDataset>>,
    }

    impl<S: RegionDataSource> MemoizedSource<S> {
        fn new(inner: S) -> Self {
            Self {
                inner,
                cache: MokaCache::builder().max_capacity(16).build(),
            }
        }

        async fn load(&self, region: RegionCode) -> Result<Arc<RegionDataset>, DatasetError> {
            self.cache
                .try_get_with(region, self.inner.load(region))
                .await
                .map_err(|e: Arc<DatasetError>| DatasetError::Unavailable {
                    region,
                    message: e.to_string(),
                })
        }
    }

    #[tokio::test]
    async fn second_load_is_memoized() {
        let source = MemoizedSource::new(CountingSource::new(false));

        let first = source.load(RegionCode::Nsw).await.unwrap();
        let second = source.load(RegionCode::Nsw).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.inner.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_regions_load_separately() {
        let source = MemoizedSource::new(CountingSource::new(false));

        source.load(RegionCode::Nsw).await.unwrap();
        source.load(RegionCode::Vic).await.unwrap();

        assert_eq!(source.inner.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_loads_coalesce() {
        let source = Arc::new(MemoizedSource::new(CountingSource::new(false)));

        let a = {
            let s = Arc::clone(&source);
            tokio::spawn(async move { s.load(RegionCode::Qld).await })
        };
        let b = {
            let s = Arc::clone(&source);
            tokio::spawn(async move { s.load(RegionCode::Qld).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(source.inner.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_surfaces_unavailable_and_is_not_cached() {
        let source = MemoizedSource::new(CountingSource::new(true));

        let err = source.load(RegionCode::Tas).await.unwrap_err();
        assert!(matches!(err, DatasetError::Unavailable { region, .. } if region == RegionCode::Tas));

        // Not cached, so a retry issues a new load
        let _ = source.load(RegionCode::Tas).await.unwrap_err();
        assert_eq!(source.inner.loads.load(Ordering::SeqCst), 2);
    }
}
