//! Static school/station dataset, partitioned by region.
//!
//! The dataset is served as pre-partitioned JSON files, one per
//! (region, kind). The loader memoizes each region for the session and
//! de-duplicates concurrent loads.

mod client;
mod error;
mod loader;

pub use client::{DatasetClient, DatasetConfig, DatasetKind};
pub use error::DatasetError;
pub use loader::{RegionDataSource, RegionDataset, RegionDatasets};
