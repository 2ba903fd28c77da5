#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region-partitioned spatial index for vector hazard datasets.
//!
//! Large datasets (large-scale fill land) are split into one `GeoJSON`
//! file per prefecture. Each file is loaded on first use, indexed in an
//! R-tree, and kept for the life of the process. [`query::query_ring`]
//! answers "is any ring point inside a polygon?" with an early exit on
//! the first hit.

pub mod cache;
pub mod index;
pub mod loader;
pub mod prefecture;
pub mod query;
pub mod region;

pub use cache::{IndexCache, UnboundedIndexCache, global_index_cache};
pub use index::RegionIndex;
pub use loader::{DatasetLoader, DirectoryDatasetLoader};
pub use query::{index_for, query_ring};
pub use region::{FixedRegionResolver, GeocodedRegionResolver, RegionResolver, ReverseGeocoder};

/// Errors from loading or indexing a region dataset.
///
/// These never escape [`query_ring`]; a failing region is logged and
/// counted as "no information".
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// Reading the dataset failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dataset is not a `GeoJSON` feature collection.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A background parse or build task panicked.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
