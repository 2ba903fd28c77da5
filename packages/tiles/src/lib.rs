#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Slippy-map tile math, sampling rings, and tile retrieval.
//!
//! - [`coords`] converts a [`GeoPoint`](hazard_map_hazard_models::GeoPoint)
//!   into a tile and pixel address.
//! - [`ring`] generates the center-plus-circle sample points used by every
//!   hazard layer.
//! - [`fetch`] retrieves and decodes one raster tile, turning every failure
//!   into "absent".
//! - [`coordinator`] deduplicates tile addresses and fetches them with
//!   bounded parallelism and two separate timeouts.

pub mod coordinator;
pub mod coords;
pub mod fetch;
pub mod ring;

pub use coordinator::{TileCoordinator, TileSet};
pub use coords::locate;
pub use fetch::{HttpTileFetcher, TileFetcher, TileImage};
pub use ring::{SampleRing, ring};

/// Errors from fetching or decoding a tile.
///
/// These never escape [`TileFetcher::fetch_tile`]; they exist so the
/// fetch path can use `?` internally and log one precise reason.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response body was not a decodable image.
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
}
