#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-hazard report for a single location.
//!
//! [`HazardAggregator`] runs every requested hazard category concurrently
//! and collects the results into a [`HazardReport`]. [`display::render`]
//! turns a report into the labelled text shown to end users.

pub mod aggregator;
pub mod config;
pub mod display;

use std::collections::BTreeMap;

use hazard_map_hazard_models::{GeoPoint, HazardCategory, Precision, RingResult};
use hazard_map_probability::ProbabilitySample;
use hazard_map_raster::RegistryError;
use serde::Serialize;

pub use aggregator::{FillLandSource, HazardAggregator};
pub use config::AggregatorConfig;

/// Errors from building an aggregator or running an aggregation.
///
/// Network and dataset failures never show up here; they degrade the
/// affected entry to its "no data" value instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The location cannot be projected onto the tile grid.
    #[error("Invalid location ({lat}, {lon}): outside the Web-Mercator tile range")]
    InvalidLocation {
        /// Requested latitude.
        lat: f64,
        /// Requested longitude.
        lon: f64,
    },

    /// A layer the aggregator depends on is missing from its registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The three sediment-disaster zone layers sampled for
/// [`HazardCategory::Landslide`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandslideZones {
    pub debris_flow: RingResult,
    pub steep_slope: RingResult,
    pub landslide: RingResult,
}

impl LandslideZones {
    /// The layers in display order.
    #[must_use]
    pub const fn layers(&self) -> [&RingResult; 3] {
        [&self.debris_flow, &self.steep_slope, &self.landslide]
    }
}

/// Result for one hazard category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HazardEntry {
    /// Point-probability values (earthquake).
    Probability(ProbabilitySample),
    /// A single classified layer.
    Severity(RingResult),
    /// The sediment-disaster composite.
    Landslide(LandslideZones),
}

/// Everything known about one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardReport {
    pub location: GeoPoint,
    pub precision: Precision,
    /// One entry per requested, recognised category.
    pub entries: BTreeMap<HazardCategory, HazardEntry>,
    /// Requested names that are not hazard categories, in request order.
    pub ignored_categories: Vec<String>,
}

impl HazardReport {
    #[must_use]
    pub fn get(&self, category: HazardCategory) -> Option<&HazardEntry> {
        self.entries.get(&category)
    }
}
