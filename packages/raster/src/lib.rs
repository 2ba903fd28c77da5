#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raster hazard layers: legends, sampling, and outline zones.
//!
//! [`layer::LayerRegistry`] holds the layers compiled into the crate. A
//! color-table layer is sampled with [`sampler::sample_layer`]; an outline
//! layer with [`boundary::sample_boundary_layer`]. Both reduce to a
//! [`RingResult`](hazard_map_hazard_models::RingResult) and never fail:
//! missing tiles read as "no hazard".

pub mod boundary;
pub mod classify;
pub mod layer;
pub mod sampler;

pub use boundary::{ZonePolygon, extract_polygon, sample_boundary_layer};
pub use classify::{ColorTable, classify};
pub use layer::{BoundaryLayerSpec, HazardLayerSpec, LayerRegistry};
pub use sampler::sample_layer;

/// Errors from loading or querying the layer registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A TOML document could not be deserialized.
    #[error("Failed to parse {name}: {source}")]
    Parse {
        /// Name the document was registered under.
        name: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Two tables or two layers share an id.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// A color table lists the same RGB twice.
    #[error("Color table {table} lists {rgb:?} more than once")]
    DuplicateColor {
        /// Table id.
        table: String,
        /// Repeated color.
        rgb: [u8; 3],
    },

    /// A layer references a color table that does not exist.
    #[error("Layer {layer} references unknown color table {table}")]
    UnknownColorTable {
        /// Layer id.
        layer: String,
        /// Missing table id.
        table: String,
    },

    /// A fallback is missing, not a color-table layer, or chained.
    #[error("Layer {layer} has invalid fallback {fallback}")]
    InvalidFallback {
        /// Layer id.
        layer: String,
        /// Referenced fallback id.
        fallback: String,
    },

    /// No layer of the requested kind has this id.
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),
}
