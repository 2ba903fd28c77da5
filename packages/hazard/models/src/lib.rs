#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic point, tile address, and hazard severity types.
//!
//! These are the values that flow between the tile, raster, spatial, and
//! report crates. Everything here is plain data: no I/O, no global state.

pub mod severity;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use severity::{ColorKey, RingReducer, RingResult, SeverityCategory};

/// Pixel width and height of one slippy-map tile.
pub const TILE_SIZE: u32 = 256;

/// Largest latitude (in degrees) representable in the Web-Mercator tile
/// pyramid.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Error returned when a [`GeoPoint`] is constructed from out-of-range
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({lat}, {lon}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
pub struct InvalidCoordinateError {
    /// The rejected latitude.
    pub lat: f64,
    /// The rejected longitude.
    pub lon: f64,
}

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a point after checking that both coordinates are finite and
    /// inside their geographic ranges.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if latitude is outside `[-90, 90]`,
    /// longitude is outside `[-180, 180]`, or either value is not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinateError> {
        if lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon)
        {
            Ok(Self { lat, lon })
        } else {
            Err(InvalidCoordinateError { lat, lon })
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }

    /// Whether the Web-Mercator tile projection is defined for this point
    /// and maps it inside the tile grid.
    ///
    /// Poles and pole-adjacent latitudes are excluded, as is `lon == 180`
    /// (which would address tile column `2^zoom`).
    #[must_use]
    pub fn is_projectable(&self) -> bool {
        self.lat.abs() < MAX_MERCATOR_LATITUDE && self.lon < 180.0
    }

    /// Returns the point displaced by the given number of degrees.
    ///
    /// Longitude wraps across the antimeridian. Latitude is not clamped;
    /// the displacements used for sampling rings are a few thousandths of
    /// a degree, so a projectable center stays projectable.
    #[must_use]
    pub fn offset_degrees(&self, d_lat: f64, d_lon: f64) -> Self {
        let mut lon = self.lon + d_lon;
        if lon >= 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }
        Self {
            lat: self.lat + d_lat,
            lon,
        }
    }
}

/// Address of one raster tile in the slippy-map pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    /// Zoom level.
    pub zoom: u8,
    /// Column, in `[0, 2^zoom)`.
    pub x: u32,
    /// Row, in `[0, 2^zoom)`.
    pub y: u32,
}

impl TileAddress {
    /// Expands a `{z}/{x}/{y}` URL template for this tile.
    #[must_use]
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

impl std::fmt::Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A pixel inside a tile, both coordinates in `[0, TILE_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PixelAddress {
    /// Column within the tile.
    pub px: u32,
    /// Row within the tile.
    pub py: u32,
}

/// Hazard categories a caller can request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HazardCategory {
    /// 30-year exceedance probabilities for strong ground motion.
    Earthquake,
    /// Maximum assumed river-flood inundation depth.
    Flood,
    /// Assumed duration of flood inundation.
    FloodKeizoku,
    /// House-collapse zone from flood flow (outline-encoded raster).
    KaokutoukaiHanran,
    /// House-collapse zone from bank erosion.
    KaokutoukaiKagan,
    /// Assumed tsunami inundation depth.
    Tsunami,
    /// Assumed storm-surge inundation depth.
    HighTide,
    /// Sediment disaster warning zones (debris flow, steep slope, landslide).
    Landslide,
    /// Large-scale filled land (vector polygons).
    LargeFillLand,
}

impl HazardCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Earthquake,
            Self::Flood,
            Self::FloodKeizoku,
            Self::KaokutoukaiHanran,
            Self::KaokutoukaiKagan,
            Self::Tsunami,
            Self::HighTide,
            Self::Landslide,
            Self::LargeFillLand,
        ]
    }
}

/// Sampling precision requested by the caller.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Precision {
    /// Fast mode: one tile, 9-pixel neighbourhood; 4-point rings.
    #[default]
    Low,
    /// Accurate mode: 16-point rings at 100 m.
    High,
}

impl Precision {
    /// Whether high-precision sampling was requested.
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Timeouts and parallelism for one fan-out of network calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Network timeout for a single request.
    pub fetch_timeout: Duration,
    /// How long collection waits for a single result before treating it as
    /// absent. Kept larger than `fetch_timeout`.
    pub collect_timeout: Duration,
    /// Maximum number of requests in flight.
    pub max_workers: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(3),
            collect_timeout: Duration::from_secs(5),
            max_workers: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(35.0, 139.0).is_ok());
    }

    #[test]
    fn poles_are_not_projectable() {
        assert!(!GeoPoint::new(90.0, 0.0).unwrap().is_projectable());
        assert!(!GeoPoint::new(-86.0, 0.0).unwrap().is_projectable());
        assert!(!GeoPoint::new(0.0, 180.0).unwrap().is_projectable());
        assert!(GeoPoint::new(35.6895, 139.6917).unwrap().is_projectable());
    }

    #[test]
    fn offset_wraps_longitude() {
        let p = GeoPoint::new(0.0, 179.9999).unwrap().offset_degrees(0.0, 0.0002);
        assert!((p.lon() - -179.9999).abs() < 1e-9);
    }

    #[test]
    fn expands_url_template() {
        let tile = TileAddress {
            zoom: 17,
            x: 116_396,
            y: 51_609,
        };
        assert_eq!(
            tile.url("https://example.test/{z}/{x}/{y}.png"),
            "https://example.test/17/116396/51609.png"
        );
    }

    #[test]
    fn category_names_round_trip() {
        for category in HazardCategory::all() {
            let parsed: HazardCategory = category.as_ref().parse().unwrap();
            assert_eq!(parsed, *category);
        }
        assert_eq!(
            "large_fill_land".parse::<HazardCategory>().unwrap(),
            HazardCategory::LargeFillLand
        );
        assert!("volcano".parse::<HazardCategory>().is_err());
    }

    #[test]
    fn precision_parses_low_and_high() {
        assert_eq!("low".parse::<Precision>().unwrap(), Precision::Low);
        assert_eq!("high".parse::<Precision>().unwrap(), Precision::High);
        assert!("medium".parse::<Precision>().is_err());
    }
}
