//! Point to region-code resolution.

use std::sync::Arc;

use async_trait::async_trait;
use hazard_map_hazard_models::GeoPoint;

use crate::prefecture;

/// Resolves the administrative region a point falls in.
///
/// Typically backed by a reverse geocoder whose address is mapped through
/// [`prefecture::code_from_address`].
#[async_trait]
pub trait RegionResolver: Send + Sync {
    /// The region code for `point`, or `None` if it cannot be determined.
    async fn resolve(&self, point: GeoPoint) -> Option<String>;
}

/// Assigns every point to one fixed region.
///
/// Adequate when the caller already knows the region and the sampling
/// radius is far smaller than the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRegionResolver {
    code: String,
}

impl FixedRegionResolver {
    /// A resolver that always answers `code`. Unknown prefecture codes are
    /// accepted but logged.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        if !prefecture::is_valid(&code) {
            log::warn!("Region code {code} is not a prefecture code");
        }
        Self { code }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

#[async_trait]
impl RegionResolver for FixedRegionResolver {
    async fn resolve(&self, _point: GeoPoint) -> Option<String> {
        Some(self.code.clone())
    }
}

/// Turns a point into a free-form postal address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// The address at `point`, or `None` if the lookup failed.
    async fn address(&self, point: GeoPoint) -> Option<String>;
}

/// Resolves regions by reverse geocoding each point and finding the
/// prefecture named in the returned address.
#[derive(Clone)]
pub struct GeocodedRegionResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl GeocodedRegionResolver {
    #[must_use]
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl RegionResolver for GeocodedRegionResolver {
    async fn resolve(&self, point: GeoPoint) -> Option<String> {
        let Some(address) = self.geocoder.address(point).await else {
            log::debug!("No address for ({}, {})", point.lat(), point.lon());
            return None;
        };

        let Some(code) = prefecture::code_from_address(&address) else {
            log::debug!("No prefecture in address {address:?}");
            return None;
        };

        log::trace!(
            "({}, {}) is in {}",
            point.lat(),
            point.lon(),
            prefecture::name(code).unwrap_or(code)
        );
        Some(code.to_string())
    }
}
