//! Present/absent reduction of a sampling ring against region datasets.
//!
//! Ring points are grouped by region so each region's index is loaded at
//! most once. The center's region is scanned first, center point first,
//! and the whole query stops at the first point found inside a polygon:
//! there is nothing more severe than "present".

use std::sync::Arc;

use futures::stream::{self, StreamExt as _};
use hazard_map_hazard_models::{FetchOptions, GeoPoint, RingResult, SeverityCategory};
use hazard_map_tiles::SampleRing;

use crate::SpatialError;
use crate::cache::IndexCache;
use crate::index::RegionIndex;
use crate::loader::DatasetLoader;
use crate::region::RegionResolver;

/// Reported when a sample point lies inside a dataset polygon.
pub const PRESENT_DESCRIPTION: &str = "あり";

/// Reported when no point was inside, including when datasets failed to
/// load or regions could not be resolved.
pub const ABSENT_DESCRIPTION: &str = "情報なし";

#[must_use]
pub fn present() -> SeverityCategory {
    SeverityCategory::new(PRESENT_DESCRIPTION, 1.0)
}

#[must_use]
pub fn absent() -> SeverityCategory {
    SeverityCategory::no_risk(ABSENT_DESCRIPTION)
}

/// Returns the cached index for `region`, loading and building it on a
/// miss.
///
/// # Errors
///
/// Returns the loader's error, or [`SpatialError::Join`] if the build task
/// panicked. Failures are not cached.
pub async fn index_for(
    region: &str,
    loader: &dyn DatasetLoader,
    cache: &dyn IndexCache,
) -> Result<Arc<RegionIndex>, SpatialError> {
    if let Some(index) = cache.get(region) {
        return Ok(index);
    }

    let collection = loader.load(region).await?;
    let index =
        tokio::task::spawn_blocking(move || RegionIndex::from_features(collection)).await?;
    log::info!("Indexed {} polygons for region {region}", index.len());

    Ok(cache.insert(region, Arc::new(index)))
}

/// Tests the points of `ring` against the per-region datasets.
///
/// `max` is present if any point is inside; `center` is present only if
/// the center point itself was found inside. Unresolvable points and
/// regions whose dataset fails to load count as absent.
///
/// Regions are resolved with at most `options.max_workers` lookups in
/// flight; a lookup that exceeds `options.collect_timeout` leaves its
/// point unresolved.
pub async fn query_ring(
    ring: &SampleRing,
    resolver: &dyn RegionResolver,
    loader: &dyn DatasetLoader,
    cache: &dyn IndexCache,
    options: &FetchOptions,
) -> RingResult {
    let collect_timeout = options.collect_timeout;
    let resolved: Vec<(usize, GeoPoint, Option<String>)> =
        stream::iter(ring.iter().map(|(index, point)| async move {
            let region = tokio::time::timeout(collect_timeout, resolver.resolve(point))
                .await
                .unwrap_or_else(|_| {
                    log::warn!(
                        "Timed out resolving the region of ring point {index} after {collect_timeout:?}"
                    );
                    None
                });
            (index, point, region)
        }))
        .buffered(options.max_workers.max(1))
        .collect()
        .await;

    for (region, points) in group_by_region(resolved) {
        let index = match index_for(&region, loader, cache).await {
            Ok(index) => index,
            Err(e) => {
                log::warn!("No dataset for region {region}, treating as no information: {e}");
                continue;
            }
        };

        for (i, point) in points {
            if index.contains(point) {
                log::debug!("Ring point {i} is inside a polygon of region {region}");
                return RingResult {
                    max: present(),
                    center: if i == 0 { present() } else { absent() },
                };
            }
        }
    }

    RingResult::uniform(absent())
}

/// Groups points by region in order of first appearance. Because ring
/// index 0 comes first, the center's region leads and the center leads
/// its region.
fn group_by_region(
    resolved: Vec<(usize, GeoPoint, Option<String>)>,
) -> Vec<(String, Vec<(usize, GeoPoint)>)> {
    let mut groups: Vec<(String, Vec<(usize, GeoPoint)>)> = Vec::new();
    for (index, point, region) in resolved {
        let Some(region) = region else {
            log::debug!("Could not resolve a region for ring point {index}");
            continue;
        };
        match groups.iter_mut().find(|(code, _)| *code == region) {
            Some((_, points)) => points.push((index, point)),
            None => groups.push((region, vec![(index, point)])),
        }
    }
    groups
}
