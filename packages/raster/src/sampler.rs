//! Max/center reduction of a color-table layer around a point.
//!
//! Standard precision reads the 3x3 pixel neighbourhood of the query
//! point from a single tile. High precision classifies every point of a
//! 100 m ring, fetching each distinct tile once.

use hazard_map_hazard_models::{
    GeoPoint, PixelAddress, Precision, RingReducer, RingResult, TILE_SIZE,
};
use hazard_map_tiles::ring::{
    FALLBACK_RING_POINTS, HIGH_PRECISION_RING_POINTS, SEARCH_RADIUS_M,
};
use hazard_map_tiles::{TileCoordinator, locate, ring};

use crate::classify::classify;
use crate::layer::HazardLayerSpec;

/// Weight of the least severe real hazard. A fallback source is only
/// consulted when the primary maximum is below this.
pub const LOWEST_HAZARD_WEIGHT: f64 = 1.0;

/// Samples `layer` around `point` and reduces to a [`RingResult`].
///
/// If the layer has a fallback and the primary maximum is below
/// [`LOWEST_HAZARD_WEIGHT`], the fallback is sampled too and merged in; the
/// merge can only raise weights. In high precision the fallback uses a
/// smaller ring of [`FALLBACK_RING_POINTS`].
pub async fn sample_layer(
    point: GeoPoint,
    layer: &HazardLayerSpec,
    precision: Precision,
    tiles: &TileCoordinator,
) -> RingResult {
    let primary = match precision {
        Precision::Low => sample_neighbourhood(point, layer, tiles).await,
        Precision::High => sample_ring(point, layer, HIGH_PRECISION_RING_POINTS, tiles).await,
    };

    let Some(fallback) = layer.fallback.as_deref() else {
        return primary;
    };
    if primary.max.weight >= LOWEST_HAZARD_WEIGHT {
        return primary;
    }

    log::debug!(
        "{} found no hazard (max weight {}), consulting {}",
        layer.id,
        primary.max.weight,
        fallback.id
    );
    let secondary = match precision {
        Precision::Low => sample_neighbourhood(point, fallback, tiles).await,
        Precision::High => sample_ring(point, fallback, FALLBACK_RING_POINTS, tiles).await,
    };
    primary.merge_fallback(secondary)
}

async fn sample_neighbourhood(
    point: GeoPoint,
    layer: &HazardLayerSpec,
    tiles: &TileCoordinator,
) -> RingResult {
    let (tile, pixel) = locate(point, layer.zoom);
    let mut reducer = RingReducer::new(layer.no_risk.clone());

    let Some(image) = tiles.fetch_one(tile, &layer.url_template).await else {
        return reducer.finish();
    };

    for (index, neighbour) in neighbourhood(pixel).into_iter().enumerate() {
        match image.get_pixel_checked(neighbour.px, neighbour.py) {
            Some(rgba) => {
                let category = classify(rgba.0, &layer.color_table, &layer.no_risk);
                reducer.observe(index, &category);
            }
            None => log::warn!(
                "Pixel ({}, {}) outside {}x{} tile {tile} of {}",
                neighbour.px,
                neighbour.py,
                image.width(),
                image.height(),
                layer.id
            ),
        }
    }

    reducer.finish()
}

async fn sample_ring(
    point: GeoPoint,
    layer: &HazardLayerSpec,
    count: usize,
    tiles: &TileCoordinator,
) -> RingResult {
    let located: Vec<_> = ring(point, SEARCH_RADIUS_M, count)
        .points()
        .iter()
        .map(|p| locate(*p, layer.zoom))
        .collect();
    let images = tiles
        .fetch_many(located.iter().map(|(tile, _)| *tile), &layer.url_template)
        .await;

    let mut reducer = RingReducer::new(layer.no_risk.clone());
    for (index, (tile, pixel)) in located.iter().enumerate() {
        let Some(Some(image)) = images.get(tile) else {
            continue;
        };
        if let Some(rgba) = image.get_pixel_checked(pixel.px, pixel.py) {
            let category = classify(rgba.0, &layer.color_table, &layer.no_risk);
            reducer.observe(index, &category);
        }
    }

    reducer.finish()
}

/// The center pixel followed by its in-tile 8-neighbours in row-major order.
fn neighbourhood(center: PixelAddress) -> Vec<PixelAddress> {
    let mut pixels = Vec::with_capacity(9);
    pixels.push(center);
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let px = center.px.checked_add_signed(dx).filter(|px| *px < TILE_SIZE);
            let py = center.py.checked_add_signed(dy).filter(|py| *py < TILE_SIZE);
            if let (Some(px), Some(py)) = (px, py) {
                pixels.push(PixelAddress { px, py });
            }
        }
    }
    pixels
}
