//! Zones drawn as outlines on an otherwise transparent tile.
//!
//! The outline pixels are reduced to their boundary, each boundary pixel
//! becomes a slightly enlarged unit square, and the union of those squares
//! is resolved into simple polygons. The enlargement makes diagonal
//! neighbours overlap, so slanted strokes stay connected. Filling each polygon's exterior ring gives the zone:
//! the stroke itself plus everything it encloses. Polygons are in pixel
//! space and are only meaningful for the tile they came from.

use std::collections::BTreeSet;

use geo::{Contains, Coord, MultiPolygon, Polygon, Rect, unary_union};
use hazard_map_hazard_models::{
    ColorKey, GeoPoint, PixelAddress, Precision, RingReducer, RingResult, TileAddress,
};
use hazard_map_tiles::ring::{HIGH_PRECISION_RING_POINTS, SEARCH_RADIUS_M};
use hazard_map_tiles::{TileCoordinator, TileImage, locate, ring};

use crate::layer::BoundaryLayerSpec;

/// How far each pixel square is grown on every side. Pixels that touch
/// only at a corner must overlap to be joined by the union.
const CORNER_OVERLAP: f64 = 0.01;

/// Filled zones extracted from one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePolygon {
    tile: TileAddress,
    zones: Vec<Polygon<f64>>,
}

impl ZonePolygon {
    /// The tile this polygon was extracted from.
    #[must_use]
    pub const fn tile(&self) -> TileAddress {
        self.tile
    }

    /// The filled zones, in pixel coordinates.
    #[must_use]
    pub fn zones(&self) -> &[Polygon<f64>] {
        &self.zones
    }

    /// Whether the center of `pixel` lies inside any zone.
    #[must_use]
    pub fn contains(&self, pixel: PixelAddress) -> bool {
        let center = Coord {
            x: f64::from(pixel.px) + 0.5,
            y: f64::from(pixel.py) + 0.5,
        };
        self.zones.iter().any(|zone| zone.contains(&center))
    }
}

/// Extracts the zones outlined in `outline` color from `image`.
///
/// Returns `None` if the tile has no opaque pixel of that color.
#[must_use]
pub fn extract_polygon(
    image: &TileImage,
    tile: TileAddress,
    outline: ColorKey,
) -> Option<ZonePolygon> {
    let stroke: BTreeSet<(u32, u32)> = image
        .enumerate_pixels()
        .filter(|(_, _, rgba)| rgba[3] != 0 && ColorKey::from_rgba(rgba.0) == outline)
        .map(|(x, y, _)| (x, y))
        .collect();
    if stroke.is_empty() {
        return None;
    }

    let (width, height) = image.dimensions();
    let squares: Vec<Polygon<f64>> = stroke
        .iter()
        .filter(|(x, y)| is_boundary(*x, *y, width, height, &stroke))
        .map(|(x, y)| pixel_square(*x, *y))
        .collect();

    // A thick stroke yields an outer and an inner boundary band; filling
    // both and taking the union again collapses them into one zone.
    let filled: Vec<Polygon<f64>> = unary_union(&squares)
        .into_iter()
        .map(|polygon| {
            let (exterior, _holes) = polygon.into_inner();
            Polygon::new(exterior, vec![])
        })
        .collect();
    let zones: MultiPolygon<f64> = unary_union(&filled);
    let zones = zones.0;

    log::trace!(
        "Tile {tile}: {} outline pixels resolved to {} zones",
        stroke.len(),
        zones.len()
    );

    Some(ZonePolygon { tile, zones })
}

/// A stroke pixel is on the boundary if any 4-neighbour is not stroke.
/// Neighbours outside the image count as not stroke.
fn is_boundary(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    stroke: &BTreeSet<(u32, u32)>,
) -> bool {
    let neighbours = [
        x.checked_sub(1).map(|nx| (nx, y)),
        (x + 1 < width).then_some((x + 1, y)),
        y.checked_sub(1).map(|ny| (x, ny)),
        (y + 1 < height).then_some((x, y + 1)),
    ];
    neighbours
        .iter()
        .any(|neighbour| neighbour.is_none_or(|n| !stroke.contains(&n)))
}

fn pixel_square(x: u32, y: u32) -> Polygon<f64> {
    let min = Coord {
        x: f64::from(x) - CORNER_OVERLAP,
        y: f64::from(y) - CORNER_OVERLAP,
    };
    let max = Coord {
        x: f64::from(x) + 1.0 + CORNER_OVERLAP,
        y: f64::from(y) + 1.0 + CORNER_OVERLAP,
    };
    Rect::new(min, max).to_polygon()
}

/// Samples an outline layer around `point`.
///
/// Standard precision tests the query point only. High precision tests
/// every point of the 100 m ring against the polygon of the center's tile;
/// ring points that fall on another tile are skipped.
pub async fn sample_boundary_layer(
    point: GeoPoint,
    layer: &BoundaryLayerSpec,
    precision: Precision,
    tiles: &TileCoordinator,
) -> RingResult {
    let (center_tile, _) = locate(point, layer.zoom);

    let Some(image) = tiles.fetch_one(center_tile, &layer.url_template).await else {
        return RingResult::uniform(layer.absent.clone());
    };
    let Some(polygon) = extract_polygon(&image, center_tile, layer.outline_color) else {
        return RingResult::uniform(layer.absent.clone());
    };

    let points = if precision.is_high() {
        ring(point, SEARCH_RADIUS_M, HIGH_PRECISION_RING_POINTS)
            .points()
            .to_vec()
    } else {
        vec![point]
    };

    let mut reducer = RingReducer::new(layer.absent.clone());
    for (index, sample) in points.into_iter().enumerate() {
        let (tile, pixel) = locate(sample, layer.zoom);
        if tile != polygon.tile() {
            log::debug!("{}: ring point {index} is on tile {tile}, skipping", layer.id);
            continue;
        }
        let category = if polygon.contains(pixel) {
            &layer.present
        } else {
            &layer.absent
        };
        reducer.observe(index, category);
    }

    reducer.finish()
}
