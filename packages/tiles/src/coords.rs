//! Web-Mercator tile and pixel addressing.

use std::f64::consts::PI;

use hazard_map_hazard_models::{GeoPoint, PixelAddress, TILE_SIZE, TileAddress};

/// Converts a point into the tile that contains it at `zoom` and the pixel
/// inside that tile.
///
/// Uses the standard slippy-map projection: `2^zoom` tiles per axis, X
/// linear in longitude, Y from the Mercator transform
/// `(1 - ln(tan(lat) + sec(lat)) / π) / 2`. Pixel offsets are the
/// fractional remainders scaled by [`TILE_SIZE`].
///
/// The projection is undefined at the poles; callers must reject points
/// for which [`GeoPoint::is_projectable`] is false before calling this.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn locate(point: GeoPoint, zoom: u8) -> (TileAddress, PixelAddress) {
    let n = 2f64.powi(i32::from(zoom));
    let lat_rad = point.lat().to_radians();

    let x_f = n * ((point.lon() + 180.0) / 360.0);
    let y_f = n * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;

    let x = x_f.floor();
    let y = y_f.floor();
    let size = f64::from(TILE_SIZE);
    let px = (size * (x_f - x)).floor().min(size - 1.0);
    let py = (size * (y_f - y)).floor().min(size - 1.0);

    (
        TileAddress {
            zoom,
            x: x as u32,
            y: y as u32,
        },
        PixelAddress {
            px: px as u32,
            py: py as u32,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_tokyo_at_zoom_17() {
        let point = GeoPoint::new(35.6895, 139.6917).unwrap();
        let (tile, pixel) = locate(point, 17);
        assert_eq!(
            tile,
            TileAddress {
                zoom: 17,
                x: 116_396,
                y: 51_609
            }
        );
        assert_eq!(pixel, PixelAddress { px: 50, py: 145 });
    }

    #[test]
    fn pixel_offsets_stay_inside_tile() {
        for lat in [-80.0, -45.5, -0.0001, 0.0, 12.3456, 35.0, 60.0, 85.0] {
            for lon in [-179.99, -90.0, 0.0, 0.5, 139.7454, 179.99] {
                let point = GeoPoint::new(lat, lon).unwrap();
                for zoom in [0, 16, 17] {
                    let (tile, pixel) = locate(point, zoom);
                    assert!(pixel.px < TILE_SIZE && pixel.py < TILE_SIZE);
                    let count = 1u64 << zoom;
                    assert!(u64::from(tile.x) < count && u64::from(tile.y) < count);
                    assert_eq!(locate(point, zoom), (tile, pixel));
                }
            }
        }
    }

    #[test]
    fn origin_is_tile_center() {
        let (tile, pixel) = locate(GeoPoint::new(0.0, 0.0).unwrap(), 1);
        assert_eq!(tile, TileAddress { zoom: 1, x: 1, y: 1 });
        assert_eq!(pixel, PixelAddress { px: 0, py: 0 });
    }
}
