//! Sampling rings: the query point plus points on a small circle around it.
//!
//! Offsets use a flat-Earth meters-to-degrees conversion, which is only
//! accurate for radii that are tiny relative to the Earth (the 100 m
//! search radius). Do not reuse this for kilometre-scale rings.

use std::f64::consts::PI;

use hazard_map_hazard_models::{GeoPoint, Precision};

/// WGS84 equatorial radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Radius of every hazard sampling ring.
pub const SEARCH_RADIUS_M: f64 = 100.0;

/// Ring points (excluding the center) in standard mode.
pub const STANDARD_RING_POINTS: usize = 4;

/// Ring points (excluding the center) in high-precision mode.
pub const HIGH_PRECISION_RING_POINTS: usize = 16;

/// Ring points used for a fallback raster source in high-precision mode.
pub const FALLBACK_RING_POINTS: usize = 8;

/// Returns the number of circle points for a precision mode.
#[must_use]
pub const fn ring_points(precision: Precision) -> usize {
    match precision {
        Precision::Low => STANDARD_RING_POINTS,
        Precision::High => HIGH_PRECISION_RING_POINTS,
    }
}

/// An ordered set of sample points. Index 0 is always the query point.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRing {
    points: Vec<GeoPoint>,
}

impl SampleRing {
    /// The query point.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        self.points[0]
    }

    /// All points, center first.
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Number of points including the center.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a ring contains at least its center.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterates `(index, point)` pairs in generation order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, GeoPoint)> + '_ {
        self.points.iter().copied().enumerate()
    }
}

/// Builds a ring of `count` points at `radius_m` around `center`, preceded
/// by the center itself.
///
/// `count == 4` places the points at north, east, south, and west. Any
/// other count spaces them at angles `2π·i/count`, clockwise from north.
#[must_use]
pub fn ring(center: GeoPoint, radius_m: f64, count: usize) -> SampleRing {
    let mut points = Vec::with_capacity(count + 1);
    points.push(center);

    if count == STANDARD_RING_POINTS {
        for angle in [0.0, PI / 2.0, PI, 3.0 * PI / 2.0] {
            points.push(displace(center, radius_m, angle));
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let step = 2.0 * PI / count as f64;
        for i in 0..count {
            #[allow(clippy::cast_precision_loss)]
            let angle = step * i as f64;
            points.push(displace(center, radius_m, angle));
        }
    }

    SampleRing { points }
}

fn displace(center: GeoPoint, radius_m: f64, angle: f64) -> GeoPoint {
    let d_lat = radius_m * angle.cos() / EARTH_RADIUS_M * (180.0 / PI);
    let d_lon = radius_m * angle.sin() / EARTH_RADIUS_M * (180.0 / PI)
        / (center.lat() * PI / 180.0).cos();
    center.offset_degrees(d_lat, d_lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo() -> GeoPoint {
        GeoPoint::new(35.6586, 139.7454).unwrap()
    }

    #[test]
    fn center_is_always_first() {
        for count in [4, 8, 16] {
            let ring = ring(tokyo(), SEARCH_RADIUS_M, count);
            assert_eq!(ring.len(), count + 1);
            assert_eq!(ring.center(), tokyo());
        }
    }

    #[test]
    fn cardinal_points_match_equal_angle_formula() {
        let cardinal = ring(tokyo(), SEARCH_RADIUS_M, 4);
        for (i, point) in cardinal.points().iter().skip(1).enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let angle = 2.0 * PI * i as f64 / 4.0;
            let expected = displace(tokyo(), SEARCH_RADIUS_M, angle);
            assert!((point.lat() - expected.lat()).abs() < 1e-12);
            assert!((point.lon() - expected.lon()).abs() < 1e-12);
        }
    }

    #[test]
    fn first_ring_point_is_due_north() {
        let ring = ring(tokyo(), SEARCH_RADIUS_M, 16);
        let north = ring.points()[1];
        assert!(north.lat() > tokyo().lat());
        assert!((north.lon() - tokyo().lon()).abs() < 1e-12);
        // 100 m is roughly 0.000898 degrees of latitude.
        assert!((north.lat() - tokyo().lat() - 0.000_898).abs() < 1e-5);
    }

    #[test]
    fn points_are_roughly_radius_away() {
        let ring = ring(tokyo(), SEARCH_RADIUS_M, 16);
        let lat_scale = EARTH_RADIUS_M * PI / 180.0;
        let lon_scale = lat_scale * tokyo().lat().to_radians().cos();
        for point in &ring.points()[1..] {
            let dy = (point.lat() - tokyo().lat()) * lat_scale;
            let dx = (point.lon() - tokyo().lon()) * lon_scale;
            let distance = dx.hypot(dy);
            assert!((distance - SEARCH_RADIUS_M).abs() < 0.01, "{distance}");
        }
    }
}
