//! R-tree over one region's hazard polygons.

use geo::{BoundingRect, Contains, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use hazard_map_hazard_models::GeoPoint;
use rstar::{AABB, RTree, RTreeObject};

use crate::SpatialError;

/// A hazard polygon stored in the R-tree.
struct FeatureEntry {
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for FeatureEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point-in-polygon index for the features of one region.
///
/// The R-tree only narrows the candidates by bounding box; every
/// candidate is then tested with exact polygon containment.
pub struct RegionIndex {
    features: RTree<FeatureEntry>,
}

impl std::fmt::Debug for RegionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionIndex")
            .field("features", &self.features.size())
            .finish()
    }
}

impl RegionIndex {
    /// Builds an index from polygons in longitude/latitude order.
    #[must_use]
    pub fn from_polygons(polygons: impl IntoIterator<Item = MultiPolygon<f64>>) -> Self {
        let entries: Vec<FeatureEntry> = polygons
            .into_iter()
            .map(|polygon| FeatureEntry {
                envelope: compute_envelope(&polygon),
                polygon,
            })
            .collect();
        Self {
            features: RTree::bulk_load(entries),
        }
    }

    /// Builds an index from the polygonal features of a collection.
    ///
    /// Features without geometry or with non-polygon geometry are skipped.
    #[must_use]
    pub fn from_features(collection: FeatureCollection) -> Self {
        let total = collection.features.len();
        let polygons: Vec<MultiPolygon<f64>> = collection
            .features
            .into_iter()
            .filter_map(|feature| feature.geometry)
            .filter_map(to_multipolygon)
            .collect();

        if polygons.len() < total {
            log::warn!(
                "Skipped {} of {total} features without polygon geometry",
                total - polygons.len()
            );
        }

        Self::from_polygons(polygons)
    }

    /// Parses a `GeoJSON` `FeatureCollection` document and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::GeoJson`] if the text is not `GeoJSON` or is
    /// not a feature collection.
    pub fn from_geojson_str(text: &str) -> Result<Self, SpatialError> {
        let geojson: GeoJson = text.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;
        Ok(Self::from_features(collection))
    }

    /// Whether any indexed polygon contains `point`.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        let query = geo::Point::new(point.lon(), point.lat());
        let query_env = AABB::from_point([point.lon(), point.lat()]);

        self.features
            .locate_in_envelope_intersecting(&query_env)
            .any(|entry| entry.polygon.contains(&query))
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.size() == 0
    }
}

/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
