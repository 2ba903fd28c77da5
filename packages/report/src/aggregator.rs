//! The multi-hazard facade.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use hazard_map_hazard_models::{GeoPoint, HazardCategory, Precision, RingResult};
use hazard_map_probability::{JshisClient, ProbabilityApi, ProbabilitySample, sample_probabilities};
use hazard_map_raster::{LayerRegistry, sample_boundary_layer, sample_layer};
use hazard_map_spatial::query::absent;
use hazard_map_spatial::{
    DatasetLoader, DirectoryDatasetLoader, IndexCache, RegionResolver, global_index_cache,
    query_ring,
};
use hazard_map_tiles::ring::{SEARCH_RADIUS_M, ring_points};
use hazard_map_tiles::{HttpTileFetcher, TileCoordinator, TileFetcher, ring};

use crate::config::AggregatorConfig;
use crate::{HazardEntry, HazardReport, LandslideZones, ReportError};

pub const DEBRIS_FLOW_LAYER: &str = "debris_flow";
pub const STEEP_SLOPE_LAYER: &str = "steep_slope";
pub const LANDSLIDE_LAYER: &str = "landslide";
pub const FLOOD_FLOW_LAYER: &str = "kaokutoukai_hanran";

/// Collaborators for the large-fill-land lookup.
#[derive(Clone)]
pub struct FillLandSource {
    pub resolver: Arc<dyn RegionResolver>,
    pub loader: Arc<dyn DatasetLoader>,
    pub cache: Arc<dyn IndexCache>,
}

/// Samples every hazard category for a location.
///
/// Holds no per-call state; one aggregator can serve concurrent calls.
#[derive(Clone)]
pub struct HazardAggregator {
    registry: Arc<LayerRegistry>,
    tiles: TileCoordinator,
    probability: Arc<dyn ProbabilityApi>,
    fill_land: Option<FillLandSource>,
}

impl HazardAggregator {
    #[must_use]
    pub fn new(
        registry: Arc<LayerRegistry>,
        fetcher: Arc<dyn TileFetcher>,
        probability: Arc<dyn ProbabilityApi>,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            registry,
            tiles: TileCoordinator::new(fetcher, config.fetch),
            probability,
            fill_land: None,
        }
    }

    /// Enables the large-fill-land lookup. Without it that category always
    /// reports "no information".
    #[must_use]
    pub fn with_fill_land(mut self, source: FillLandSource) -> Self {
        self.fill_land = Some(source);
        self
    }

    /// Builds an aggregator that talks to the public tile and probability
    /// services, using the embedded layer registry.
    ///
    /// Large fill land is enabled when `config.fill_land_dir` is set and a
    /// `resolver` is given; its indexes go into the process-wide cache.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &AggregatorConfig,
        resolver: Option<Arc<dyn RegionResolver>>,
    ) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder().build()?;
        let fetcher = Arc::new(HttpTileFetcher::with_client(client.clone()));
        let probability = Arc::new(JshisClient::new(
            client,
            config.probability_url.clone(),
            config.fetch.fetch_timeout,
        ));

        let aggregator = Self::new(
            Arc::new(LayerRegistry::embedded().clone()),
            fetcher,
            probability,
            config,
        );

        Ok(match (&config.fill_land_dir, resolver) {
            (Some(dir), Some(resolver)) => aggregator.with_fill_land(FillLandSource {
                resolver,
                loader: Arc::new(DirectoryDatasetLoader::new(dir)),
                cache: global_index_cache(),
            }),
            (Some(dir), None) => {
                log::warn!(
                    "Fill land directory {} configured without a region resolver, disabling large fill land",
                    dir.display()
                );
                aggregator
            }
            (None, _) => aggregator,
        })
    }

    /// Samples the requested categories around `point`.
    ///
    /// `requested = None` means every category. Names that are not
    /// categories are skipped, logged, and listed in
    /// [`HazardReport::ignored_categories`].
    ///
    /// # Errors
    ///
    /// * [`ReportError::InvalidLocation`] if `point` is outside the tile
    ///   projection
    /// * [`ReportError::Registry`] if the registry lacks a layer this
    ///   aggregator samples
    pub async fn aggregate(
        &self,
        point: GeoPoint,
        requested: Option<&[String]>,
        precision: Precision,
    ) -> Result<HazardReport, ReportError> {
        if !point.is_projectable() {
            return Err(ReportError::InvalidLocation {
                lat: point.lat(),
                lon: point.lon(),
            });
        }

        let (categories, ignored_categories) = select_categories(requested);
        log::debug!(
            "Aggregating {} categories at ({}, {}) with {precision} precision",
            categories.len(),
            point.lat(),
            point.lon()
        );

        let sampled = join_all(categories.into_iter().map(|category| async move {
            self.sample(category, point, precision)
                .await
                .map(|entry| (category, entry))
        }))
        .await;

        Ok(HazardReport {
            location: point,
            precision,
            entries: sampled.into_iter().collect::<Result<BTreeMap<_, _>, _>>()?,
            ignored_categories,
        })
    }

    async fn sample(
        &self,
        category: HazardCategory,
        point: GeoPoint,
        precision: Precision,
    ) -> Result<HazardEntry, ReportError> {
        Ok(match category {
            HazardCategory::Earthquake => {
                HazardEntry::Probability(self.sample_probability(point, precision).await)
            }
            HazardCategory::Flood
            | HazardCategory::FloodKeizoku
            | HazardCategory::KaokutoukaiKagan
            | HazardCategory::Tsunami
            | HazardCategory::HighTide => {
                HazardEntry::Severity(self.sample_raster(category.as_ref(), point, precision).await?)
            }
            HazardCategory::KaokutoukaiHanran => {
                let layer = self.registry.boundary(FLOOD_FLOW_LAYER)?;
                HazardEntry::Severity(
                    sample_boundary_layer(point, &layer, precision, &self.tiles).await,
                )
            }
            HazardCategory::Landslide => {
                let (debris_flow, steep_slope, landslide) = tokio::join!(
                    self.sample_raster(DEBRIS_FLOW_LAYER, point, precision),
                    self.sample_raster(STEEP_SLOPE_LAYER, point, precision),
                    self.sample_raster(LANDSLIDE_LAYER, point, precision),
                );
                HazardEntry::Landslide(LandslideZones {
                    debris_flow: debris_flow?,
                    steep_slope: steep_slope?,
                    landslide: landslide?,
                })
            }
            HazardCategory::LargeFillLand => {
                HazardEntry::Severity(self.sample_fill_land(point, precision).await)
            }
        })
    }

    async fn sample_raster(
        &self,
        layer_id: &str,
        point: GeoPoint,
        precision: Precision,
    ) -> Result<RingResult, ReportError> {
        let layer = self.registry.raster(layer_id)?;
        Ok(sample_layer(point, &layer, precision, &self.tiles).await)
    }

    async fn sample_probability(&self, point: GeoPoint, precision: Precision) -> ProbabilitySample {
        let ring = ring(point, SEARCH_RADIUS_M, ring_points(precision));
        sample_probabilities(self.probability.as_ref(), &ring, self.tiles.options()).await
    }

    async fn sample_fill_land(&self, point: GeoPoint, precision: Precision) -> RingResult {
        let Some(source) = &self.fill_land else {
            log::debug!("Large fill land is not configured");
            return RingResult::uniform(absent());
        };
        let ring = ring(point, SEARCH_RADIUS_M, ring_points(precision));
        query_ring(
            &ring,
            source.resolver.as_ref(),
            source.loader.as_ref(),
            source.cache.as_ref(),
            self.tiles.options(),
        )
        .await
    }
}

fn select_categories(requested: Option<&[String]>) -> (BTreeSet<HazardCategory>, Vec<String>) {
    let Some(requested) = requested else {
        return (HazardCategory::all().iter().copied().collect(), Vec::new());
    };

    let mut categories = BTreeSet::new();
    let mut ignored = Vec::new();
    for name in requested {
        match name.trim().parse::<HazardCategory>() {
            Ok(category) => {
                categories.insert(category);
            }
            Err(_) => {
                log::warn!("Ignoring unknown hazard category {name:?}");
                ignored.push(name.clone());
            }
        }
    }
    (categories, ignored)
}
