//! Compile-time registry of raster hazard layers.
//!
//! Each layer is defined in a TOML file under `layers/` and each legend in
//! a TOML file under `color_tables/`. The registry embeds both at compile
//! time, resolves table and fallback references, and exposes the result
//! via [`LayerRegistry::embedded`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use hazard_map_hazard_models::{ColorKey, SeverityCategory};
use serde::Deserialize;

use crate::RegistryError;
use crate::classify::ColorTable;

/// A layer whose pixels are classified through a color table.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardLayerSpec {
    /// Unique identifier (e.g. `"flood"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Tile URL template with `{z}`, `{x}`, `{y}` placeholders.
    pub url_template: String,
    /// Zoom level sampled.
    pub zoom: u8,
    /// Legend used to classify pixels.
    pub color_table: Arc<ColorTable>,
    /// Weight-0 category for transparent pixels and missing tiles.
    pub no_risk: SeverityCategory,
    /// Secondary source queried when this layer finds nothing.
    pub fallback: Option<Arc<Self>>,
}

/// A layer that draws risk zones as solid-color outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayerSpec {
    pub id: String,
    pub name: String,
    pub url_template: String,
    pub zoom: u8,
    /// Exact RGB of the outline stroke.
    pub outline_color: ColorKey,
    /// Reported when a sample point lies inside a zone.
    pub present: SeverityCategory,
    /// Reported otherwise.
    pub absent: SeverityCategory,
}

/// Layer definition as written in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    pub zoom: u8,
    pub no_risk_description: String,
    pub source: SourceConfig,
}

/// How a layer encodes hazards, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Filled pixels looked up in a color table.
    ColorTable {
        /// Id of a file under `color_tables/`.
        color_table: String,
        /// Id of another color-table layer to consult when this one is empty.
        #[serde(default)]
        fallback: Option<String>,
    },
    /// Zone outlines on a transparent tile.
    Outline {
        outline_color: [u8; 3],
        present_description: String,
    },
}

/// Legend definition as written in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorTableConfig {
    pub id: String,
    /// Description for opaque pixels that match no entry.
    #[serde(default)]
    pub any_color: Option<String>,
    pub entries: Vec<ColorEntryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorEntryConfig {
    pub rgb: [u8; 3],
    pub description: String,
    pub weight: f64,
}

// ── Compile-time embedded TOML files ────────────────────────────────

const COLOR_TABLE_TOMLS: &[(&str, &str)] = &[
    ("water_depth", include_str!("../color_tables/water_depth.toml")),
    (
        "flood_duration",
        include_str!("../color_tables/flood_duration.toml"),
    ),
    ("debris_flow", include_str!("../color_tables/debris_flow.toml")),
    ("steep_slope", include_str!("../color_tables/steep_slope.toml")),
    ("landslide", include_str!("../color_tables/landslide.toml")),
    ("bank_erosion", include_str!("../color_tables/bank_erosion.toml")),
];

const LAYER_TOMLS: &[(&str, &str)] = &[
    ("flood", include_str!("../layers/flood.toml")),
    ("flood_l1", include_str!("../layers/flood_l1.toml")),
    ("flood_keizoku", include_str!("../layers/flood_keizoku.toml")),
    ("tsunami", include_str!("../layers/tsunami.toml")),
    ("high_tide", include_str!("../layers/high_tide.toml")),
    ("debris_flow", include_str!("../layers/debris_flow.toml")),
    ("steep_slope", include_str!("../layers/steep_slope.toml")),
    ("landslide", include_str!("../layers/landslide.toml")),
    (
        "kaokutoukai_kagan",
        include_str!("../layers/kaokutoukai_kagan.toml"),
    ),
    (
        "kaokutoukai_hanran",
        include_str!("../layers/kaokutoukai_hanran.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_LAYER_COUNT: usize = 10;

static EMBEDDED: LazyLock<LayerRegistry> = LazyLock::new(|| {
    LayerRegistry::from_toml(COLOR_TABLE_TOMLS, LAYER_TOMLS)
        .unwrap_or_else(|e| panic!("Failed to load embedded layer registry: {e}"))
});

/// Resolved layers, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    raster: BTreeMap<String, Arc<HazardLayerSpec>>,
    boundary: BTreeMap<String, Arc<BoundaryLayerSpec>>,
}

impl LayerRegistry {
    /// The registry built from the TOML files embedded in this crate.
    ///
    /// # Panics
    ///
    /// Panics if any embedded TOML file is malformed or references an
    /// unknown table or layer (the files are compiled in, so this fails on
    /// first use in every build).
    #[must_use]
    pub fn embedded() -> &'static Self {
        &EMBEDDED
    }

    /// Parses and resolves `(name, toml)` pairs of color tables and layers.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::Parse`] if a document is not valid for its type
    /// * [`RegistryError::DuplicateId`] if two tables or two layers share an id
    /// * [`RegistryError::DuplicateColor`] if a table lists an RGB twice
    /// * [`RegistryError::UnknownColorTable`] if a layer names a missing table
    /// * [`RegistryError::InvalidFallback`] if a fallback is missing, is an
    ///   outline layer, or has a fallback of its own
    pub fn from_toml(
        color_tables: &[(&str, &str)],
        layers: &[(&str, &str)],
    ) -> Result<Self, RegistryError> {
        let mut tables = BTreeMap::new();
        for (name, text) in color_tables {
            let config: ColorTableConfig = parse(name, text)?;
            let table = build_table(config)?;
            let id = table.id().to_string();
            if tables.insert(id.clone(), Arc::new(table)).is_some() {
                return Err(RegistryError::DuplicateId(id));
            }
        }

        let mut configs = Vec::with_capacity(layers.len());
        let mut seen = BTreeSet::new();
        for (name, text) in layers {
            let config: LayerConfig = parse(name, text)?;
            if !seen.insert(config.id.clone()) {
                return Err(RegistryError::DuplicateId(config.id));
            }
            configs.push(config);
        }

        let mut registry = Self::default();

        // Layers without a fallback first, so fallbacks can be resolved
        // against them in the second pass.
        let (chained, plain): (Vec<_>, Vec<_>) = configs.into_iter().partition(|c| {
            matches!(
                c.source,
                SourceConfig::ColorTable {
                    fallback: Some(_),
                    ..
                }
            )
        });

        for config in plain {
            registry.insert(config, &tables, None)?;
        }
        for config in chained {
            let SourceConfig::ColorTable {
                fallback: Some(fallback_id),
                ..
            } = &config.source
            else {
                continue;
            };
            let fallback = registry
                .raster
                .get(fallback_id)
                .filter(|layer| layer.fallback.is_none())
                .cloned()
                .ok_or_else(|| RegistryError::InvalidFallback {
                    layer: config.id.clone(),
                    fallback: fallback_id.clone(),
                })?;
            registry.insert(config, &tables, Some(fallback))?;
        }

        Ok(registry)
    }

    fn insert(
        &mut self,
        config: LayerConfig,
        tables: &BTreeMap<String, Arc<ColorTable>>,
        fallback: Option<Arc<HazardLayerSpec>>,
    ) -> Result<(), RegistryError> {
        let no_risk = SeverityCategory::no_risk(config.no_risk_description);
        match config.source {
            SourceConfig::ColorTable { color_table, .. } => {
                let table = tables.get(&color_table).cloned().ok_or_else(|| {
                    RegistryError::UnknownColorTable {
                        layer: config.id.clone(),
                        table: color_table.clone(),
                    }
                })?;
                self.raster.insert(
                    config.id.clone(),
                    Arc::new(HazardLayerSpec {
                        id: config.id,
                        name: config.name,
                        url_template: config.url,
                        zoom: config.zoom,
                        color_table: table,
                        no_risk,
                        fallback,
                    }),
                );
            }
            SourceConfig::Outline {
                outline_color,
                present_description,
            } => {
                self.boundary.insert(
                    config.id.clone(),
                    Arc::new(BoundaryLayerSpec {
                        id: config.id,
                        name: config.name,
                        url_template: config.url,
                        zoom: config.zoom,
                        outline_color: outline_color.into(),
                        present: SeverityCategory::new(present_description, 1.0),
                        absent: no_risk,
                    }),
                );
            }
        }
        Ok(())
    }

    /// Looks up a color-table layer.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownLayer`] if no such layer exists.
    pub fn raster(&self, id: &str) -> Result<Arc<HazardLayerSpec>, RegistryError> {
        self.raster
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownLayer(id.to_string()))
    }

    /// Looks up an outline layer.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownLayer`] if no such layer exists.
    pub fn boundary(&self, id: &str) -> Result<Arc<BoundaryLayerSpec>, RegistryError> {
        self.boundary
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownLayer(id.to_string()))
    }

    /// Number of layers of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raster.len() + self.boundary.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raster.is_empty() && self.boundary.is_empty()
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, text: &str) -> Result<T, RegistryError> {
    toml::de::from_str(text).map_err(|source| RegistryError::Parse {
        name: name.to_string(),
        source,
    })
}

fn build_table(config: ColorTableConfig) -> Result<ColorTable, RegistryError> {
    let mut entries = BTreeMap::new();
    for entry in config.entries {
        let key = ColorKey::from(entry.rgb);
        let category = SeverityCategory::new(entry.description, entry.weight);
        if entries.insert(key, category).is_some() {
            return Err(RegistryError::DuplicateColor {
                table: config.id,
                rgb: entry.rgb,
            });
        }
    }

    let table = ColorTable::new(config.id, entries);
    Ok(match config.any_color {
        Some(description) => table.with_any_color(SeverityCategory::new(description, 1.0)),
        None => table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_layers() {
        assert_eq!(LayerRegistry::embedded().len(), EXPECTED_LAYER_COUNT);
    }

    #[test]
    fn layer_ids_match_file_names() {
        for (name, text) in LAYER_TOMLS {
            let config: LayerConfig = parse(name, text).unwrap();
            assert_eq!(&config.id, name);
        }
        for (name, text) in COLOR_TABLE_TOMLS {
            let config: ColorTableConfig = parse(name, text).unwrap();
            assert_eq!(&config.id, name);
        }
    }

    #[test]
    fn urls_are_tile_templates() {
        for (name, text) in LAYER_TOMLS {
            let config: LayerConfig = parse(name, text).unwrap();
            assert!(config.url.starts_with("https://"), "{name}");
            for placeholder in ["{z}", "{x}", "{y}"] {
                assert!(config.url.contains(placeholder), "{name} lacks {placeholder}");
            }
        }
    }

    #[test]
    fn table_weights_are_positive() {
        for (name, text) in COLOR_TABLE_TOMLS {
            let config: ColorTableConfig = parse(name, text).unwrap();
            for entry in &config.entries {
                assert!(entry.weight > 0.0, "{name}: {}", entry.description);
            }
        }
    }

    #[test]
    fn flood_falls_back_to_planned_scale() {
        let flood = LayerRegistry::embedded().raster("flood").unwrap();
        let fallback = flood.fallback.as_ref().unwrap();
        assert_eq!(fallback.id, "flood_l1");
        assert!(Arc::ptr_eq(&flood.color_table, &fallback.color_table));
        assert_eq!(flood.no_risk.description, "浸水なし");
    }

    #[test]
    fn bank_erosion_uses_any_color() {
        let kagan = LayerRegistry::embedded()
            .raster("kaokutoukai_kagan")
            .unwrap();
        assert!(kagan.color_table.is_empty());
        let got = crate::classify::classify([10, 20, 30, 255], &kagan.color_table, &kagan.no_risk);
        assert_eq!(got.description, "該当あり");
    }

    #[test]
    fn hanran_is_an_outline_layer() {
        let registry = LayerRegistry::embedded();
        let hanran = registry.boundary("kaokutoukai_hanran").unwrap();
        assert_eq!(hanran.absent.description, "判定なし");
        assert!(matches!(
            registry.raster("kaokutoukai_hanran"),
            Err(RegistryError::UnknownLayer(_))
        ));
    }

    #[test]
    fn rejects_unknown_table() {
        let layer = r#"
            id = "x"
            name = "x"
            url = "https://t/{z}/{x}/{y}.png"
            zoom = 16
            no_risk_description = "none"
            [source]
            type = "color_table"
            color_table = "missing"
        "#;
        let err = LayerRegistry::from_toml(&[], &[("x", layer)]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownColorTable { .. }));
    }

    #[test]
    fn rejects_chained_fallbacks() {
        let table = r#"
            id = "t"
            entries = []
        "#;
        let layer = |id: &str, fallback: &str| {
            format!(
                r#"
                id = "{id}"
                name = "{id}"
                url = "https://t/{{z}}/{{x}}/{{y}}.png"
                zoom = 16
                no_risk_description = "none"
                [source]
                type = "color_table"
                color_table = "t"
                fallback = "{fallback}"
                "#
            )
        };
        let a = layer("a", "b");
        let b = layer("b", "a");
        let err = LayerRegistry::from_toml(&[("t", table)], &[("a", &a), ("b", &b)]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidFallback { .. }));
    }

    #[test]
    fn rejects_duplicate_colors() {
        let table = r#"
            id = "t"
            [[entries]]
            rgb = [1, 2, 3]
            description = "a"
            weight = 1.0
            [[entries]]
            rgb = [1, 2, 3]
            description = "b"
            weight = 2.0
        "#;
        let err = LayerRegistry::from_toml(&[("t", table)], &[]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateColor { rgb: [1, 2, 3], .. }));
    }
}
