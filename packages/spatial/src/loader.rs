//! Per-region dataset retrieval.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use geojson::{FeatureCollection, GeoJson};

use crate::SpatialError;

/// File name prefix of the MLIT large-fill-land datasets
/// (`A54-23_13.geojson` for Tokyo).
pub const FILL_LAND_FILE_PREFIX: &str = "A54-23_";

/// Loads the polygon dataset for one region.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// Loads and parses the dataset for `region`.
    ///
    /// # Errors
    ///
    /// Returns a [`SpatialError`] if the dataset is missing or malformed.
    /// Callers treat any error as "no information" for that region.
    async fn load(&self, region: &str) -> Result<FeatureCollection, SpatialError>;
}

/// Reads `{dir}/{prefix}{region}.geojson` from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryDatasetLoader {
    dir: PathBuf,
    file_prefix: String,
}

impl DirectoryDatasetLoader {
    /// A loader for the large-fill-land files in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_prefix(dir, FILL_LAND_FILE_PREFIX)
    }

    #[must_use]
    pub fn with_prefix(dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    /// Path of the dataset for `region`.
    #[must_use]
    pub fn path_for(&self, region: &str) -> PathBuf {
        self.dir.join(format!("{}{region}.geojson", self.file_prefix))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DatasetLoader for DirectoryDatasetLoader {
    async fn load(&self, region: &str) -> Result<FeatureCollection, SpatialError> {
        let path = self.path_for(region);
        log::debug!("Loading dataset for region {region} from {}", path.display());

        let text = tokio::fs::read_to_string(&path).await?;
        tokio::task::spawn_blocking(move || -> Result<FeatureCollection, SpatialError> {
            let geojson: GeoJson = text.parse()?;
            Ok(FeatureCollection::try_from(geojson)?)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::FILL_LAND;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hazard_map_spatial_{name}_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn builds_prefixed_paths() {
        let loader = DirectoryDatasetLoader::new("/data/fill");
        assert_eq!(
            loader.path_for("13"),
            PathBuf::from("/data/fill/A54-23_13.geojson")
        );
    }

    #[tokio::test]
    async fn loads_feature_collection_from_disk() {
        let dir = temp_dir("load");
        std::fs::write(dir.join("A54-23_13.geojson"), FILL_LAND).unwrap();

        let collection = DirectoryDatasetLoader::new(&dir).load("13").await.unwrap();
        assert_eq!(collection.features.len(), 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = temp_dir("missing");
        let err = DirectoryDatasetLoader::new(&dir).load("47").await.unwrap_err();
        assert!(matches!(err, SpatialError::Io(_)));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn malformed_file_is_a_geojson_error() {
        let dir = temp_dir("malformed");
        std::fs::write(dir.join("A54-23_01.geojson"), "{ not geojson").unwrap();

        let err = DirectoryDatasetLoader::new(&dir).load("01").await.unwrap_err();
        assert!(matches!(err, SpatialError::GeoJson(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
