//! Single-tile retrieval.
//!
//! [`TileFetcher`] is the seam between the sampling code and the network.
//! Implementations never fail loudly: any transport error, non-2xx status,
//! or decode failure becomes `None` plus a warning in the log.

use std::time::Duration;

use async_trait::async_trait;

use crate::TileError;

/// A decoded tile with per-pixel RGBA access.
pub type TileImage = image::RgbaImage;

/// Retrieves one raster tile.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Fetches and decodes the tile at `url`, giving up after `timeout`.
    ///
    /// Returns `None` on any failure.
    async fn fetch_tile(&self, url: &str, timeout: Duration) -> Option<TileImage>;
}

/// [`TileFetcher`] backed by plain HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
}

impl HttpTileFetcher {
    /// Creates a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, TileError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Creates a fetcher that shares an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn try_fetch(&self, url: &str, timeout: Duration) -> Result<TileImage, TileError> {
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        decode_tile(&bytes)
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch_tile(&self, url: &str, timeout: Duration) -> Option<TileImage> {
        match self.try_fetch(url, timeout).await {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Failed to fetch tile {url}: {e}");
                None
            }
        }
    }
}

/// Decodes an encoded image (PNG in practice) into RGBA pixels.
///
/// # Errors
///
/// Returns [`TileError::Decode`] if the bytes are not a supported image.
pub fn decode_tile(bytes: &[u8]) -> Result<TileImage, TileError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn decodes_png_to_rgba() {
        let mut source = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        source.put_pixel(1, 2, Rgba([255, 183, 183, 255]));

        let mut bytes = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_tile(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(1, 2), &Rgba([255, 183, 183, 255]));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = decode_tile(b"<html>not found</html>").unwrap_err();
        assert!(matches!(err, TileError::Decode(_)));
    }
}
