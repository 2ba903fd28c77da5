//! Deduplicated, bounded-parallel tile retrieval.
//!
//! Ring points that share a tile produce one request. Requests run with at
//! most [`FetchOptions::max_workers`] in flight; each request carries the
//! network timeout, and the wait for its result is separately capped by
//! [`FetchOptions::collect_timeout`] so one hung fetch cannot hold up the
//! others.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt as _};
use hazard_map_hazard_models::{FetchOptions, TileAddress};

use crate::fetch::{TileFetcher, TileImage};

/// Fetch results keyed by tile. Every requested address is present; failed
/// fetches map to `None`.
pub type TileSet = BTreeMap<TileAddress, Option<TileImage>>;

/// Dispatches tile fetches for one aggregation call.
#[derive(Clone)]
pub struct TileCoordinator {
    fetcher: Arc<dyn TileFetcher>,
    options: FetchOptions,
}

impl TileCoordinator {
    /// Creates a coordinator around a fetcher.
    #[must_use]
    pub fn new(fetcher: Arc<dyn TileFetcher>, options: FetchOptions) -> Self {
        Self { fetcher, options }
    }

    /// The timeouts and worker limit in use.
    #[must_use]
    pub const fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetches every distinct address in `addresses` from `url_template`.
    pub async fn fetch_many<I>(&self, addresses: I, url_template: &str) -> TileSet
    where
        I: IntoIterator<Item = TileAddress>,
    {
        let unique: BTreeSet<TileAddress> = addresses.into_iter().collect();
        let mut tiles: TileSet = unique.iter().map(|address| (*address, None)).collect();

        let fetcher = &self.fetcher;
        let options = self.options;

        let fetched: Vec<(TileAddress, Option<TileImage>)> =
            stream::iter(unique.into_iter().map(|address| {
                let url = address.url(url_template);
                async move {
                    let result = tokio::time::timeout(
                        options.collect_timeout,
                        fetcher.fetch_tile(&url, options.fetch_timeout),
                    )
                    .await;
                    match result {
                        Ok(image) => (address, image),
                        Err(_) => {
                            log::warn!(
                                "Timed out collecting tile {address} after {:?}",
                                options.collect_timeout
                            );
                            (address, None)
                        }
                    }
                }
            }))
            .buffer_unordered(options.max_workers.max(1))
            .collect()
            .await;

        for (address, image) in fetched {
            tiles.insert(address, image);
        }

        log::debug!(
            "Fetched {}/{} tiles from {url_template}",
            tiles.values().filter(|image| image.is_some()).count(),
            tiles.len()
        );

        tiles
    }

    /// Fetches a single tile with the same timeouts as [`Self::fetch_many`].
    pub async fn fetch_one(&self, address: TileAddress, url_template: &str) -> Option<TileImage> {
        self.fetch_many([address], url_template)
            .await
            .remove(&address)
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};

    use super::*;

    /// Serves a 1x1 tile for every URL except those containing `fail`,
    /// sleeping first on URLs containing `slow` and hanging on `hang_url`.
    #[derive(Default)]
    struct FakeFetcher {
        hang_url: Option<&'static str>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TileFetcher for FakeFetcher {
        async fn fetch_tile(&self, url: &str, _timeout: Duration) -> Option<TileImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = if self.hang_url == Some(url) {
                30_000
            } else if url.contains("slow") {
                2_000
            } else {
                20
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if url.contains("fail") {
                None
            } else {
                Some(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255])))
            }
        }
    }

    fn tile(x: u32) -> TileAddress {
        TileAddress { zoom: 17, x, y: 7 }
    }

    fn options(max_workers: usize) -> FetchOptions {
        FetchOptions {
            fetch_timeout: Duration::from_millis(30),
            collect_timeout: Duration::from_millis(200),
            max_workers,
        }
    }

    #[tokio::test]
    async fn deduplicates_addresses() {
        let fetcher = Arc::new(FakeFetcher::default());
        let coordinator = TileCoordinator::new(fetcher.clone(), options(4));

        let tiles = coordinator
            .fetch_many([tile(1), tile(1), tile(2), tile(1), tile(2)], "t/{z}/{x}/{y}")
            .await;

        assert_eq!(tiles.len(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(tiles.values().all(Option::is_some));
    }

    #[tokio::test]
    async fn failed_fetches_are_present_as_none() {
        let coordinator = TileCoordinator::new(Arc::new(FakeFetcher::default()), options(4));

        let tiles = coordinator.fetch_many([tile(1), tile(2)], "fail/{x}").await;

        assert_eq!(tiles.len(), 2);
        assert!(tiles.contains_key(&tile(1)));
        assert!(tiles.values().all(Option::is_none));
    }

    #[tokio::test]
    async fn collection_timeout_drops_only_the_hung_fetch() {
        let fetcher = Arc::new(FakeFetcher {
            hang_url: Some("ok/1"),
            ..FakeFetcher::default()
        });
        let options = options(2);
        let coordinator = TileCoordinator::new(fetcher, options);

        let started = tokio::time::Instant::now();
        let tiles = coordinator.fetch_many((1..=4).map(tile), "ok/{x}").await;
        let elapsed = started.elapsed();

        assert_eq!(tiles.len(), 4);
        assert!(tiles[&tile(1)].is_none());
        assert!((2..=4).all(|x| tiles[&tile(x)].is_some()));
        assert!(elapsed >= options.collect_timeout);
        assert!(elapsed < options.collect_timeout * 3, "took {elapsed:?}");
    }

    #[tokio::test]
    async fn respects_worker_limit() {
        let fetcher = Arc::new(FakeFetcher::default());
        let coordinator = TileCoordinator::new(fetcher.clone(), options(2));

        let tiles = coordinator.fetch_many((0..8).map(tile), "ok/{x}").await;

        assert_eq!(tiles.len(), 8);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 2);
    }
}
