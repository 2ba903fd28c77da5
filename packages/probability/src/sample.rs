//! Max/center reduction of exceedance probabilities over a ring.

use futures::stream::{self, StreamExt as _};
use hazard_map_hazard_models::FetchOptions;
use hazard_map_tiles::SampleRing;
use serde::{Deserialize, Serialize};

use crate::{ExceedanceProbabilities, ProbabilityApi};

/// Largest value on the ring and the value at the query point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityPair {
    pub max: Option<f64>,
    pub center: Option<f64>,
}

impl ProbabilityPair {
    fn observe(&mut self, index: usize, value: Option<f64>) {
        let Some(value) = value else {
            return;
        };
        if index == 0 {
            self.center = Some(value);
        }
        if self.max.is_none_or(|max| value > max) {
            self.max = Some(value);
        }
    }
}

/// Both thresholds reduced over a ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilitySample {
    /// Intensity 5-upper or stronger within 30 years.
    pub p50: ProbabilityPair,
    /// Intensity 6-upper or stronger within 30 years.
    pub p60: ProbabilityPair,
}

/// Queries `api` at every ring point with bounded parallelism.
///
/// Failed or timed-out points contribute nothing. A threshold with no
/// value at any point has `max == None`; `center` is `None` whenever the
/// center point produced no value.
pub async fn sample_probabilities(
    api: &dyn ProbabilityApi,
    ring: &SampleRing,
    options: &FetchOptions,
) -> ProbabilitySample {
    let collect_timeout = options.collect_timeout;

    let results: Vec<(usize, ExceedanceProbabilities)> = stream::iter(ring.iter().map(
        |(index, point)| async move {
            match tokio::time::timeout(collect_timeout, api.exceedance(point)).await {
                Ok(Ok(probs)) => (index, probs),
                Ok(Err(e)) => {
                    log::warn!("Probability lookup failed for ring point {index}: {e}");
                    (index, ExceedanceProbabilities::default())
                }
                Err(_) => {
                    log::warn!(
                        "Timed out collecting probability for ring point {index} after {collect_timeout:?}"
                    );
                    (index, ExceedanceProbabilities::default())
                }
            }
        },
    ))
    .buffer_unordered(options.max_workers.max(1))
    .collect()
    .await;

    let mut sample = ProbabilitySample::default();
    for (index, probs) in results {
        sample.p50.observe(index, probs.p50);
        sample.p60.observe(index, probs.p60);
    }
    sample
}
