#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point probabilities of strong ground motion.
//!
//! [`ProbabilityApi`] looks up the 30-year exceedance probabilities at one
//! point; [`sample_probabilities`] fans it out over a sampling ring and
//! keeps the maximum and the center value for each threshold.

pub mod jshis;
pub mod sample;

use async_trait::async_trait;
use hazard_map_hazard_models::GeoPoint;
use serde::{Deserialize, Serialize};

pub use jshis::{DEFAULT_JSHIS_URL, JshisClient};
pub use sample::{ProbabilityPair, ProbabilitySample, sample_probabilities};

/// Errors from a single probability lookup.
///
/// [`sample_probabilities`] logs these and treats the point as having no
/// data.
#[derive(Debug, thiserror::Error)]
pub enum ProbabilityError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what was wrong.
        message: String,
    },
}

/// Probabilities (in `[0, 1]`) at one point. `None` means the source had
/// no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceedanceProbabilities {
    /// Intensity 5-upper or stronger within 30 years.
    pub p50: Option<f64>,
    /// Intensity 6-upper or stronger within 30 years.
    pub p60: Option<f64>,
}

/// Looks up exceedance probabilities at a point.
#[async_trait]
pub trait ProbabilityApi: Send + Sync {
    /// Probabilities at `point`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbabilityError`] if the lookup fails.
    async fn exceedance(&self, point: GeoPoint)
    -> Result<ExceedanceProbabilities, ProbabilityError>;
}
