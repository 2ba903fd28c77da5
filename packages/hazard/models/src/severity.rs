//! Severity categories and the max/center ring reduction.
//!
//! A [`SeverityCategory`] carries a weight that orders categories within a
//! single hazard layer: `0` is "no hazard", positive weights are real
//! hazard levels, and `-1` marks a pixel that was present but not
//! recognised. A [`RingReducer`] folds per-point classifications into a
//! [`RingResult`].

use serde::{Deserialize, Serialize};

/// Description used for pixels whose color is present but not in the
/// layer's table.
pub const UNCLASSIFIED_DESCRIPTION: &str = "情報なし";

/// An RGB color used as a lookup key (alpha is ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColorKey {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl ColorKey {
    /// Creates a key from its three channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Drops the alpha channel of an RGBA pixel.
    #[must_use]
    pub const fn from_rgba(rgba: [u8; 4]) -> Self {
        Self {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
        }
    }
}

impl From<[u8; 3]> for ColorKey {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

/// A hazard level with its display text and ordering weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCategory {
    /// Human-readable description (e.g. "3m以上5m未満").
    pub description: String,
    /// Ordering key within one layer. `0` = no hazard, `< 0` = unclassified.
    pub weight: f64,
}

impl SeverityCategory {
    /// Creates a category.
    #[must_use]
    pub fn new(description: impl Into<String>, weight: f64) -> Self {
        Self {
            description: description.into(),
            weight,
        }
    }

    /// A weight-0 "no hazard" category with the given description.
    #[must_use]
    pub fn no_risk(description: impl Into<String>) -> Self {
        Self::new(description, 0.0)
    }

    /// The weight `-1` category for present-but-unmapped pixels.
    #[must_use]
    pub fn unclassified() -> Self {
        Self::new(UNCLASSIFIED_DESCRIPTION, -1.0)
    }

    /// Whether this category is the unclassified marker.
    #[must_use]
    pub fn is_unclassified(&self) -> bool {
        self.weight < 0.0
    }
}

/// The reduction of one hazard layer over a sampling ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingResult {
    /// Most severe category seen anywhere on the ring.
    pub max: SeverityCategory,
    /// Category at the query point itself (ring index 0).
    pub center: SeverityCategory,
}

impl RingResult {
    /// Both `max` and `center` set to the same category.
    #[must_use]
    pub fn uniform(category: SeverityCategory) -> Self {
        Self {
            max: category.clone(),
            center: category,
        }
    }

    /// Merges a fallback source's result into this one.
    ///
    /// The fallback only replaces a value when its weight is strictly
    /// greater, so the merged weights never drop below `self`'s.
    #[must_use]
    pub fn merge_fallback(self, fallback: Self) -> Self {
        let max = if fallback.max.weight > self.max.weight {
            fallback.max
        } else {
            self.max
        };
        let center = if fallback.center.weight > self.center.weight {
            fallback.center
        } else {
            self.center
        };
        Self { max, center }
    }
}

/// Folds per-point classifications into a [`RingResult`].
///
/// Points must be observed with their ring index; index 0 is the center.
/// A later point only replaces the running maximum when its weight is
/// strictly greater, so ties keep the first-seen category.
#[derive(Debug, Clone)]
pub struct RingReducer {
    no_risk: SeverityCategory,
    max: SeverityCategory,
    center: Option<SeverityCategory>,
}

impl RingReducer {
    /// Starts a reduction whose maximum and center default to `no_risk`.
    #[must_use]
    pub fn new(no_risk: SeverityCategory) -> Self {
        Self {
            max: no_risk.clone(),
            no_risk,
            center: None,
        }
    }

    /// Records the classification of ring point `index`.
    pub fn observe(&mut self, index: usize, category: &SeverityCategory) {
        if index == 0 {
            self.center = Some(category.clone());
        }
        if category.weight > self.max.weight {
            self.max = category.clone();
        }
    }

    /// Current maximum weight.
    #[must_use]
    pub const fn max_weight(&self) -> f64 {
        self.max.weight
    }

    /// Finishes the reduction. A center that was never observed falls back
    /// to the no-risk category.
    #[must_use]
    pub fn finish(self) -> RingResult {
        RingResult {
            max: self.max,
            center: self.center.unwrap_or(self.no_risk),
        }
    }
}
