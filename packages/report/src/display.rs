//! End-user text for a [`HazardReport`].
//!
//! Each category becomes one or more labelled lines. When the maximum and
//! the center differ from the "no data" text, both are shown:
//!
//! ```text
//!  周辺100mの最大: 0.5m以上3m未満
//!  中心点: 0.5m未満
//! ```

use hazard_map_hazard_models::{HazardCategory, RingResult};
use hazard_map_probability::ProbabilityPair;
use serde::Serialize;

use crate::{HazardEntry, HazardReport, LandslideZones};

/// Shown for a probability that is absent.
pub const NO_DATA: &str = "データなし";

/// Shown for a probability whose raw text is not a number.
pub const PARSE_FAILURE: &str = "データ解析失敗";

const NOT_APPLICABLE: &str = "該当なし";

pub const P50_LABEL: &str = "30年以内に震度5強以上の地震が起こる確率";
pub const P60_LABEL: &str = "30年以内に震度6強以上の地震が起こる確率";
pub const LANDSLIDE_LABEL: &str = "土砂災害警戒・特別警戒区域";

/// One labelled line group of the rendered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub label: &'static str,
    pub text: String,
}

/// Label and "no data" text for the single-layer categories.
const fn layer_text(category: HazardCategory) -> Option<(&'static str, &'static str)> {
    match category {
        HazardCategory::Flood => Some(("想定最大浸水深", "浸水なし")),
        HazardCategory::FloodKeizoku => Some(("浸水継続時間", "浸水想定なし")),
        HazardCategory::KaokutoukaiHanran => {
            Some(("家屋倒壊等氾濫想定区域（氾濫流）", "判定なし"))
        }
        HazardCategory::KaokutoukaiKagan => {
            Some(("家屋倒壊等氾濫想定区域（河岸侵食）", NOT_APPLICABLE))
        }
        HazardCategory::Tsunami => Some(("津波浸水想定", "浸水想定なし")),
        HazardCategory::HighTide => Some(("高潮浸水想定", "浸水想定なし")),
        HazardCategory::LargeFillLand => Some(("大規模盛土造成地", "情報なし")),
        HazardCategory::Earthquake | HazardCategory::Landslide => None,
    }
}

/// Formats a probability in `[0, 1]` as a whole percentage, rounding down.
#[must_use]
pub fn format_probability(value: Option<f64>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |p| format!("{}%", (p * 100.0).floor()))
}

/// Like [`format_probability`] for a raw textual value.
#[must_use]
pub fn format_probability_text(value: Option<&str>) -> String {
    match value {
        None => NO_DATA.to_string(),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| PARSE_FAILURE.to_string(), |p| format_probability(Some(p))),
    }
}

/// Combines a maximum and a center value into the two-line display form.
///
/// Missing values read as `no_data`; when both are `no_data` the result is
/// just `no_data`.
#[must_use]
pub fn format_pair(max: Option<&str>, center: Option<&str>, no_data: &str) -> String {
    let max = max.unwrap_or(no_data);
    let center = center.unwrap_or(no_data);
    if max == no_data && center == no_data {
        return no_data.to_string();
    }
    format!(" 周辺100mの最大: {max}\n 中心点: {center}")
}

fn format_probability_pair(pair: &ProbabilityPair) -> String {
    format_pair(
        Some(&format_probability(pair.max)),
        Some(&format_probability(pair.center)),
        NO_DATA,
    )
}

fn format_ring(result: &RingResult, no_data: &str) -> String {
    format_pair(
        Some(&result.max.description),
        Some(&result.center.description),
        no_data,
    )
}

fn join_found<'a>(descriptions: impl Iterator<Item = &'a str>) -> String {
    let found: Vec<&str> = descriptions
        .filter(|description| *description != NOT_APPLICABLE)
        .collect();
    if found.is_empty() {
        NOT_APPLICABLE.to_string()
    } else {
        found.join(", ")
    }
}

fn format_landslide(zones: &LandslideZones) -> String {
    let layers = zones.layers();
    let max = join_found(layers.iter().map(|result| result.max.description.as_str()));
    let center = join_found(layers.iter().map(|result| result.center.description.as_str()));
    format_pair(Some(&max), Some(&center), NOT_APPLICABLE)
}

/// Renders every entry of `report` in category order. Categories that
/// were not requested produce no lines.
#[must_use]
pub fn render(report: &HazardReport) -> Vec<DisplayEntry> {
    let mut lines = Vec::with_capacity(report.entries.len() + 1);

    for (category, entry) in &report.entries {
        match entry {
            HazardEntry::Probability(sample) => {
                lines.push(DisplayEntry {
                    label: P50_LABEL,
                    text: format_probability_pair(&sample.p50),
                });
                lines.push(DisplayEntry {
                    label: P60_LABEL,
                    text: format_probability_pair(&sample.p60),
                });
            }
            HazardEntry::Landslide(zones) => lines.push(DisplayEntry {
                label: LANDSLIDE_LABEL,
                text: format_landslide(zones),
            }),
            HazardEntry::Severity(result) => {
                let Some((label, no_data)) = layer_text(*category) else {
                    log::warn!("No display text for {category}");
                    continue;
                };
                lines.push(DisplayEntry {
                    label,
                    text: format_ring(result, no_data),
                });
            }
        }
    }

    lines
}
