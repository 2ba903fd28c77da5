//! J-SHIS point probability client.
//!
//! The J-SHIS "mesh info" endpoint returns a `GeoJSON` `FeatureCollection`
//! for the 250 m mesh containing a point. The first feature's properties
//! carry the 30-year exceedance probabilities for JMA seismic intensity
//! 5-upper (`T30_I50_PS`) and 6-upper (`T30_I60_PS`).
//!
//! See <https://www.j-shis.bosai.go.jp/api-pshm-meshinfo>

use std::time::Duration;

use async_trait::async_trait;
use hazard_map_hazard_models::GeoPoint;

use crate::{ExceedanceProbabilities, ProbabilityApi, ProbabilityError};

/// Default endpoint: 2020 model, average case, all earthquakes.
pub const DEFAULT_JSHIS_URL: &str =
    "https://www.j-shis.bosai.go.jp/map/api/pshm/Y2020/AVR/TTL_MTTL/meshinfo.geojson";

const P50_PROPERTY: &str = "T30_I50_PS";
const P60_PROPERTY: &str = "T30_I60_PS";

/// [`ProbabilityApi`] backed by the J-SHIS HTTP API.
#[derive(Debug, Clone)]
pub struct JshisClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl JshisClient {
    /// Creates a client for `base_url` with a per-request timeout.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ProbabilityApi for JshisClient {
    async fn exceedance(
        &self,
        point: GeoPoint,
    ) -> Result<ExceedanceProbabilities, ProbabilityError> {
        let position = format!("{},{}", point.lon(), point.lat());
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("position", position.as_str()), ("epsg", "4326")])
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProbabilityError::Status {
                url: self.base_url.clone(),
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a mesh-info response.
///
/// An empty feature list means the point is outside the model and yields
/// no values. Values may be JSON numbers or numeric strings; anything else
/// is logged and treated as absent.
///
/// # Errors
///
/// Returns [`ProbabilityError::Parse`] if the body has no `features`
/// array.
pub fn parse_response(
    body: &serde_json::Value,
) -> Result<ExceedanceProbabilities, ProbabilityError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| ProbabilityError::Parse {
            message: "J-SHIS response missing 'features' array".to_string(),
        })?;

    let Some(properties) = features.first().and_then(|f| f.get("properties")) else {
        return Ok(ExceedanceProbabilities::default());
    };

    Ok(ExceedanceProbabilities {
        p50: read_probability(properties, P50_PROPERTY),
        p60: read_probability(properties, P60_PROPERTY),
    })
}

fn read_probability(properties: &serde_json::Value, key: &str) -> Option<f64> {
    let value = properties.get(key)?;
    let parsed = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        log::warn!("Unparseable J-SHIS {key} value: {value}");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_numbers_and_numeric_strings() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "T30_I50_PS": 0.5123, "T30_I60_PS": "0.0731" }
            }]
        });
        let probs = parse_response(&body).unwrap();
        assert_eq!(probs.p50, Some(0.5123));
        assert_eq!(probs.p60, Some(0.0731));
    }

    #[test]
    fn missing_and_garbage_values_are_absent() {
        let body = json!({
            "features": [{ "properties": { "T30_I50_PS": "n/a", "T30_I60_PS": null } }]
        });
        assert_eq!(parse_response(&body).unwrap(), ExceedanceProbabilities::default());

        let body = json!({ "features": [{ "properties": {} }] });
        assert_eq!(parse_response(&body).unwrap(), ExceedanceProbabilities::default());
    }

    #[test]
    fn empty_collection_is_no_data() {
        let body = json!({ "type": "FeatureCollection", "features": [] });
        assert_eq!(parse_response(&body).unwrap(), ExceedanceProbabilities::default());
    }

    #[test]
    fn missing_features_is_a_parse_error() {
        let err = parse_response(&json!({ "error": "bad position" })).unwrap_err();
        assert!(matches!(err, ProbabilityError::Parse { .. }));
    }
}
