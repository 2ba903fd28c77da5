#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Looks up natural hazards around one location in Japan.
//!
//! ```text
//! hazard_map_cli 35.6586,139.7454 --hazards flood,earthquake --precision high
//! ```
//!
//! Runtime knobs (timeouts, worker count, API URL, fill-land directory)
//! come from the `HAZARD_*` environment variables; `--fill-land-dir`
//! overrides `HAZARD_FILL_LAND_DIR`.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use clap::Parser;
use hazard_map_hazard_models::{GeoPoint, Precision};
use hazard_map_report::{AggregatorConfig, HazardAggregator, display};
use hazard_map_spatial::{FixedRegionResolver, RegionResolver};
use regex::Regex;

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?[0-9]{1,2}(?:\.[0-9]+)?)[ \t]*,[ \t]*(-?[0-9]{1,3}(?:\.[0-9]+)?)$")
        .unwrap_or_else(|_| unreachable!())
});

#[derive(Parser)]
#[command(name = "hazard_map_cli", about = "Natural hazard lookup for one location")]
struct Cli {
    /// Location as `lat,lon` in WGS84 degrees
    #[arg(value_parser = parse_location, allow_hyphen_values = true)]
    location: GeoPoint,

    /// Comma-separated hazard categories (default: all)
    #[arg(long, value_delimiter = ',')]
    hazards: Option<Vec<String>>,

    /// Sampling precision: `low` or `high`
    #[arg(long, default_value = "low", value_parser = parse_precision)]
    precision: Precision,

    /// Prefecture code (01-47) used for large fill land lookups
    #[arg(long)]
    region: Option<String>,

    /// Directory of per-prefecture large fill land `GeoJSON` files
    #[arg(long)]
    fill_land_dir: Option<PathBuf>,

    /// Print the raw report as JSON instead of display text
    #[arg(long)]
    json: bool,
}

fn parse_location(input: &str) -> Result<GeoPoint, String> {
    let captures = LOCATION_RE
        .captures(input.trim())
        .ok_or_else(|| format!("expected `lat,lon`, got {input:?}"))?;

    let lat: f64 = captures[1].parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = captures[2].parse().map_err(|e| format!("bad longitude: {e}"))?;

    GeoPoint::new(lat, lon).map_err(|e| e.to_string())
}

fn parse_precision(input: &str) -> Result<Precision, String> {
    input
        .parse()
        .map_err(|_| format!("expected `low` or `high`, got {input:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut config = AggregatorConfig::from_env();
    if let Some(dir) = cli.fill_land_dir {
        config.fill_land_dir = Some(dir);
    }

    let resolver = cli
        .region
        .map(|code| Arc::new(FixedRegionResolver::new(code)) as Arc<dyn RegionResolver>);
    if config.fill_land_dir.is_some() && resolver.is_none() {
        log::warn!("--region is required for large fill land lookups");
    }

    let aggregator = HazardAggregator::from_config(&config, resolver)?;

    log::info!(
        "Looking up hazards at ({}, {})",
        cli.location.lat(),
        cli.location.lon()
    );
    let report = aggregator
        .aggregate(cli.location, cli.hazards.as_deref(), cli.precision)
        .await?;

    for name in &report.ignored_categories {
        eprintln!("Ignored unknown hazard category: {name}");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in display::render(&report) {
            println!("{}:\n{}", entry.label, entry.text);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pairs() {
        let point = parse_location("35.6586,139.7454").unwrap();
        assert!((point.lat() - 35.6586).abs() < 1e-9);
        assert!((point.lon() - 139.7454).abs() < 1e-9);

        let point = parse_location("  -33.9 , 151 ").unwrap();
        assert!((point.lat() + 33.9).abs() < 1e-9);
        assert!((point.lon() - 151.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_locations() {
        assert!(parse_location("東京都新宿区").is_err());
        assert!(parse_location("35.6586").is_err());
        assert!(parse_location("135.0,139.0").is_err());
        assert!(parse_location("95.0,139.0").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_hazard_list_and_precision() {
        let cli = Cli::try_parse_from([
            "hazard_map_cli",
            "35.6586,139.7454",
            "--hazards",
            "flood,earthquake",
            "--precision",
            "high",
        ])
        .unwrap();

        assert_eq!(
            cli.hazards,
            Some(vec!["flood".to_string(), "earthquake".to_string()])
        );
        assert_eq!(cli.precision, Precision::High);
        assert!(!cli.json);
    }
}
