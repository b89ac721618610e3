#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population density and casualty estimate types.
//!
//! These types are the contract between the estimation pipeline and its
//! consumers (the API server and CLI). They are serialized to JSON for
//! the REST API, so field names are camelCase on the wire.
//!
//! A [`PopulationDensityResult`] is deliberately sparse: only
//! `density_per_sq_km` and `source` are always present. The cell and
//! country tiers are populated only when their respective remote data
//! source succeeded, so consumers can tell *which* approximation layer
//! a figure came from.

use serde::{Deserialize, Serialize};

/// A WGS84 point. Latitude in `[-90, 90]`, longitude in `(-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude/longitude degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// National aggregate statistics for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryFacts {
    /// ISO 3166-1 alpha-2 code (e.g. "US", "JP").
    pub code: String,
    /// Display name (e.g. "United States").
    pub name: String,
    /// Total population.
    pub population: u64,
    /// Total area in km². Always positive.
    pub area_sq_km: f64,
}

impl CountryFacts {
    /// Mean population density in people per km².
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_density(&self) -> f64 {
        self.population as f64 / self.area_sq_km
    }
}

/// Which approximation layer produced a density figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DensitySource {
    /// High-resolution gridded population cells (~100 m raster).
    GriddedCells,
    /// National mean density (population / area).
    CountryAverage,
    /// Every data source failed; density is zero.
    NoData,
}

/// Best-effort population density at a coordinate.
///
/// Invariant: `density_per_sq_km` is always present. All other fields
/// are present only when their data source succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationDensityResult {
    /// ISO 3166-1 alpha-2 code, if the reverse geocode succeeded.
    pub country_code: Option<String>,
    /// Country display name, if known.
    pub country_name: Option<String>,
    /// The density figure consumers should use, in people per km².
    pub density_per_sq_km: f64,
    /// Provenance of `density_per_sq_km`.
    pub source: DensitySource,
    /// Population of the ~100 m cell containing the coordinate.
    pub cell_population: Option<f64>,
    /// Area of that cell in km².
    pub cell_area_sq_km: Option<f64>,
    /// Cell population divided by cell area.
    pub cell_density_per_sq_km: Option<f64>,
    /// Total country population, if country facts resolved.
    pub country_population: Option<u64>,
    /// Total country area in km², if country facts resolved.
    pub country_area_sq_km: Option<f64>,
    /// Country population / area, if country facts resolved.
    pub country_mean_density: Option<f64>,
    /// Human-readable caveats (e.g. which tiers were unavailable).
    pub notes: Option<String>,
}

/// Summary statistics over a set of density samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleStats {
    /// Mean density across resolved samples, people per km².
    pub mean_density: f64,
    /// Maximum sampled density.
    pub max_density: f64,
    /// Minimum sampled density.
    pub min_density: f64,
    /// How many sample points resolved successfully.
    pub sample_count: usize,
}

impl SampleStats {
    /// Aggregates resolved sample densities into summary statistics.
    ///
    /// Returns `None` for an empty slice — zero resolved samples means
    /// "no data", not "density zero".
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_densities(densities: &[f64]) -> Option<Self> {
        if densities.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &d in densities {
            min = min.min(d);
            max = max.max(d);
            sum += d;
        }

        Some(Self {
            mean_density: sum / densities.len() as f64,
            max_density: max,
            min_density: min,
            sample_count: densities.len(),
        })
    }
}

/// A bounded casualty estimate for a point-radius impact footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasualtyEstimate {
    /// The underlying density resolution this estimate was built from.
    #[serde(flatten)]
    pub density: PopulationDensityResult,
    /// Blast radius in km.
    pub blast_radius_km: f64,
    /// Impact area in km² (π·r²).
    pub impact_area_sq_km: f64,
    /// Blended and clamped density actually used for the estimate.
    pub effective_density: f64,
    /// Mean density over the sample grid, if sampling ran and succeeded.
    pub sampled_mean_density: Option<f64>,
    /// Maximum density over the sample grid, if sampling ran.
    pub sampled_max_density: Option<f64>,
    /// How many grid samples resolved, if sampling ran.
    pub sample_count: Option<usize>,
    /// Final estimated casualty count. Non-negative and capped.
    pub estimated_casualties: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_density_divides_population_by_area() {
        let facts = CountryFacts {
            code: "XX".to_string(),
            name: "Testland".to_string(),
            population: 10_000_000,
            area_sq_km: 100_000.0,
        };
        assert!((facts.mean_density() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sample_stats_aggregates() {
        let stats = SampleStats::from_densities(&[100.0, 300.0, 200.0]).unwrap();
        assert!((stats.mean_density - 200.0).abs() < 1e-9);
        assert!((stats.max_density - 300.0).abs() < f64::EPSILON);
        assert!((stats.min_density - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.sample_count, 3);
    }

    #[test]
    fn sample_stats_empty_is_none() {
        assert!(SampleStats::from_densities(&[]).is_none());
    }

    #[test]
    fn sample_stats_single_sample() {
        let stats = SampleStats::from_densities(&[42.0]).unwrap();
        assert!((stats.mean_density - 42.0).abs() < f64::EPSILON);
        assert!((stats.max_density - stats.min_density).abs() < f64::EPSILON);
        assert_eq!(stats.sample_count, 1);
    }

    #[test]
    fn density_source_serializes_camel_case() {
        let json = serde_json::to_string(&DensitySource::GriddedCells).unwrap();
        assert_eq!(json, "\"griddedCells\"");
    }
}
