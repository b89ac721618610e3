//! Bounded casualty estimation for a point-radius impact footprint.
//!
//! Blends hyper-local (sampled / single-cell) density against the
//! national average as a function of blast radius, clamps the blend to
//! a policy ceiling so one anomalous raster cell cannot blow the
//! estimate up, and caps the final count against the country and world
//! populations.

use std::f64::consts::PI;

use impact_map_population_models::{CasualtyEstimate, Coordinate, PopulationDensityResult, SampleStats};

use crate::{
    PopulationError,
    cache::{CellCache, LocationCache},
    resolver, sample_grid, sampler,
    source_registry::SourceSet,
};

/// Characteristic distance (km) over which local density gives way to
/// the national average in the blend.
const BLEND_SCALE_KM: f64 = 8.0;

/// Radius (km) above which the sample grid is consulted; smaller
/// blasts are served by the single-cell lookup alone.
const SAMPLING_RADIUS_THRESHOLD_KM: f64 = 1.0;

/// Hard ceiling on any blended density, in people per km².
const GLOBAL_DENSITY_CEILING: f64 = 50_000.0;

/// Ceiling candidate: this multiple of the sampled maximum density.
const SAMPLED_MAX_CEILING_FACTOR: f64 = 1.5;

/// Ceiling candidate: this multiple of the national and local densities.
const TIER_CEILING_FACTOR: f64 = 5.0;

/// No estimate may exceed the approximate world population.
const GLOBAL_POPULATION_CAP: f64 = 8_200_000_000.0;

/// No estimate may exceed this fraction of the country population.
const COUNTRY_POPULATION_CAP_FRACTION: f64 = 0.9;

/// Estimates casualties for a blast of `blast_radius_m` meters centered
/// on `coordinate`.
///
/// # Errors
///
/// Returns [`PopulationError::InvalidInput`] if the radius is not a
/// finite positive number. Every other failure degrades internally:
/// the density resolution and sampling are best-effort.
pub async fn estimate_casualties(
    client: &reqwest::Client,
    sources: &SourceSet,
    location_cache: &LocationCache,
    cell_cache: &CellCache,
    coordinate: Coordinate,
    blast_radius_m: f64,
) -> Result<CasualtyEstimate, PopulationError> {
    if !blast_radius_m.is_finite() || blast_radius_m <= 0.0 {
        return Err(PopulationError::InvalidInput {
            message: format!("blast radius must be a positive number of meters, got {blast_radius_m}"),
        });
    }

    let radius_km = blast_radius_m / 1000.0;
    let density = resolver::resolve_density(client, sources, location_cache, coordinate).await;

    let stats = if radius_km > SAMPLING_RADIUS_THRESHOLD_KM {
        match &sources.gridded {
            Some(config) => {
                let grid = sample_grid::sample_grid(coordinate, radius_km);
                sampler::sample_density(client, config, cell_cache, &grid).await
            }
            None => None,
        }
    } else {
        None
    };

    Ok(build_estimate(density, stats, radius_km))
}

/// Pure estimation step: blend, clamp, cap.
fn build_estimate(
    density: PopulationDensityResult,
    stats: Option<SampleStats>,
    radius_km: f64,
) -> CasualtyEstimate {
    let impact_area_sq_km = PI * radius_km * radius_km;
    let overall = density.density_per_sq_km;

    let local = stats
        .map(|s| s.mean_density)
        .or(density.cell_density_per_sq_km)
        .unwrap_or(overall);
    let national = density.country_mean_density.unwrap_or(overall);

    let weight = blend_weight(radius_km);
    let blended = local * weight + national * (1.0 - weight);

    let ceiling = density_ceiling(stats.map(|s| s.max_density), national, local);
    let effective_density = blended.clamp(0.0, ceiling);

    let raw = effective_density * impact_area_sq_km;
    let estimated_casualties = cap_casualties(raw, density.country_population);

    CasualtyEstimate {
        density,
        blast_radius_km: radius_km,
        impact_area_sq_km,
        effective_density,
        sampled_mean_density: stats.map(|s| s.mean_density),
        sampled_max_density: stats.map(|s| s.max_density),
        sample_count: stats.map(|s| s.sample_count),
        estimated_casualties,
    }
}

/// Exponentially decaying weight of the local density in the blend.
///
/// Near 1 for small radii (local data dominates), decaying toward 0 as
/// the footprint grows past [`BLEND_SCALE_KM`].
fn blend_weight(radius_km: f64) -> f64 {
    (-radius_km / BLEND_SCALE_KM).exp()
}

/// Policy ceiling for the blended density: the smallest positive
/// finite candidate among the global ceiling, a multiple of the
/// sampled maximum, and multiples of the national and local tiers,
/// floored at 1 person per km².
fn density_ceiling(sampled_max: Option<f64>, national: f64, local: f64) -> f64 {
    let candidates = [
        Some(GLOBAL_DENSITY_CEILING),
        sampled_max.map(|d| d * SAMPLED_MAX_CEILING_FACTOR),
        Some(national * TIER_CEILING_FACTOR),
        Some(local * TIER_CEILING_FACTOR),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter(|c| c.is_finite() && *c > 0.0)
        .fold(f64::INFINITY, f64::min)
        .max(1.0)
}

/// Caps raw casualties against the country and world populations and
/// floors at zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn cap_casualties(raw: f64, country_population: Option<u64>) -> u64 {
    let mut capped = raw.min(GLOBAL_POPULATION_CAP);
    if let Some(population) = country_population {
        capped = capped.min(population as f64 * COUNTRY_POPULATION_CAP_FRACTION);
    }
    capped.max(0.0).round() as u64
}
