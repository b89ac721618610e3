//! Best-effort population density resolution for a coordinate.
//!
//! Runs the fallback chain — reverse geocode, country facts, direct
//! cell lookup — converting each tier's failure into absence rather
//! than aborting, then composes whatever resolved into a single
//! [`PopulationDensityResult`]. Every terminal outcome is cached at
//! location granularity, so repeated queries for the same rounded
//! coordinate cost nothing after the first resolution.

use impact_map_population_models::{Coordinate, CountryFacts, DensitySource, PopulationDensityResult};

use crate::{
    cache::{LocationCache, location_key},
    country, geocode,
    geocode::ResolvedCountry,
    gridded::{self, CELL_AREA_SQ_KM},
    source_registry::SourceSet,
};

/// Resolves a best-effort population density for `coordinate`.
///
/// Total: every failure degrades to a lower tier, bottoming out at a
/// zero-density result with an explanatory note.
pub async fn resolve_density(
    client: &reqwest::Client,
    sources: &SourceSet,
    location_cache: &LocationCache,
    coordinate: Coordinate,
) -> PopulationDensityResult {
    let key = location_key(coordinate);
    if let Some(hit) = location_cache.get(&key) {
        log::debug!("Location cache hit for {key}");
        return hit;
    }

    let resolved_country = match &sources.reverse_geocode {
        Some(config) => match geocode::reverse_geocode(client, config, coordinate).await {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                log::warn!("Reverse geocode failed for {key}: {e}");
                None
            }
        },
        None => None,
    };

    let facts = match (&resolved_country, &sources.country_facts) {
        (Some(resolved), Some(config)) => {
            match country::country_facts(client, config, &resolved.code).await {
                Ok(facts) => Some(facts),
                Err(e) => {
                    log::warn!("Country facts lookup failed for {}: {e}", resolved.code);
                    None
                }
            }
        }
        _ => None,
    };

    let cell_population = match &sources.gridded {
        Some(config) => match gridded::cell_population(client, config, coordinate).await {
            Ok(population) => Some(population),
            Err(e) => {
                log::warn!("Gridded cell lookup failed for {key}: {e}");
                None
            }
        },
        None => None,
    };

    let result = build_result(resolved_country, facts, cell_population);
    location_cache.insert(key, result.clone());
    result
}

/// Composes the tier outcomes into a density result.
///
/// Priority: gridded cell density, then country mean density, then an
/// explicit no-data result.
fn build_result(
    resolved_country: Option<ResolvedCountry>,
    facts: Option<CountryFacts>,
    cell_population: Option<f64>,
) -> PopulationDensityResult {
    let country_code = resolved_country
        .as_ref()
        .map(|c| c.code.clone())
        .or_else(|| facts.as_ref().map(|f| f.code.clone()));
    let country_name = facts
        .as_ref()
        .map(|f| f.name.clone())
        .or_else(|| resolved_country.as_ref().and_then(|c| c.name.clone()));

    let country_population = facts.as_ref().map(|f| f.population);
    let country_area_sq_km = facts.as_ref().map(|f| f.area_sq_km);
    let country_mean_density = facts.as_ref().map(CountryFacts::mean_density);

    match (cell_population, &facts) {
        (Some(population), _) => {
            let density = population / CELL_AREA_SQ_KM;
            PopulationDensityResult {
                country_code,
                country_name,
                density_per_sq_km: density,
                source: DensitySource::GriddedCells,
                cell_population: Some(population),
                cell_area_sq_km: Some(CELL_AREA_SQ_KM),
                cell_density_per_sq_km: Some(density),
                country_population,
                country_area_sq_km,
                country_mean_density,
                notes: None,
            }
        }
        (None, Some(country)) => PopulationDensityResult {
            country_code,
            country_name,
            density_per_sq_km: country.mean_density(),
            source: DensitySource::CountryAverage,
            cell_population: None,
            cell_area_sq_km: None,
            cell_density_per_sq_km: None,
            country_population,
            country_area_sq_km,
            country_mean_density,
            notes: Some(
                "local cell data unavailable; using national average density".to_string(),
            ),
        },
        (None, None) => PopulationDensityResult {
            country_code,
            country_name,
            density_per_sq_km: 0.0,
            source: DensitySource::NoData,
            cell_population: None,
            cell_area_sq_km: None,
            cell_density_per_sq_km: None,
            country_population: None,
            country_area_sq_km: None,
            country_mean_density: None,
            notes: Some("no population data available for this location".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> CountryFacts {
        CountryFacts {
            code: "XX".to_string(),
            name: "Testland".to_string(),
            population: 10_000_000,
            area_sq_km: 100_000.0,
        }
    }

    #[test]
    fn cell_success_uses_gridded_source() {
        let result = build_result(
            Some(ResolvedCountry {
                code: "XX".to_string(),
                name: None,
            }),
            Some(facts()),
            Some(2.5),
        );
        assert_eq!(result.source, DensitySource::GriddedCells);
        assert!((result.density_per_sq_km - 250.0).abs() < 1e-9);
        assert_eq!(result.cell_population, Some(2.5));
        assert_eq!(result.cell_area_sq_km, Some(0.01));
        assert_eq!(result.country_population, Some(10_000_000));
        assert!((result.country_mean_density.unwrap() - 100.0).abs() < 1e-9);
        assert!(result.notes.is_none());
    }

    #[test]
    fn cell_failure_falls_back_to_country_average() {
        let result = build_result(
            Some(ResolvedCountry {
                code: "XX".to_string(),
                name: None,
            }),
            Some(facts()),
            None,
        );
        assert_eq!(result.source, DensitySource::CountryAverage);
        assert!((result.density_per_sq_km - 100.0).abs() < 1e-9);
        assert!(result.cell_population.is_none());
        assert_eq!(result.country_name.as_deref(), Some("Testland"));
        assert!(result.notes.as_deref().unwrap().contains("unavailable"));
    }

    #[test]
    fn total_failure_yields_zero_density_with_note() {
        let result = build_result(None, None, None);
        assert_eq!(result.source, DensitySource::NoData);
        assert!((result.density_per_sq_km - 0.0).abs() < f64::EPSILON);
        assert!(result.country_code.is_none());
        assert!(!result.notes.as_deref().unwrap().is_empty());
    }

    #[test]
    fn geocode_only_failure_keeps_cell_density() {
        // Country unknown but the cell resolved: still a gridded result
        let result = build_result(None, None, Some(1.0));
        assert_eq!(result.source, DensitySource::GriddedCells);
        assert!((result.density_per_sq_km - 100.0).abs() < 1e-9);
        assert!(result.country_code.is_none());
        assert!(result.country_mean_density.is_none());
    }

    #[tokio::test]
    async fn resolution_is_cached_and_idempotent() {
        // No sources configured: the chain makes no remote calls and
        // bottoms out at no-data, which must still be cached.
        let client = reqwest::Client::new();
        let sources = SourceSet::default();
        let cache = LocationCache::new();
        let coordinate = Coordinate::new(41.8827, -87.6278);

        let first = resolve_density(&client, &sources, &cache, coordinate).await;
        assert!(cache.get(&location_key(coordinate)).is_some());

        let second = resolve_density(&client, &sources, &cache, coordinate).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cached_result_short_circuits_resolution() {
        let client = reqwest::Client::new();
        let sources = SourceSet::default();
        let cache = LocationCache::new();
        let coordinate = Coordinate::new(10.0, 20.0);

        let seeded = build_result(None, Some(facts()), None);
        cache.insert(location_key(coordinate), seeded.clone());

        let resolved = resolve_density(&client, &sources, &cache, coordinate).await;
        assert_eq!(resolved, seeded);
    }
}
