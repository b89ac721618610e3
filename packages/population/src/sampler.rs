//! Concurrent density sampling over a geodesic grid.
//!
//! Fans one gridded-cell request out per sample point, waits for every
//! outcome, and reduces the successes to summary statistics. A failed
//! point contributes nothing instead of aborting the batch, so a grid
//! with any resolved point still yields usable statistics.

use futures::stream::{self, StreamExt as _};
use impact_map_population_models::{Coordinate, SampleStats};

use crate::{
    cache::{CellCache, cell_key},
    gridded::{self, CELL_AREA_SQ_KM},
    source_registry::GriddedConfig,
};

/// Concurrent in-flight cell requests per sample batch.
const SAMPLE_CONCURRENCY: usize = 6;

/// Samples population density at each grid point and aggregates the
/// successes.
///
/// Returns `None` if no point resolved — "no data", distinct from a
/// grid of empty cells.
pub async fn sample_density(
    client: &reqwest::Client,
    config: &GriddedConfig,
    cell_cache: &CellCache,
    points: &[Coordinate],
) -> Option<SampleStats> {
    let results: Vec<Option<f64>> = stream::iter(
        points
            .iter()
            .copied()
            .map(|point| async move { fetch_cell_density(client, config, cell_cache, point).await }),
    )
    .buffer_unordered(SAMPLE_CONCURRENCY)
    .collect()
    .await;

    let densities: Vec<f64> = results.into_iter().flatten().collect();
    log::debug!(
        "Resolved {}/{} sample points",
        densities.len(),
        points.len()
    );

    let stats = SampleStats::from_densities(&densities);
    if stats.is_none() {
        log::warn!("No sample points resolved out of {}", points.len());
    }
    stats
}

/// Resolves one sample point to a density, consulting the cell cache
/// before the remote service. Failures are logged and absorbed.
async fn fetch_cell_density(
    client: &reqwest::Client,
    config: &GriddedConfig,
    cell_cache: &CellCache,
    point: Coordinate,
) -> Option<f64> {
    let key = cell_key(point);

    if let Some(population) = cell_cache.get(&key) {
        return Some(population / CELL_AREA_SQ_KM);
    }

    match gridded::cell_population(client, config, point).await {
        Ok(population) => {
            cell_cache.insert(key, population);
            Some(population / CELL_AREA_SQ_KM)
        }
        Err(e) => {
            log::warn!("Cell lookup failed at {key}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_grid::sample_grid;

    fn unreachable_config() -> GriddedConfig {
        // Nothing listens here; any remote call would error immediately
        GriddedConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            dataset: "wpgppop".to_string(),
            year: 2020,
            max_poll_attempts: 1,
            poll_interval_ms: 0,
        }
    }

    #[tokio::test]
    async fn cached_points_resolve_without_remote_calls() {
        let client = reqwest::Client::new();
        let config = unreachable_config();
        let cache = CellCache::new();

        let points = sample_grid(Coordinate::new(41.8827, -87.6278), 2.0);
        for point in &points {
            cache.insert(cell_key(*point), 5.0);
        }

        let stats = sample_density(&client, &config, &cache, &points)
            .await
            .unwrap();
        assert_eq!(stats.sample_count, points.len());
        // 5 people per 0.01 km² cell = 500 per km²
        assert!((stats.mean_density - 500.0).abs() < 1e-9);
        assert!((stats.max_density - 500.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn partial_cache_coverage_is_fail_soft() {
        let client = reqwest::Client::new();
        let config = unreachable_config();
        let cache = CellCache::new();

        let points = sample_grid(Coordinate::new(41.8827, -87.6278), 25.0);
        assert_eq!(points.len(), 13);

        // 7 points cached, 6 left to fail against the unreachable service
        for point in &points[..7] {
            cache.insert(cell_key(*point), 2.0);
        }

        let stats = sample_density(&client, &config, &cache, &points)
            .await
            .unwrap();
        assert_eq!(stats.sample_count, 7);
        assert!((stats.mean_density - 200.0).abs() < 1e-9);
        assert!((stats.min_density - 200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn all_failures_yield_none() {
        let client = reqwest::Client::new();
        let config = unreachable_config();
        let cache = CellCache::new();

        let points = sample_grid(Coordinate::new(41.8827, -87.6278), 2.0);
        assert!(
            sample_density(&client, &config, &cache, &points)
                .await
                .is_none()
        );
    }
}
