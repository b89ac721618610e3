//! Deterministic geodesic sample grids around an impact center.
//!
//! A grid is the center point plus one or two rings of evenly spaced
//! bearings, so a footprint is approximated by at most
//! `1 + 2 × RING_BEARINGS` cell lookups regardless of blast size.

use std::f64::consts::TAU;

use impact_map_geodesy::destination_point;
use impact_map_population_models::Coordinate;

/// Sample footprints are never shrunk below this radius (km).
pub const MIN_SAMPLE_RADIUS_KM: f64 = 0.5;

/// Sample footprints are never grown beyond this radius (km); bounds
/// how far from the center remote cells are fetched for huge blasts.
pub const MAX_SAMPLE_RADIUS_KM: f64 = 50.0;

/// Evenly spaced bearings per ring.
pub const RING_BEARINGS: usize = 6;

/// Nominal radii above this (km) get a second ring at the full
/// effective radius.
const SECOND_RING_THRESHOLD_KM: f64 = 10.0;

/// The first ring sits at this fraction of the effective radius.
const INNER_RING_FRACTION: f64 = 0.6;

/// Generates the sample grid for a footprint of `radius_km` around
/// `center`.
///
/// The center is always the first point. The effective radius is the
/// nominal radius clamped to
/// `[MIN_SAMPLE_RADIUS_KM, MAX_SAMPLE_RADIUS_KM]`.
#[must_use]
pub fn sample_grid(center: Coordinate, radius_km: f64) -> Vec<Coordinate> {
    let effective = radius_km.clamp(MIN_SAMPLE_RADIUS_KM, MAX_SAMPLE_RADIUS_KM);

    let mut points = Vec::with_capacity(1 + 2 * RING_BEARINGS);
    points.push(center);
    push_ring(&mut points, center, effective * INNER_RING_FRACTION);

    if radius_km > SECOND_RING_THRESHOLD_KM {
        push_ring(&mut points, center, effective);
    }

    points
}

#[allow(clippy::cast_precision_loss)]
fn push_ring(points: &mut Vec<Coordinate>, center: Coordinate, ring_radius_km: f64) {
    for i in 0..RING_BEARINGS {
        let bearing = TAU * i as f64 / RING_BEARINGS as f64;
        let (latitude, longitude) =
            destination_point(center.latitude, center.longitude, ring_radius_km, bearing);
        points.push(Coordinate::new(latitude, longitude));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Coordinate = Coordinate::new(41.8827, -87.6278);

    /// Rough great-circle distance for assertions (km).
    fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let dlat = (b.latitude - a.latitude).to_radians();
        let dlon = (b.longitude - a.longitude).to_radians();
        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * impact_map_geodesy::EARTH_RADIUS_KM * h.sqrt().asin()
    }

    #[test]
    fn small_radius_yields_single_ring() {
        let grid = sample_grid(CENTER, 2.0);
        assert_eq!(grid.len(), 1 + RING_BEARINGS);
        assert_eq!(grid[0], CENTER);
    }

    #[test]
    fn large_radius_yields_two_rings() {
        let grid = sample_grid(CENTER, 25.0);
        assert_eq!(grid.len(), 1 + 2 * RING_BEARINGS);
    }

    #[test]
    fn threshold_radius_stays_single_ring() {
        let grid = sample_grid(CENTER, 10.0);
        assert_eq!(grid.len(), 1 + RING_BEARINGS);
    }

    #[test]
    fn inner_ring_sits_at_expected_distance() {
        let grid = sample_grid(CENTER, 5.0);
        for point in &grid[1..] {
            let d = distance_km(CENTER, *point);
            assert!((d - 3.0).abs() < 0.05, "ring point at {d} km, expected 3");
        }
    }

    #[test]
    fn tiny_radius_is_floored() {
        // 0.01 km nominal clamps to 0.5 km; inner ring at 0.3 km
        let grid = sample_grid(CENTER, 0.01);
        for point in &grid[1..] {
            let d = distance_km(CENTER, *point);
            assert!((d - 0.3).abs() < 0.01);
        }
    }

    #[test]
    fn huge_radius_is_capped() {
        let grid = sample_grid(CENTER, 1000.0);
        assert_eq!(grid.len(), 1 + 2 * RING_BEARINGS);
        for point in &grid[1..] {
            assert!(distance_km(CENTER, *point) <= MAX_SAMPLE_RADIUS_KM + 0.5);
        }
    }

    #[test]
    fn ring_points_are_distinct() {
        let grid = sample_grid(CENTER, 5.0);
        for (i, a) in grid.iter().enumerate() {
            for b in &grid[i + 1..] {
                assert!(distance_km(*a, *b) > 0.01);
            }
        }
    }
}
