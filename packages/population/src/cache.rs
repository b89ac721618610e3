//! In-memory memoization for remote population lookups.
//!
//! Two layers, both keyed by coordinates rounded to a fixed decimal
//! precision so near-identical lookups collapse onto one entry:
//!
//! - [`CellCache`] — successful gridded-cell populations, keyed at
//!   4 decimal places (~10 m). Failures are not cached so transient
//!   outages retry on the next encounter.
//! - [`LocationCache`] — every terminal [`PopulationDensityResult`]
//!   (including fallback and no-data outcomes), keyed at 3 decimal
//!   places (~100 m).
//!
//! Entries are immutable once written and live for the process
//! lifetime; inputs are bounded by user interaction rate, so there is
//! no eviction. Caches are constructed explicitly and injected into the
//! pipeline rather than held in globals, so tests get fresh instances.
//! Duplicate in-flight fetches for one key are benign: both resolve to
//! the same value and the second write is a no-op in effect.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use impact_map_population_models::{Coordinate, PopulationDensityResult};

/// Cache key at location granularity (3 decimal places, ~100 m).
#[must_use]
pub fn location_key(coordinate: Coordinate) -> String {
    format!("{:.3},{:.3}", coordinate.latitude, coordinate.longitude)
}

/// Cache key at cell granularity (4 decimal places, ~10 m).
#[must_use]
pub fn cell_key(coordinate: Coordinate) -> String {
    format!("{:.4},{:.4}", coordinate.latitude, coordinate.longitude)
}

/// Memoizes successful gridded-cell population lookups.
#[derive(Debug, Default)]
pub struct CellCache {
    entries: Mutex<BTreeMap<String, f64>>,
}

impl CellCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached cell population for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Stores a successful cell population lookup.
    pub fn insert(&self, key: String, population: f64) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, population);
    }
}

/// Memoizes terminal density resolutions per rounded location.
#[derive(Debug, Default)]
pub struct LocationCache {
    entries: Mutex<BTreeMap<String, PopulationDensityResult>>,
}

impl LocationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<PopulationDensityResult> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Stores a terminal resolution (success, fallback, or no-data).
    pub fn insert(&self, key: String, result: PopulationDensityResult) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result);
    }
}
