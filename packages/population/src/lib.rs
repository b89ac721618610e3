#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population exposure estimation for impact footprints.
//!
//! Combines three remote data sources of differing resolution and
//! reliability into a best-effort density and casualty estimate,
//! configured via TOML files in `services/`:
//!
//! 1. **Gridded population** (`WorldPop`) — ~100 m raster cells,
//!    reached through an asynchronous submit/poll task protocol.
//!    Highest resolution, least reliable.
//! 2. **Country facts** (REST Countries) — national population and
//!    area, from which a mean density is derived. Coarse but sturdy.
//! 3. **Reverse geocoder** (`BigDataCloud`) — resolves which country a
//!    coordinate falls in, anchoring tier 2.
//!
//! Each tier's failure is logged and converted into absence; the
//! resolver composes whatever survived, bottoming out at an explicit
//! zero-density result. [`PopulationService`] is the entry point the
//! API server and CLI consume.

pub mod cache;
pub mod country;
pub mod estimator;
pub mod geocode;
pub mod gridded;
pub mod resolver;
pub mod sample_grid;
pub mod sampler;
pub mod source_registry;

use impact_map_population_models::{CasualtyEstimate, Coordinate, PopulationDensityResult};
use thiserror::Error;

use crate::{
    cache::{CellCache, LocationCache},
    source_registry::SourceSet,
};

/// Errors from the population estimation pipeline.
#[derive(Debug, Error)]
pub enum PopulationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response violated the expected protocol shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The reverse geocoder returned nothing usable.
    #[error("Lookup failed: {message}")]
    LookupFailed {
        /// Description of the failed lookup.
        message: String,
    },

    /// The country facts source returned nothing usable.
    #[error("Data unavailable: {message}")]
    DataUnavailable {
        /// Description of the missing data.
        message: String,
    },

    /// A gridded population task finished with its error flag set.
    #[error("Remote task failed: {message}")]
    RemoteTask {
        /// Message supplied by the remote service.
        message: String,
    },

    /// The gridded population task never reached a terminal state.
    #[error("Polling timed out after {attempts} attempts")]
    PollTimeout {
        /// How many poll attempts were made.
        attempts: u32,
    },

    /// Malformed caller input. The only error surfaced to consumers.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },
}

/// The estimation pipeline with its HTTP client, source configuration,
/// and memoization caches.
///
/// One instance is shared per application; cache lifetime equals the
/// instance lifetime. Both entry points are total for well-formed
/// input — remote failures degrade through the fallback tiers instead
/// of propagating, and only an invalid blast radius errors.
pub struct PopulationService {
    client: reqwest::Client,
    sources: SourceSet,
    location_cache: LocationCache,
    cell_cache: CellCache,
}

impl PopulationService {
    /// Creates a service using the embedded source registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sources(SourceSet::load())
    }

    /// Creates a service with an explicit source configuration.
    ///
    /// Tests pass a [`SourceSet::default`] (all roles empty) to run the
    /// pipeline fully offline.
    #[must_use]
    pub fn with_sources(sources: SourceSet) -> Self {
        Self {
            client: reqwest::Client::new(),
            sources,
            location_cache: LocationCache::new(),
            cell_cache: CellCache::new(),
        }
    }

    /// Resolves a best-effort population density for `coordinate`.
    pub async fn resolve_density(&self, coordinate: Coordinate) -> PopulationDensityResult {
        resolver::resolve_density(&self.client, &self.sources, &self.location_cache, coordinate)
            .await
    }

    /// Estimates casualties for a blast of `blast_radius_m` meters
    /// centered on `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::InvalidInput`] if the radius is not a
    /// finite positive number.
    pub async fn estimate_casualties(
        &self,
        coordinate: Coordinate,
        blast_radius_m: f64,
    ) -> Result<CasualtyEstimate, PopulationError> {
        estimator::estimate_casualties(
            &self.client,
            &self.sources,
            &self.location_cache,
            &self.cell_cache,
            coordinate,
            blast_radius_m,
        )
        .await
    }
}

impl Default for PopulationService {
    fn default() -> Self {
        Self::new()
    }
}
