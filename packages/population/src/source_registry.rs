//! Compile-time registry of remote data source configurations.
//!
//! Each data source is defined in a TOML file under `services/`. The
//! registry embeds these at compile time and exposes them via
//! [`all_sources`] and [`enabled_sources`]; [`SourceSet::load`] resolves
//! the three pipeline roles (reverse geocoder, country facts, gridded
//! population) from whatever is enabled.
//!
//! Disabling a source in its TOML makes that tier permanently
//! unavailable — the resolver falls through it exactly as it would for a
//! failed call.

use serde::Deserialize;

/// A remote data source configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSource {
    /// Unique identifier (e.g., `"bigdatacloud"`, `"worldpop"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this source participates in the pipeline.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Coordinate → country code lookup.
    ReverseGeocode {
        /// API endpoint (e.g., `"https://api.bigdatacloud.net/data/reverse-geocode-client"`).
        base_url: String,
        /// `localityLanguage` query parameter value.
        locality_language: String,
    },
    /// Country code → national population/area lookup.
    CountryFacts {
        /// API base URL; the alpha-2 code is appended as a path segment.
        base_url: String,
    },
    /// Gridded (~100 m cell) population sampler with a submit/poll protocol.
    GriddedPopulation {
        /// API base URL (e.g., `"https://api.worldpop.org"`).
        base_url: String,
        /// Dataset identifier (e.g., `"wpgppop"`).
        dataset: String,
        /// Dataset year.
        year: u16,
        /// Maximum poll attempts before giving up on a task.
        #[serde(default = "default_poll_attempts")]
        max_poll_attempts: u32,
        /// Fixed delay between poll attempts in milliseconds.
        #[serde(default = "default_poll_interval_ms")]
        poll_interval_ms: u64,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_poll_attempts() -> u32 {
    8
}

const fn default_poll_interval_ms() -> u64 {
    1500
}

/// Resolved configuration for the reverse geocoder.
#[derive(Debug, Clone)]
pub struct ReverseGeocodeConfig {
    /// API endpoint.
    pub base_url: String,
    /// `localityLanguage` query parameter value.
    pub locality_language: String,
}

/// Resolved configuration for the country facts source.
#[derive(Debug, Clone)]
pub struct CountryFactsConfig {
    /// API base URL; the alpha-2 code is appended as a path segment.
    pub base_url: String,
}

/// Resolved configuration for the gridded population source.
#[derive(Debug, Clone)]
pub struct GriddedConfig {
    /// API base URL.
    pub base_url: String,
    /// Dataset identifier.
    pub dataset: String,
    /// Dataset year.
    pub year: u16,
    /// Maximum poll attempts before giving up on a task.
    pub max_poll_attempts: u32,
    /// Fixed delay between poll attempts in milliseconds.
    pub poll_interval_ms: u64,
}

/// The three pipeline roles resolved from the registry.
///
/// A `None` role behaves like a source whose every call fails: the
/// fallback chain skips it. Tests construct this directly to run the
/// pipeline fully offline.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    /// Coordinate → country code.
    pub reverse_geocode: Option<ReverseGeocodeConfig>,
    /// Country code → national facts.
    pub country_facts: Option<CountryFactsConfig>,
    /// Gridded cell population.
    pub gridded: Option<GriddedConfig>,
}

impl SourceSet {
    /// Resolves the pipeline roles from the enabled sources in the
    /// embedded registry. The first enabled source of each kind wins.
    #[must_use]
    pub fn load() -> Self {
        Self::from_sources(enabled_sources())
    }

    fn from_sources(sources: Vec<DataSource>) -> Self {
        let mut set = Self::default();
        for source in sources {
            match source.provider {
                ProviderConfig::ReverseGeocode {
                    base_url,
                    locality_language,
                } if set.reverse_geocode.is_none() => {
                    set.reverse_geocode = Some(ReverseGeocodeConfig {
                        base_url,
                        locality_language,
                    });
                }
                ProviderConfig::CountryFacts { base_url } if set.country_facts.is_none() => {
                    set.country_facts = Some(CountryFactsConfig { base_url });
                }
                ProviderConfig::GriddedPopulation {
                    base_url,
                    dataset,
                    year,
                    max_poll_attempts,
                    poll_interval_ms,
                } if set.gridded.is_none() => {
                    set.gridded = Some(GriddedConfig {
                        base_url,
                        dataset,
                        year,
                        max_poll_attempts,
                        poll_interval_ms,
                    });
                }
                _ => {
                    log::warn!("Ignoring extra data source '{}'", source.id);
                }
            }
        }
        set
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SOURCE_TOMLS: &[(&str, &str)] = &[
    (
        "reverse_geocode",
        include_str!("../services/reverse_geocode.toml"),
    ),
    (
        "country_facts",
        include_str!("../services/country_facts.toml"),
    ),
    (
        "gridded_population",
        include_str!("../services/gridded_population.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 3;

/// Returns all data source configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time
/// guarantee since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<DataSource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse data source '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled sources.
#[must_use]
pub fn enabled_sources() -> Vec<DataSource> {
    all_sources().into_iter().filter(|s| s.enabled).collect()
}
