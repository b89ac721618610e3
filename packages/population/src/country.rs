//! Country facts client (country code → national population/area).
//!
//! Uses the REST Countries v3.1 alpha-code endpoint. The response is a
//! JSON array whose first element carries `population`, `area` (km²)
//! and `name.common`.
//!
//! See <https://restcountries.com/#endpoints-code>

use impact_map_population_models::CountryFacts;

use crate::{PopulationError, source_registry::CountryFactsConfig};

/// Fetches national population and area for an ISO alpha-2 code.
///
/// # Errors
///
/// Returns [`PopulationError::DataUnavailable`] if the service responds
/// non-2xx or the response lacks a usable (positive) population or
/// area, and [`PopulationError::Http`] on transport failures.
pub async fn country_facts(
    client: &reqwest::Client,
    config: &CountryFactsConfig,
    code: &str,
) -> Result<CountryFacts, PopulationError> {
    let url = format!("{}/{}", config.base_url, code);
    let resp = client.get(&url).send().await?;

    if !resp.status().is_success() {
        return Err(PopulationError::DataUnavailable {
            message: format!("country facts service returned status {} for {code}", resp.status()),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body, code)
}

/// Parses a REST Countries array response.
fn parse_response(body: &serde_json::Value, code: &str) -> Result<CountryFacts, PopulationError> {
    let first = body
        .as_array()
        .and_then(|entries| entries.first())
        .ok_or_else(|| PopulationError::DataUnavailable {
            message: format!("no country entry for {code}"),
        })?;

    let population = first
        .get("population")
        .and_then(serde_json::Value::as_i64)
        .filter(|p| *p > 0)
        .ok_or_else(|| PopulationError::DataUnavailable {
            message: format!("country {code} has no usable population"),
        })?;

    let area_sq_km = first
        .get("area")
        .and_then(serde_json::Value::as_f64)
        .filter(|a| *a > 0.0)
        .ok_or_else(|| PopulationError::DataUnavailable {
            message: format!("country {code} has no usable area"),
        })?;

    let name = first
        .pointer("/name/common")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(code)
        .to_string();

    #[allow(clippy::cast_sign_loss)]
    let population = population as u64;

    Ok(CountryFacts {
        code: code.to_string(),
        name,
        population,
        area_sq_km,
    })
}
