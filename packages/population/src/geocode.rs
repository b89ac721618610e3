//! Reverse geocoder client (coordinate → country).
//!
//! Uses the BigDataCloud client-side reverse geocoding endpoint, which
//! needs no API key. A single GET resolves a coordinate to an ISO
//! 3166-1 alpha-2 country code plus a display name.
//!
//! See <https://www.bigdatacloud.com/docs/api/free-reverse-geocode-to-city-api>

use impact_map_population_models::Coordinate;

use crate::{PopulationError, source_registry::ReverseGeocodeConfig};

/// A country identity resolved from a coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCountry {
    /// ISO 3166-1 alpha-2 code (e.g. "US").
    pub code: String,
    /// Country display name, when the response carries one.
    pub name: Option<String>,
}

/// Resolves the country containing `coordinate`.
///
/// # Errors
///
/// Returns [`PopulationError::LookupFailed`] if the service responds
/// non-2xx or the response carries no country code, and
/// [`PopulationError::Http`] on transport failures.
pub async fn reverse_geocode(
    client: &reqwest::Client,
    config: &ReverseGeocodeConfig,
    coordinate: Coordinate,
) -> Result<ResolvedCountry, PopulationError> {
    let resp = client
        .get(&config.base_url)
        .query(&[
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("localityLanguage", config.locality_language.clone()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PopulationError::LookupFailed {
            message: format!("reverse geocoder returned status {}", resp.status()),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a reverse geocode JSON response.
fn parse_response(body: &serde_json::Value) -> Result<ResolvedCountry, PopulationError> {
    let code = body
        .get("countryCode")
        .and_then(serde_json::Value::as_str)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| PopulationError::LookupFailed {
            message: "response has no countryCode".to_string(),
        })?;

    let name = body
        .get("countryName")
        .and_then(serde_json::Value::as_str)
        .filter(|n| !n.is_empty())
        .map(String::from);

    Ok(ResolvedCountry {
        code: code.to_string(),
        name,
    })
}
