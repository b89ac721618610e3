//! HTTP handler functions for the impact map API.

use actix_web::{HttpResponse, web};
use impact_map_population::PopulationError;
use impact_map_population_models::Coordinate;
use impact_map_server_models::{ApiHealth, CasualtyQueryParams, DensityQueryParams};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/density`
///
/// Resolves a best-effort population density for a coordinate. Always
/// succeeds for in-range coordinates — remote failures degrade to
/// fallback tiers inside the pipeline.
pub async fn density(
    state: web::Data<AppState>,
    params: web::Query<DensityQueryParams>,
) -> HttpResponse {
    let Some(coordinate) = validate_coordinate(params.lat, params.lon) else {
        return bad_request("lat must be in [-90, 90] and lon in [-180, 180]");
    };

    let result = state.population.resolve_density(coordinate).await;
    HttpResponse::Ok().json(result)
}

/// `GET /api/casualties`
///
/// Estimates casualties for a blast radius around a coordinate.
pub async fn casualties(
    state: web::Data<AppState>,
    params: web::Query<CasualtyQueryParams>,
) -> HttpResponse {
    let Some(coordinate) = validate_coordinate(params.lat, params.lon) else {
        return bad_request("lat must be in [-90, 90] and lon in [-180, 180]");
    };

    match state
        .population
        .estimate_casualties(coordinate, params.radius_m)
        .await
    {
        Ok(estimate) => HttpResponse::Ok().json(estimate),
        Err(e @ PopulationError::InvalidInput { .. }) => bad_request(&e.to_string()),
        Err(e) => {
            // The pipeline degrades internally; anything else reaching
            // here is a programming error worth surfacing loudly.
            log::error!("Casualty estimation failed unexpectedly: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "estimation failed"
            }))
        }
    }
}

/// Validates latitude/longitude ranges.
fn validate_coordinate(lat: f64, lon: f64) -> Option<Coordinate> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some(Coordinate::new(lat, lon))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_in_range_coordinates() {
        assert!(validate_coordinate(41.8827, -87.6278).is_some());
        assert!(validate_coordinate(-90.0, 180.0).is_some());
        assert!(validate_coordinate(90.0, -180.0).is_some());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_coordinate(91.0, 0.0).is_none());
        assert!(validate_coordinate(0.0, 181.0).is_none());
        assert!(validate_coordinate(f64::NAN, 0.0).is_none());
        assert!(validate_coordinate(0.0, f64::NEG_INFINITY).is_none());
    }
}
