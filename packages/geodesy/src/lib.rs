#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spherical-Earth geodesy math.
//!
//! Pure great-circle calculations used to place population sample points
//! around an impact center. Everything here treats the Earth as a sphere
//! of radius [`EARTH_RADIUS_KM`]; the error versus an ellipsoid model is
//! far below the ~100 m resolution of the gridded population data.
//!
//! No input validation is performed: NaN in means NaN out.

/// Mean Earth radius in kilometers (IUGG spherical approximation).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Computes the point reached by traveling `distance_km` from
/// `(lat_deg, lon_deg)` along the great-circle `bearing_rad`
/// (radians, clockwise from north).
///
/// Uses the standard spherical direct formula:
///
/// ```text
/// φ2 = asin(sin φ1 · cos δ + cos φ1 · sin δ · cos θ)
/// λ2 = λ1 + atan2(sin θ · sin δ · cos φ1, cos δ − sin φ1 · sin φ2)
/// ```
///
/// where `δ = d / R` is the angular distance.
///
/// Returns `(latitude, longitude)` in degrees with the longitude
/// normalized into `(-180, 180]`.
#[must_use]
pub fn destination_point(
    lat_deg: f64,
    lon_deg: f64,
    distance_km: f64,
    bearing_rad: f64,
) -> (f64, f64) {
    let lat1 = lat_deg.to_radians();
    let lon1 = lon_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing_rad.cos()).asin();
    let lon2 = lon1
        + (bearing_rad.sin() * delta.sin() * lat1.cos())
            .atan2(delta.cos() - lat1.sin() * lat2.sin());

    (lat2.to_degrees(), normalize_longitude(lon2.to_degrees()))
}

/// Normalizes a longitude in degrees into the range `(-180, 180]`.
///
/// The antimeridian itself maps to `180`, never `-180`, so a given
/// meridian always has exactly one representation.
#[must_use]
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    180.0 - (180.0 - lon_deg).rem_euclid(360.0)
}
