//! Orbital and link domain generators for property-based testing
//!
//! Ranges match what the libraries accept, so a failure is always a real
//! defect rather than a rejected input.

use chrono::{DateTime, TimeZone, Utc};
use link_budget::WeatherSample;
use orbital_mechanics::{GeodeticPosition, OrbitalElements};
use proptest::prelude::*;
use std::f64::consts::PI;

// ============================================================================
// Orbital Domain Generators
// ============================================================================

/// Altitude in km (LEO to GEO range)
pub fn altitude_km() -> impl Strategy<Value = f64> {
    200.0..=42_000.0
}

/// HALO constellation altitude (~10,500 km)
pub fn altitude_halo() -> impl Strategy<Value = f64> {
    10_000.0..=11_000.0
}

/// Mean motion in rev/day, GEO (~1) to very low LEO (~16)
pub fn mean_motion() -> impl Strategy<Value = f64> {
    1.0..=16.0
}

/// Eccentricity the Kepler solver is specified for
pub fn eccentricity() -> impl Strategy<Value = f64> {
    0.0..=0.9
}

/// Near-circular eccentricity (0-0.01)
pub fn eccentricity_circular() -> impl Strategy<Value = f64> {
    0.0..0.01
}

/// Inclination in degrees (0-180)
pub fn inclination_deg() -> impl Strategy<Value = f64> {
    0.0..=180.0
}

/// Any angle in [0, 360) degrees (RAAN, argument of perigee, mean anomaly)
pub fn angle_deg() -> impl Strategy<Value = f64> {
    0.0..360.0
}

/// Mean anomaly in [0, 2π) radians
pub fn mean_anomaly_rad() -> impl Strategy<Value = f64> {
    0.0..2.0 * PI
}

/// Sidereal angle in [0, 2π) radians
pub fn sidereal_angle() -> impl Strategy<Value = f64> {
    0.0..2.0 * PI
}

/// Latitude away from the poles (-89 to 89 deg)
pub fn latitude_deg() -> impl Strategy<Value = f64> {
    -89.0..=89.0
}

/// Longitude in the canonical half-open range (-180, 180]
pub fn longitude_deg() -> impl Strategy<Value = f64> {
    (-180.0..=180.0).prop_map(|lon: f64| if lon == -180.0 { 180.0 } else { lon })
}

/// Elevation above the horizon (0, 90] deg
pub fn elevation_deg() -> impl Strategy<Value = f64> {
    0.01..=90.0
}

/// Minutes after epoch, up to a week
pub fn minutes_since_epoch() -> impl Strategy<Value = f64> {
    0.0..=10_080.0
}

// ============================================================================
// Radiation Generators
// ============================================================================

/// L-shell covering both belts and the regions outside them
pub fn l_shell() -> impl Strategy<Value = f64> {
    0.5..=12.0
}

// ============================================================================
// Composite Generators
// ============================================================================

/// Fixed epoch so failures reproduce.
pub fn reference_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Walker layout (planes, satellites per plane, altitude) around the HALO shell
pub fn walker_shape() -> impl Strategy<Value = (u32, u32, f64)> {
    (1u32..=6, 1u32..=8, altitude_halo())
}

/// Validated element set with near-circular eccentricity
pub fn orbital_elements() -> impl Strategy<Value = OrbitalElements> {
    (
        mean_motion(),
        eccentricity_circular(),
        inclination_deg(),
        angle_deg(),
        angle_deg(),
        angle_deg(),
    )
        .prop_filter_map("valid elements", |(n, e, i, raan, argp, m)| {
            OrbitalElements::from_degrees(n, e, i, raan, argp, m, 0.0, reference_epoch()).ok()
        })
}

/// Ground station or satellite position (lat, lon, alt up to 40,000 km)
pub fn geodetic_position() -> impl Strategy<Value = GeodeticPosition> {
    (latitude_deg(), longitude_deg(), 0.0..=40_000.0).prop_map(|(latitude, longitude, altitude_km)| {
        GeodeticPosition { latitude, longitude, altitude_km }
    })
}

/// Ground station position (altitude 0-5 km)
pub fn ground_station_pos() -> impl Strategy<Value = GeodeticPosition> {
    (latitude_deg(), longitude_deg(), 0.0..=5.0).prop_map(|(latitude, longitude, altitude_km)| {
        GeodeticPosition { latitude, longitude, altitude_km }
    })
}

/// Physically plausible surface weather
pub fn weather_sample() -> impl Strategy<Value = WeatherSample> {
    (0.0..=100.0, 0.0..=40.0, 0.1..=60.0, 0.0..=100.0, -40.0..=45.0, 0.0..=20.0).prop_map(
        |(cloud, wind, visibility, humidity, temperature, precip)| WeatherSample {
            cloud_cover_pct: cloud,
            wind_speed_ms: wind,
            visibility_km: visibility,
            humidity_pct: humidity,
            temperature_c: temperature,
            precipitation_mm_h: precip,
        },
    )
}

/// Weather or no observation at all
pub fn maybe_weather() -> impl Strategy<Value = Option<WeatherSample>> {
    proptest::option::of(weather_sample())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_altitude_bounds(v in altitude_km()) {
            prop_assert!((200.0..=42_000.0).contains(&v));
        }

        #[test]
        fn test_longitude_canonical(v in longitude_deg()) {
            prop_assert!(v > -180.0 && v <= 180.0);
        }

        #[test]
        fn test_elements_are_closed_orbits(el in orbital_elements()) {
            prop_assert!(el.eccentricity() < 0.01);
            prop_assert!(el.mean_motion() >= 1.0);
        }

        #[test]
        fn test_walker_shape_bounds((planes, per_plane, alt) in walker_shape()) {
            prop_assert!(planes >= 1 && per_plane >= 1);
            prop_assert!((10_000.0..=11_000.0).contains(&alt));
        }

        #[test]
        fn test_weather_validates(wx in weather_sample()) {
            prop_assert!(wx.validated().is_ok());
        }
    }
}
