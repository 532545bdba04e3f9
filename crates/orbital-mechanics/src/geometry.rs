//! Ground/satellite link geometry
//!
//! Topocentric look angles, slant range, visibility against a horizon mask,
//! and Doppler shift along the line of sight.

use crate::transforms::{normalize_azimuth, to_inertial};
use crate::{
    GeodeticPosition, InertialState, OrbitalError, Result, EARTH_ROTATION_RAD_S,
    SPEED_OF_LIGHT_KM_S,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default horizon mask (deg)
pub const DEFAULT_HORIZON_MASK_DEG: f64 = 10.0;
/// 1550 nm optical carrier (GHz)
pub const DEFAULT_CARRIER_GHZ: f64 = SPEED_OF_LIGHT_KM_S / 1550e-12 / 1e9;

/// Minimum meaningful slant range (km)
const MIN_RANGE_KM: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Elevation a satellite must exceed to count as visible (deg)
    pub horizon_mask_deg: f64,
    /// Carrier used for the Doppler estimate (GHz)
    pub carrier_frequency_ghz: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            horizon_mask_deg: DEFAULT_HORIZON_MASK_DEG,
            carrier_frequency_ghz: DEFAULT_CARRIER_GHZ,
        }
    }
}

impl GeometryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn horizon_mask(mut self, deg: f64) -> Self {
        self.horizon_mask_deg = deg;
        self
    }

    pub fn carrier_ghz(mut self, ghz: f64) -> Self {
        self.carrier_frequency_ghz = ghz;
        self
    }
}

/// Look angles and link kinematics from a ground point to a satellite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkGeometry {
    pub range_km: f64,
    /// 0 = North, 90 = East
    pub azimuth_deg: f64,
    /// 0 = horizon, 90 = zenith
    pub elevation_deg: f64,
    pub visible: bool,
    /// Positive when the satellite recedes (km/s)
    pub range_rate_km_s: f64,
    /// Received minus transmitted frequency (GHz)
    pub doppler_shift_ghz: f64,
}

/// Inertial state of a fixed ground point, including Earth-rotation velocity.
pub fn ground_state(ground: &GeodeticPosition, sidereal_time: f64) -> InertialState {
    let position = to_inertial(ground, sidereal_time).position;
    let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RAD_S * 60.0);
    InertialState::new(position, omega.cross(&position))
}

/// Rate of change of slant range (km/s), positive when receding.
pub fn range_rate(satellite: &InertialState, ground: &InertialState) -> f64 {
    let line_of_sight = satellite.position - ground.position;
    let range = line_of_sight.norm();
    if range < MIN_RANGE_KM {
        return 0.0;
    }
    let relative_velocity = satellite.velocity - ground.velocity;
    relative_velocity.dot(&line_of_sight) / range / 60.0
}

/// Doppler shift in the carrier's unit.
///
/// Positive when the satellite approaches the ground point.
pub fn doppler_shift(satellite: &InertialState, ground: &InertialState, carrier_ghz: f64) -> f64 {
    -carrier_ghz * range_rate(satellite, ground) / SPEED_OF_LIGHT_KM_S
}

/// Full link geometry between a satellite and a ground point.
pub fn geometry(
    satellite: &InertialState,
    ground: &GeodeticPosition,
    sidereal_time: f64,
    config: &GeometryConfig,
) -> Result<LinkGeometry> {
    if !satellite.is_finite() {
        return Err(OrbitalError::DegenerateGeometry("non-finite satellite state".to_string()));
    }

    let station = ground_state(ground, sidereal_time);
    let rho = satellite.position - station.position;
    let range_km = rho.norm();
    if range_km < MIN_RANGE_KM {
        return Err(OrbitalError::DegenerateGeometry(format!(
            "satellite coincides with ground point ({range_km} km)"
        )));
    }

    // East-North-Up at the station; local sidereal angle replaces longitude.
    let lat = ground.latitude.to_radians();
    let lst = ground.longitude.to_radians() + sidereal_time;
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lst, cos_lst) = lst.sin_cos();

    let east = -sin_lst * rho.x + cos_lst * rho.y;
    let north = -sin_lat * cos_lst * rho.x - sin_lat * sin_lst * rho.y + cos_lat * rho.z;
    let up = cos_lat * cos_lst * rho.x + cos_lat * sin_lst * rho.y + sin_lat * rho.z;

    let azimuth_deg = normalize_azimuth(east.atan2(north).to_degrees());
    let elevation_deg = (up / range_km).clamp(-1.0, 1.0).asin().to_degrees();

    let range_rate_km_s = range_rate(satellite, &station);
    let doppler_shift_ghz = doppler_shift(satellite, &station, config.carrier_frequency_ghz);

    trace!(range_km, azimuth_deg, elevation_deg, "look angles");

    Ok(LinkGeometry {
        range_km,
        azimuth_deg,
        elevation_deg,
        visible: elevation_deg > config.horizon_mask_deg,
        range_rate_km_s,
        doppler_shift_ghz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::to_inertial;
    use crate::WGS84_A_KM;

    fn origin() -> GeodeticPosition {
        GeodeticPosition { latitude: 0.0, longitude: 0.0, altitude_km: 0.0 }
    }

    fn satellite_over(lat: f64, lon: f64, alt: f64, theta: f64) -> InertialState {
        to_inertial(&GeodeticPosition { latitude: lat, longitude: lon, altitude_km: alt }, theta)
    }

    fn angle_diff(a: f64, b: f64) -> f64 {
        ((a - b + 540.0).rem_euclid(360.0) - 180.0).abs()
    }

    #[test]
    fn test_overhead_satellite() {
        let sat = InertialState::at_rest(Vector3::new(WGS84_A_KM + 500.0, 0.0, 0.0));
        let geo = geometry(&sat, &origin(), 0.0, &GeometryConfig::default()).unwrap();
        assert!((geo.range_km - 500.0).abs() < 1e-6);
        assert!((geo.elevation_deg - 90.0).abs() < 1e-6);
        assert!(geo.visible);
    }

    #[test]
    fn test_azimuth_cardinal_directions() {
        let theta = 0.7;
        let cfg = GeometryConfig::default();

        let north = geometry(&satellite_over(10.0, 0.0, 1000.0, theta), &origin(), theta, &cfg).unwrap();
        assert!(angle_diff(north.azimuth_deg, 0.0) < 1e-6);

        let east = geometry(&satellite_over(0.0, 10.0, 1000.0, theta), &origin(), theta, &cfg).unwrap();
        assert!((east.azimuth_deg - 90.0).abs() < 1e-6);

        let south = geometry(&satellite_over(-10.0, 0.0, 1000.0, theta), &origin(), theta, &cfg).unwrap();
        assert!((south.azimuth_deg - 180.0).abs() < 1e-6);

        let west = geometry(&satellite_over(0.0, -10.0, 1000.0, theta), &origin(), theta, &cfg).unwrap();
        assert!((west.azimuth_deg - 270.0).abs() < 1e-6);
        assert!((0.0..360.0).contains(&west.azimuth_deg));
    }

    #[test]
    fn test_far_side_not_visible() {
        let sat = satellite_over(-34.0, 62.0, 500.0, 0.0);
        let ground = GeodeticPosition { latitude: 34.0, longitude: -118.0, altitude_km: 0.1 };
        let geo = geometry(&sat, &ground, 0.0, &GeometryConfig::default()).unwrap();
        assert!(geo.elevation_deg < 0.0);
        assert!(geo.elevation_deg >= -90.0);
        assert!(!geo.visible);
    }

    #[test]
    fn test_horizon_mask_is_configurable() {
        let sat = satellite_over(0.0, 20.0, 1000.0, 0.0);
        let low = geometry(&sat, &origin(), 0.0, &GeometryConfig::new().horizon_mask(0.0)).unwrap();
        let el = low.elevation_deg;
        assert!(el > 0.0 && el < 30.0, "el = {el}");

        let above = GeometryConfig::new().horizon_mask(el - 1.0);
        let below = GeometryConfig::new().horizon_mask(el + 1.0);
        assert!(geometry(&sat, &origin(), 0.0, &above).unwrap().visible);
        assert!(!geometry(&sat, &origin(), 0.0, &below).unwrap().visible);
    }

    #[test]
    fn test_doppler_sign_and_scale() {
        let ground = InertialState::at_rest(Vector3::new(WGS84_A_KM, 0.0, 0.0));
        // 1 km/s straight down toward the station
        let approaching = InertialState::new(
            Vector3::new(WGS84_A_KM + 500.0, 0.0, 0.0),
            Vector3::new(-60.0, 0.0, 0.0),
        );
        let shift = doppler_shift(&approaching, &ground, 1.0);
        assert!((shift - 1.0 / SPEED_OF_LIGHT_KM_S).abs() < 1e-15);
        assert!((range_rate(&approaching, &ground) + 1.0).abs() < 1e-12);

        let receding = InertialState::new(approaching.position, -approaching.velocity);
        assert!(doppler_shift(&receding, &ground, 1.0) < 0.0);
    }

    #[test]
    fn test_ground_state_rotation_speed() {
        let station = ground_state(&origin(), 0.0);
        let speed_km_s = station.speed_km_s();
        assert!((speed_km_s - EARTH_ROTATION_RAD_S * WGS84_A_KM).abs() < 1e-9);
        // Eastward at the prime meridian with θ = 0
        assert!(station.velocity.y > 0.0);
    }

    #[test]
    fn test_coincident_points_rejected() {
        let sat = satellite_over(0.0, 0.0, 0.0, 0.0);
        let err = geometry(&sat, &origin(), 0.0, &GeometryConfig::default());
        assert!(matches!(err, Err(OrbitalError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_default_carrier_is_optical() {
        assert!((DEFAULT_CARRIER_GHZ - 193_414.489).abs() < 0.01);
    }
}
