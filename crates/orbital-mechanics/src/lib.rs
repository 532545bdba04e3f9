//! Orbital Mechanics Library
//!
//! J2-corrected propagation, inertial/geodetic frame transforms, ground link
//! geometry, and the trapped-radiation environment for the HALO constellation
//! and any catalog satellite fed in as orbital elements.
//!
//! Every operation is a pure function over immutable value types. Time is
//! always an explicit argument (minutes since epoch, sidereal angle), so any
//! number of satellites can be evaluated concurrently without coordination.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod contact;
pub mod elements;
pub mod geometry;
pub mod kepler;
pub mod propagation;
pub mod radiation;
pub mod transforms;
pub mod walker;

pub use contact::{find_contact_windows, ContactWindow};
pub use elements::OrbitalElements;
pub use geometry::{GeometryConfig, LinkGeometry};
pub use kepler::KeplerSolution;
pub use radiation::RadiationSample;

/// Gravitational parameter μ in km³/s².
pub const MU_EARTH_KM3_S2: f64 = 398_600.4418;
/// Gravitational parameter μ in km³/min².
pub const MU_EARTH_KM3_MIN2: f64 = MU_EARTH_KM3_S2 * 3600.0;
/// Second zonal harmonic.
pub const J2: f64 = 0.00108263;
/// Mean Earth radius used by the propagator and radiation model (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// WGS84 equatorial radius (km).
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS84 flattening.
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;
/// Earth rotation rate (rad/s).
pub const EARTH_ROTATION_RAD_S: f64 = 7.2921159e-5;
/// Speed of light (km/s).
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;
pub const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Invalid orbital elements: {0}")]
    InvalidElements(String),
    #[error("Invalid TLE format: {0}")]
    InvalidTle(String),
    #[error("Propagation failed: {0}")]
    PropagationFailed(String),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Degenerate link geometry: {0}")]
    DegenerateGeometry(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Catalog entry for one satellite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Satellite {
    pub id: String,
    pub norad_id: u32,
    pub name: String,
    pub plane: u8,
    pub slot: u8,
    pub status: SatelliteStatus,
    pub elements: OrbitalElements,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum SatelliteStatus {
    Operational,
    Spare,
    Maneuvering,
    Degraded,
    Offline,
}

/// Position (km) and velocity (km/min) in the Earth-centered inertial frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl InertialState {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// State with zero velocity, as produced for fixed ground points.
    pub fn at_rest(position: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.position.norm()
    }

    pub fn speed_km_s(&self) -> f64 {
        self.velocity.norm() / 60.0
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|v| v.is_finite())
    }
}

/// Latitude/longitude in degrees, altitude in km above the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

impl GeodeticPosition {
    /// Builds a position, normalizing longitude into (-180, 180].
    pub fn new(latitude: f64, longitude: f64, altitude_km: f64) -> Result<Self> {
        if !(latitude.is_finite() && longitude.is_finite() && altitude_km.is_finite()) {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "non-finite position ({latitude}, {longitude}, {altitude_km})"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        Ok(Self {
            latitude,
            longitude: transforms::normalize_longitude(longitude),
            altitude_km,
        })
    }
}

impl Satellite {
    pub fn propagate(&self, minutes_since_epoch: f64) -> Result<InertialState> {
        propagation::propagate(&self.elements, minutes_since_epoch)
    }

    pub fn ground_track(&self, time: DateTime<Utc>) -> Result<GeodeticPosition> {
        let state = propagation::propagate_at(&self.elements, time)?;
        Ok(transforms::to_geodetic(&state, transforms::sidereal_time(time)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geodetic_position_normalizes_longitude() {
        let pos = GeodeticPosition::new(10.0, 190.0, 0.0).unwrap();
        assert!((pos.longitude + 170.0).abs() < 1e-12);

        let pos = GeodeticPosition::new(10.0, -180.0, 0.0).unwrap();
        assert_eq!(pos.longitude, 180.0);
    }

    #[test]
    fn test_geodetic_position_rejects_bad_latitude() {
        assert!(GeodeticPosition::new(91.0, 0.0, 0.0).is_err());
        assert!(GeodeticPosition::new(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_value_types_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OrbitalElements>();
        assert_send_sync::<InertialState>();
        assert_send_sync::<GeodeticPosition>();
        assert_send_sync::<LinkGeometry>();
        assert_send_sync::<RadiationSample>();
    }
}
