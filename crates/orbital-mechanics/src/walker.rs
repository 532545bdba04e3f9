//! Walker Delta constellation generation
//!
//! ## Walker Delta Notation: T/P/F
//! - T = Total satellites
//! - P = Number of orbital planes
//! - F = Phasing factor (0 to P-1)
//!
//! HALO: 12/3/1 = 12 sats, 3 planes, phase factor 1, 4 per plane,
//! planes at 0°, 120°, 240° RAAN.

use crate::{
    OrbitalElements, OrbitalError, Result, Satellite, SatelliteStatus, MU_EARTH_KM3_S2,
    WGS84_A_KM,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Satellite names (Greek alphabet)
const SAT_NAMES: [&str; 12] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu",
];

/// First NORAD id handed out to generated satellites
const BASE_NORAD_ID: u32 = 90_001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerDelta {
    pub total_satellites: u32,
    pub planes: u32,
    pub phasing: u32,
    pub altitude_km: f64,
    pub inclination_deg: f64,
    #[serde(default)]
    pub eccentricity: f64,
}

impl WalkerDelta {
    pub fn halo_constellation() -> Self {
        WalkerDelta {
            total_satellites: 12,
            planes: 3,
            phasing: 1,
            altitude_km: 10500.0,
            inclination_deg: 55.0,
            eccentricity: 0.0004,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.planes == 0 || self.total_satellites == 0 {
            return Err(OrbitalError::InvalidElements(
                "constellation needs at least one plane and one satellite".to_string(),
            ));
        }
        if self.total_satellites % self.planes != 0 {
            return Err(OrbitalError::InvalidElements(format!(
                "{} satellites do not split evenly into {} planes",
                self.total_satellites, self.planes
            )));
        }
        // Plane and slot indices are stored as u8 in the catalog
        if u8::try_from(self.planes - 1).is_err()
            || u8::try_from(self.satellites_per_plane() - 1).is_err()
        {
            return Err(OrbitalError::InvalidElements(format!(
                "{}/{} needs more than 256 planes or slots per plane",
                self.total_satellites, self.planes
            )));
        }
        if self.phasing >= self.planes {
            return Err(OrbitalError::InvalidElements(format!(
                "phasing {} must be below plane count {}",
                self.phasing, self.planes
            )));
        }
        if !(self.altitude_km.is_finite() && self.altitude_km > 0.0) {
            return Err(OrbitalError::InvalidElements(format!(
                "altitude {} km must be positive",
                self.altitude_km
            )));
        }
        Ok(())
    }

    pub fn satellites_per_plane(&self) -> u32 {
        self.total_satellites / self.planes
    }

    pub fn plane_spacing_deg(&self) -> f64 {
        360.0 / self.planes as f64
    }

    pub fn in_plane_spacing_deg(&self) -> f64 {
        360.0 / self.satellites_per_plane() as f64
    }

    /// Phase offset between adjacent planes: 360° / T * F
    pub fn phase_offset_deg(&self) -> f64 {
        360.0 / self.total_satellites as f64 * self.phasing as f64
    }

    /// Mean motion (rev/day) of a circular orbit at the design altitude.
    pub fn mean_motion(&self) -> f64 {
        let sma = WGS84_A_KM + self.altitude_km;
        let n_rad_s = (MU_EARTH_KM3_S2 / sma.powi(3)).sqrt();
        n_rad_s * 86400.0 / (2.0 * PI)
    }

    /// Element sets for every slot, plane-major.
    pub fn elements(&self, epoch: DateTime<Utc>) -> Result<Vec<OrbitalElements>> {
        self.validate()?;
        let mean_motion = self.mean_motion();
        let per_plane = self.satellites_per_plane();

        let mut out = Vec::with_capacity(self.total_satellites as usize);
        for plane in 0..self.planes {
            for slot in 0..per_plane {
                let raan = plane as f64 * self.plane_spacing_deg();
                let anomaly = slot as f64 * self.in_plane_spacing_deg()
                    + plane as f64 * self.phase_offset_deg();
                out.push(OrbitalElements::from_degrees(
                    mean_motion,
                    self.eccentricity,
                    self.inclination_deg,
                    raan,
                    0.0,
                    anomaly.rem_euclid(360.0),
                    0.0,
                    epoch,
                )?);
            }
        }
        Ok(out)
    }

    /// Catalog entries for the generated constellation.
    pub fn satellites(&self, epoch: DateTime<Utc>) -> Result<Vec<Satellite>> {
        let per_plane = self.satellites_per_plane();
        self.elements(epoch)?
            .into_iter()
            .enumerate()
            .map(|(i, elements)| {
                let index = u32::try_from(i).map_err(|_| {
                    OrbitalError::InvalidElements(format!("satellite index {i} out of range"))
                })?;
                let (plane, slot) = match (
                    u8::try_from(index / per_plane),
                    u8::try_from(index % per_plane),
                ) {
                    (Ok(plane), Ok(slot)) => (plane, slot),
                    _ => {
                        return Err(OrbitalError::InvalidElements(format!(
                            "satellite {index} does not fit a u8 plane/slot"
                        )))
                    }
                };
                let name = SAT_NAMES
                    .get(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("sat-{:03}", i + 1));
                Ok(Satellite {
                    id: format!("HALO-{:02}", i + 1),
                    norad_id: BASE_NORAD_ID + index,
                    name,
                    plane,
                    slot,
                    status: SatelliteStatus::Operational,
                    elements,
                })
            })
            .collect()
    }
}
