//! Trapped-radiation environment
//!
//! Centered-dipole geomagnetic field, McIlwain L-shell, a two-belt trapped
//! flux model, the South Atlantic Anomaly box and single-event-upset odds.
//!
//! # Van Allen Belts
//! - Inner belt: L 1.5–2.5, 1,000–6,000 km (protons)
//! - Slot region between the belts
//! - Outer belt: L 3.5–5.5, 10,000–25,000 km (electrons)

use crate::{GeodeticPosition, InertialState, EARTH_RADIUS_KM};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// μ0/4π · M for the geomagnetic dipole (T·m³)
pub const DIPOLE_MOMENT: f64 = 7.94e15;

/// Trapped flux only exists between these L values
pub const L_SHELL_MIN: f64 = 1.2;
pub const L_SHELL_MAX: f64 = 7.0;

/// Peak flux (particles/cm²/s)
pub const INNER_BELT_PEAK_FLUX: f64 = 1e8;
pub const OUTER_BELT_PEAK_FLUX: f64 = 1e7;

/// Flux at which an upset becomes certain
pub const SEU_SATURATION_FLUX: f64 = 1e9;

pub const PROTON_FRACTION: f64 = 0.6;
pub const ELECTRON_FRACTION: f64 = 0.4;

/// cos² floor so polar L values stay finite
const MIN_COS2_LATITUDE: f64 = 1e-12;

/// Rectangular L/altitude window with a Gaussian profile in L.
struct Belt {
    l_min: f64,
    l_max: f64,
    altitude_min_km: f64,
    altitude_max_km: f64,
    peak_flux: f64,
}

impl Belt {
    fn flux(&self, l_shell: f64, altitude_km: f64) -> f64 {
        if !(self.l_min..=self.l_max).contains(&l_shell)
            || !(self.altitude_min_km..=self.altitude_max_km).contains(&altitude_km)
        {
            return 0.0;
        }
        let center = (self.l_min + self.l_max) / 2.0;
        let sigma = (self.l_max - self.l_min) / 4.0;
        self.peak_flux * (-(l_shell - center).powi(2) / (2.0 * sigma * sigma)).exp()
    }
}

const INNER_BELT: Belt = Belt {
    l_min: 1.5,
    l_max: 2.5,
    altitude_min_km: 1000.0,
    altitude_max_km: 6000.0,
    peak_flux: INNER_BELT_PEAK_FLUX,
};

const OUTER_BELT: Belt = Belt {
    l_min: 3.5,
    l_max: 5.5,
    altitude_min_km: 10_000.0,
    altitude_max_km: 25_000.0,
    peak_flux: OUTER_BELT_PEAK_FLUX,
};

/// South Atlantic Anomaly box
pub const SAA_CENTER_LAT: f64 = -30.0;
pub const SAA_CENTER_LON: f64 = -50.0;
pub const SAA_HALF_WIDTH_LAT: f64 = 25.0;
pub const SAA_HALF_WIDTH_LON: f64 = 35.0;
pub const SAA_ALTITUDE_MIN_KM: f64 = 200.0;
pub const SAA_ALTITUDE_MAX_KM: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagneticField {
    /// Field vector in the inertial frame (nT)
    pub vector_nt: Vector3<f64>,
    pub magnitude_nt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiationSample {
    /// Earth radii
    pub l_shell: f64,
    pub field: MagneticField,
    /// particles/cm²/s
    pub total_flux: f64,
    pub proton_flux: f64,
    pub electron_flux: f64,
    pub in_belt: bool,
    pub in_saa: bool,
    /// [0, 1]
    pub seu_probability: f64,
}

/// Dipole L-shell. Grows without bound toward the poles.
pub fn l_shell(geodetic: &GeodeticPosition) -> f64 {
    let r = (EARTH_RADIUS_KM + geodetic.altitude_km) / EARTH_RADIUS_KM;
    let cos_lat = geodetic.latitude.to_radians().cos();
    r / (cos_lat * cos_lat).max(MIN_COS2_LATITUDE)
}

/// Centered dipole field at an inertial position (km), moment along -z.
pub fn magnetic_field(position: &Vector3<f64>) -> MagneticField {
    let r_km = position.norm();
    if r_km < 1e-6 {
        debug!("field requested at Earth center");
        return MagneticField {
            vector_nt: Vector3::zeros(),
            magnitude_nt: 0.0,
        };
    }

    let r_m = r_km * 1e3;
    let r_hat = position / r_km;
    let m_hat = Vector3::new(0.0, 0.0, -1.0);

    let scale = DIPOLE_MOMENT / r_m.powi(3) * 1e9;
    let vector_nt = (r_hat * (3.0 * m_hat.dot(&r_hat)) - m_hat) * scale;

    MagneticField {
        vector_nt,
        magnitude_nt: vector_nt.norm(),
    }
}

/// Trapped flux (particles/cm²/s) for an L-shell and altitude.
pub fn radiation_flux(l_shell: f64, altitude_km: f64) -> f64 {
    if !l_shell.is_finite() || !(L_SHELL_MIN..=L_SHELL_MAX).contains(&l_shell) {
        return 0.0;
    }
    INNER_BELT.flux(l_shell, altitude_km) + OUTER_BELT.flux(l_shell, altitude_km)
}

pub fn in_south_atlantic_anomaly(geodetic: &GeodeticPosition) -> bool {
    (geodetic.latitude - SAA_CENTER_LAT).abs() <= SAA_HALF_WIDTH_LAT
        && (geodetic.longitude - SAA_CENTER_LON).abs() <= SAA_HALF_WIDTH_LON
        && (SAA_ALTITUDE_MIN_KM..=SAA_ALTITUDE_MAX_KM).contains(&geodetic.altitude_km)
}

/// Probability of a single-event upset for a given flux.
pub fn seu_probability(flux: f64) -> f64 {
    (flux / SEU_SATURATION_FLUX).clamp(0.0, 1.0)
}

/// Full radiation sample for one satellite state.
pub fn radiation_parameters(state: &InertialState, geodetic: &GeodeticPosition) -> RadiationSample {
    let l = l_shell(geodetic);
    let total_flux = radiation_flux(l, geodetic.altitude_km);

    RadiationSample {
        l_shell: l,
        field: magnetic_field(&state.position),
        total_flux,
        proton_flux: total_flux * PROTON_FRACTION,
        electron_flux: total_flux * ELECTRON_FRACTION,
        in_belt: total_flux > 0.0,
        in_saa: in_south_atlantic_anomaly(geodetic),
        seu_probability: seu_probability(total_flux),
    }
}
