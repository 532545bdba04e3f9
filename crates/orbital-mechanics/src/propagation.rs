//! Simplified SGP4-style propagation.
//!
//! Mean motion is recovered from the catalog value with a first-order J2
//! secular correction, the mean anomaly advances linearly, and the state is
//! built from a single Kepler solve. No drag or short-periodic terms.

use crate::kepler::{solve_kepler, true_anomaly};
use crate::{
    InertialState, OrbitalElements, OrbitalError, Result, EARTH_RADIUS_KM, J2, MINUTES_PER_DAY,
    MU_EARTH_KM3_MIN2,
};
use chrono::{DateTime, Utc};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{trace, warn};

/// J2-corrected mean quantities derived from an element set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanElements {
    /// Unperturbed semi-major axis from Kepler's third law (km)
    pub semi_major_axis_unperturbed_km: f64,
    /// Corrected semi-major axis (km)
    pub semi_major_axis_km: f64,
    /// Corrected mean motion (rad/min)
    pub mean_motion_rad_min: f64,
    /// Anomalistic period (min)
    pub period_minutes: f64,
}

/// Recover corrected semi-major axis and mean motion.
pub fn mean_elements(elements: &OrbitalElements) -> MeanElements {
    let n0 = elements.mean_motion_rad_min();
    let e = elements.eccentricity();
    let cos_i = elements.inclination().cos();

    let a0 = (MU_EARTH_KM3_MIN2 / (n0 * n0)).cbrt();

    let shape = (3.0 * cos_i * cos_i - 1.0) / (1.0 - e * e).powf(1.5);
    let d1 = 0.75 * J2 * (EARTH_RADIUS_KM / a0).powi(2) * shape;
    let a1 = a0 * (1.0 - d1 / 3.0 - d1 * d1 - 134.0 / 81.0 * d1.powi(3));
    let d0 = 0.75 * J2 * (EARTH_RADIUS_KM / a1).powi(2) * shape;

    let n = n0 / (1.0 + d0);
    let a = a1 / (1.0 - d0);

    MeanElements {
        semi_major_axis_unperturbed_km: a0,
        semi_major_axis_km: a,
        mean_motion_rad_min: n,
        period_minutes: 2.0 * PI / n,
    }
}

/// Orbital period in minutes, using the corrected mean motion.
pub fn orbital_period_minutes(elements: &OrbitalElements) -> f64 {
    mean_elements(elements).period_minutes
}

/// J2 secular drift of the ascending node (rad/day).
pub fn nodal_precession_rate(elements: &OrbitalElements) -> f64 {
    let mean = mean_elements(elements);
    let e = elements.eccentricity();
    let p = mean.semi_major_axis_km * (1.0 - e * e);

    let drift_rad_min = -1.5
        * mean.mean_motion_rad_min
        * J2
        * (EARTH_RADIUS_KM / p).powi(2)
        * elements.inclination().cos();
    drift_rad_min * MINUTES_PER_DAY
}

/// Propagate elements to `minutes_since_epoch`.
///
/// Position in km, velocity in km/min, both in the inertial frame.
pub fn propagate(elements: &OrbitalElements, minutes_since_epoch: f64) -> Result<InertialState> {
    if !minutes_since_epoch.is_finite() {
        return Err(OrbitalError::PropagationFailed(format!(
            "non-finite time offset {minutes_since_epoch}"
        )));
    }

    let mean = mean_elements(elements);
    let e = elements.eccentricity();
    let a = mean.semi_major_axis_km;

    let mean_anomaly = elements.mean_anomaly() + mean.mean_motion_rad_min * minutes_since_epoch;
    let solution = solve_kepler(mean_anomaly, e);
    if !solution.converged {
        warn!(
            eccentricity = e,
            residual = solution.residual,
            iterations = solution.iterations,
            "Kepler solve did not converge, using best estimate"
        );
    }
    let nu = true_anomaly(solution.eccentric_anomaly, e);

    // Perifocal frame
    let p = a * (1.0 - e * e);
    let radius = a * (1.0 - e * solution.eccentric_anomaly.cos());
    let position_pf = Vector3::new(radius * nu.cos(), radius * nu.sin(), 0.0);

    // Vis-viva speed along the perifocal flight direction
    let speed = (MU_EARTH_KM3_MIN2 * (2.0 / radius - 1.0 / a)).sqrt();
    let flight_dir = Vector3::new(-nu.sin(), e + nu.cos(), 0.0);
    let velocity_pf = flight_dir.normalize() * speed;

    let rotation = perifocal_to_inertial(elements);
    let state = InertialState::new(rotation * position_pf, rotation * velocity_pf);

    trace!(
        minutes = minutes_since_epoch,
        radius_km = radius,
        semi_latus_km = p,
        "propagated"
    );

    if !state.is_finite() {
        return Err(OrbitalError::PropagationFailed(format!(
            "non-finite state at t={minutes_since_epoch} min"
        )));
    }
    Ok(state)
}

/// Propagate to an absolute instant.
pub fn propagate_at(elements: &OrbitalElements, time: DateTime<Utc>) -> Result<InertialState> {
    propagate(elements, elements.minutes_since_epoch(time))
}

/// R3(-Ω)·R1(-i)·R3(-ω)
fn perifocal_to_inertial(elements: &OrbitalElements) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), elements.raan())
        * Rotation3::from_axis_angle(&Vector3::x_axis(), elements.inclination())
        * Rotation3::from_axis_angle(&Vector3::z_axis(), elements.arg_perigee())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn leo() -> OrbitalElements {
        let epoch = Utc.with_ymd_and_hms(2024, 2, 13, 16, 0, 0).unwrap();
        OrbitalElements::from_degrees(14.2, 0.0005, 51.6, 0.0, 0.0, 0.0, 0.0, epoch).unwrap()
    }

    #[test]
    fn test_initial_radius_matches_third_law() {
        let el = leo();
        let n0 = el.mean_motion_rad_min();
        let a_expected = (MU_EARTH_KM3_MIN2 / (n0 * n0)).cbrt();

        let state = propagate(&el, 0.0).unwrap();
        let r = state.radius_km();
        assert!((r - a_expected * (1.0 - el.eccentricity())).abs() < 5.0, "r = {r}");
        // ~830 km LEO
        assert!(r - EARTH_RADIUS_KM > 780.0 && r - EARTH_RADIUS_KM < 880.0);
    }

    #[test]
    fn test_half_period_is_opposite() {
        let el = leo();
        let start = propagate(&el, 0.0).unwrap().position;
        let half = propagate(&el, orbital_period_minutes(&el) / 2.0).unwrap().position;

        let error = (half + start).norm() / start.norm();
        assert!(error < 0.05, "relative error {error}");
    }

    #[test]
    fn test_full_period_returns() {
        let el = leo();
        let period = orbital_period_minutes(&el);
        let a = propagate(&el, 12.0).unwrap();
        let b = propagate(&el, 12.0 + period).unwrap();
        assert!((a.position - b.position).norm() < 1e-3);
        assert!((a.velocity - b.velocity).norm() < 1e-5);
    }

    #[test]
    fn test_velocity_is_circular_speed() {
        let el = leo();
        let state = propagate(&el, 30.0).unwrap();
        let v_circ = (crate::MU_EARTH_KM3_S2 / state.radius_km()).sqrt();
        assert!((state.speed_km_s() - v_circ).abs() < 0.02);
        // Prograde orbit: angular momentum points north
        assert!(state.position.cross(&state.velocity).z > 0.0);
    }

    #[test]
    fn test_period_close_to_catalog_value() {
        let el = leo();
        let period = orbital_period_minutes(&el);
        assert!((period - MINUTES_PER_DAY / 14.2).abs() < 0.5);
    }

    #[test]
    fn test_nodal_precession_direction() {
        let prograde = leo();
        assert!(nodal_precession_rate(&prograde) < 0.0);

        let retrograde = OrbitalElements::from_degrees(
            14.2,
            0.0005,
            98.0,
            0.0,
            0.0,
            0.0,
            0.0,
            prograde.epoch(),
        )
        .unwrap();
        assert!(nodal_precession_rate(&retrograde) > 0.0);
    }

    #[test]
    fn test_rejects_non_finite_time() {
        assert!(propagate(&leo(), f64::INFINITY).is_err());
    }

    #[test]
    fn test_corrected_axis_uses_delta1_recovery() {
        let el = leo();
        let mean = mean_elements(&el);
        let a0 = mean.semi_major_axis_unperturbed_km;

        let cos_i = el.inclination().cos();
        let e = el.eccentricity();
        let shape = (3.0 * cos_i * cos_i - 1.0) / (1.0 - e * e).powf(1.5);
        let d1 = 0.75 * J2 * (EARTH_RADIUS_KM / a0).powi(2) * shape;
        let a1 = a0 * (1.0 - d1 / 3.0 - d1 * d1 - 134.0 / 81.0 * d1.powi(3));
        let d0 = 0.75 * J2 * (EARTH_RADIUS_KM / a1).powi(2) * shape;

        assert!((mean.semi_major_axis_km - a1 / (1.0 - d0)).abs() < 1e-9);
        // Sub-km shift from the unperturbed axis for this LEO
        assert!((mean.semi_major_axis_km - a0).abs() < 1.0);
        assert!((mean.semi_major_axis_km - a0 / (1.0 - d0)).abs() > 1e-3);
    }
}
