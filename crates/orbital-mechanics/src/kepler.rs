//! Kepler's equation solver.
//!
//! Newton iteration on `E - e·sin(E) = M`. The solver never fails: it returns
//! the best estimate reached together with enough information for the caller
//! to decide whether that estimate is good enough.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const KEPLER_TOLERANCE: f64 = 1e-8;
pub const KEPLER_MAX_ITERATIONS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerSolution {
    /// Eccentric anomaly (rad)
    pub eccentric_anomaly: f64,
    /// Newton steps taken
    pub iterations: u32,
    /// |E - e·sin(E) - M| at the returned estimate
    pub residual: f64,
    /// Last step was below tolerance
    pub converged: bool,
}

/// Solve Kepler's equation for the eccentric anomaly.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let e = eccentricity;
    // Solve on [0, 2π) and shift back so E stays continuous in M.
    let m = mean_anomaly.rem_euclid(2.0 * PI);
    let revolutions = mean_anomaly - m;

    // Danby starter
    let sin_m = m.sin();
    let direction = if sin_m > 0.0 {
        1.0
    } else if sin_m < 0.0 {
        -1.0
    } else {
        0.0
    };
    let mut ecc_anomaly = m + 0.85 * e * direction;

    let mut iterations = 0;
    let mut converged = false;
    while iterations < KEPLER_MAX_ITERATIONS {
        let f = ecc_anomaly - e * ecc_anomaly.sin() - m;
        let f_prime = 1.0 - e * ecc_anomaly.cos();
        let delta = f / f_prime;
        ecc_anomaly -= delta;
        iterations += 1;
        if delta.abs() < KEPLER_TOLERANCE {
            converged = true;
            break;
        }
    }

    KeplerSolution {
        eccentric_anomaly: ecc_anomaly + revolutions,
        iterations,
        residual: (ecc_anomaly - e * ecc_anomaly.sin() - m).abs(),
        converged,
    }
}

/// Eccentric anomaly only, best effort.
#[inline]
pub fn eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> f64 {
    solve_kepler(mean_anomaly, eccentricity).eccentric_anomaly
}

/// True anomaly from eccentric anomaly via the half-angle formula.
#[inline]
pub fn true_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let half = eccentric_anomaly / 2.0;
    2.0 * ((1.0 + eccentricity).sqrt() * half.sin())
        .atan2((1.0 - eccentricity).sqrt() * half.cos())
}
