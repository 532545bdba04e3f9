//! Contact Window Calculator
//!
//! Finds when a satellite is visible from a ground station by sampling the
//! propagator over a span of minutes. Used for scheduling passes and planning
//! tracking operations.

use crate::geometry::{geometry, GeometryConfig, LinkGeometry};
use crate::propagation::propagate;
use crate::transforms::sidereal_time;
use crate::{GeodeticPosition, OrbitalElements, OrbitalError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A contact window (satellite pass). Times are minutes since element epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactWindow {
    /// Acquisition of Signal
    pub aos_minutes: f64,
    /// Loss of Signal
    pub los_minutes: f64,
    /// Time of Closest Approach
    pub tca_minutes: f64,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
}

impl ContactWindow {
    pub fn duration_minutes(&self) -> f64 {
        self.los_minutes - self.aos_minutes
    }
}

struct OpenPass {
    aos: f64,
    aos_azimuth: f64,
    tca: f64,
    max_elevation: f64,
}

impl OpenPass {
    fn close(self, los: f64, los_azimuth: f64) -> ContactWindow {
        ContactWindow {
            aos_minutes: self.aos,
            los_minutes: los,
            tca_minutes: self.tca,
            max_elevation_deg: self.max_elevation,
            aos_azimuth_deg: self.aos_azimuth,
            los_azimuth_deg: los_azimuth,
        }
    }
}

/// Link geometry at `minutes` after the element epoch.
pub fn geometry_at(
    elements: &OrbitalElements,
    ground: &GeodeticPosition,
    minutes: f64,
    config: &GeometryConfig,
) -> Result<LinkGeometry> {
    let state = propagate(elements, minutes)?;
    let time = elements.instant_at(minutes)?;
    geometry(&state, ground, sidereal_time(time), config)
}

/// Find contact windows between `start_minutes` and `end_minutes`.
///
/// A pass still in view at the end of the span is closed at the last sample.
pub fn find_contact_windows(
    elements: &OrbitalElements,
    ground: &GeodeticPosition,
    start_minutes: f64,
    end_minutes: f64,
    step_minutes: f64,
    config: &GeometryConfig,
) -> Result<Vec<ContactWindow>> {
    if !(step_minutes.is_finite() && step_minutes > 0.0) {
        return Err(OrbitalError::PropagationFailed(format!(
            "sample step must be positive, got {step_minutes} min"
        )));
    }
    if !(start_minutes.is_finite() && end_minutes.is_finite()) || end_minutes < start_minutes {
        return Err(OrbitalError::PropagationFailed(format!(
            "invalid search span [{start_minutes}, {end_minutes}]"
        )));
    }

    let samples = ((end_minutes - start_minutes) / step_minutes).floor() as usize;
    let mut windows = Vec::new();
    let mut open: Option<OpenPass> = None;
    let mut last = None;

    for i in 0..=samples {
        let t = start_minutes + i as f64 * step_minutes;
        let look = geometry_at(elements, ground, t, config)?;

        match open.take() {
            // AOS - start of pass
            None if look.visible => {
                open = Some(OpenPass {
                    aos: t,
                    aos_azimuth: look.azimuth_deg,
                    tca: t,
                    max_elevation: look.elevation_deg,
                });
            }
            // During pass
            Some(mut pass) if look.visible => {
                if look.elevation_deg > pass.max_elevation {
                    pass.max_elevation = look.elevation_deg;
                    pass.tca = t;
                }
                open = Some(pass);
            }
            // LOS - end of pass
            Some(pass) => windows.push(pass.close(t, look.azimuth_deg)),
            None => {}
        }
        last = Some((t, look.azimuth_deg));
    }

    if let (Some(pass), Some((t, azimuth))) = (open, last) {
        windows.push(pass.close(t, azimuth));
    }

    debug!(count = windows.len(), "contact windows found");
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn leo() -> OrbitalElements {
        let epoch = Utc.with_ymd_and_hms(2024, 2, 13, 16, 0, 0).unwrap();
        OrbitalElements::from_degrees(14.2, 0.0005, 51.6, 0.0, 0.0, 0.0, 0.0, epoch).unwrap()
    }

    #[test]
    fn test_windows_over_a_day() {
        let el = leo();
        let station = GeodeticPosition { latitude: 40.0, longitude: -105.0, altitude_km: 1.6 };
        let windows =
            find_contact_windows(&el, &station, 0.0, 1440.0, 0.5, &GeometryConfig::default())
                .unwrap();

        assert!(!windows.is_empty(), "a 51.6° LEO passes a 40° station daily");
        for w in &windows {
            assert!(w.los_minutes > w.aos_minutes);
            assert!(w.tca_minutes >= w.aos_minutes && w.tca_minutes <= w.los_minutes);
            assert!(w.max_elevation_deg > 10.0);
            // LEO passes are short
            assert!(w.duration_minutes() < 30.0);
        }
    }

    #[test]
    fn test_polar_station_never_sees_low_inclination() {
        let epoch = Utc.with_ymd_and_hms(2024, 2, 13, 16, 0, 0).unwrap();
        let equatorial =
            OrbitalElements::from_degrees(14.2, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, epoch).unwrap();
        let station = GeodeticPosition { latitude: 85.0, longitude: 0.0, altitude_km: 0.0 };
        let windows = find_contact_windows(
            &equatorial,
            &station,
            0.0,
            720.0,
            1.0,
            &GeometryConfig::default(),
        )
        .unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_rejects_bad_step() {
        let station = GeodeticPosition { latitude: 0.0, longitude: 0.0, altitude_km: 0.0 };
        let cfg = GeometryConfig::default();
        assert!(find_contact_windows(&leo(), &station, 0.0, 10.0, 0.0, &cfg).is_err());
        assert!(find_contact_windows(&leo(), &station, 10.0, 0.0, 1.0, &cfg).is_err());
    }

    #[test]
    fn test_offsets_past_the_calendar_are_errors() {
        let station = GeodeticPosition { latitude: 40.0, longitude: -105.0, altitude_km: 1.6 };
        let cfg = GeometryConfig::default();
        let el = leo();

        // Propagation alone accepts the offset; turning it into a date cannot
        assert!(propagate(&el, 1e12).is_ok());
        assert!(matches!(
            geometry_at(&el, &station, 1e12, &cfg),
            Err(OrbitalError::PropagationFailed(_))
        ));
        assert!(find_contact_windows(&el, &station, 1e12, 1e12 + 10.0, 1.0, &cfg).is_err());
    }
}
