//! Mean orbital elements.
//!
//! Elements are validated once at construction and never mutated afterwards;
//! propagation takes elements plus an elapsed-time offset.

use crate::{OrbitalError, Result, MINUTES_PER_DAY};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean elements at epoch. Angles in radians, mean motion in rev/day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementsRecord", into = "ElementsRecord")]
pub struct OrbitalElements {
    mean_motion: f64,
    eccentricity: f64,
    inclination: f64,
    raan: f64,
    arg_perigee: f64,
    mean_anomaly: f64,
    drag_term: f64,
    epoch: DateTime<Utc>,
}

/// Wire shape of [`OrbitalElements`]; deserialization goes through
/// [`OrbitalElements::new`] so stored element sets are validated too.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ElementsRecord {
    mean_motion: f64,
    eccentricity: f64,
    inclination: f64,
    raan: f64,
    arg_perigee: f64,
    mean_anomaly: f64,
    #[serde(default)]
    drag_term: f64,
    epoch: DateTime<Utc>,
}

impl TryFrom<ElementsRecord> for OrbitalElements {
    type Error = OrbitalError;

    fn try_from(r: ElementsRecord) -> Result<Self> {
        Self::new(
            r.mean_motion,
            r.eccentricity,
            r.inclination,
            r.raan,
            r.arg_perigee,
            r.mean_anomaly,
            r.drag_term,
            r.epoch,
        )
    }
}

impl From<OrbitalElements> for ElementsRecord {
    fn from(e: OrbitalElements) -> Self {
        Self {
            mean_motion: e.mean_motion,
            eccentricity: e.eccentricity,
            inclination: e.inclination,
            raan: e.raan,
            arg_perigee: e.arg_perigee,
            mean_anomaly: e.mean_anomaly,
            drag_term: e.drag_term,
            epoch: e.epoch,
        }
    }
}

impl OrbitalElements {
    /// Validates and builds an element set.
    ///
    /// Rejects non-finite values, non-positive mean motion and eccentricity
    /// outside `[0, 1)`. Angles are accepted in any range.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mean_motion: f64,
        eccentricity: f64,
        inclination: f64,
        raan: f64,
        arg_perigee: f64,
        mean_anomaly: f64,
        drag_term: f64,
        epoch: DateTime<Utc>,
    ) -> Result<Self> {
        let fields = [
            ("mean_motion", mean_motion),
            ("eccentricity", eccentricity),
            ("inclination", inclination),
            ("raan", raan),
            ("arg_perigee", arg_perigee),
            ("mean_anomaly", mean_anomaly),
            ("drag_term", drag_term),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(OrbitalError::InvalidElements(format!("{name} is not finite: {value}")));
        }
        if mean_motion <= 0.0 {
            return Err(OrbitalError::InvalidElements(format!(
                "mean motion must be positive, got {mean_motion} rev/day"
            )));
        }
        if !(0.0..1.0).contains(&eccentricity) {
            return Err(OrbitalError::InvalidElements(format!(
                "eccentricity {eccentricity} outside [0, 1)"
            )));
        }

        Ok(Self {
            mean_motion,
            eccentricity,
            inclination,
            raan,
            arg_perigee,
            mean_anomaly,
            drag_term,
            epoch,
        })
    }

    /// Same as [`OrbitalElements::new`] with angles given in degrees.
    #[allow(clippy::too_many_arguments)]
    pub fn from_degrees(
        mean_motion: f64,
        eccentricity: f64,
        inclination_deg: f64,
        raan_deg: f64,
        arg_perigee_deg: f64,
        mean_anomaly_deg: f64,
        drag_term: f64,
        epoch: DateTime<Utc>,
    ) -> Result<Self> {
        Self::new(
            mean_motion,
            eccentricity,
            inclination_deg.to_radians(),
            raan_deg.to_radians(),
            arg_perigee_deg.to_radians(),
            mean_anomaly_deg.to_radians(),
            drag_term,
            epoch,
        )
    }

    /// Parse a two-line element set from a catalog.
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self> {
        let tle = sgp4::Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| OrbitalError::InvalidTle(format!("{:?}", e)))?;

        let epoch = DateTime::<Utc>::from_naive_utc_and_offset(tle.datetime, Utc);
        Self::from_degrees(
            tle.mean_motion,
            tle.eccentricity,
            tle.inclination,
            tle.right_ascension,
            tle.argument_of_perigee,
            tle.mean_anomaly,
            tle.drag_term,
            epoch,
        )
    }

    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    /// Mean motion in rad/min.
    pub fn mean_motion_rad_min(&self) -> f64 {
        self.mean_motion * 2.0 * PI / MINUTES_PER_DAY
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    pub fn raan(&self) -> f64 {
        self.raan
    }

    pub fn arg_perigee(&self) -> f64 {
        self.arg_perigee
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.mean_anomaly
    }

    pub fn drag_term(&self) -> f64 {
        self.drag_term
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Minutes elapsed from epoch to `time` (negative before epoch).
    pub fn minutes_since_epoch(&self, time: DateTime<Utc>) -> f64 {
        let duration = time.signed_duration_since(self.epoch);
        duration.num_milliseconds() as f64 / 60_000.0
    }

    /// Instant `minutes` after epoch, or an error when it falls outside the
    /// representable date range.
    pub fn instant_at(&self, minutes: f64) -> Result<DateTime<Utc>> {
        let millis = (minutes * 60_000.0).round();
        let offset = if millis.is_finite() && millis.abs() < i64::MAX as f64 {
            TimeDelta::try_milliseconds(millis as i64)
        } else {
            None
        };
        offset
            .and_then(|offset| self.epoch.checked_add_signed(offset))
            .ok_or_else(|| {
                OrbitalError::PropagationFailed(format!(
                    "{minutes} min after epoch is outside the supported date range"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 13, 16, 0, 0).unwrap()
    }

    #[test]
    fn test_rejects_open_orbits() {
        let err = OrbitalElements::new(14.2, 1.0, 0.9, 0.0, 0.0, 0.0, 0.0, epoch());
        assert!(matches!(err, Err(OrbitalError::InvalidElements(_))));

        let err = OrbitalElements::new(14.2, -0.1, 0.9, 0.0, 0.0, 0.0, 0.0, epoch());
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_bad_mean_motion() {
        assert!(OrbitalElements::new(0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, epoch()).is_err());
        assert!(OrbitalElements::new(f64::NAN, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, epoch()).is_err());
    }

    #[test]
    fn test_from_degrees() {
        let el = OrbitalElements::from_degrees(14.2, 0.0005, 51.6, 0.0, 0.0, 0.0, 0.0, epoch())
            .unwrap();
        assert!((el.inclination() - 51.6_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_from_tle_iss() {
        let line1 = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
        let line2 = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
        let el = OrbitalElements::from_tle(Some("ISS".to_string()), line1, line2).unwrap();

        assert!((el.inclination().to_degrees() - 51.6416).abs() < 1e-6);
        assert!((el.raan().to_degrees() - 247.4627).abs() < 1e-6);
        assert!((el.eccentricity() - 0.0006703).abs() < 1e-9);
        assert!((el.mean_motion() - 15.72125391).abs() < 1e-6);
        assert_eq!(el.epoch().format("%Y-%m-%d").to_string(), "2008-09-20");
    }

    #[test]
    fn test_from_tle_rejects_garbage() {
        let err = OrbitalElements::from_tle(None, "not a tle", "still not a tle");
        assert!(matches!(err, Err(OrbitalError::InvalidTle(_))));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"mean_motion":14.2,"eccentricity":1.5,"inclination":0.9,"raan":0.0,
            "arg_perigee":0.0,"mean_anomaly":0.0,"epoch":"2024-02-13T16:00:00Z"}"#;
        assert!(serde_json::from_str::<OrbitalElements>(json).is_err());

        let ok = json.replace("1.5", "0.001");
        let el: OrbitalElements = serde_json::from_str(&ok).unwrap();
        assert_eq!(el.drag_term(), 0.0);
    }

    #[test]
    fn test_minutes_since_epoch() {
        let el = OrbitalElements::new(14.2, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, epoch()).unwrap();
        let later = epoch() + chrono::Duration::minutes(90);
        assert!((el.minutes_since_epoch(later) - 90.0).abs() < 1e-9);
        assert!((el.minutes_since_epoch(epoch() - chrono::Duration::seconds(30)) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_instant_at_is_checked() {
        let el = OrbitalElements::from_degrees(14.2, 0.0005, 51.6, 0.0, 0.0, 0.0, 0.0, epoch()).unwrap();
        assert_eq!(el.instant_at(90.0).unwrap(), epoch() + chrono::Duration::minutes(90));
        assert_eq!(el.instant_at(-0.5).unwrap(), epoch() - chrono::Duration::seconds(30));

        for minutes in [1e12, -1e12, 1e300, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(el.instant_at(minutes), Err(OrbitalError::PropagationFailed(_))),
                "{minutes} min should be rejected"
            );
        }
    }
}
