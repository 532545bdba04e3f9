//! Frame conversions between the inertial frame and WGS84 geodetic
//! coordinates, plus Greenwich Mean Sidereal Time.

use crate::{GeodeticPosition, InertialState, WGS84_A_KM, WGS84_FLATTENING};
use chrono::{DateTime, Utc};
use nalgebra::{Rotation3, Vector3};
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const JD_J2000: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Geodetic latitude refinement limits.
const GEODETIC_MAX_ITERATIONS: usize = 10;
const GEODETIC_TOLERANCE_RAD: f64 = 1e-12;

/// First eccentricity squared of the WGS84 ellipsoid.
#[inline]
pub fn ellipsoid_e2() -> f64 {
    WGS84_FLATTENING * (2.0 - WGS84_FLATTENING)
}

/// Julian date of an instant.
pub fn julian_date(time: DateTime<Utc>) -> f64 {
    let seconds = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + JD_UNIX_EPOCH
}

/// GMST in radians for a Julian date, normalized to [0, 2π).
pub fn sidereal_time_jd(jd: f64) -> f64 {
    // Julian centuries from J2000.0
    let t = (jd - JD_J2000) / 36525.0;

    let gmst_sec = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * t
        + 0.093104 * t * t
        - 6.2e-6 * t * t * t;

    ((gmst_sec / 240.0).to_radians()).rem_euclid(TWO_PI)
}

/// GMST in radians for an instant, normalized to [0, 2π).
pub fn sidereal_time(time: DateTime<Utc>) -> f64 {
    sidereal_time_jd(julian_date(time))
}

/// Wrap a longitude into (-180, 180].
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Wrap an azimuth into [0, 360).
pub fn normalize_azimuth(az_deg: f64) -> f64 {
    let wrapped = az_deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotate an Earth-fixed vector into the inertial frame.
pub fn earth_fixed_to_inertial(v: &Vector3<f64>, sidereal_time: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), sidereal_time) * v
}

/// Rotate an inertial vector into the Earth-fixed frame.
pub fn inertial_to_earth_fixed(v: &Vector3<f64>, sidereal_time: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -sidereal_time) * v
}

/// Single-pass conversion: spherical latitude with the ellipsoid correction
/// applied to altitude only.
///
/// Latitude error grows to roughly 0.19° at mid latitudes near the surface.
pub fn to_geodetic_spherical(state: &InertialState, sidereal_time: f64) -> GeodeticPosition {
    let p = state.position;
    let r = p.norm();
    let latitude = if r > 0.0 { (p.z / r).clamp(-1.0, 1.0).asin() } else { 0.0 };
    let c = 1.0 / (1.0 - ellipsoid_e2() * latitude.sin().powi(2)).sqrt();

    GeodeticPosition {
        latitude: latitude.to_degrees(),
        longitude: inertial_longitude(&p, sidereal_time),
        altitude_km: r - WGS84_A_KM * c,
    }
}

/// Inertial position to geodetic latitude/longitude/altitude.
///
/// Starts from the spherical latitude and refines it against the ellipsoid
/// until the update falls below tolerance.
pub fn to_geodetic(state: &InertialState, sidereal_time: f64) -> GeodeticPosition {
    let p = state.position;
    let e2 = ellipsoid_e2();
    let r_xy = p.x.hypot(p.y);

    let mut latitude = p.z.atan2(r_xy);
    for _ in 0..GEODETIC_MAX_ITERATIONS {
        let c = 1.0 / (1.0 - e2 * latitude.sin().powi(2)).sqrt();
        let next = (p.z + WGS84_A_KM * c * e2 * latitude.sin()).atan2(r_xy);
        let step = (next - latitude).abs();
        latitude = next;
        if step < GEODETIC_TOLERANCE_RAD {
            break;
        }
    }

    let (sin_lat, cos_lat) = latitude.sin_cos();
    let n = WGS84_A_KM / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let altitude_km = if cos_lat.abs() > 1e-6 {
        r_xy / cos_lat - n
    } else {
        p.z / sin_lat - n * (1.0 - e2)
    };

    GeodeticPosition {
        latitude: latitude.to_degrees(),
        longitude: inertial_longitude(&p, sidereal_time),
        altitude_km,
    }
}

/// Geodetic position to an inertial state at rest (zero velocity).
pub fn to_inertial(geodetic: &GeodeticPosition, sidereal_time: f64) -> InertialState {
    InertialState::at_rest(earth_fixed_to_inertial(&to_earth_fixed(geodetic), sidereal_time))
}

/// Geodetic position to Earth-fixed Cartesian coordinates (km).
pub fn to_earth_fixed(geodetic: &GeodeticPosition) -> Vector3<f64> {
    let lat = geodetic.latitude.to_radians();
    let lon = geodetic.longitude.to_radians();
    let alt = geodetic.altitude_km;
    let e2 = ellipsoid_e2();

    // Radius of curvature in the prime vertical
    let n = WGS84_A_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();

    Vector3::new(
        (n + alt) * lat.cos() * lon.cos(),
        (n + alt) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + alt) * lat.sin(),
    )
}

fn inertial_longitude(p: &Vector3<f64>, sidereal_time: f64) -> f64 {
    normalize_longitude((p.y.atan2(p.x) - sidereal_time).to_degrees())
}
