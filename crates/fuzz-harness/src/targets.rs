//! Named fuzz targets over the orbital and link libraries.
//!
//! Each target pairs a generator with a check; the CLI runs them with large
//! case counts and the integration tests run the same checks through
//! `proptest!`.

use crate::generators::*;
use crate::runner::FuzzRunner;
use link_budget::{atmospheric_loss, link_quality, WeatherSample};
use orbital_mechanics::contact::geometry_at;
use orbital_mechanics::geometry::GeometryConfig;
use orbital_mechanics::kepler::solve_kepler;
use orbital_mechanics::propagation::{orbital_period_minutes, propagate};
use orbital_mechanics::radiation::{radiation_flux, L_SHELL_MAX, L_SHELL_MIN};
use orbital_mechanics::transforms::{to_geodetic, to_inertial};
use orbital_mechanics::walker::WalkerDelta;
use orbital_mechanics::{GeodeticPosition, OrbitalElements, OrbitalError, WGS84_A_KM};
use std::collections::HashSet;

pub type Check = std::result::Result<(), String>;

/// (name, description) for every target `run_all` executes.
pub const TARGETS: &[(&str, &str)] = &[
    ("kepler_residual", "|E - e sin E - M| < 1e-6 for e in [0, 0.9]"),
    ("geodetic_round_trip", "inertial <-> geodetic within 1e-3 deg and 1 km"),
    ("propagation_periodicity", "state repeats after one period for e < 0.01"),
    ("link_geometry_ranges", "elevation/azimuth stay canonical and finite"),
    ("atmospheric_loss_monotonic", "loss strictly decreases with elevation"),
    ("flux_l_shell_bounds", "flux is zero outside L in [1.2, 7]"),
    ("link_quality_bounds", "link quality stays in [0, 1]"),
    ("walker_catalog", "generated catalogs have unique slots on the design shell"),
];

pub fn check_kepler_residual(eccentricity: f64, mean_anomaly: f64) -> Check {
    let solution = solve_kepler(mean_anomaly, eccentricity);
    let e_anom = solution.eccentric_anomaly;
    let residual = (e_anom - eccentricity * e_anom.sin() - mean_anomaly).abs();
    if residual < 1e-6 {
        Ok(())
    } else {
        Err(format!("residual {residual:e} after {} iterations", solution.iterations))
    }
}

pub fn check_geodetic_round_trip(geodetic: &GeodeticPosition, sidereal: f64) -> Check {
    let back = to_geodetic(&to_inertial(geodetic, sidereal), sidereal);

    let dlat = (back.latitude - geodetic.latitude).abs();
    let dlon = (back.longitude - geodetic.longitude).rem_euclid(360.0);
    let dlon = dlon.min(360.0 - dlon);
    let dalt = (back.altitude_km - geodetic.altitude_km).abs();

    if dlat < 1e-3 && dlon < 1e-3 && dalt < 1.0 {
        Ok(())
    } else {
        Err(format!("round trip moved by {dlat:e}° lat, {dlon:e}° lon, {dalt:e} km"))
    }
}

pub fn check_propagation_periodicity(elements: &OrbitalElements, start_minutes: f64) -> Check {
    let period = orbital_period_minutes(elements);
    let a = propagate(elements, start_minutes).map_err(|e| e.to_string())?;
    let b = propagate(elements, start_minutes + period).map_err(|e| e.to_string())?;

    let drift = (a.position - b.position).norm() / a.radius_km();
    if drift < 1e-6 {
        Ok(())
    } else {
        Err(format!("relative drift {drift:e} after {period:.3} min"))
    }
}

pub fn check_link_geometry(
    elements: &OrbitalElements,
    ground: &GeodeticPosition,
    minutes: f64,
) -> Check {
    let look = match geometry_at(elements, ground, minutes, &GeometryConfig::default()) {
        Ok(look) => look,
        Err(OrbitalError::DegenerateGeometry(_)) => return Ok(()),
        Err(e) => return Err(e.to_string()),
    };

    if !(-90.0..=90.0).contains(&look.elevation_deg) {
        return Err(format!("elevation {} out of range", look.elevation_deg));
    }
    if !(0.0..360.0).contains(&look.azimuth_deg) {
        return Err(format!("azimuth {} out of range", look.azimuth_deg));
    }
    let finite = look.range_km > 0.0
        && look.range_rate_km_s.is_finite()
        && look.doppler_shift_ghz.is_finite();
    if !finite {
        return Err(format!("non-finite geometry {look:?}"));
    }
    if look.visible != (look.elevation_deg > GeometryConfig::default().horizon_mask_deg) {
        return Err("visibility flag disagrees with horizon mask".to_string());
    }
    Ok(())
}

pub fn check_atmospheric_loss_monotonic(low_deg: f64, high_deg: f64) -> Check {
    let (low, high) = if low_deg <= high_deg { (low_deg, high_deg) } else { (high_deg, low_deg) };
    if high - low < 1e-3 {
        return Ok(());
    }
    let loss_low = atmospheric_loss(low).map_err(|e| e.to_string())?;
    let loss_high = atmospheric_loss(high).map_err(|e| e.to_string())?;
    if loss_low > loss_high {
        Ok(())
    } else {
        Err(format!("loss({low}) = {loss_low} not above loss({high}) = {loss_high}"))
    }
}

pub fn check_flux_bounds(l_shell: f64, altitude_km: f64) -> Check {
    let flux = radiation_flux(l_shell, altitude_km);
    if !(flux.is_finite() && flux >= 0.0) {
        return Err(format!("flux {flux} is not a valid rate"));
    }
    if !(L_SHELL_MIN..=L_SHELL_MAX).contains(&l_shell) && flux != 0.0 {
        return Err(format!("flux {flux} at L = {l_shell}"));
    }
    Ok(())
}

pub fn check_link_quality(elevation_deg: f64, weather: Option<&WeatherSample>) -> Check {
    let q = link_quality(elevation_deg, weather).map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(format!("quality {q} outside [0, 1]"))
    }
}

pub fn check_walker_catalog(planes: u32, per_plane: u32, altitude_km: f64) -> Check {
    let walker = WalkerDelta {
        total_satellites: planes * per_plane,
        planes,
        phasing: planes - 1,
        altitude_km,
        ..WalkerDelta::halo_constellation()
    };
    let sats = walker.satellites(reference_epoch()).map_err(|e| e.to_string())?;
    if sats.len() != walker.total_satellites as usize {
        return Err(format!("{} satellites for a {} layout", sats.len(), walker.total_satellites));
    }

    let mut ids = HashSet::new();
    let mut slots = HashSet::new();
    for sat in &sats {
        if !ids.insert(sat.id.as_str()) || !slots.insert((sat.plane, sat.slot)) {
            return Err(format!("{} reuses an id or plane/slot", sat.id));
        }
        if u32::from(sat.plane) >= planes || u32::from(sat.slot) >= per_plane {
            return Err(format!("{} at plane {} slot {}", sat.id, sat.plane, sat.slot));
        }
        let radius = propagate(&sat.elements, 0.0).map_err(|e| e.to_string())?.radius_km();
        let offset = radius - (WGS84_A_KM + altitude_km);
        if offset.abs() > 15.0 {
            return Err(format!("{} is {offset:.1} km off the design shell", sat.id));
        }
    }
    Ok(())
}

/// Run every target in [`TARGETS`] order.
pub fn run_all(runner: &mut FuzzRunner) {
    runner.run("kepler_residual", (eccentricity(), mean_anomaly_rad()), |(e, m)| {
        check_kepler_residual(*e, *m)
    });
    runner.run("geodetic_round_trip", (geodetic_position(), sidereal_angle()), |(g, theta)| {
        check_geodetic_round_trip(g, *theta)
    });
    runner.run(
        "propagation_periodicity",
        (orbital_elements(), minutes_since_epoch()),
        |(el, t)| check_propagation_periodicity(el, *t),
    );
    runner.run(
        "link_geometry_ranges",
        (orbital_elements(), ground_station_pos(), minutes_since_epoch()),
        |(el, ground, t)| check_link_geometry(el, ground, *t),
    );
    runner.run(
        "atmospheric_loss_monotonic",
        (elevation_deg(), elevation_deg()),
        |(a, b)| check_atmospheric_loss_monotonic(*a, *b),
    );
    runner.run("flux_l_shell_bounds", (l_shell(), altitude_km()), |(l, alt)| {
        check_flux_bounds(*l, *alt)
    });
    runner.run("link_quality_bounds", (elevation_deg(), maybe_weather()), |(el, wx)| {
        check_link_quality(*el, wx.as_ref())
    });
    runner.run("walker_catalog", walker_shape(), |(planes, per_plane, alt)| {
        check_walker_catalog(*planes, *per_plane, *alt)
    });
}
