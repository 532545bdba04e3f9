//! FSO Link Budget Calculator
//!
//! Received power and margin for a space-to-ground optical link:
//! - Free space path loss over the actual slant range
//! - Transmit/receive aperture gains
//! - Atmospheric extinction, turbulence and cloud penalties
//! - Pointing loss and required system margin

use crate::atmosphere::{AtmosphericTerms, QualityCategory};
use crate::weather::WeatherSample;
use crate::{LinkBudgetError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Optical terminal pair. Defaults are a MEO-grade space terminal
/// (EDRS/LCRD class) talking to a 40cm optical ground station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticalTerminal {
    pub wavelength_nm: f64,
    /// 5W transmit power (space-grade)
    pub tx_power_dbm: f64,
    pub tx_aperture_m: f64,
    pub rx_aperture_m: f64,
    /// High-sensitivity APD receiver
    pub rx_sensitivity_dbm: f64,
    pub pointing_loss_db: f64,
    pub required_margin_db: f64,
    pub aperture_efficiency: f64,
}

impl Default for OpticalTerminal {
    fn default() -> Self {
        Self {
            wavelength_nm: 1550.0,
            tx_power_dbm: 37.0,
            tx_aperture_m: 0.25,
            rx_aperture_m: 0.40,
            rx_sensitivity_dbm: -45.0,
            pointing_loss_db: 2.0,
            required_margin_db: 3.0,
            aperture_efficiency: 0.55,
        }
    }
}

impl OpticalTerminal {
    pub fn tx_power(mut self, dbm: f64) -> Self {
        self.tx_power_dbm = dbm;
        self
    }

    pub fn apertures(mut self, tx_m: f64, rx_m: f64) -> Self {
        self.tx_aperture_m = tx_m;
        self.rx_aperture_m = rx_m;
        self
    }

    pub fn rx_sensitivity(mut self, dbm: f64) -> Self {
        self.rx_sensitivity_dbm = dbm;
        self
    }

    pub fn required_margin(mut self, db: f64) -> Self {
        self.required_margin_db = db;
        self
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("wavelength_nm", self.wavelength_nm),
            ("tx_aperture_m", self.tx_aperture_m),
            ("rx_aperture_m", self.rx_aperture_m),
            ("aperture_efficiency", self.aperture_efficiency),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(LinkBudgetError::NonFinite(format!(
                "terminal {name} must be positive, got {value}"
            )));
        }
        let levels = [
            self.tx_power_dbm,
            self.rx_sensitivity_dbm,
            self.pointing_loss_db,
            self.required_margin_db,
        ];
        if levels.iter().any(|v| !v.is_finite()) {
            return Err(LinkBudgetError::NonFinite("terminal power levels".to_string()));
        }
        Ok(())
    }
}

/// Free space path loss in dB: (4πd/λ)².
pub fn free_space_path_loss(range_km: f64, wavelength_nm: f64) -> f64 {
    let range_m = range_km * 1000.0;
    let wavelength_m = wavelength_nm * 1e-9;
    20.0 * (4.0 * PI * range_m / wavelength_m).log10()
}

/// Antenna gain from aperture diameter (dBi).
pub fn aperture_gain(diameter_m: f64, wavelength_nm: f64, efficiency: f64) -> f64 {
    let wavelength_m = wavelength_nm * 1e-9;
    let area = PI * (diameter_m / 2.0).powi(2);
    let gain = 4.0 * PI * area * efficiency / wavelength_m.powi(2);
    10.0 * gain.log10()
}

/// Detailed link budget breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBudget {
    pub elevation_deg: f64,
    pub range_km: f64,
    pub tx_power_dbm: f64,
    pub tx_gain_db: f64,
    pub fspl_db: f64,
    pub atmospheric_loss_db: f64,
    pub turbulence_penalty_db: f64,
    pub cloud_penalty_db: f64,
    /// Atmospheric + turbulence + cloud
    pub total_loss_db: f64,
    pub pointing_loss_db: f64,
    pub rx_gain_db: f64,
    pub rx_power_dbm: f64,
    pub rx_sensitivity_dbm: f64,
    /// Received power above sensitivity, less the required margin
    pub link_margin_db: f64,
    /// [0, 1]
    pub transmission: f64,
    /// [0, 1]
    pub quality: f64,
    pub cn2: f64,
    pub turbulence_category: QualityCategory,
    pub link_viable: bool,
}

/// Full budget for one pass sample.
pub fn link_budget(
    elevation_deg: f64,
    range_km: f64,
    weather: Option<&WeatherSample>,
    terminal: &OpticalTerminal,
) -> Result<LinkBudget> {
    if !(range_km.is_finite() && range_km > 0.0) {
        return Err(LinkBudgetError::NonFinite(format!(
            "slant range must be positive, got {range_km} km"
        )));
    }
    terminal.validate()?;
    let atmosphere = AtmosphericTerms::evaluate(elevation_deg, weather)?;

    let gain = |diameter_m: f64| {
        aperture_gain(diameter_m, terminal.wavelength_nm, terminal.aperture_efficiency)
    };
    let tx_gain = gain(terminal.tx_aperture_m);
    let rx_gain = gain(terminal.rx_aperture_m);
    let fspl = free_space_path_loss(range_km, terminal.wavelength_nm);
    let total_loss = atmosphere.total_loss_db();

    let rx_power = terminal.tx_power_dbm + tx_gain - fspl - total_loss - terminal.pointing_loss_db
        + rx_gain;
    let margin = rx_power - terminal.rx_sensitivity_dbm - terminal.required_margin_db;

    debug!(elevation_deg, range_km, rx_power_dbm = rx_power, margin_db = margin, "link budget");

    Ok(LinkBudget {
        elevation_deg,
        range_km,
        tx_power_dbm: terminal.tx_power_dbm,
        tx_gain_db: tx_gain,
        fspl_db: fspl,
        atmospheric_loss_db: atmosphere.atmospheric_loss_db,
        turbulence_penalty_db: atmosphere.turbulence_penalty_db,
        cloud_penalty_db: atmosphere.cloud_penalty_db,
        total_loss_db: total_loss,
        pointing_loss_db: terminal.pointing_loss_db,
        rx_gain_db: rx_gain,
        rx_power_dbm: rx_power,
        rx_sensitivity_dbm: terminal.rx_sensitivity_dbm,
        link_margin_db: margin,
        transmission: atmosphere.transmission,
        quality: atmosphere.quality(),
        cn2: atmosphere.cn2,
        turbulence_category: atmosphere.category(),
        link_viable: margin > 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fspl_reference() {
        // 10,500 km at 1550nm ≈ 278.6 dB
        let fspl = free_space_path_loss(10_500.0, 1550.0);
        assert!((fspl - 278.6).abs() < 0.2, "{fspl}");
        // Doubling range adds 6 dB
        let doubled = free_space_path_loss(21_000.0, 1550.0);
        assert!((doubled - fspl - 6.0206).abs() < 1e-3);
    }

    #[test]
    fn test_aperture_gain_scales_with_area() {
        let small = aperture_gain(0.25, 1550.0, 0.55);
        let large = aperture_gain(0.50, 1550.0, 0.55);
        assert!((small - 111.5).abs() < 0.2, "{small}");
        assert!((large - small - 6.0206).abs() < 1e-3);
    }

    #[test]
    fn test_meo_zenith_clear_is_viable() {
        let budget = link_budget(90.0, 10_500.0, None, &OpticalTerminal::default()).unwrap();
        assert!(budget.link_viable, "margin {} dB", budget.link_margin_db);
        assert!((budget.link_margin_db - 24.8).abs() < 0.5);
        assert_eq!(budget.turbulence_penalty_db, 0.0);
        assert_eq!(budget.cloud_penalty_db, 0.0);
    }

    #[test]
    fn test_low_overcast_costs_margin() {
        let terminal = OpticalTerminal::default();
        let overcast = WeatherSample {
            cloud_cover_pct: 100.0,
            wind_speed_ms: 0.0,
            ..WeatherSample::clear()
        };

        let clear = link_budget(45.0, 12_000.0, None, &terminal).unwrap();
        let low = link_budget(5.0, 12_000.0, Some(&overcast), &terminal).unwrap();
        assert!(low.link_margin_db < clear.link_margin_db - 15.0);
        assert!(low.quality < 0.05);
        assert_eq!(low.turbulence_category, QualityCategory::VeryPoor);
    }

    #[test]
    fn test_weak_terminal_not_viable() {
        let weak = OpticalTerminal::default().tx_power(0.0).apertures(0.05, 0.10);
        let budget = link_budget(20.0, 20_000.0, None, &weak).unwrap();
        assert!(!budget.link_viable);
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        let terminal = OpticalTerminal::default();
        assert!(link_budget(45.0, 0.0, None, &terminal).is_err());
        assert!(link_budget(45.0, f64::NAN, None, &terminal).is_err());
        assert_eq!(
            link_budget(-1.0, 1000.0, None, &terminal),
            Err(LinkBudgetError::NonPositiveElevation(-1.0))
        );
        let broken = OpticalTerminal { wavelength_nm: 0.0, ..terminal };
        assert!(link_budget(45.0, 1000.0, None, &broken).is_err());
    }
}
