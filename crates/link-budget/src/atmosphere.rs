//! Atmospheric and turbulence losses for a ground-to-space optical path.
//!
//! Cn² (refractive-index structure constant) is estimated from surface
//! weather and scaled by air mass; extinction follows Beer-Lambert with a
//! plane-parallel air mass of 1/sin(elevation).

use crate::weather::WeatherSample;
use crate::{LinkBudgetError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::LOG10_E;
use tracing::trace;

/// Nominal ground-level Cn² (m^-2/3), also the fallback without weather.
pub const CN2_BASELINE: f64 = 1e-15;
pub const CN2_MIN: f64 = 1e-17;
pub const CN2_MAX: f64 = 1e-13;

/// Zenith optical depth at 1550nm
pub const ZENITH_EXTINCTION: f64 = 0.15;

/// Turbulence penalty only applies below this elevation
pub const TURBULENCE_RAMP_ELEVATION_DEG: f64 = 30.0;

/// Penalty for full overcast (dB)
pub const CLOUD_PENALTY_DB: f64 = 5.0;

/// Cn² estimate from surface conditions, clamped to [1e-17, 1e-13].
///
/// At or below the horizon the air mass is unbounded and the estimate
/// saturates at the upper clamp.
pub fn cn2_turbulence(cloud_cover_pct: f64, wind_speed_ms: f64, elevation_deg: f64) -> f64 {
    let sin_el = elevation_deg.to_radians().sin();
    if sin_el.is_nan() || sin_el <= 0.0 {
        return CN2_MAX;
    }

    let cloud_factor = 1.0 + cloud_cover_pct / 100.0 * 2.0;
    let wind_factor = (wind_speed_ms / 10.0).clamp(0.5, 2.0);
    let air_mass_factor = (1.0 / sin_el).powf(0.6);

    let cn2 = CN2_BASELINE * cloud_factor * wind_factor * air_mass_factor;
    if cn2.is_nan() {
        return CN2_MAX;
    }
    cn2.clamp(CN2_MIN, CN2_MAX)
}

fn air_mass(elevation_deg: f64) -> Result<f64> {
    if !elevation_deg.is_finite() {
        return Err(LinkBudgetError::NonFinite(format!("elevation {elevation_deg}")));
    }
    if elevation_deg <= 0.0 {
        return Err(LinkBudgetError::NonPositiveElevation(elevation_deg));
    }
    Ok(1.0 / elevation_deg.min(90.0).to_radians().sin())
}

/// Fraction of power surviving the atmosphere, in [0, 1].
pub fn transmission(elevation_deg: f64) -> Result<f64> {
    Ok((-ZENITH_EXTINCTION * air_mass(elevation_deg)?).exp().clamp(0.0, 1.0))
}

/// Beer-Lambert extinction loss (dB). Rejects elevations at or below the horizon.
///
/// Equal to -10·log10(transmission), but stays finite where the linear
/// transmission underflows.
pub fn atmospheric_loss(elevation_deg: f64) -> Result<f64> {
    Ok(10.0 * LOG10_E * ZENITH_EXTINCTION * air_mass(elevation_deg)?)
}

/// Scintillation penalty (dB): zero above 30°, ramping linearly toward the horizon.
pub fn turbulence_penalty(elevation_deg: f64, cn2: f64) -> f64 {
    if elevation_deg >= TURBULENCE_RAMP_ELEVATION_DEG {
        return 0.0;
    }
    let ramp =
        (TURBULENCE_RAMP_ELEVATION_DEG - elevation_deg.max(0.0)) / TURBULENCE_RAMP_ELEVATION_DEG;
    ramp * cn2.clamp(CN2_MIN, CN2_MAX).log10().abs() * 0.5
}

/// Cloud attenuation (dB), 5 dB at full overcast.
pub fn cloud_penalty(cloud_cover_pct: f64) -> f64 {
    cloud_cover_pct.clamp(0.0, 100.0) / 100.0 * CLOUD_PENALTY_DB
}

/// Every atmospheric contribution for one elevation and optional weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosphericTerms {
    pub cn2: f64,
    pub transmission: f64,
    pub atmospheric_loss_db: f64,
    pub turbulence_penalty_db: f64,
    pub cloud_penalty_db: f64,
}

impl AtmosphericTerms {
    pub fn evaluate(elevation_deg: f64, weather: Option<&WeatherSample>) -> Result<Self> {
        let weather = weather.map(WeatherSample::validated).transpose()?;
        let transmission = transmission(elevation_deg)?;

        let cn2 = weather
            .map(|wx| cn2_turbulence(wx.cloud_cover_pct, wx.wind_speed_ms, elevation_deg))
            .unwrap_or(CN2_BASELINE);

        let terms = Self {
            cn2,
            transmission,
            atmospheric_loss_db: atmospheric_loss(elevation_deg)?,
            turbulence_penalty_db: turbulence_penalty(elevation_deg, cn2),
            cloud_penalty_db: weather.map(|wx| cloud_penalty(wx.cloud_cover_pct)).unwrap_or(0.0),
        };
        trace!(elevation_deg, ?terms, "atmospheric terms");
        Ok(terms)
    }

    pub fn total_loss_db(&self) -> f64 {
        self.atmospheric_loss_db + self.turbulence_penalty_db + self.cloud_penalty_db
    }

    /// Linear link quality in [0, 1].
    pub fn quality(&self) -> f64 {
        10f64.powf(-self.total_loss_db() / 10.0).clamp(0.0, 1.0)
    }

    pub fn category(&self) -> QualityCategory {
        quality_category(self.cn2)
    }
}

/// Linear link quality in [0, 1] for an elevation and optional weather.
pub fn link_quality(elevation_deg: f64, weather: Option<&WeatherSample>) -> Result<f64> {
    Ok(AtmosphericTerms::evaluate(elevation_deg, weather)?.quality())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityCategory {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl QualityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityCategory::Excellent => "excellent",
            QualityCategory::Good => "good",
            QualityCategory::Moderate => "moderate",
            QualityCategory::Poor => "poor",
            QualityCategory::VeryPoor => "very_poor",
        }
    }
}

impl std::fmt::Display for QualityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turbulence strength bucket for a Cn² value.
pub fn quality_category(cn2: f64) -> QualityCategory {
    match cn2 {
        c if c < 1e-16 => QualityCategory::Excellent,
        c if c < 5e-16 => QualityCategory::Good,
        c if c < 1e-15 => QualityCategory::Moderate,
        c if c < 5e-15 => QualityCategory::Poor,
        _ => QualityCategory::VeryPoor,
    }
}
