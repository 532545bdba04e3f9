//! FSO Link Budget
//!
//! Ground-to-space free space optical link assessment at 1550nm:
//! - Cn² turbulence estimate from surface weather
//! - Elevation-dependent atmospheric extinction (Beer-Lambert)
//! - Turbulence and cloud penalties folded into a linear link quality
//! - Full terminal budget (path loss, aperture gains, received power, margin)
//!
//! Weather is optional everywhere; without a sample the documented fallback
//! constants are used.

use thiserror::Error;

pub mod atmosphere;
pub mod budget;
pub mod weather;

pub use atmosphere::{
    atmospheric_loss, cn2_turbulence, link_quality, quality_category, turbulence_penalty,
    AtmosphericTerms, QualityCategory,
};
pub use budget::{link_budget, LinkBudget, OpticalTerminal};
pub use weather::{
    Climatology, FixedWeather, FsoWeatherScore, SiteClimate, WeatherSample, WeatherSource,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkBudgetError {
    #[error("Elevation must be above the horizon, got {0}°")]
    NonPositiveElevation(f64),
    #[error("Invalid weather sample: {0}")]
    InvalidWeather(String),
    #[error("Non-finite input: {0}")]
    NonFinite(String),
}

pub type Result<T> = std::result::Result<T, LinkBudgetError>;
