//! Surface Weather for FSO Link Quality
//!
//! Observations come from an external source; this module only validates and
//! scores them:
//! - Cloud cover (primary FSO blocker)
//! - Visibility (aerosol scattering)
//! - Precipitation (rain/snow scattering)
//! - Wind (turbulence and pointing stability)
//!
//! Site selection adds long-term climate factors on top: annual sunshine,
//! clear nights per year and air quality.

use crate::{LinkBudgetError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One surface weather observation at a ground station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Cloud cover percentage (0-100)
    pub cloud_cover_pct: f64,
    /// Wind speed (m/s)
    pub wind_speed_ms: f64,
    /// Visibility in km
    pub visibility_km: f64,
    /// Relative humidity (0-100)
    pub humidity_pct: f64,
    /// Temperature (Celsius)
    pub temperature_c: f64,
    /// Precipitation rate (mm/h)
    #[serde(default)]
    pub precipitation_mm_h: f64,
}

/// FSO weather quality score (0-1, 1 = optimal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsoWeatherScore {
    /// Overall quality score (0-1)
    pub quality: f64,
    /// Cloud impact (0-1, 1 = no clouds)
    pub cloud_score: f64,
    /// Visibility impact (0-1, 1 = clear)
    pub visibility_score: f64,
    /// Precipitation impact (0-1, 1 = no precip)
    pub precip_score: f64,
    /// Turbulence/wind impact (0-1, 1 = calm)
    pub turbulence_score: f64,
    /// Annual sunshine (0-1), present when scored against a site climate
    #[serde(default)]
    pub sunshine_score: Option<f64>,
    /// Clear nights per year (0-1)
    #[serde(default)]
    pub clear_night_score: Option<f64>,
    /// Air quality (0-1, 1 = clean air)
    #[serde(default)]
    pub air_quality_score: Option<f64>,
    pub link_viable: bool,
    /// Reason if not viable
    pub degradation_reason: Option<String>,
}

/// Long-term climate of a ground site. Unknown values score as neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteClimate {
    /// Typical range 1000-4000 h/year
    pub annual_sunshine_hours: Option<f64>,
    /// 0-365
    pub clear_nights_per_year: Option<f64>,
    /// US EPA AQI
    pub air_quality_index: Option<f64>,
    /// Used when no AQI is available (µg/m³)
    pub pm25_ugm3: Option<f64>,
}

/// Composite weights with site climate. Real-time factors carry 75%.
const W_CLOUD: f64 = 0.30;
const W_VISIBILITY: f64 = 0.15;
const W_PRECIP: f64 = 0.15;
const W_TURBULENCE: f64 = 0.05;
const W_AIR_QUALITY: f64 = 0.10;
const W_SUNSHINE: f64 = 0.15;
const W_CLEAR_NIGHTS: f64 = 0.10;

const VIABILITY_CLOUD_MIN: f64 = 0.2;
const VIABILITY_VISIBILITY_MIN: f64 = 0.3;
const VIABILITY_PRECIP_MIN: f64 = 0.2;
const VIABILITY_AIR_QUALITY_MIN: f64 = 0.2;
const VIABILITY_COMPOSITE_MIN: f64 = 0.3;

impl SiteClimate {
    pub fn sunshine_score(&self) -> f64 {
        match self.annual_sunshine_hours {
            Some(h) if h >= 3500.0 => 1.0,
            Some(h) if h >= 2500.0 => 0.7 + 0.3 * (h - 2500.0) / 1000.0,
            Some(h) if h >= 1500.0 => 0.4 + 0.3 * (h - 1500.0) / 1000.0,
            Some(h) if h >= 1000.0 => 0.2 + 0.2 * (h - 1000.0) / 500.0,
            Some(_) => 0.1,
            None => 0.5,
        }
    }

    pub fn clear_night_score(&self) -> f64 {
        match self.clear_nights_per_year {
            Some(n) if n >= 250.0 => 1.0,
            Some(n) if n >= 200.0 => 0.8 + 0.2 * (n - 200.0) / 50.0,
            Some(n) if n >= 150.0 => 0.6 + 0.2 * (n - 150.0) / 50.0,
            Some(n) if n >= 100.0 => 0.4 + 0.2 * (n - 100.0) / 50.0,
            Some(n) => 0.1 + 0.3 * n.max(0.0) / 100.0,
            None => 0.5,
        }
    }

    /// AQI first, then PM2.5, else assume moderate air.
    pub fn air_quality_score(&self) -> f64 {
        match (self.air_quality_index, self.pm25_ugm3) {
            (Some(aqi), _) => match aqi {
                a if a <= 50.0 => 1.0,
                a if a <= 100.0 => 0.7 + 0.3 * (100.0 - a) / 50.0,
                a if a <= 150.0 => 0.4 + 0.3 * (150.0 - a) / 50.0,
                a if a <= 200.0 => 0.2 + 0.2 * (200.0 - a) / 50.0,
                a if a <= 300.0 => 0.1 + 0.1 * (300.0 - a) / 100.0,
                _ => 0.05,
            },
            (None, Some(pm)) => match pm {
                p if p <= 12.0 => 1.0,
                p if p <= 35.0 => 0.7 + 0.3 * (35.0 - p) / 23.0,
                p if p <= 55.0 => 0.4 + 0.3 * (55.0 - p) / 20.0,
                p if p <= 150.0 => 0.1 + 0.3 * (150.0 - p) / 95.0,
                _ => 0.05,
            },
            (None, None) => 0.7,
        }
    }
}

impl WeatherSample {
    /// Clear, calm sky.
    pub fn clear() -> Self {
        Self {
            cloud_cover_pct: 0.0,
            wind_speed_ms: 3.0,
            visibility_km: 50.0,
            humidity_pct: 40.0,
            temperature_c: 20.0,
            precipitation_mm_h: 0.0,
        }
    }

    /// Checks the sample before it reaches any formula.
    ///
    /// Non-finite or negative physical quantities are rejected; percentages
    /// outside 0-100 are clamped with a warning.
    pub fn validated(&self) -> Result<Self> {
        let fields = [
            ("cloud_cover_pct", self.cloud_cover_pct),
            ("wind_speed_ms", self.wind_speed_ms),
            ("visibility_km", self.visibility_km),
            ("humidity_pct", self.humidity_pct),
            ("temperature_c", self.temperature_c),
            ("precipitation_mm_h", self.precipitation_mm_h),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(LinkBudgetError::InvalidWeather(format!("{name} is not finite: {value}")));
        }
        for (name, value) in [
            ("wind_speed_ms", self.wind_speed_ms),
            ("visibility_km", self.visibility_km),
            ("precipitation_mm_h", self.precipitation_mm_h),
        ] {
            if value < 0.0 {
                return Err(LinkBudgetError::InvalidWeather(format!("{name} is negative: {value}")));
            }
        }

        let mut sample = *self;
        for (name, pct) in [
            ("cloud_cover_pct", &mut sample.cloud_cover_pct),
            ("humidity_pct", &mut sample.humidity_pct),
        ] {
            if !(0.0..=100.0).contains(&*pct) {
                warn!(field = name, value = *pct, "percentage out of range, clamping");
                *pct = pct.clamp(0.0, 100.0);
            }
        }
        Ok(sample)
    }

    /// Calculate FSO weather quality score from current conditions only
    pub fn fso_score(&self) -> FsoWeatherScore {
        let (cloud_score, visibility_score, precip_score, turbulence_score) = self.condition_scores();

        let quality = 0.40 * cloud_score
            + 0.25 * visibility_score
            + 0.25 * precip_score
            + 0.10 * turbulence_score;

        let (link_viable, degradation_reason) =
            verdict(cloud_score, visibility_score, precip_score, None, quality);

        FsoWeatherScore {
            quality,
            cloud_score,
            visibility_score,
            precip_score,
            turbulence_score,
            sunshine_score: None,
            clear_night_score: None,
            air_quality_score: None,
            link_viable,
            degradation_reason,
        }
    }

    /// Score current conditions together with the site's long-term climate.
    pub fn fso_score_with_climate(&self, climate: &SiteClimate) -> FsoWeatherScore {
        let (cloud_score, visibility_score, precip_score, turbulence_score) = self.condition_scores();
        let sunshine_score = climate.sunshine_score();
        let clear_night_score = climate.clear_night_score();
        let air_quality_score = climate.air_quality_score();

        let quality = W_CLOUD * cloud_score
            + W_VISIBILITY * visibility_score
            + W_PRECIP * precip_score
            + W_TURBULENCE * turbulence_score
            + W_AIR_QUALITY * air_quality_score
            + W_SUNSHINE * sunshine_score
            + W_CLEAR_NIGHTS * clear_night_score;

        let (link_viable, degradation_reason) = verdict(
            cloud_score,
            visibility_score,
            precip_score,
            Some(air_quality_score),
            quality,
        );

        FsoWeatherScore {
            quality,
            cloud_score,
            visibility_score,
            precip_score,
            turbulence_score,
            sunshine_score: Some(sunshine_score),
            clear_night_score: Some(clear_night_score),
            air_quality_score: Some(air_quality_score),
            link_viable,
            degradation_reason,
        }
    }

    /// (cloud, visibility, precipitation, turbulence) sub-scores
    fn condition_scores(&self) -> (f64, f64, f64, f64) {
        // 0% = perfect, 100% = total blockage
        let cloud_score = 1.0 - (self.cloud_cover_pct / 100.0).clamp(0.0, 1.0);

        // Visibility: < 1km is critical, > 20km is excellent
        let visibility_score = match self.visibility_km {
            v if v < 1.0 => 0.1,
            v if v < 5.0 => 0.3 + 0.2 * (v - 1.0) / 4.0,
            v if v < 10.0 => 0.5 + 0.2 * (v - 5.0) / 5.0,
            v if v < 20.0 => 0.7 + 0.2 * (v - 10.0) / 10.0,
            _ => 0.9,
        };

        // Any significant precipitation blocks FSO
        let precip_score = match self.precipitation_mm_h {
            p if p > 0.5 => 0.1,
            p if p > 0.1 => 0.3 + 0.4 * (1.0 - p / 0.5),
            p => 1.0 - p.max(0.0) * 3.0,
        };

        // > 20 m/s is problematic for fine pointing
        let turbulence_score = match self.wind_speed_ms {
            w if w > 25.0 => 0.3,
            w if w > 15.0 => 0.5 + 0.2 * (25.0 - w) / 10.0,
            w if w > 10.0 => 0.7 + 0.2 * (15.0 - w) / 5.0,
            w => 0.9 + 0.1 * (10.0 - w.max(0.0)) / 10.0,
        };

        (cloud_score, visibility_score, precip_score, turbulence_score)
    }
}

fn verdict(
    cloud: f64,
    visibility: f64,
    precip: f64,
    air_quality: Option<f64>,
    quality: f64,
) -> (bool, Option<String>) {
    let reason = if cloud < VIABILITY_CLOUD_MIN {
        Some("Heavy cloud cover")
    } else if visibility < VIABILITY_VISIBILITY_MIN {
        Some("Poor visibility")
    } else if precip < VIABILITY_PRECIP_MIN {
        Some("Active precipitation")
    } else if air_quality.is_some_and(|aq| aq < VIABILITY_AIR_QUALITY_MIN) {
        Some("Poor air quality (high particulates)")
    } else if quality < VIABILITY_COMPOSITE_MIN {
        Some("Multiple degradation factors")
    } else {
        None
    };
    (reason.is_none(), reason.map(str::to_string))
}

/// Source of surface observations for a ground location.
pub trait WeatherSource: Send + Sync {
    /// Current weather, `None` when no observation is available.
    fn current(&self, lat: f64, lon: f64) -> Option<WeatherSample>;

    /// Hourly forecast for the next `hours` hours.
    fn forecast(&self, lat: f64, lon: f64, hours: usize) -> Vec<WeatherSample> {
        self.current(lat, lon).map(|wx| vec![wx; hours]).unwrap_or_default()
    }
}

/// The same sample everywhere, for scenarios and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedWeather(pub WeatherSample);

impl WeatherSource for FixedWeather {
    fn current(&self, _lat: f64, _lon: f64) -> Option<WeatherSample> {
        Some(self.0)
    }
}

/// Latitude-band climatology. Deterministic, no observations required.
#[derive(Debug, Clone, Copy, Default)]
pub struct Climatology;

impl Climatology {
    /// (cloud %, visibility km) baseline for the latitude band
    fn band(abs_lat: f64) -> (f64, f64) {
        // Arid subtropics have the best skies
        if abs_lat > 15.0 && abs_lat < 35.0 {
            (20.0, 30.0)
        } else if abs_lat < 15.0 {
            (50.0, 15.0)
        } else if abs_lat < 55.0 {
            (40.0, 20.0)
        } else {
            (60.0, 10.0)
        }
    }

    pub fn sample_for(&self, lat: f64, lon: f64) -> WeatherSample {
        let abs_lat = lat.abs();
        let (cloud_base, visibility_base) = Self::band(abs_lat);

        let local_factor = (lon.to_radians().sin() + 1.0) / 2.0;

        WeatherSample {
            cloud_cover_pct: (cloud_base + local_factor * 20.0).min(100.0),
            wind_speed_ms: 5.0 + local_factor * 10.0,
            visibility_km: visibility_base + local_factor * 10.0,
            humidity_pct: 40.0 + cloud_base * 0.5,
            temperature_c: 20.0 - abs_lat * 0.5,
            precipitation_mm_h: 0.0,
        }
    }

    /// Site climate estimated from the latitude band.
    pub fn climate_for(&self, lat: f64) -> SiteClimate {
        let abs_lat = lat.abs();
        let arid = abs_lat > 15.0 && abs_lat < 35.0;

        let sunshine = if arid {
            3500.0 + (35.0 - abs_lat) * 10.0
        } else if abs_lat < 15.0 {
            2000.0 + abs_lat * 20.0
        } else if abs_lat < 55.0 {
            1800.0 + (55.0 - abs_lat) * 20.0
        } else {
            (1200.0 + (70.0 - abs_lat) * 30.0).max(1000.0)
        };
        let (cloud_base, _) = Self::band(abs_lat);

        SiteClimate {
            annual_sunshine_hours: Some(sunshine),
            clear_nights_per_year: Some((sunshine / 4000.0 * 280.0).min(300.0)),
            air_quality_index: Some(if arid { 30.0 } else { 50.0 + cloud_base * 0.3 }),
            pm25_ugm3: None,
        }
    }
}

impl WeatherSource for Climatology {
    fn current(&self, lat: f64, lon: f64) -> Option<WeatherSample> {
        Some(self.sample_for(lat, lon))
    }

    fn forecast(&self, lat: f64, lon: f64, hours: usize) -> Vec<WeatherSample> {
        (0..hours)
            .map(|h| {
                let mut wx = self.sample_for(lat, lon);
                // Forecast uncertainty grows with lead time
                wx.cloud_cover_pct = (wx.cloud_cover_pct + h as f64 * 2.0).min(100.0);
                wx
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_weather_score() {
        let score = WeatherSample { cloud_cover_pct: 5.0, ..WeatherSample::clear() }.fso_score();
        assert!(score.quality > 0.9, "Clear weather should have high score: {}", score.quality);
        assert!(score.link_viable);
    }

    #[test]
    fn test_cloudy_weather_blocks_link() {
        let wx = WeatherSample {
            cloud_cover_pct: 95.0,
            wind_speed_ms: 10.0,
            visibility_km: 5.0,
            humidity_pct: 80.0,
            temperature_c: 15.0,
            precipitation_mm_h: 0.0,
        };
        let score = wx.fso_score();
        assert!(!score.link_viable);
        assert_eq!(score.degradation_reason.as_deref(), Some("Heavy cloud cover"));
    }

    #[test]
    fn test_precipitation_blocks_link() {
        let wx = WeatherSample {
            cloud_cover_pct: 50.0,
            precipitation_mm_h: 2.0,
            ..WeatherSample::clear()
        };
        let score = wx.fso_score();
        assert!(!score.link_viable);
        assert_eq!(score.degradation_reason.as_deref(), Some("Active precipitation"));
    }

    #[test]
    fn test_validated_clamps_and_rejects() {
        let wx = WeatherSample { cloud_cover_pct: 140.0, humidity_pct: -3.0, ..WeatherSample::clear() };
        let v = wx.validated().unwrap();
        assert_eq!(v.cloud_cover_pct, 100.0);
        assert_eq!(v.humidity_pct, 0.0);

        let nan = WeatherSample { wind_speed_ms: f64::NAN, ..WeatherSample::clear() };
        assert!(matches!(nan.validated(), Err(LinkBudgetError::InvalidWeather(_))));

        let negative = WeatherSample { visibility_km: -1.0, ..WeatherSample::clear() };
        assert!(negative.validated().is_err());
    }

    #[test]
    fn test_climatology_latitude_variation() {
        let source = Climatology;
        let desert = source.current(25.0, 0.0).unwrap().fso_score();
        let tropical = source.current(5.0, 0.0).unwrap().fso_score();
        assert!(desert.quality > tropical.quality);

        let forecast = source.forecast(25.0, 0.0, 6);
        assert_eq!(forecast.len(), 6);
        assert!(forecast[5].cloud_cover_pct > forecast[0].cloud_cover_pct);
    }

    #[test]
    fn test_fixed_weather_forecast_repeats() {
        let source = FixedWeather(WeatherSample::clear());
        let forecast = source.forecast(0.0, 0.0, 3);
        assert_eq!(forecast, vec![WeatherSample::clear(); 3]);
    }

    #[test]
    fn test_realtime_score_has_no_climate_terms() {
        let score = WeatherSample::clear().fso_score();
        assert_eq!(score.sunshine_score, None);
        assert_eq!(score.air_quality_score, None);
    }

    #[test]
    fn test_unknown_climate_scores_neutral() {
        let climate = SiteClimate::default();
        assert_eq!(climate.sunshine_score(), 0.5);
        assert_eq!(climate.clear_night_score(), 0.5);
        assert_eq!(climate.air_quality_score(), 0.7);

        let pm_only = SiteClimate { pm25_ugm3: Some(10.0), ..SiteClimate::default() };
        assert_eq!(pm_only.air_quality_score(), 1.0);
    }

    #[test]
    fn test_desert_site_beats_high_latitude() {
        let source = Climatology;
        let desert = source.climate_for(25.0);
        let north = source.climate_for(65.0);
        assert!(desert.sunshine_score() > north.sunshine_score());
        assert!(desert.clear_night_score() > north.clear_night_score());
        assert!(desert.air_quality_score() > north.air_quality_score());

        let wx = WeatherSample::clear();
        let good = wx.fso_score_with_climate(&desert);
        let poor = wx.fso_score_with_climate(&north);
        assert!(good.quality > poor.quality);
        assert!(good.link_viable);
        assert!(good.quality > 0.85, "quality {}", good.quality);
    }

    #[test]
    fn test_hazardous_air_blocks_link() {
        let smoky = SiteClimate { air_quality_index: Some(350.0), ..SiteClimate::default() };
        let score = WeatherSample::clear().fso_score_with_climate(&smoky);
        assert!(!score.link_viable);
        assert_eq!(
            score.degradation_reason.as_deref(),
            Some("Poor air quality (high particulates)")
        );
        // Clouds are still reported first
        let overcast = WeatherSample { cloud_cover_pct: 95.0, ..WeatherSample::clear() };
        let score = overcast.fso_score_with_climate(&smoky);
        assert_eq!(score.degradation_reason.as_deref(), Some("Heavy cloud cover"));
    }
}
