//! Scenario configuration
//!
//! A scenario is a JSON document; every field has a default so an empty
//! object runs the HALO constellation over a station at (0°, 0°).

use crate::{Result, SimError};
use chrono::{DateTime, Utc};
use link_budget::{OpticalTerminal, WeatherSample};
use orbital_mechanics::walker::WalkerDelta;
use orbital_mechanics::{GeodeticPosition, GeometryConfig, Satellite};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ground station identity and location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub id: String,
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            id: "GS-000".to_string(),
            name: "Default".to_string(),
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        }
    }
}

impl StationConfig {
    /// Apply `GS_ID`, `GS_NAME`, `GS_LAT`, `GS_LON` and `GS_ALT_M` overrides.
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Overrides from an arbitrary variable lookup. Unparseable numbers are
    /// ignored with a warning.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("GS_ID") {
            self.id = id;
        }
        if let Some(name) = lookup("GS_NAME") {
            self.name = name;
        }
        let number = |key: &str| {
            lookup(key).and_then(|s| match s.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("ignoring {}={:?}: not a number", key, s);
                    None
                }
            })
        };
        if let Some(lat) = number("GS_LAT") {
            self.latitude_deg = lat;
        }
        if let Some(lon) = number("GS_LON") {
            self.longitude_deg = lon;
        }
        if let Some(alt) = number("GS_ALT_M") {
            self.altitude_m = alt;
        }
        self
    }

    pub fn geodetic(&self) -> Result<GeodeticPosition> {
        Ok(GeodeticPosition::new(
            self.latitude_deg,
            self.longitude_deg,
            self.altitude_m / 1000.0,
        )?)
    }
}

/// Where the simulated satellites come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ConstellationSource {
    /// Generated Walker Delta pattern, epoch at scenario start
    Walker(WalkerDelta),
    /// Two- or three-line element catalog on disk
    Tle { path: PathBuf },
    /// Catalog entries inline in the scenario
    Satellites { satellites: Vec<Satellite> },
}

impl Default for ConstellationSource {
    fn default() -> Self {
        ConstellationSource::Walker(WalkerDelta::halo_constellation())
    }
}

impl ConstellationSource {
    /// Resolve to catalog entries. Relative TLE paths are taken from `base`.
    pub fn load(&self, epoch: DateTime<Utc>, base: Option<&Path>) -> Result<Vec<Satellite>> {
        match self {
            ConstellationSource::Walker(walker) => {
                walker.validate()?;
                Ok(walker.satellites(epoch)?)
            }
            ConstellationSource::Tle { path } => {
                let resolved = match base {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                crate::catalog::load_tle_catalog(&resolved)
            }
            ConstellationSource::Satellites { satellites } => Ok(satellites.clone()),
        }
    }
}

/// Full simulation scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub station: StationConfig,
    pub constellation: ConstellationSource,
    /// Defaults to the wall clock when the run starts
    pub start: Option<DateTime<Utc>>,
    pub duration_minutes: f64,
    pub step_seconds: u64,
    pub geometry: GeometryConfig,
    pub terminal: OpticalTerminal,
    /// Surface weather held for the whole run; none means clear sky
    pub weather: Option<WeatherSample>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            station: StationConfig::default(),
            constellation: ConstellationSource::default(),
            start: None,
            duration_minutes: 360.0,
            step_seconds: 60,
            geometry: GeometryConfig::default(),
            terminal: OpticalTerminal::default(),
            weather: None,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading scenario from {:?}", path);
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: SimConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn duration_minutes(mut self, minutes: f64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn step_seconds(mut self, seconds: u64) -> Self {
        self.step_seconds = seconds;
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn station(mut self, station: StationConfig) -> Self {
        self.station = station;
        self
    }

    pub fn constellation(mut self, source: ConstellationSource) -> Self {
        self.constellation = source;
        self
    }

    pub fn weather(mut self, weather: Option<WeatherSample>) -> Self {
        self.weather = weather;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_seconds == 0 {
            return Err(SimError::InvalidConfig("step_seconds must be positive".to_string()));
        }
        if !(self.duration_minutes.is_finite() && self.duration_minutes >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "duration_minutes must be finite and non-negative, got {}",
                self.duration_minutes
            )));
        }
        self.station.geodetic()?;
        if let Some(weather) = &self.weather {
            weather.validated()?;
        }
        Ok(())
    }

    pub fn step_minutes(&self) -> f64 {
        self.step_seconds as f64 / 60.0
    }

    /// Number of ticks after the first; the span is sampled inclusively.
    pub fn tick_count(&self) -> u64 {
        (self.duration_minutes * 60.0 / self.step_seconds.max(1) as f64).floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_scenario_uses_defaults() {
        let config: SimConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.station.id, "GS-000");
        assert_eq!(config.step_seconds, 60);
        assert!(matches!(config.constellation, ConstellationSource::Walker(ref w) if w.total_satellites == 12));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scenario_sources() {
        let json = r#"{"constellation": {"source": "tle", "path": "catalog.tle"}}"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.constellation, ConstellationSource::Tle { .. }));

        let json = r#"{"constellation": {"source": "walker", "total_satellites": 6,
            "planes": 2, "phasing": 1, "altitude_km": 1200.0, "inclination_deg": 53.0}}"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();
        let sats = config.constellation.load(Utc::now(), None).unwrap();
        assert_eq!(sats.len(), 6);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SimConfig::new().step_seconds(0).validate().is_err());
        assert!(SimConfig::new().duration_minutes(f64::NAN).validate().is_err());

        let mut station = StationConfig::default();
        station.latitude_deg = 95.0;
        assert!(SimConfig::new().station(station).validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [("GS_ID", "GS-042"), ("GS_LAT", "48.5"), ("GS_ALT_M", "oops")]
            .into_iter()
            .collect();
        let station = StationConfig::default().with_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(station.id, "GS-042");
        assert_eq!(station.latitude_deg, 48.5);
        assert_eq!(station.altitude_m, 0.0);
    }

    #[test]
    fn test_tick_count() {
        let config = SimConfig::new().duration_minutes(10.0).step_seconds(60);
        assert_eq!(config.tick_count(), 10);
        let config = SimConfig::new().duration_minutes(0.0);
        assert_eq!(config.tick_count(), 0);
    }
}
