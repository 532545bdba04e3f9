//! Simulation loop
//!
//! Pure with respect to time: every sample takes the instant as an argument,
//! so the same `Simulation` serves both the fast-forward run and the
//! wall-clock paced one.

use crate::config::SimConfig;
use crate::telemetry::{ContactSummary, OutputLine, StationStatus, TelemetryRecord, TrackingMode};
use crate::{Result, SimError};
use chrono::{DateTime, TimeDelta, Utc};
use link_budget::{link_budget, WeatherSample, WeatherSource};
use orbital_mechanics::contact::find_contact_windows;
use orbital_mechanics::geometry::geometry;
use orbital_mechanics::propagation::propagate;
use orbital_mechanics::radiation::radiation_parameters;
use orbital_mechanics::transforms::{sidereal_time, to_geodetic};
use orbital_mechanics::{ContactWindow, GeodeticPosition, Satellite};
use tracing::{debug, info, warn};

/// Log the tracked satellite every this many ticks
const TRACKING_LOG_EVERY: u64 = 10;
/// Log the idle state every this many ticks
const IDLE_LOG_EVERY: u64 = 60;

pub struct Simulation {
    config: SimConfig,
    station: GeodeticPosition,
    satellites: Vec<Satellite>,
    weather: Option<WeatherSample>,
}

impl Simulation {
    pub fn new(config: SimConfig, satellites: Vec<Satellite>) -> Result<Self> {
        config.validate()?;
        let station = config.station.geodetic()?;
        let weather = config.weather.map(|wx| wx.validated()).transpose()?;
        info!(
            "Ground Station {} ({}) at {:.4}°, {:.4}° with {} satellites",
            config.station.id,
            config.station.name,
            station.latitude,
            station.longitude,
            satellites.len()
        );
        Ok(Self {
            config,
            station,
            satellites,
            weather,
        })
    }

    /// Take weather from `source` when the scenario does not fix it.
    pub fn with_weather_source(mut self, source: &dyn WeatherSource) -> Result<Self> {
        if self.weather.is_none() {
            self.weather = source
                .current(self.station.latitude, self.station.longitude)
                .map(|wx| wx.validated())
                .transpose()?;
            if let Some(wx) = &self.weather {
                let score = wx.fso_score();
                info!(
                    "Weather at {}: {:.0}% cloud, FSO score {:.2}{}",
                    self.config.station.id,
                    wx.cloud_cover_pct,
                    score.quality,
                    score
                        .degradation_reason
                        .map(|r| format!(" ({})", r))
                        .unwrap_or_default()
                );
            }
        }
        Ok(self)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn station(&self) -> &GeodeticPosition {
        &self.station
    }

    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    pub fn weather(&self) -> Option<&WeatherSample> {
        self.weather.as_ref()
    }

    /// Instant of tick `index` counted from `start`
    pub fn time_at(&self, start: DateTime<Utc>, index: u64) -> Result<DateTime<Utc>> {
        index
            .checked_mul(self.config.step_seconds)
            .and_then(|seconds| i64::try_from(seconds).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|offset| start.checked_add_signed(offset))
            .ok_or_else(|| {
                SimError::InvalidConfig(format!(
                    "tick {index} after {start} is outside the supported date range"
                ))
            })
    }

    /// Full telemetry for one satellite at `time`.
    pub fn sample(&self, satellite: &Satellite, time: DateTime<Utc>) -> Result<TelemetryRecord> {
        let minutes = satellite.elements.minutes_since_epoch(time);
        let state = propagate(&satellite.elements, minutes)?;
        let theta = sidereal_time(time);
        let position = to_geodetic(&state, theta);
        let look = geometry(&state, &self.station, theta, &self.config.geometry)?;
        let radiation = radiation_parameters(&state, &position);

        let link = if look.visible && look.elevation_deg > 0.0 {
            Some(link_budget(
                look.elevation_deg,
                look.range_km,
                self.weather.as_ref(),
                &self.config.terminal,
            )?)
        } else {
            None
        };

        Ok(TelemetryRecord {
            timestamp: time,
            station_id: self.config.station.id.clone(),
            satellite_id: satellite.id.clone(),
            norad_id: satellite.norad_id,
            satellite_name: satellite.name.clone(),
            minutes_since_epoch: minutes,
            position,
            geometry: look,
            radiation,
            link,
        })
    }

    /// Sample every satellite. A satellite that fails to propagate is
    /// skipped for this tick.
    pub fn tick(&self, time: DateTime<Utc>) -> Vec<TelemetryRecord> {
        self.satellites
            .iter()
            .filter_map(|sat| match self.sample(sat, time) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("{} skipped at {}: {}", sat.id, time, e);
                    None
                }
            })
            .collect()
    }

    /// Point the terminal at the highest visible satellite.
    pub fn station_status(&self, time: DateTime<Utc>, records: &[TelemetryRecord]) -> StationStatus {
        let visible: Vec<&TelemetryRecord> = records.iter().filter(|r| r.geometry.visible).collect();
        let best = visible.iter().copied().max_by(|a, b| {
            a.geometry
                .elevation_deg
                .total_cmp(&b.geometry.elevation_deg)
        });

        StationStatus {
            timestamp: time,
            station_id: self.config.station.id.clone(),
            tracking_mode: if best.is_some() {
                TrackingMode::Tracking
            } else {
                TrackingMode::Idle
            },
            visible_count: visible.len(),
            tracking_satellite_id: best.map(|r| r.satellite_id.clone()),
            tracking_satellite_norad: best.map(|r| r.norad_id),
            azimuth_deg: best.map(|r| r.geometry.azimuth_deg),
            elevation_deg: best.map(|r| r.geometry.elevation_deg),
            link_margin_db: best.and_then(|r| r.link.as_ref()).map(|l| l.link_margin_db),
        }
    }

    /// Telemetry lines for every satellite followed by the station line.
    pub fn step(&self, index: u64, time: DateTime<Utc>) -> Vec<OutputLine> {
        let records = self.tick(time);
        let status = self.station_status(time, &records);

        match (&status.tracking_satellite_id, status.azimuth_deg, status.elevation_deg) {
            (Some(id), Some(az), Some(el)) if index % TRACKING_LOG_EVERY == 0 => {
                let range = records
                    .iter()
                    .find(|r| &r.satellite_id == id)
                    .map(|r| r.geometry.range_km)
                    .unwrap_or_default();
                info!(
                    "{} tracking {} at Az={:.1}° El={:.1}° Range={:.0}km",
                    status.station_id, id, az, el, range
                );
            }
            (None, _, _) if index % IDLE_LOG_EVERY == 0 => {
                info!("{} idle - no satellites visible", status.station_id);
            }
            _ => {}
        }
        debug!(tick = index, visible = status.visible_count, "tick done");

        let mut lines: Vec<OutputLine> = records.into_iter().map(OutputLine::Telemetry).collect();
        lines.push(OutputLine::Station(status));
        lines
    }

    /// Fast-forward over the configured span, handing each line to `emit`,
    /// then append the contact summary.
    pub fn run<F>(&self, start: DateTime<Utc>, mut emit: F) -> Result<()>
    where
        F: FnMut(&OutputLine) -> Result<()>,
    {
        for index in 0..=self.config.tick_count() {
            for line in self.step(index, self.time_at(start, index)?) {
                emit(&line)?;
            }
        }
        for contact in self.contact_windows(start)? {
            emit(&OutputLine::Contact(contact))?;
        }
        Ok(())
    }

    /// Passes over the station between `start` and the end of the run,
    /// sorted by acquisition time.
    pub fn contact_windows(&self, start: DateTime<Utc>) -> Result<Vec<ContactSummary>> {
        let mut summaries = Vec::new();
        for sat in &self.satellites {
            let from = sat.elements.minutes_since_epoch(start);
            let windows = match find_contact_windows(
                &sat.elements,
                &self.station,
                from,
                from + self.config.duration_minutes,
                self.config.step_minutes(),
                &self.config.geometry,
            ) {
                Ok(windows) => windows,
                Err(e) => {
                    warn!("no contact windows for {}: {}", sat.id, e);
                    continue;
                }
            };

            let converted: Result<Vec<ContactSummary>> =
                windows.iter().map(|w| self.summarize(sat, w)).collect();
            match converted {
                Ok(mut found) => summaries.append(&mut found),
                Err(e) => warn!("no contact windows for {}: {}", sat.id, e),
            }
        }
        summaries.sort_by(|a, b| a.aos.cmp(&b.aos));
        info!(
            "{} contact windows over {:.0} min",
            summaries.len(),
            self.config.duration_minutes
        );
        Ok(summaries)
    }

    fn summarize(&self, sat: &Satellite, window: &ContactWindow) -> Result<ContactSummary> {
        let at = |minutes: f64| sat.elements.instant_at(minutes);
        Ok(ContactSummary {
            station_id: self.config.station.id.clone(),
            satellite_id: sat.id.clone(),
            aos: at(window.aos_minutes)?,
            los: at(window.los_minutes)?,
            tca: at(window.tca_minutes)?,
            duration_minutes: window.duration_minutes(),
            max_elevation_deg: window.max_elevation_deg,
            aos_azimuth_deg: window.aos_azimuth_deg,
            los_azimuth_deg: window.los_azimuth_deg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StationConfig;
    use chrono::{Duration, TimeZone};
    use link_budget::FixedWeather;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn halo_sim(minutes: f64) -> Simulation {
        let config = SimConfig::new()
            .station(StationConfig {
                latitude_deg: 35.0,
                longitude_deg: -106.0,
                ..StationConfig::default()
            })
            .duration_minutes(minutes)
            .step_seconds(60)
            .start(epoch());
        let sats = config.constellation.load(epoch(), None).unwrap();
        Simulation::new(config, sats).unwrap()
    }

    #[test]
    fn test_tick_samples_every_satellite() {
        let sim = halo_sim(10.0);
        let records = sim.tick(epoch());
        assert_eq!(records.len(), 12);
        for r in &records {
            assert_eq!(r.link.is_some(), r.geometry.visible && r.geometry.elevation_deg > 0.0);
            assert!((r.position.altitude_km - 10_500.0).abs() < 100.0);
        }
    }

    #[test]
    fn test_station_tracks_highest_satellite() {
        let sim = halo_sim(10.0);
        let records = sim.tick(epoch());
        let status = sim.station_status(epoch(), &records);
        let highest = records
            .iter()
            .filter(|r| r.geometry.visible)
            .map(|r| r.geometry.elevation_deg)
            .fold(f64::NEG_INFINITY, f64::max);

        match status.tracking_mode {
            TrackingMode::Tracking => assert_eq!(status.elevation_deg, Some(highest)),
            TrackingMode::Idle => assert_eq!(status.visible_count, 0),
        }
    }

    #[test]
    fn test_run_emits_every_tick() {
        let sim = halo_sim(5.0);
        let mut telemetry = 0;
        let mut stations = 0;
        sim.run(epoch(), |line| {
            match line {
                OutputLine::Telemetry(_) => telemetry += 1,
                OutputLine::Station(_) => stations += 1,
                OutputLine::Contact(_) => {}
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(stations, 6);
        assert_eq!(telemetry, 6 * 12);
    }

    #[test]
    fn test_contacts_fall_inside_run() {
        let sim = halo_sim(360.0);
        let contacts = sim.contact_windows(epoch()).unwrap();
        assert!(!contacts.is_empty());
        let end = epoch() + Duration::minutes(360);
        for c in &contacts {
            assert!(c.aos >= epoch() - Duration::seconds(1));
            assert!(c.los <= end + Duration::seconds(1));
            assert!(c.aos <= c.tca && c.tca <= c.los);
            assert!(c.max_elevation_deg > sim.config().geometry.horizon_mask_deg);
        }
        assert!(contacts.windows(2).all(|w| w[0].aos <= w[1].aos));
    }

    #[test]
    fn test_weather_source_fills_missing_weather() {
        let cloudy = WeatherSample {
            cloud_cover_pct: 90.0,
            ..WeatherSample::clear()
        };
        let sim = halo_sim(1.0).with_weather_source(&FixedWeather(cloudy)).unwrap();
        assert_eq!(sim.weather().map(|w| w.cloud_cover_pct), Some(90.0));
    }

    #[test]
    fn test_end_of_calendar_is_an_error() {
        let sim = halo_sim(10.0);
        let last = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);

        assert!(sim.time_at(last, 1).is_ok());
        assert!(matches!(sim.time_at(last, 2), Err(SimError::InvalidConfig(_))));
        assert!(sim.time_at(epoch(), u64::MAX).is_err());

        // Every satellite's search runs off the calendar and is skipped
        assert!(sim.contact_windows(last).unwrap().is_empty());
        assert!(sim.run(last, |_| Ok(())).is_err());
    }
}
