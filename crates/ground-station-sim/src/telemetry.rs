//! Telemetry records written by the simulation, one JSON object per line.

use chrono::{DateTime, Utc};
use link_budget::LinkBudget;
use orbital_mechanics::{GeodeticPosition, LinkGeometry, RadiationSample};
use serde::{Deserialize, Serialize};

/// Per-satellite sample at one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub station_id: String,
    pub satellite_id: String,
    pub norad_id: u32,
    pub satellite_name: String,
    pub minutes_since_epoch: f64,
    pub position: GeodeticPosition,
    pub geometry: LinkGeometry,
    pub radiation: RadiationSample,
    /// Present only while the satellite is above the horizon mask
    pub link: Option<LinkBudget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    Idle,
    Tracking,
}

/// Station-level state at one tick: which satellite the terminal points at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationStatus {
    pub timestamp: DateTime<Utc>,
    pub station_id: String,
    pub tracking_mode: TrackingMode,
    pub visible_count: usize,
    pub tracking_satellite_id: Option<String>,
    pub tracking_satellite_norad: Option<u32>,
    pub azimuth_deg: Option<f64>,
    pub elevation_deg: Option<f64>,
    pub link_margin_db: Option<f64>,
}

/// A contact window with absolute times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSummary {
    pub station_id: String,
    pub satellite_id: String,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub tca: DateTime<Utc>,
    pub duration_minutes: f64,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputLine {
    Telemetry(TelemetryRecord),
    Station(StationStatus),
    Contact(ContactSummary),
}
