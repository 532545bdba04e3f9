//! Ground Station Simulation
//!
//! One optical ground station tracking a constellation over a span of
//! simulated time. Each tick propagates every satellite, computes look
//! angles, the radiation environment along the orbit and, for satellites in
//! view, the optical link budget. The binary writes the records as JSON
//! lines and closes with a contact-window summary.

use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod simulation;
pub mod telemetry;

pub use catalog::{load_tle_catalog, parse_tle_catalog};
pub use config::{ConstellationSource, SimConfig, StationConfig};
pub use simulation::Simulation;
pub use telemetry::{ContactSummary, OutputLine, StationStatus, TelemetryRecord, TrackingMode};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Orbital error: {0}")]
    Orbital(#[from] orbital_mechanics::OrbitalError),

    #[error("Link budget error: {0}")]
    LinkBudget(#[from] link_budget::LinkBudgetError),

    #[error("Invalid scenario: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
