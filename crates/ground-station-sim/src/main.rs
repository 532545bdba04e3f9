//! Ground Station Simulation CLI
//!
//! Usage:
//!   ground-station-sim [--scenario scenario.json] [--tle catalog.tle]
//!                      [--lat DEG --lon DEG --alt-m M] [--duration-min N]
//!                      [--step-s N] [--realtime] [--output telemetry.jsonl]

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use ground_station_sim::{ConstellationSource, OutputLine, SimConfig, Simulation};
use link_budget::Climatology;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ground-station-sim", about = "Simulate one optical ground station tracking a constellation")]
struct Args {
    /// Scenario JSON file
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// TLE catalog to track instead of the scenario constellation
    #[arg(long)]
    tle: Option<PathBuf>,

    /// Station latitude (deg)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Station longitude (deg)
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Station altitude (m)
    #[arg(long)]
    alt_m: Option<f64>,

    /// Simulation start (RFC 3339), defaults to now
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Simulated span in minutes
    #[arg(long)]
    duration_min: Option<f64>,

    /// Seconds between ticks
    #[arg(long)]
    step_s: Option<u64>,

    /// Weather when the scenario does not fix it
    #[arg(long, value_enum, default_value_t = WeatherMode::Clear)]
    weather: WeatherMode,

    /// Pace ticks against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Output file for JSON lines (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WeatherMode {
    /// Scenario weather only, clear sky otherwise
    Clear,
    /// Latitude-band climatology
    Climatology,
}

fn build_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.scenario {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::new(),
    };

    config.station = config.station.with_env();
    if let Some(path) = &args.tle {
        config.constellation = ConstellationSource::Tle { path: path.clone() };
    }
    if let Some(lat) = args.lat {
        config.station.latitude_deg = lat;
    }
    if let Some(lon) = args.lon {
        config.station.longitude_deg = lon;
    }
    if let Some(alt) = args.alt_m {
        config.station.altitude_m = alt;
    }
    if let Some(start) = args.start {
        config.start = Some(start);
    }
    if let Some(minutes) = args.duration_min {
        config.duration_minutes = minutes;
    }
    if let Some(step) = args.step_s {
        config.step_seconds = step;
    }
    config.validate()?;
    Ok(config)
}

fn write_line(out: &mut dyn Write, line: &OutputLine) -> ground_station_sim::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "ground_station_sim=debug,orbital_mechanics=debug,link_budget=debug"
    } else {
        "ground_station_sim=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&args)?;
    let start = if args.realtime {
        Utc::now()
    } else {
        config.start.unwrap_or_else(Utc::now)
    };

    // Relative catalog paths inside a scenario resolve against its directory
    let base = match (&args.tle, &args.scenario) {
        (None, Some(scenario)) => scenario.parent(),
        _ => None,
    };
    let satellites = config.constellation.load(start, base)?;
    let sim = Simulation::new(config, satellites)?;
    let sim = match args.weather {
        WeatherMode::Clear => sim,
        WeatherMode::Climatology => {
            let sim = sim.with_weather_source(&Climatology)?;
            if let Some(wx) = sim.weather() {
                let climate = Climatology.climate_for(sim.station().latitude);
                let score = wx.fso_score_with_climate(&climate);
                info!(
                    "Site score {:.2} with climate ({:.0} sunshine h/yr, viable: {})",
                    score.quality,
                    climate.annual_sunshine_hours.unwrap_or_default(),
                    score.link_viable
                );
            }
            sim
        }
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            info!("Writing telemetry to {:?}", path);
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if args.realtime {
        let step = sim.config().step_seconds;
        let mut interval = time::interval(Duration::from_secs(step));
        for index in 0..=sim.config().tick_count() {
            interval.tick().await;
            for line in sim.step(index, Utc::now()) {
                write_line(out.as_mut(), &line)?;
            }
            out.flush()?;
        }
        for contact in sim.contact_windows(start)? {
            write_line(out.as_mut(), &OutputLine::Contact(contact))?;
        }
    } else {
        info!(
            "Simulating {:.0} min from {} in {} s steps",
            sim.config().duration_minutes,
            start,
            sim.config().step_seconds
        );
        sim.run(start, |line| write_line(out.as_mut(), line))?;
    }

    out.flush()?;
    Ok(())
}
