//! Orbital Fuzz Runner CLI
//!
//! Usage:
//!   orbit-fuzz run [--cases N] [--seed S] [--json results.json]
//!   orbit-fuzz list

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fuzz_harness::runner::{FuzzConfig, FuzzRunner};
use fuzz_harness::targets::{run_all, TARGETS};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "orbit-fuzz", about = "Property sweeps over the orbital and link libraries")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every fuzz target
    Run {
        /// Number of test cases per target
        #[arg(long, default_value_t = 10_000)]
        cases: u32,

        /// Random seed (0 = random)
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Also write results as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// List available fuzz targets
    List,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::List => {
            println!("Available fuzz targets:");
            for (name, description) in TARGETS {
                println!("  {:<28} {}", name, description);
            }
            Ok(())
        }
        Command::Run { cases, seed, json } => {
            let config = FuzzConfig::new().cases(cases).seed(seed);
            info!(cases = config.cases, seed = config.seed, "running {} targets", TARGETS.len());

            let mut runner = FuzzRunner::new(config);
            run_all(&mut runner);
            runner.print_all_summaries();

            if let Some(path) = json {
                info!("Writing results to {:?}", path);
                let writer = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(writer, runner.results())?;
            }

            if !runner.all_passed() {
                bail!("fuzz targets failed");
            }
            Ok(())
        }
    }
}
