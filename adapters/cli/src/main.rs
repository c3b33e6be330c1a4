#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that loads a layout and pumps the Gridforge simulation.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use gridforge_world::query;
use log::{info, warn};

use crate::{
    config::Settings,
    simulation::{Simulation, Summary},
};

/// Command-line options for a single simulation run.
#[derive(Debug, Parser)]
#[command(name = "gridforge", about = "Runs the Gridforge simulation without a frontend")]
struct Cli {
    /// TOML file with world, system and layout settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated time to run, in seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u64,
    /// Overrides the seed of every randomised system.
    #[arg(long)]
    seed: Option<u64>,
    /// Length of a simulation frame, in milliseconds.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    ensure!(cli.step_ms > 0, "--step-ms must be greater than zero");

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = cli.seed {
        settings.reseed(seed);
    }

    let mut simulation = Simulation::new(&settings);
    let frames = cli.seconds.saturating_mul(1000) / cli.step_ms;
    let dt = Duration::from_millis(cli.step_ms);
    info!("running {frames} frames of {}ms", cli.step_ms);

    for _ in 0..frames {
        simulation.step(dt);
        if query::core_integrity(simulation.world()) == 0 {
            warn!("core destroyed; stopping early");
            break;
        }
    }

    println!("{}", Summary::capture(simulation.world()));
    Ok(())
}
