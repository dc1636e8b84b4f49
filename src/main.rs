mod config;
mod ephemeris;
mod error;
mod geo;
mod grid;
mod observer;
mod passes;
mod terminator;
mod web;

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::ephemeris::SatelliteCatalog;
use crate::passes::find_passes;

#[derive(Parser)]
#[command(name = "hamdash")]
#[command(about = "Amateur radio dashboard geometry engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Predict passes for one satellite and print them
    Passes {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
        /// NORAD catalog number
        norad_id: u32,
        #[arg(long, default_value_t = 24)]
        hours: i64,
        #[arg(long)]
        min_elevation: Option<f64>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Passes {
            config,
            norad_id,
            hours,
            min_elevation,
        } => passes(&config, norad_id, hours, min_elevation),
    }
}

fn load_config(path: &str) -> Result<Config, ExitCode> {
    Config::from_file(path).map_err(|e| {
        eprintln!("Error reading config {}: {}", path, e);
        ExitCode::FAILURE
    })
}

fn serve(config_path: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let observer = match config.station.observer() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Invalid station coordinates: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config, observer)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn passes(config_path: &str, norad_id: u32, hours: i64, min_elevation: Option<f64>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let observer = match config.station.observer() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Invalid station coordinates: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = Arc::new(SatelliteCatalog::new(
        config.tle.folder.clone(),
        config.tle.max_age,
    ));
    if let Err(e) = catalog.load_all() {
        eprintln!("Error loading element sets: {}", e);
        return ExitCode::FAILURE;
    }

    let sampler = match catalog.snapshot(norad_id) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = Utc::now();
    let end = start + Duration::hours(hours.clamp(1, 168));
    let threshold = min_elevation.unwrap_or(config.predict.default_min_elevation);
    let step = Duration::seconds(config.predict.coarse_step_seconds);

    let found = match find_passes(&sampler, &observer, start, end, threshold, step) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Prediction failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if sampler.meta().stale {
        eprintln!("Warning: element set for {} is stale", norad_id);
    }

    println!(
        "{} passes of {} above {:.1} deg in the next {} h",
        found.len(),
        sampler.info().name,
        threshold,
        hours
    );
    for (i, pass) in found.iter().enumerate() {
        let rise = if pass.rise_clipped { "window" } else { "rise" };
        let set = if pass.set_clipped { "window" } else { "set" };
        println!(
            "  {}: {} {} -> {} {} (max {:.1} deg, {} s)",
            i + 1,
            rise,
            pass.rise.instant.format("%Y-%m-%d %H:%M:%S"),
            set,
            pass.set.instant.format("%H:%M:%S"),
            pass.max_elevation_deg,
            pass.duration_seconds
        );
    }

    ExitCode::SUCCESS
}
