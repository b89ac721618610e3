#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI front end for the impact map estimation pipeline.
//!
//! Resolves densities and casualty estimates for a coordinate from the
//! command line, printing results as pretty JSON. Useful for poking
//! the remote data sources without running the API server.

use clap::{Parser, Subcommand};
use impact_map_population::{PopulationService, source_registry};
use impact_map_population_models::Coordinate;

#[derive(Parser)]
#[command(name = "impact_map_cli", about = "Impact map estimation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the population density at a coordinate
    Density {
        /// Latitude in degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long)]
        lon: f64,
    },
    /// Estimate casualties for a blast radius around a coordinate
    Estimate {
        /// Latitude in degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long)]
        lon: f64,
        /// Blast radius in meters
        #[arg(long)]
        radius_m: f64,
    },
    /// List all configured data sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();

    match cli.command {
        Commands::Density { lat, lon } => {
            let service = PopulationService::new();
            let result = service.resolve_density(Coordinate::new(lat, lon)).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Estimate { lat, lon, radius_m } => {
            let service = PopulationService::new();
            let estimate = service
                .estimate_casualties(Coordinate::new(lat, lon), radius_m)
                .await?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        }
        Commands::Sources => {
            for source in source_registry::all_sources() {
                let status = if source.enabled { "enabled" } else { "disabled" };
                println!("{:<16} {:<32} [{status}]", source.id, source.name);
            }
        }
    }

    Ok(())
}
