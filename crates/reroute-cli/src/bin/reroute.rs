//! Offline reroute tool.
//!
//! Usage:
//!   reroute metrics --route route.json [--aircraft a320.json]
//!   reroute reroute --route route.json --alternatives alts.json --blocked WP2

use anyhow::Result;
use clap::{Parser, Subcommand};
use reroute_cli::{
    find_waypoint, init_tracing, load_aircraft, load_route, load_routes, metrics_json,
    parse_position,
};
use reroute_core::{recompute_metrics, ScoringWeights};
use reroute_engine::{EngineConfig, HeuristicRerouter, RerouteRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score and reroute flight routes offline")]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute and print the metrics of a route record
    Metrics {
        #[arg(long)]
        route: PathBuf,

        /// Aircraft performance file (JSON)
        #[arg(long)]
        aircraft: Option<PathBuf>,
    },
    /// Reroute a route around a blocked waypoint using supplied alternatives
    Reroute {
        #[arg(long)]
        route: PathBuf,

        /// JSON array of alternative route records
        #[arg(long)]
        alternatives: PathBuf,

        /// Blocked waypoint id or name
        #[arg(long)]
        blocked: String,

        /// Current position as "lat,lon"; defaults to the waypoint before the block
        #[arg(long)]
        position: Option<String>,

        #[arg(long)]
        aircraft: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    match args.command {
        Command::Metrics { route, aircraft } => {
            let mut route = load_route(&route)?;
            let aircraft = aircraft.as_deref().map(load_aircraft).transpose()?;
            recompute_metrics(&mut route, aircraft.as_ref(), &ScoringWeights::default());
            println!("{}", serde_json::to_string_pretty(&metrics_json(&route)?)?);
        }
        Command::Reroute {
            route,
            alternatives,
            blocked,
            position,
            aircraft,
        } => {
            let current_route = load_route(&route)?;
            let blocked_waypoint = find_waypoint(&current_route, &blocked)?;
            let current_position = position.as_deref().map(parse_position).transpose()?;
            let alternatives = load_routes(&alternatives)?;

            let mut rerouter = HeuristicRerouter::new(EngineConfig::from_env());
            if let Some(path) = aircraft {
                rerouter = rerouter.with_aircraft(load_aircraft(&path)?);
            }

            tracing::info!(
                route = %current_route.name,
                blocked = %blocked_waypoint.name,
                alternatives = alternatives.len(),
                "Rerouting offline"
            );
            let report = rerouter
                .reroute(RerouteRequest {
                    current_route,
                    blocked_waypoint,
                    current_position,
                    alternatives,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    Ok(())
}
