//! Reroute CLI - offline tools for scoring and rerouting flight routes.
//!
//! Route files use the same JSON record shape the API exchanges.

use anyhow::{anyhow, Context, Result};
use reroute_core::{route_from_json, routes_from_json, Aircraft, Route, RouteRecord, Waypoint};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_DIRECTIVE: &str = "reroute=info";

/// Install the fmt subscriber. A parseable `RUST_LOG` replaces the default
/// `reroute=info` filter entirely.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn load_route(path: &Path) -> Result<Route> {
    route_from_json(&read(path)?).with_context(|| format!("parsing route {}", path.display()))
}

pub fn load_routes(path: &Path) -> Result<Vec<Route>> {
    routes_from_json(&read(path)?).with_context(|| format!("parsing routes {}", path.display()))
}

pub fn load_aircraft(path: &Path) -> Result<Aircraft> {
    serde_json::from_str(&read(path)?).with_context(|| format!("parsing aircraft {}", path.display()))
}

/// Find a waypoint by id or, failing that, by exact name.
pub fn find_waypoint(route: &Route, key: &str) -> Result<Waypoint> {
    route
        .waypoints
        .iter()
        .find(|wp| wp.id.to_string() == key)
        .or_else(|| route.waypoints.iter().find(|wp| wp.name == key))
        .cloned()
        .ok_or_else(|| anyhow!("route '{}' has no waypoint '{}'", route.name, key))
}

/// Parse "lat,lon" into a synthetic current-position waypoint.
pub fn parse_position(raw: &str) -> Result<Waypoint> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("position must be 'lat,lon', got '{raw}'"))?;
    let latitude: f64 = lat.trim().parse().context("parsing latitude")?;
    let longitude: f64 = lon.trim().parse().context("parsing longitude")?;
    Ok(Waypoint::new("CurrentPosition", latitude, longitude, 0))
}

/// Route record plus the fitness flag, for printing.
pub fn metrics_json(route: &Route) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(RouteRecord::from(route))?;
    value["fitness_degraded"] = serde_json::Value::Bool(route.fitness_degraded);
    Ok(value)
}
