//! Engine configuration from environment.

use std::env;
use std::time::Duration;

const DEFAULT_ALTERNATIVE_TYPES: [&str; 5] = ["left", "right", "north", "south", "wide"];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Exclusion radius around a blocked waypoint for bypass generation (km)
    pub bypass_radius_km: f64,
    /// Exclusion radius used when generating whole alternatives (km)
    pub alternative_radius_km: f64,
    /// Applied to every generator and weather call; `None` waits forever
    pub upstream_timeout: Option<Duration>,
    /// Path types to keep when generating alternatives
    pub alternative_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bypass_radius_km: 20.0,
            alternative_radius_km: 100.0,
            upstream_timeout: None,
            alternative_types: DEFAULT_ALTERNATIVE_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bypass_radius_km: env::var("REROUTE_BYPASS_RADIUS_KM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bypass_radius_km),
            alternative_radius_km: env::var("REROUTE_ALTERNATIVE_RADIUS_KM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.alternative_radius_km),
            upstream_timeout: env::var("REROUTE_UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis),
            alternative_types: env::var("REROUTE_ALTERNATIVE_TYPES")
                .ok()
                .map(|s| parse_types(&s))
                .filter(|types| !types.is_empty())
                .unwrap_or(defaults.alternative_types),
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = Some(timeout);
        self
    }
}

fn parse_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
