//! Whole-path rerouting onto a ranked alternative.
//!
//! This is the scorer exposed under the "ppo" method tag. It has no learned
//! state: alternatives are ranked by the evaluator and the best one is
//! spliced onto the current route.

use crate::collaborators::{call_upstream, CandidateGenerator, WeatherProvider};
use crate::config::EngineConfig;
use reroute_core::{
    leg_times, prepare_candidates, score_candidates, total_distance, Aircraft, ExclusionZone,
    RerouteContext, RerouteError, Result, Route, RouteRecord, ScoringMode, ScoringWeights,
    Waypoint,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct RerouteRequest {
    pub current_route: Route,
    pub blocked_waypoint: Waypoint,
    /// Defaults to the waypoint before the blocked one
    pub current_position: Option<Waypoint>,
    /// Generated from the route's endpoints when empty
    pub alternatives: Vec<Route>,
}

/// Summary of a completed reroute, in the shape API clients expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerouteDetails {
    pub original_route_id: Uuid,
    pub blocked_waypoint: String,
    pub reroute_starting_point: String,
    pub alternative_route_type: String,
    pub distance_increase_km: f64,
    pub rerouted_segment_distances: Vec<f64>,
    pub rerouted_segment_times: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct RerouteReport {
    pub route: Route,
    pub details: RerouteDetails,
    pub score: f64,
    pub mode: ScoringMode,
}

impl RerouteReport {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "rerouted_route": RouteRecord::from(&self.route),
            "reroute_details": self.details,
        })
    }
}

pub struct HeuristicRerouter {
    config: EngineConfig,
    generator: Option<Arc<dyn CandidateGenerator>>,
    weather: Option<Arc<dyn WeatherProvider>>,
    aircraft: Option<Aircraft>,
    weights: ScoringWeights,
}

impl HeuristicRerouter {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            generator: None,
            weather: None,
            aircraft: None,
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn CandidateGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_aircraft(mut self, aircraft: Aircraft) -> Self {
        self.aircraft = Some(aircraft);
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Weather-aware ranking needs both a weather source and an aircraft.
    pub fn scoring_mode(&self) -> ScoringMode {
        match (&self.weather, &self.aircraft) {
            (Some(_), Some(_)) => ScoringMode::WeatherAware,
            _ => ScoringMode::DistanceOnly,
        }
    }

    pub async fn reroute(&self, request: RerouteRequest) -> Result<RerouteReport> {
        let RerouteRequest {
            mut current_route,
            blocked_waypoint,
            current_position,
            alternatives,
        } = request;

        if current_route.waypoints.is_empty() {
            return Err(RerouteError::InvalidInput(format!(
                "route {} has no waypoints",
                current_route.id
            )));
        }

        tracing::info!(
            route = %current_route.name,
            blocked = %blocked_waypoint.name,
            "Rerouting around blocked waypoint"
        );

        let blocked_index = current_route.waypoint_index(blocked_waypoint.id);
        let current_position = match current_position {
            Some(position) => position,
            None => default_position(&mut current_route, blocked_index)?,
        };

        let alternatives = if alternatives.is_empty() {
            self.generate_alternatives(&current_route, &blocked_waypoint)
                .await?
        } else {
            alternatives
        };

        let original_distance = total_distance(&mut current_route);
        let aircraft = self.aircraft.as_ref();
        let mode = self.scoring_mode();

        let ctx = RerouteContext {
            current_route: &current_route,
            blocked: &blocked_waypoint,
            current_position: &current_position,
            aircraft,
            weights: &self.weights,
        };
        let mut candidates = prepare_candidates(&ctx, &alternatives);

        if let (ScoringMode::WeatherAware, Some(weather)) = (mode, &self.weather) {
            for candidate in candidates.iter_mut().filter(|c| c.needs_weather()) {
                let samples = call_upstream(
                    self.config.upstream_timeout,
                    "weather provider",
                    weather.weather_for_route(&candidate.spliced.route),
                )
                .await?;
                candidate.attach_weather(samples, aircraft, &self.weights);
            }
        }

        let ranked = score_candidates(candidates, mode, aircraft, &self.weights);
        let Some(best) = ranked.into_iter().next() else {
            tracing::warn!(route = %current_route.name, "No valid alternative routes found for rerouting");
            return Err(RerouteError::NoAlternative(format!(
                "no unused alternative around {}",
                blocked_waypoint.name
            )));
        };

        tracing::info!(
            path_type = %best.alternative.path_type,
            target = %best.target_waypoint.name,
            score = best.score,
            fuel_kg = best.fuel_kg,
            weather_risk = best.weather_risk,
            "Selected reroute"
        );

        let mut route = best.spliced.route;
        total_distance(&mut route);
        if aircraft.is_some() {
            leg_times(&mut route, aircraft);
        }

        let details = RerouteDetails {
            original_route_id: current_route.id,
            blocked_waypoint: blocked_waypoint.name.clone(),
            reroute_starting_point: starting_point(&current_route, blocked_index),
            alternative_route_type: route
                .reroute_history
                .last()
                .map(|record| record.path_type.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            distance_increase_km: route.distance_km - original_distance,
            rerouted_segment_distances: route.leg_distances.clone(),
            rerouted_segment_times: route.leg_times.clone(),
        };

        Ok(RerouteReport {
            route,
            details,
            score: best.score,
            mode,
        })
    }

    async fn generate_alternatives(&self, route: &Route, blocked: &Waypoint) -> Result<Vec<Route>> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            RerouteError::InvalidInput("no alternatives supplied and no generator configured".into())
        })?;
        let (Some(origin), Some(destination)) = (&route.origin, &route.destination) else {
            return Err(RerouteError::InvalidInput(format!(
                "route {} needs an origin and destination to generate alternatives",
                route.id
            )));
        };

        let zones = [ExclusionZone::around(blocked, self.config.alternative_radius_km)];
        let generated = call_upstream(
            self.config.upstream_timeout,
            "candidate generator",
            generator.generate(
                &origin.to_point(),
                &destination.to_point(),
                &zones,
                self.aircraft.as_ref(),
            ),
        )
        .await?;

        let allowed = &self.config.alternative_types;
        let alternatives: Vec<Route> = generated
            .into_iter()
            .filter(|alt| allowed.iter().any(|t| *t == alt.path_type))
            .collect();
        tracing::debug!(count = alternatives.len(), "Generated alternative routes");
        Ok(alternatives)
    }
}

/// The waypoint before the blocked one, made ACTIVE.
fn default_position(route: &mut Route, blocked_index: Option<usize>) -> Result<Waypoint> {
    let index = blocked_index.ok_or_else(|| {
        tracing::error!(route = %route.name, "Blocked waypoint not found in current route");
        RerouteError::DataInconsistency(format!(
            "blocked waypoint is not part of route {}",
            route.id
        ))
    })?;
    if index == 0 {
        tracing::warn!("Cannot reroute from origin - first waypoint is blocked");
        return Err(RerouteError::InvalidInput(
            "first waypoint is blocked and no current position was given".into(),
        ));
    }
    route.activate_waypoint(index - 1);
    Ok(route.waypoints[index - 1].clone())
}

fn starting_point(route: &Route, blocked_index: Option<usize>) -> String {
    match blocked_index {
        Some(0) => route
            .origin
            .as_ref()
            .map(|origin| origin.name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        Some(index) => route.waypoints[index - 1].name.clone(),
        None => UNKNOWN.to_string(),
    }
}
