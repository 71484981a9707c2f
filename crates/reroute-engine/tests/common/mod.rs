//! In-process fakes for the engine's collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use reroute_core::{
    Aircraft, Airport, ExclusionZone, Point, Route, WeatherSample, WeatherSamples, Waypoint,
};
use reroute_engine::{CandidateGenerator, WeatherProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn airport(code: &str, lat: f64, lon: f64) -> Airport {
    Airport::new(code, code, lat, lon)
}

/// R1: A(0,0) → B(4,0) over WP1..WP3 on the equator.
pub fn r1() -> Route {
    let waypoints = (1..=3)
        .map(|i| Waypoint::new(format!("WP{i}"), i as f64, 0.0, i))
        .collect();
    Route::new(
        "R1",
        Some(airport("AAA", 0.0, 0.0)),
        Some(airport("BBB", 4.0, 0.0)),
        waypoints,
        "direct",
    )
    .with_optimization_method("ppo")
}

/// Five-point alternative of `path_type`, offset east by `lon`.
pub fn alternative(path_type: &str, lon: f64) -> Route {
    let waypoints = (1..=5)
        .map(|i| Waypoint::new(format!("WP{i}_{path_type}"), i as f64 * 0.7, lon, i))
        .collect();
    Route::new(
        format!("R1_{path_type}"),
        Some(airport("AAA", 0.0, 0.0)),
        Some(airport("BBB", 4.0, 0.0)),
        waypoints,
        path_type,
    )
}

pub fn jet() -> Aircraft {
    Aircraft {
        model: "A320".into(),
        cruise_speed_kmh: 900.0,
        fuel_burn_kg_per_hr: 2_500.0,
        fuel_capacity_kg: 20_000.0,
    }
}

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub origin: Point,
    pub destination: Point,
    pub zones: Vec<ExclusionZone>,
}

/// Returns a three-point bypass (origin, offset midpoint, destination) for
/// every request, plus any extra canned routes.
#[derive(Default)]
pub struct BypassGenerator {
    pub extra: Vec<Route>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<GenerateCall>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl BypassGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn with_routes(extra: Vec<Route>) -> Self {
        Self {
            extra,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CandidateGenerator for BypassGenerator {
    async fn generate(
        &self,
        origin: &Point,
        destination: &Point,
        excluded_zones: &[ExclusionZone],
        _aircraft: Option<&Aircraft>,
    ) -> anyhow::Result<Vec<Route>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(GenerateCall {
            origin: origin.clone(),
            destination: destination.clone(),
            zones: excluded_zones.to_vec(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if !self.extra.is_empty() {
            return Ok(self.extra.clone());
        }

        let mid_lat = (origin.latitude + destination.latitude) / 2.0;
        let mid_lon = (origin.longitude + destination.longitude) / 2.0 + 0.3;
        let waypoints = vec![
            Waypoint::new("BYPASS_START", origin.latitude, origin.longitude, 1),
            Waypoint::new("BYPASS_MID", mid_lat, mid_lon, 2),
            Waypoint::new("BYPASS_END", destination.latitude, destination.longitude, 3),
        ];
        Ok(vec![Route::new("bypass", None, None, waypoints, "left")])
    }
}

pub struct EmptyGenerator;

#[async_trait]
impl CandidateGenerator for EmptyGenerator {
    async fn generate(
        &self,
        _origin: &Point,
        _destination: &Point,
        _excluded_zones: &[ExclusionZone],
        _aircraft: Option<&Aircraft>,
    ) -> anyhow::Result<Vec<Route>> {
        Ok(Vec::new())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl CandidateGenerator for FailingGenerator {
    async fn generate(
        &self,
        _origin: &Point,
        _destination: &Point,
        _excluded_zones: &[ExclusionZone],
        _aircraft: Option<&Aircraft>,
    ) -> anyhow::Result<Vec<Route>> {
        anyhow::bail!("connection refused")
    }
}

/// Two calm samples for any route.
#[derive(Default)]
pub struct CalmWeather {
    pub calls: AtomicUsize,
}

#[async_trait]
impl WeatherProvider for CalmWeather {
    async fn weather_for_route(&self, _route: &Route) -> anyhow::Result<WeatherSamples> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut samples = WeatherSamples::new();
        for key in ["waypoint_0", "waypoint_1"] {
            samples.insert(
                key.to_string(),
                WeatherSample {
                    wind_speed_10m: Some(0.0),
                    wind_direction_10m: Some(0.0),
                    visibility: Some(10_000.0),
                    ..WeatherSample::default()
                },
            );
        }
        Ok(samples)
    }
}
