//! Serialized form of a route as exchanged with API clients and files.

use crate::cost::total_distance;
use crate::error::{RerouteError, Result};
use crate::models::{Airport, RerouteRecord, Route, WeatherSamples, Waypoint, DIRECT_PATH_TYPE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estimated block time. Written as whole `{hours, minutes}`; on input the
/// parts may be fractional and a bare number of hours is also accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstimatedTime {
    Split {
        #[serde(serialize_with = "whole_units")]
        hours: f64,
        #[serde(default, serialize_with = "whole_units")]
        minutes: f64,
    },
    Hours(f64),
}

impl EstimatedTime {
    pub fn from_hours(hours: f64) -> Self {
        let whole = hours.trunc();
        Self::Split {
            hours: whole,
            minutes: ((hours - whole) * 60.0).trunc(),
        }
    }

    pub fn as_hours(&self) -> f64 {
        match *self {
            Self::Split { hours, minutes } => hours + minutes / 60.0,
            Self::Hours(hours) => hours,
        }
    }
}

fn whole_units<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(value.trunc().max(0.0) as u64)
}

fn default_path_type() -> String {
    DIRECT_PATH_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub origin: Option<Airport>,
    #[serde(default)]
    pub destination: Option<Airport>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default = "default_path_type")]
    pub path_type: String,
    #[serde(default)]
    pub optimization_method: String,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub leg_distances: Vec<f64>,
    #[serde(default)]
    pub leg_times: Vec<f64>,
    #[serde(default)]
    pub fitness_score: f64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reroute_history: Vec<RerouteRecord>,
    /// Fuel burn in kg, 2 decimals
    #[serde(default)]
    pub fuel_consumption: f64,
    #[serde(default)]
    pub estimated_time: Option<EstimatedTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSamples>,
}

impl From<&Route> for RouteRecord {
    fn from(route: &Route) -> Self {
        Self {
            id: route.id,
            name: route.name.clone(),
            origin: route.origin.clone(),
            destination: route.destination.clone(),
            waypoints: route.waypoints.clone(),
            path_type: route.path_type.clone(),
            optimization_method: route.optimization_method.clone(),
            distance_km: route.distance_km,
            leg_distances: route.leg_distances.clone(),
            leg_times: route.leg_times.clone(),
            fitness_score: route.fitness_score,
            created_at: route.created_at,
            reroute_history: route.reroute_history.clone(),
            fuel_consumption: (route.fuel_consumption_kg * 100.0).round() / 100.0,
            estimated_time: route
                .estimated_time_hours
                .filter(|hours| *hours > 0.0)
                .map(EstimatedTime::from_hours),
            weather: (!route.weather.is_empty()).then(|| route.weather.clone()),
        }
    }
}

impl RouteRecord {
    /// Rebuild the in-memory route. Distance and leg distances are always
    /// recomputed from the waypoints; stored leg times are discarded.
    pub fn into_route(self) -> Route {
        let mut route = Route::new(
            self.name,
            self.origin,
            self.destination,
            self.waypoints,
            self.path_type,
        )
        .with_optimization_method(self.optimization_method)
        .with_weather(self.weather.unwrap_or_default());

        route.id = self.id;
        route.created_at = self.created_at;
        route.fitness_score = self.fitness_score;
        route.fuel_consumption_kg = self.fuel_consumption;
        route.reroute_history = self.reroute_history;
        route.estimated_time_hours = self.estimated_time.map(|t| t.as_hours());

        total_distance(&mut route);
        route.leg_times.clear();
        route
    }
}

pub fn route_from_value(value: serde_json::Value) -> Result<Route> {
    let record: RouteRecord = serde_json::from_value(value)
        .map_err(|e| RerouteError::InvalidInput(format!("malformed route record: {e}")))?;
    Ok(record.into_route())
}

pub fn route_from_json(json: &str) -> Result<Route> {
    let record: RouteRecord = serde_json::from_str(json)
        .map_err(|e| RerouteError::InvalidInput(format!("malformed route record: {e}")))?;
    Ok(record.into_route())
}

/// Parse a JSON array of route records.
pub fn routes_from_json(json: &str) -> Result<Vec<Route>> {
    let records: Vec<RouteRecord> = serde_json::from_str(json)
        .map_err(|e| RerouteError::InvalidInput(format!("malformed route list: {e}")))?;
    Ok(records.into_iter().map(RouteRecord::into_route).collect())
}
