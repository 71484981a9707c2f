//! Core data models for routes, waypoints, aircraft and weather.

use crate::spatial::{haversine_km, Located};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path type of the baseline route; never selectable as a reroute.
pub const DIRECT_PATH_TYPE: &str = "direct";

/// Method tag written on routes produced by the heuristic rerouter.
/// Kept as "ppo" for compatibility with existing consumers.
pub const HEURISTIC_METHOD_TAG: &str = "ppo";

/// Generic located point handed to external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Synthetic point standing in for the aircraft's current position.
    pub fn current_position(latitude: f64, longitude: f64) -> Self {
        let tag = Uuid::new_v4().simple().to_string();
        Self::new(format!("TMP{}", &tag[..4].to_uppercase()), "Current Position", latitude, longitude)
    }
}

impl Located for Point {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Airport reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    #[serde(alias = "iata_code")]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Airport {
    pub fn new(code: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            city: String::new(),
            country: String::new(),
            latitude,
            longitude,
        }
    }

    pub fn to_point(&self) -> Point {
        Point::new(&self.code, &self.name, self.latitude, self.longitude)
    }
}

impl Located for Airport {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Lifecycle state of a waypoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointState {
    /// Not reached yet
    #[default]
    Pending,
    /// The aircraft is flying toward / holding at this waypoint
    Active,
    Passed,
    /// Unusable; terminal
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 1-based position within the route
    #[serde(default)]
    pub order: u32,
    #[serde(default, alias = "status")]
    pub state: WaypointState,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            latitude,
            longitude,
            order,
            state: WaypointState::Pending,
        }
    }

    /// Copy a located point into a fresh pending waypoint.
    pub fn at<L: Located + ?Sized>(location: &L, name: impl Into<String>, order: u32) -> Self {
        Self::new(name, location.latitude(), location.longitude(), order)
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.id.to_string(), &self.name, self.latitude, self.longitude)
    }

    pub fn mark_blocked(&mut self) {
        self.state = WaypointState::Blocked;
    }

    pub fn is_blocked(&self) -> bool {
        self.state == WaypointState::Blocked
    }
}

impl Located for Waypoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Aircraft performance figures supplied by the reference-data lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub model: String,
    pub cruise_speed_kmh: f64,
    pub fuel_burn_kg_per_hr: f64,
    pub fuel_capacity_kg: f64,
}

/// Weather observation for one leg or point of a route.
///
/// Every field is optional; accessors return the neutral value used by the
/// cost model when a field is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Surface wind speed (m/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_10m: Option<f64>,
    /// Direction the surface wind blows from (degrees)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction_10m: Option<f64>,
    /// Older providers report the surface wind under these keys. Only read
    /// when the 10 m value is missing.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "wind_speed")]
    pub legacy_wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "wind_direction")]
    pub legacy_wind_direction: Option<f64>,
    /// Vertical air velocity at 250 hPa (m/s), turbulence proxy
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "vertical_velocity_250hPa"
    )]
    pub vertical_velocity_250hpa: Option<f64>,
    /// Total cloud cover (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    /// High cloud cover (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover_high: Option<f64>,
    /// Visibility (m)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showers: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowfall: Option<f64>,
    /// Coarse WMO weather code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_code: Option<f64>,
    /// Convective available potential energy (J/kg)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cape: Option<f64>,
    /// Jet stream speed at 250 hPa (km/h)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "jet_stream_speed_250hPa"
    )]
    pub jet_stream_speed_250hpa: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "jet_stream_direction_250hPa"
    )]
    pub jet_stream_direction_250hpa: Option<f64>,
}

impl WeatherSample {
    /// Surface wind (speed, direction) when both are reported.
    pub fn surface_wind(&self) -> Option<(f64, f64)> {
        Some((self.reported_wind_speed()?, self.reported_wind_direction()?))
    }

    pub fn wind_speed(&self) -> f64 {
        self.reported_wind_speed().unwrap_or(0.0)
    }

    pub fn wind_direction(&self) -> f64 {
        self.reported_wind_direction().unwrap_or(0.0)
    }

    fn reported_wind_speed(&self) -> Option<f64> {
        self.wind_speed_10m.or(self.legacy_wind_speed)
    }

    fn reported_wind_direction(&self) -> Option<f64> {
        self.wind_direction_10m.or(self.legacy_wind_direction)
    }

    pub fn vertical_velocity(&self) -> f64 {
        self.vertical_velocity_250hpa.unwrap_or(0.0)
    }

    pub fn cloud_cover(&self) -> f64 {
        self.cloud_cover.unwrap_or(0.0)
    }

    pub fn cloud_cover_high(&self) -> f64 {
        self.cloud_cover_high.unwrap_or(0.0)
    }

    pub fn visibility(&self) -> f64 {
        self.visibility.unwrap_or(10_000.0)
    }

    pub fn weather_code(&self) -> f64 {
        self.weather_code.unwrap_or(0.0)
    }

    pub fn cape(&self) -> f64 {
        self.cape.unwrap_or(0.0)
    }

    pub fn jet_stream(&self) -> (f64, f64) {
        (
            self.jet_stream_speed_250hpa.unwrap_or(0.0),
            self.jet_stream_direction_250hpa.unwrap_or(0.0),
        )
    }

    /// Precipitation heavy enough to degrade runway conditions.
    pub fn runway_hazard(&self) -> bool {
        self.precipitation.unwrap_or(0.0) > 10.0
            || self.rain.unwrap_or(0.0) > 5.0
            || self.showers.unwrap_or(0.0) > 5.0
            || self.snowfall.unwrap_or(0.0) > 1.0
    }
}

/// Weather samples keyed by a stable per-point key, in insertion order.
pub type WeatherSamples = IndexMap<String, WeatherSample>;

/// Key of the sample describing the leg that starts at waypoint `index`.
pub fn leg_weather_key(index: usize) -> String {
    format!("waypoint_{index}")
}

/// Circular no-go region handed to the candidate generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

impl ExclusionZone {
    pub fn around<L: Located + ?Sized>(center: &L, radius_km: f64) -> Self {
        Self {
            center_lat: center.latitude(),
            center_lon: center.longitude(),
            radius_km,
        }
    }

    pub fn contains<L: Located + ?Sized>(&self, point: &L) -> bool {
        haversine_km(self.center_lat, self.center_lon, point.latitude(), point.longitude())
            <= self.radius_km
    }
}

/// One entry of a route's reroute audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerouteRecord {
    pub blocked_waypoint: String,
    pub path_type: String,
}

impl RerouteRecord {
    pub fn new(blocked_waypoint: impl Into<String>, path_type: impl Into<String>) -> Self {
        Self {
            blocked_waypoint: blocked_waypoint.into(),
            path_type: path_type.into(),
        }
    }
}

/// A flight route between two airports.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub origin: Option<Airport>,
    pub destination: Option<Airport>,
    pub waypoints: Vec<Waypoint>,
    /// Geometric strategy tag ("direct", "left", "rerouted_wide", ...)
    pub path_type: String,
    pub optimization_method: String,
    pub distance_km: f64,
    pub leg_distances: Vec<f64>,
    /// Hours per leg; empty until computed with an aircraft
    pub leg_times: Vec<f64>,
    pub fuel_consumption_kg: f64,
    pub estimated_time_hours: Option<f64>,
    /// Lower is better
    pub fitness_score: f64,
    /// Set when fitness fell back to distance only
    pub fitness_degraded: bool,
    pub weather: WeatherSamples,
    pub reroute_history: Vec<RerouteRecord>,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        origin: Option<Airport>,
        destination: Option<Airport>,
        waypoints: Vec<Waypoint>,
        path_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            origin,
            destination,
            waypoints,
            path_type: path_type.into(),
            optimization_method: String::new(),
            distance_km: 0.0,
            leg_distances: Vec::new(),
            leg_times: Vec::new(),
            fuel_consumption_kg: 0.0,
            estimated_time_hours: None,
            fitness_score: 0.0,
            fitness_degraded: false,
            weather: WeatherSamples::new(),
            reroute_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_optimization_method(mut self, method: impl Into<String>) -> Self {
        self.optimization_method = method.into();
        self
    }

    pub fn with_weather(mut self, weather: WeatherSamples) -> Self {
        self.weather = weather;
        self
    }

    pub fn waypoint_index(&self, id: Uuid) -> Option<usize> {
        self.waypoints.iter().position(|wp| wp.id == id)
    }

    /// The waypoint currently being flown to, if any.
    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints
            .iter()
            .find(|wp| wp.state == WaypointState::Active)
    }

    /// Make `index` the single ACTIVE waypoint.
    ///
    /// Any other ACTIVE waypoint is demoted: to PASSED when it lies before
    /// `index`, to PENDING otherwise. Blocked waypoints cannot be activated.
    pub fn activate_waypoint(&mut self, index: usize) -> bool {
        match self.waypoints.get(index) {
            Some(wp) if !wp.is_blocked() => {}
            _ => return false,
        }

        for (i, wp) in self.waypoints.iter_mut().enumerate() {
            if i == index {
                wp.state = WaypointState::Active;
            } else if wp.state == WaypointState::Active {
                wp.state = if i < index {
                    WaypointState::Passed
                } else {
                    WaypointState::Pending
                };
            }
        }
        true
    }

    /// True when every waypoint's order equals its 1-based position.
    pub fn orders_contiguous(&self) -> bool {
        self.waypoints
            .iter()
            .enumerate()
            .all(|(i, wp)| wp.order as usize == i + 1)
    }

    /// True when the route ends at its declared destination.
    pub fn ends_at_destination(&self) -> bool {
        let Some(destination) = &self.destination else {
            return true;
        };
        match self.waypoints.last() {
            Some(last) => last.same_coordinates(destination),
            None => true,
        }
    }
}
