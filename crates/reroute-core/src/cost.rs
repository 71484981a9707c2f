//! Route cost model: distance, leg timing, fuel burn and composite fitness.
//!
//! Everything here is synchronous and infallible. Missing inputs degrade to
//! documented defaults instead of erroring.

use crate::models::{
    leg_weather_key, Aircraft, Airport, Route, WeatherSample, WeatherSamples, Waypoint,
};
use crate::rules::ScoringWeights;
use crate::spatial::{haversine_km, planar_heading_deg, Located};

/// Fixed takeoff + landing allowance in hours.
pub const TAKEOFF_LANDING_HOURS: f64 = 0.5;

/// Cruise speed assumed when no aircraft is bound (km/h).
pub const DEFAULT_CRUISE_SPEED_KMH: f64 = 900.0;

/// Final multiplier on fuel burn. Not derived from physics: it calibrates the
/// estimate to the reference planner's figures and should be revisited
/// against real-world burn data.
pub const FUEL_CALIBRATION_FACTOR: f64 = 0.5;

const DEFAULT_FUEL_BURN_KG_PER_HR: f64 = 3_000.0;
const DEFAULT_FUEL_CAPACITY_KG: f64 = 70_000.0;

const HEADWIND_FUEL_PER_UNIT: f64 = 0.02;
const TAILWIND_FUEL_PER_UNIT: f64 = 0.015;
const MIN_LEG_WIND_FACTOR: f64 = 0.5;
const MIN_WIND_FACTOR: f64 = 0.3;
// Placeholders until altitude/temperature corrections exist.
const ALTITUDE_FACTOR: f64 = 1.0;
const TEMPERATURE_FACTOR: f64 = 1.0;

const MS_TO_KMH: f64 = 3.6;

const MIN_WEATHER_SAMPLES: usize = 2;
const BASE_AIRSPEED_KMH: f64 = 900.0;
const FUEL_NORMALIZATION_KG: f64 = 10_000.0;
const LONG_ROUTE_THRESHOLD_KM: f64 = 5_000.0;

type Coords = (f64, f64);

/// Leg endpoints: origin→wp0, consecutive waypoints, wpN→destination.
/// Without waypoints the route is a single origin→destination leg.
fn leg_points(route: &Route) -> Vec<(Coords, Coords)> {
    let origin = route.origin.as_ref().map(Located::coords);
    let destination = route.destination.as_ref().map(Located::coords);

    let mut legs = Vec::with_capacity(route.waypoints.len() + 1);
    if route.waypoints.is_empty() {
        if let (Some(o), Some(d)) = (origin, destination) {
            legs.push((o, d));
        }
        return legs;
    }

    if let (Some(o), Some(first)) = (origin, route.waypoints.first()) {
        legs.push((o, first.coords()));
    }
    for pair in route.waypoints.windows(2) {
        legs.push((pair[0].coords(), pair[1].coords()));
    }
    if let (Some(last), Some(d)) = (route.waypoints.last(), destination) {
        legs.push((last.coords(), d));
    }
    legs
}

fn leg_distance(leg: &(Coords, Coords)) -> f64 {
    let ((lat1, lon1), (lat2, lon2)) = *leg;
    haversine_km(lat1, lon1, lat2, lon2)
}

/// Recompute per-leg distances and the total (km). Stale leg times that no
/// longer line up with the legs are dropped.
pub fn total_distance(route: &mut Route) -> f64 {
    let legs: Vec<f64> = leg_points(route).iter().map(leg_distance).collect();
    route.distance_km = legs.iter().sum();
    if route.leg_times.len() != legs.len() {
        route.leg_times.clear();
    }
    route.leg_distances = legs;
    route.distance_km
}

/// Per-leg flight time in hours, with the takeoff/landing allowance split
/// between the first and last leg. Empty without a usable cruise speed.
pub fn leg_times(route: &mut Route, aircraft: Option<&Aircraft>) -> Vec<f64> {
    let Some(speed) = aircraft
        .map(|a| a.cruise_speed_kmh)
        .filter(|speed| *speed > 0.0)
    else {
        route.leg_times.clear();
        return Vec::new();
    };

    let distances: Vec<f64> = leg_points(route).iter().map(leg_distance).collect();
    let mut times: Vec<f64> = distances.iter().map(|d| d / speed).collect();
    if let Some(first) = times.first_mut() {
        *first += TAKEOFF_LANDING_HOURS / 2.0;
    }
    if let Some(last) = times.last_mut() {
        *last += TAKEOFF_LANDING_HOURS / 2.0;
    }

    route.distance_km = distances.iter().sum();
    route.leg_distances = distances;
    route.leg_times = times.clone();
    times
}

/// Mean of the bearings between consecutive waypoints, in degrees.
pub fn average_bearing(route: &Route) -> f64 {
    if route.waypoints.len() < 2 {
        return 0.0;
    }
    let bearings: Vec<f64> = route
        .waypoints
        .windows(2)
        .map(|pair| pair[0].bearing_deg_to(&pair[1]))
        .collect();
    bearings.iter().sum::<f64>() / bearings.len() as f64
}

/// Estimated block time in hours, adjusted for the mean surface wind along
/// the route. Returns `None` without a usable aircraft or before the
/// distance is known; the stored value is only overwritten on success.
pub fn estimated_time(route: &mut Route, aircraft: Option<&Aircraft>) -> Option<f64> {
    let speed = aircraft
        .map(|a| a.cruise_speed_kmh)
        .filter(|speed| *speed > 0.0)?;
    if route.distance_km <= 0.0 {
        return None;
    }

    let mut hours = route.distance_km / speed + TAKEOFF_LANDING_HOURS;

    if !route.weather.is_empty() {
        let bearing = average_bearing(route);
        let effects: Vec<f64> = route
            .weather
            .values()
            .filter_map(WeatherSample::surface_wind)
            .map(|(wind_speed, wind_direction)| {
                // Positive helps, negative slows.
                if (wind_direction - bearing).abs() <= 90.0 {
                    wind_speed * MS_TO_KMH
                } else {
                    -wind_speed * MS_TO_KMH
                }
            })
            .collect();

        if !effects.is_empty() {
            let avg_effect = effects.iter().sum::<f64>() / effects.len() as f64;
            let effective_speed = speed + avg_effect;
            if effective_speed > 0.0 {
                hours = route.distance_km / effective_speed + TAKEOFF_LANDING_HOURS;
            }
        }
    }

    route.estimated_time_hours = Some(hours);
    Some(hours)
}

/// Estimated time assuming the default cruise speed.
pub fn default_estimated_time(distance_km: f64) -> f64 {
    distance_km / DEFAULT_CRUISE_SPEED_KMH + TAKEOFF_LANDING_HOURS
}

/// Fuel multiplier for a single leg given the wind and the leg bearing.
fn leg_wind_factor(wind_speed: f64, wind_direction: f64, bearing: f64) -> f64 {
    let angle = ((wind_direction - bearing + 180.0).rem_euclid(360.0) - 180.0).abs();
    if angle <= 90.0 {
        let headwind = wind_speed * angle.to_radians().cos();
        1.0 + HEADWIND_FUEL_PER_UNIT * headwind
    } else {
        let tailwind = wind_speed * (angle - 180.0).to_radians().cos();
        (1.0 - TAILWIND_FUEL_PER_UNIT * tailwind).max(MIN_LEG_WIND_FACTOR)
    }
}

/// Overall wind factor: per-leg factors blended into a running average with
/// weight 1/(legs) per update, floored at 0.3.
pub fn wind_factor(waypoints: &[Waypoint], weather: &WeatherSamples) -> f64 {
    let mut factor = 1.0;
    let segments = waypoints.len().saturating_sub(1);
    if segments > 0 {
        let proportion = 1.0 / segments as f64;
        for (i, pair) in waypoints.windows(2).enumerate() {
            let Some(sample) = weather.get(&leg_weather_key(i)) else {
                continue;
            };
            let bearing = pair[0].bearing_deg_to(&pair[1]);
            let leg = leg_wind_factor(sample.wind_speed(), sample.wind_direction(), bearing);
            factor = factor * (1.0 - proportion) + leg * proportion;
        }
    }
    factor.max(MIN_WIND_FACTOR)
}

/// Estimated fuel burn in kg for the route's current distance and weather.
/// Stores and returns the value; zero without a usable cruise speed.
pub fn fuel_consumption(route: &mut Route, aircraft: &Aircraft) -> f64 {
    if aircraft.cruise_speed_kmh <= 0.0 {
        route.fuel_consumption_kg = 0.0;
        return 0.0;
    }

    let flight_hours = route.distance_km / aircraft.cruise_speed_kmh;
    let base_fuel_kg = flight_hours * aircraft.fuel_burn_kg_per_hr;
    let wind = wind_factor(&route.waypoints, &route.weather);

    let fuel_kg =
        base_fuel_kg * wind * ALTITUDE_FACTOR * TEMPERATURE_FACTOR * FUEL_CALIBRATION_FACTOR;
    route.fuel_consumption_kg = fuel_kg;
    fuel_kg
}

/// Individual weather safety penalties feeding the fitness score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SafetyBreakdown {
    pub turbulence: f64,
    pub thunderstorm: f64,
    pub visibility: f64,
    pub cloud_cover: f64,
    pub runway: f64,
    pub crosswind: f64,
    pub hazard_code: f64,
}

impl SafetyBreakdown {
    pub fn total(&self) -> f64 {
        self.turbulence
            + self.thunderstorm
            + self.visibility
            + self.cloud_cover
            + self.runway
            + self.crosswind
            + self.hazard_code
    }
}

/// Safety penalties for a sample sequence. Route-wide penalties use every
/// sample; endpoint penalties use the first and last sample.
pub fn safety_breakdown(samples: &[&WeatherSample], heading_deg: f64) -> SafetyBreakdown {
    let (Some(source), Some(dest)) = (samples.first(), samples.last()) else {
        return SafetyBreakdown::default();
    };
    let n = samples.len() as f64;

    let turbulent = samples
        .iter()
        .filter(|s| s.vertical_velocity().abs() > 0.5)
        .count() as f64;
    let stormy = samples
        .iter()
        .filter(|s| s.cape() > 1000.0 || s.cloud_cover_high() > 80.0)
        .count() as f64;

    let endpoints = [*source, *dest];

    SafetyBreakdown {
        turbulence: turbulent / n * 2.0,
        thunderstorm: stormy / n * 3.0,
        visibility: if endpoints.iter().any(|s| s.visibility() < 5000.0) {
            1.0
        } else {
            0.0
        },
        cloud_cover: if endpoints.iter().any(|s| s.cloud_cover() > 80.0) {
            0.5
        } else {
            0.0
        },
        runway: count_endpoints(&endpoints, |s| s.runway_hazard()) * 0.75,
        crosswind: count_endpoints(&endpoints, |s| {
            let angle = (heading_deg - s.wind_direction()).abs().to_radians();
            s.wind_speed() * angle.sin() > 20.0
        }) * 0.5,
        hazard_code: count_endpoints(&endpoints, |s| s.weather_code() > 50.0) * 0.3,
    }
}

fn count_endpoints(endpoints: &[&WeatherSample], hit: impl Fn(&WeatherSample) -> bool) -> f64 {
    endpoints.iter().filter(|&&s| hit(s)).count() as f64
}

/// Origin→destination heading used for jet-stream and crosswind projection.
fn flight_heading(route: &Route) -> f64 {
    match (&route.origin, &route.destination) {
        (Some(o), Some(d)) => planar_heading_deg(o.latitude, o.longitude, d.latitude, d.longitude),
        _ => 0.0,
    }
}

/// Ground speed from projecting the jet stream onto the heading, floored at
/// half the base airspeed.
fn ground_speed_kmh(sample: &WeatherSample, heading_deg: f64) -> f64 {
    let (jet_speed, jet_direction) = sample.jet_stream();
    let component = jet_speed * (heading_deg - jet_direction).abs().to_radians().cos();
    (BASE_AIRSPEED_KMH + component).max(BASE_AIRSPEED_KMH * 0.5)
}

/// Composite fitness with the default weights. Lower is better.
pub fn fitness(route: &mut Route, aircraft: Option<&Aircraft>) -> f64 {
    fitness_with_weights(route, aircraft, &ScoringWeights::default())
}

/// Composite fitness: weather safety, normalized fuel burn, fuel shortage
/// and a long-route surcharge. Falls back to distance/1000 with fewer than
/// two weather samples and flags the route as degraded.
pub fn fitness_with_weights(
    route: &mut Route,
    aircraft: Option<&Aircraft>,
    weights: &ScoringWeights,
) -> f64 {
    if route.distance_km <= 0.0 {
        total_distance(route);
    }

    if route.weather.len() < MIN_WEATHER_SAMPLES {
        tracing::warn!(
            route_id = %route.id,
            samples = route.weather.len(),
            "Insufficient weather data, using distance-only fitness"
        );
        route.fitness_degraded = true;
        route.fitness_score = route.distance_km / 1000.0;
        return route.fitness_score;
    }

    let samples: Vec<&WeatherSample> = route.weather.values().collect();
    let heading = flight_heading(route);

    let mean_ground_speed = samples
        .iter()
        .map(|s| ground_speed_kmh(s, heading))
        .sum::<f64>()
        / samples.len() as f64;
    let flight_time_hours = route.distance_km / mean_ground_speed;

    let (burn_rate, capacity) = aircraft
        .map(|a| (a.fuel_burn_kg_per_hr, a.fuel_capacity_kg))
        .unwrap_or((DEFAULT_FUEL_BURN_KG_PER_HR, DEFAULT_FUEL_CAPACITY_KG));
    let fuel_kg = burn_rate * flight_time_hours;

    let shortage_penalty = if capacity > 0.0 && fuel_kg > capacity {
        (fuel_kg - capacity) / capacity * 10.0
    } else {
        0.0
    };

    let safety = safety_breakdown(&samples, heading);

    let mut score = weights.weather_weight * safety.total()
        + weights.distance_weight * (fuel_kg / FUEL_NORMALIZATION_KG)
        + shortage_penalty;
    if route.distance_km > LONG_ROUTE_THRESHOLD_KM {
        score += (route.distance_km - LONG_ROUTE_THRESHOLD_KM) / 1000.0;
    }

    tracing::debug!(
        route_id = %route.id,
        safety = safety.total(),
        fuel_kg,
        score,
        "Computed route fitness"
    );

    route.fitness_degraded = false;
    route.fitness_score = score;
    score
}

/// Recompute every derived metric from scratch.
///
/// Distance, legs and fitness always; fuel, leg times and estimated time
/// with an aircraft. Without one the estimated time assumes the default
/// cruise speed.
pub fn recompute_metrics(route: &mut Route, aircraft: Option<&Aircraft>, weights: &ScoringWeights) {
    total_distance(route);
    leg_times(route, aircraft);
    fitness_with_weights(route, aircraft, weights);

    match aircraft {
        Some(aircraft) => {
            fuel_consumption(route, aircraft);
            if estimated_time(route, Some(aircraft)).is_none() {
                route.estimated_time_hours = Some(default_estimated_time(route.distance_km));
            }
        }
        None => {
            route.estimated_time_hours = Some(default_estimated_time(route.distance_km));
        }
    }
}

/// Leg endpoints of a hypothetical reroute applied after waypoint `pivot`.
fn reroute_legs(
    route: &Route,
    pivot: usize,
    alt_waypoints: &[Waypoint],
    new_destination: &Airport,
) -> Vec<(Coords, Coords)> {
    let Some(pivot_wp) = route.waypoints.get(pivot) else {
        return Vec::new();
    };

    let mut legs = Vec::new();
    if let (Some(origin), Some(first)) = (&route.origin, route.waypoints.first()) {
        legs.push((origin.coords(), first.coords()));
    }
    for pair in route.waypoints[..=pivot].windows(2) {
        legs.push((pair[0].coords(), pair[1].coords()));
    }
    match (alt_waypoints.first(), alt_waypoints.last()) {
        (Some(first), Some(last)) => {
            legs.push((pivot_wp.coords(), first.coords()));
            for pair in alt_waypoints.windows(2) {
                legs.push((pair[0].coords(), pair[1].coords()));
            }
            legs.push((last.coords(), new_destination.coords()));
        }
        _ => legs.push((pivot_wp.coords(), new_destination.coords())),
    }
    legs
}

/// Distance (km) the route would have if it left its waypoint list after
/// `pivot` and flew `alt_waypoints` to `new_destination`. Does not mutate.
pub fn distance_after_reroute(
    route: &Route,
    pivot: usize,
    alt_waypoints: &[Waypoint],
    new_destination: &Airport,
) -> f64 {
    reroute_legs(route, pivot, alt_waypoints, new_destination)
        .iter()
        .map(leg_distance)
        .sum()
}

/// Block time (hours) of the same hypothetical reroute, with the
/// takeoff/landing allowance split across first and last leg.
pub fn time_after_reroute(
    route: &Route,
    pivot: usize,
    alt_waypoints: &[Waypoint],
    new_destination: &Airport,
    aircraft: Option<&Aircraft>,
) -> f64 {
    let Some(speed) = aircraft
        .map(|a| a.cruise_speed_kmh)
        .filter(|speed| *speed > 0.0)
    else {
        return 0.0;
    };
    let legs = reroute_legs(route, pivot, alt_waypoints, new_destination);
    if legs.is_empty() {
        return 0.0;
    }
    legs.iter().map(|leg| leg_distance(leg) / speed).sum::<f64>() + TAKEOFF_LANDING_HOURS
}
