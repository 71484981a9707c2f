//! Ranking of alternative paths around a blocked waypoint.
//!
//! Candidates are prepared synchronously. Weather for candidates that carry
//! none is fetched by the caller and attached with [`Candidate::attach_weather`]
//! before scoring.

use crate::cost::{estimated_time, fitness_with_weights, fuel_consumption};
use crate::models::{Aircraft, Route, WeatherSamples, Waypoint, DIRECT_PATH_TYPE};
use crate::rules::ScoringWeights;
use crate::splice::{nearest_index, splice_reroute, SpliceRequest, SplicedRoute};
use std::cmp::Ordering;
use std::collections::HashSet;

const TURBULENCE_THRESHOLD: f64 = 0.5;
const LOW_VISIBILITY_M: f64 = 5_000.0;
const HEAVY_CLOUD_PCT: f64 = 80.0;

/// Path types that may not be chosen again: every type in the reroute
/// history, the current path type and "direct".
pub fn used_path_types(route: &Route) -> HashSet<String> {
    route
        .reroute_history
        .iter()
        .map(|record| record.path_type.clone())
        .chain([route.path_type.clone(), DIRECT_PATH_TYPE.to_string()])
        .collect()
}

/// Shared inputs for one reroute decision.
#[derive(Debug, Clone, Copy)]
pub struct RerouteContext<'a> {
    pub current_route: &'a Route,
    pub blocked: &'a Waypoint,
    pub current_position: &'a Waypoint,
    pub aircraft: Option<&'a Aircraft>,
    pub weights: &'a ScoringWeights,
}

/// An alternative joined at its waypoint nearest to the current position.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub alternative: &'a Route,
    pub target_index: usize,
    /// Distance (km) from the current position to the join target
    pub distance_km: f64,
    pub spliced: SplicedRoute,
}

impl Candidate<'_> {
    pub fn target_waypoint(&self) -> &Waypoint {
        &self.alternative.waypoints[self.target_index]
    }

    /// True when the spliced route carries no weather samples at all.
    pub fn needs_weather(&self) -> bool {
        self.spliced.route.weather.is_empty()
    }

    pub fn attach_weather(
        &mut self,
        samples: WeatherSamples,
        aircraft: Option<&Aircraft>,
        weights: &ScoringWeights,
    ) {
        let route = &mut self.spliced.route;
        route.weather = samples;
        fitness_with_weights(route, aircraft, weights);
        // Wind now known; keeps the still-air time without an aircraft.
        estimated_time(route, aircraft);
    }
}

/// Filter out used path types and splice every survivor. Alternatives
/// without waypoints are skipped.
pub fn prepare_candidates<'a>(
    ctx: &RerouteContext<'_>,
    alternatives: &'a [Route],
) -> Vec<Candidate<'a>> {
    let used = used_path_types(ctx.current_route);

    alternatives
        .iter()
        .filter(|alt| {
            let fresh = !used.contains(&alt.path_type);
            if !fresh {
                tracing::debug!(path_type = %alt.path_type, "Skipping already used path type");
            }
            fresh
        })
        .filter_map(|alt| {
            let (target_index, distance_km) = nearest_index(&alt.waypoints, ctx.current_position)?;
            let spliced = splice_reroute(&SpliceRequest {
                original: ctx.current_route,
                blocked: ctx.blocked,
                current_position: ctx.current_position,
                alternative: alt,
                target_waypoint: &alt.waypoints[target_index],
                target_index,
                aircraft: ctx.aircraft,
                weights: ctx.weights,
            });
            Some(Candidate {
                alternative: alt,
                target_index,
                distance_km,
                spliced,
            })
        })
        .collect()
}

/// Ad hoc hazard scalar summed over all samples.
pub fn weather_risk(samples: &WeatherSamples) -> f64 {
    samples
        .values()
        .map(|sample| {
            let mut risk = 0.0;
            let vertical = sample.vertical_velocity().abs();
            if vertical > TURBULENCE_THRESHOLD {
                risk += vertical * 2.0;
            }
            let visibility = sample.visibility();
            if visibility < LOW_VISIBILITY_M {
                risk += (LOW_VISIBILITY_M - visibility) / 1000.0;
            }
            let cloud = sample.cloud_cover();
            if cloud > HEAVY_CLOUD_PCT {
                risk += (cloud - HEAVY_CLOUD_PCT) / 5.0;
            }
            risk
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// fitness + fuel and weather risk terms
    WeatherAware,
    /// distance to the join target only
    DistanceOnly,
}

/// One ranked alternative. Lower score is better.
#[derive(Debug, Clone)]
pub struct ScoredAlternative {
    pub alternative: Route,
    pub target_waypoint: Waypoint,
    pub target_index: usize,
    pub distance_km: f64,
    pub score: f64,
    pub fuel_kg: f64,
    pub weather_risk: f64,
    /// The spliced candidate route
    pub spliced: SplicedRoute,
    pub mode: ScoringMode,
}

/// Score candidates and sort ascending. Ties keep input order.
pub fn score_candidates(
    candidates: Vec<Candidate<'_>>,
    mode: ScoringMode,
    aircraft: Option<&Aircraft>,
    weights: &ScoringWeights,
) -> Vec<ScoredAlternative> {
    let mut scored: Vec<ScoredAlternative> = candidates
        .into_iter()
        .map(|candidate| {
            let target_waypoint = candidate.target_waypoint().clone();
            let Candidate {
                alternative,
                target_index,
                distance_km,
                mut spliced,
            } = candidate;

            let (score, fuel_kg, risk) = match mode {
                ScoringMode::WeatherAware => {
                    let fuel_kg = aircraft
                        .map(|a| fuel_consumption(&mut spliced.route, a))
                        .unwrap_or(0.0);
                    let risk = weather_risk(&spliced.route.weather);
                    let score = spliced.route.fitness_score
                        + fuel_kg * weights.fuel_score_weight
                        + risk * weights.weather_risk_weight;
                    (score, fuel_kg, risk)
                }
                ScoringMode::DistanceOnly => (distance_km, 0.0, 0.0),
            };

            tracing::debug!(
                path_type = %alternative.path_type,
                score,
                fuel_kg,
                weather_risk = risk,
                "Scored alternative"
            );

            ScoredAlternative {
                alternative: alternative.clone(),
                target_waypoint,
                target_index,
                distance_km,
                score,
                fuel_kg,
                weather_risk: risk,
                spliced,
                mode,
            }
        })
        .collect();

    scored.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
    scored
}

/// Prepare and score in one step using whatever weather the routes already
/// carry.
pub fn rank_alternatives(
    ctx: &RerouteContext<'_>,
    alternatives: &[Route],
    mode: ScoringMode,
) -> Vec<ScoredAlternative> {
    let candidates = prepare_candidates(ctx, alternatives);
    score_candidates(candidates, mode, ctx.aircraft, ctx.weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Airport, RerouteRecord, WeatherSample};

    fn route(path_type: &str, lon: f64) -> Route {
        let waypoints = (1..=4)
            .map(|i| Waypoint::new(format!("WP{i}_{path_type}"), i as f64, lon, i))
            .collect();
        Route::new(
            "A-B",
            Some(Airport::new("AAA", "A", 0.0, 0.0)),
            Some(Airport::new("BBB", "B", 5.0, 0.0)),
            waypoints,
            path_type,
        )
    }

    fn jet() -> Aircraft {
        Aircraft {
            model: "A320".into(),
            cruise_speed_kmh: 900.0,
            fuel_burn_kg_per_hr: 2_500.0,
            fuel_capacity_kg: 20_000.0,
        }
    }

    #[test]
    fn used_types_cover_history_current_and_direct() {
        let mut current = route("rerouted_left", 0.0);
        current.reroute_history = vec![RerouteRecord::new("WP2", "left")];

        let used = used_path_types(&current);
        assert!(used.contains("left"));
        assert!(used.contains("rerouted_left"));
        assert!(used.contains(DIRECT_PATH_TYPE));
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn same_path_type_yields_no_candidates() {
        let current = route("direct", 0.0);
        let alternatives = vec![route("direct", 0.5)];
        let weights = ScoringWeights::default();
        let ctx = RerouteContext {
            current_route: &current,
            blocked: &current.waypoints[1],
            current_position: &current.waypoints[0],
            aircraft: None,
            weights: &weights,
        };

        assert!(rank_alternatives(&ctx, &alternatives, ScoringMode::DistanceOnly).is_empty());
    }

    #[test]
    fn distance_only_sorts_by_join_distance() {
        let current = route("direct", 0.0);
        let alternatives = vec![route("wide", 2.0), route("left", 0.5), route("right", -1.0)];
        let weights = ScoringWeights::default();
        let ctx = RerouteContext {
            current_route: &current,
            blocked: &current.waypoints[1],
            current_position: &current.waypoints[0],
            aircraft: None,
            weights: &weights,
        };

        let ranked = rank_alternatives(&ctx, &alternatives, ScoringMode::DistanceOnly);
        let types: Vec<_> = ranked.iter().map(|s| s.alternative.path_type.as_str()).collect();
        assert_eq!(types, vec!["left", "right", "wide"]);
        assert_eq!(ranked[0].target_index, 0);
        assert_eq!(ranked[0].score, ranked[0].distance_km);
        assert_eq!(ranked[0].spliced.route.path_type, "rerouted_left");
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let current = route("direct", 0.0);
        let alternatives = vec![route("north", 1.0), route("south", 1.0)];
        let weights = ScoringWeights::default();
        let ctx = RerouteContext {
            current_route: &current,
            blocked: &current.waypoints[1],
            current_position: &current.waypoints[0],
            aircraft: None,
            weights: &weights,
        };

        let ranked = rank_alternatives(&ctx, &alternatives, ScoringMode::DistanceOnly);
        assert_eq!(ranked[0].alternative.path_type, "north");
        assert_eq!(ranked[1].alternative.path_type, "south");
    }

    #[test]
    fn weather_aware_score_combines_fitness_fuel_and_risk() {
        let current = route("direct", 0.0);
        let alternatives = vec![route("left", 0.5)];
        let weights = ScoringWeights::default();
        let aircraft = jet();
        let ctx = RerouteContext {
            current_route: &current,
            blocked: &current.waypoints[1],
            current_position: &current.waypoints[0],
            aircraft: Some(&aircraft),
            weights: &weights,
        };

        let mut candidates = prepare_candidates(&ctx, &alternatives);
        assert!(candidates[0].needs_weather());

        let mut samples = WeatherSamples::new();
        samples.insert(
            "waypoint_0".into(),
            WeatherSample {
                vertical_velocity_250hpa: Some(-1.0),
                visibility: Some(3_000.0),
                cloud_cover: Some(90.0),
                ..WeatherSample::default()
            },
        );
        samples.insert("waypoint_1".into(), WeatherSample::default());
        candidates[0].attach_weather(samples, Some(&aircraft), &weights);
        assert!(!candidates[0].spliced.route.fitness_degraded);

        let ranked = score_candidates(candidates, ScoringMode::WeatherAware, Some(&aircraft), &weights);
        let best = &ranked[0];
        // 2*1.0 + (5000-3000)/1000 + (90-80)/5
        assert!((best.weather_risk - 6.0).abs() < 1e-9);
        assert!(best.fuel_kg > 0.0);
        let expected = best.spliced.route.fitness_score + best.fuel_kg * 0.2 + 6.0 * 0.1;
        assert!((best.score - expected).abs() < 1e-9);
        assert_eq!(best.mode, ScoringMode::WeatherAware);
    }

    #[test]
    fn attached_wind_updates_estimated_time() {
        let current = route("direct", 0.0);
        let alternatives = vec![route("left", 0.5)];
        let weights = ScoringWeights::default();
        let aircraft = jet();
        let ctx = RerouteContext {
            current_route: &current,
            blocked: &current.waypoints[1],
            current_position: &current.waypoints[0],
            aircraft: Some(&aircraft),
            weights: &weights,
        };

        let mut candidates = prepare_candidates(&ctx, &alternatives);
        let still_air = candidates[0].spliced.route.estimated_time_hours.unwrap();
        let bearing = crate::cost::average_bearing(&candidates[0].spliced.route);

        let tailwind = WeatherSample {
            wind_speed_10m: Some(20.0),
            wind_direction_10m: Some(bearing),
            ..WeatherSample::default()
        };
        let mut samples = WeatherSamples::new();
        samples.insert("waypoint_0".into(), tailwind.clone());
        samples.insert("waypoint_1".into(), tailwind);
        candidates[0].attach_weather(samples, Some(&aircraft), &weights);

        let with_wind = candidates[0].spliced.route.estimated_time_hours.unwrap();
        assert!(with_wind < still_air);
    }

    #[test]
    fn empty_weather_has_no_risk() {
        assert_eq!(weather_risk(&WeatherSamples::new()), 0.0);
    }
}
