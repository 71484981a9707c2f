pub mod cost;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod record;
pub mod rules;
pub mod spatial;
pub mod splice;

pub use cost::{
    average_bearing, default_estimated_time, distance_after_reroute, estimated_time, fitness,
    fitness_with_weights, fuel_consumption, leg_times, recompute_metrics, safety_breakdown,
    time_after_reroute, total_distance, wind_factor, SafetyBreakdown, FUEL_CALIBRATION_FACTOR,
};
pub use error::{RerouteError, Result};
pub use evaluator::{
    prepare_candidates, rank_alternatives, score_candidates, used_path_types, weather_risk,
    Candidate, RerouteContext, ScoredAlternative, ScoringMode,
};
pub use models::{
    leg_weather_key, Aircraft, Airport, ExclusionZone, Point, RerouteRecord, Route, Waypoint,
    WaypointState, WeatherSample, WeatherSamples, DIRECT_PATH_TYPE, HEURISTIC_METHOD_TAG,
};
pub use record::{route_from_json, route_from_value, routes_from_json, EstimatedTime, RouteRecord};
pub use rules::ScoringWeights;
pub use spatial::{haversine_km, Located};
pub use splice::{
    resolve_position, splice_reroute, PositionMatch, ResolvedPosition, SpliceMode, SpliceRequest,
    SplicedRoute, WaypointSequenceBuilder,
};
