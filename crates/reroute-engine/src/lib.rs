//! Live rerouting service: route registry, blocked-waypoint handling and
//! whole-path rerouting over injected collaborators.

pub mod collaborators;
pub mod config;
pub mod handler;
pub mod registry;
pub mod rerouter;

pub use collaborators::{
    CandidateGenerator, LowestFitness, Optimizer, OptimizerFactory, OptimizerRegistry,
    WeatherProvider,
};
pub use config::EngineConfig;
pub use handler::BlockedWaypointHandler;
pub use registry::RouteRegistry;
pub use rerouter::{HeuristicRerouter, RerouteDetails, RerouteReport, RerouteRequest};
