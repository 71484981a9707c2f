//! Bypass a single blocked waypoint on a live route.

use crate::collaborators::{call_upstream, CandidateGenerator, OptimizerFactory};
use crate::config::EngineConfig;
use crate::registry::RouteRegistry;
use reroute_core::{
    recompute_metrics, Aircraft, Airport, ExclusionZone, Located, Point, RerouteError, Result,
    Route, ScoringWeights, Waypoint, WaypointSequenceBuilder,
};
use std::sync::Arc;
use uuid::Uuid;

/// Replaces a blocked waypoint with a generated bypass segment while keeping
/// the rest of the route. Reroute history is left untouched.
pub struct BlockedWaypointHandler {
    registry: Arc<RouteRegistry>,
    generator: Arc<dyn CandidateGenerator>,
    optimizers: Arc<dyn OptimizerFactory>,
    config: EngineConfig,
    aircraft: Option<Aircraft>,
    weights: ScoringWeights,
}

impl BlockedWaypointHandler {
    pub fn new(
        registry: Arc<RouteRegistry>,
        generator: Arc<dyn CandidateGenerator>,
        optimizers: Arc<dyn OptimizerFactory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            generator,
            optimizers,
            config,
            aircraft: None,
            weights: ScoringWeights::default(),
        }
    }

    /// Bind an aircraft so fuel, leg times and estimated time are recomputed.
    pub fn with_aircraft(mut self, aircraft: Aircraft) -> Self {
        self.aircraft = Some(aircraft);
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// Mark `waypoint_id` BLOCKED and splice a bypass around it.
    ///
    /// The route's lock is held for the whole operation. All work happens on
    /// a copy; the stored route only changes on success.
    pub async fn handle_blocked_waypoint(&self, route_id: Uuid, waypoint_id: Uuid) -> Result<Route> {
        tracing::info!(%route_id, %waypoint_id, "Handling blocked waypoint");

        let Some(mut lease) = self.registry.lock(route_id).await else {
            tracing::warn!(%route_id, "Route not found");
            return Err(RerouteError::NotFound(format!("route {route_id}")));
        };

        let mut working = (*lease.guard).clone();
        let Some(blocked_index) = working.waypoint_index(waypoint_id) else {
            tracing::warn!(%route_id, %waypoint_id, "Waypoint not found in route");
            return Err(RerouteError::NotFound(format!(
                "waypoint {waypoint_id} in route {route_id}"
            )));
        };
        working.waypoints[blocked_index].mark_blocked();

        let anchor = self.anchor(&mut working, blocked_index)?;
        let rejoin = rejoin_target(&working, blocked_index)?;
        let zones = [ExclusionZone::around(
            &working.waypoints[blocked_index],
            self.config.bypass_radius_km,
        )];

        let candidates = call_upstream(
            self.config.upstream_timeout,
            "candidate generator",
            self.generator
                .generate(&anchor, &rejoin, &zones, self.aircraft.as_ref()),
        )
        .await?;
        tracing::debug!(%route_id, candidates = candidates.len(), "Generated bypass candidates");

        let optimizer = self
            .optimizers
            .select(&working.optimization_method)
            .ok_or_else(|| {
                RerouteError::InvalidInput(format!(
                    "no optimizer for method '{}'",
                    working.optimization_method
                ))
            })?;

        let bypass = optimizer
            .optimize(candidates)
            .filter(|segment| !segment.waypoints.is_empty())
            .ok_or_else(|| {
                tracing::error!(%route_id, "Failed to generate new segment to bypass blocked waypoint");
                RerouteError::RerouteFailed(format!(
                    "no bypass segment around waypoint {waypoint_id}"
                ))
            })?;

        // First and last bypass points are the anchor and the rejoin target.
        let interior: &[Waypoint] = match bypass.waypoints.len() {
            n if n > 2 => &bypass.waypoints[1..n - 1],
            _ => &[],
        };

        let waypoints = WaypointSequenceBuilder::new(&bypass.path_type)
            .retain(&working.waypoints[..blocked_index])
            .append_fresh(interior)
            .retain(&working.waypoints[blocked_index + 1..])
            .build(working.destination.as_ref());
        working.waypoints = waypoints;

        recompute_metrics(&mut working, self.aircraft.as_ref(), &self.weights);

        if !self.registry.holds(route_id, &lease) {
            tracing::warn!(%route_id, "Route removed while rerouting, discarding bypass");
            return Err(RerouteError::NotFound(format!("route {route_id}")));
        }
        *lease.guard = working.clone();
        tracing::info!(
            %route_id,
            waypoints = working.waypoints.len(),
            distance_km = working.distance_km,
            "Committed bypass around blocked waypoint"
        );
        Ok(working)
    }

    /// Previous waypoint (made the single ACTIVE one), else the origin.
    fn anchor(&self, route: &mut Route, blocked_index: usize) -> Result<Point> {
        if blocked_index > 0 {
            let previous = blocked_index - 1;
            if !route.activate_waypoint(previous) {
                tracing::debug!(index = previous, "Anchor waypoint is blocked, keeping its state");
            }
            let wp = &route.waypoints[previous];
            return Ok(Point::current_position(wp.latitude(), wp.longitude()));
        }

        route
            .origin
            .as_ref()
            .map(|origin| Point::current_position(origin.latitude, origin.longitude))
            .ok_or_else(|| {
                RerouteError::InvalidInput("first waypoint blocked on a route without origin".into())
            })
    }
}

/// Next waypoint after the block, else the destination.
fn rejoin_target(route: &Route, blocked_index: usize) -> Result<Point> {
    if let Some(next) = route.waypoints.get(blocked_index + 1) {
        return Ok(next.to_point());
    }
    route
        .destination
        .as_ref()
        .map(Airport::to_point)
        .ok_or_else(|| {
            RerouteError::InvalidInput("last waypoint blocked on a route without destination".into())
        })
}
