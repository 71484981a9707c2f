//! Path splicing: merge a retained prefix of the original path with a detour
//! suffix into one renumbered, identity-clean waypoint sequence.

use crate::cost::recompute_metrics;
use crate::models::{
    Aircraft, Airport, RerouteRecord, Route, Waypoint, WaypointState, HEURISTIC_METHOD_TAG,
};
use crate::rules::ScoringWeights;
use crate::spatial::Located;
use uuid::Uuid;

/// Which strategy located the current position in the original path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionMatch {
    /// Same waypoint id
    Identity,
    /// Closest waypoint by great-circle distance
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPosition {
    pub index: usize,
    pub matched_by: PositionMatch,
    /// Great-circle distance between the position and the matched waypoint (km)
    pub offset_km: f64,
}

/// Locate `position` in `waypoints`: by id first, then by nearest
/// coordinates (first encountered wins on ties). `None` only for an empty path.
pub fn resolve_position(waypoints: &[Waypoint], position: &Waypoint) -> Option<ResolvedPosition> {
    if let Some(index) = waypoints.iter().position(|wp| wp.id == position.id) {
        return Some(ResolvedPosition {
            index,
            matched_by: PositionMatch::Identity,
            offset_km: 0.0,
        });
    }

    nearest_index(waypoints, position).map(|(index, offset_km)| ResolvedPosition {
        index,
        matched_by: PositionMatch::Nearest,
        offset_km,
    })
}

/// Index and distance (km) of the waypoint closest to `point`.
pub fn nearest_index<L: Located + ?Sized>(waypoints: &[Waypoint], point: &L) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, wp) in waypoints.iter().enumerate() {
        let distance = point.distance_km_to(wp);
        if best.map_or(true, |(_, min)| distance < min) {
            best = Some((i, distance));
        }
    }
    best
}

/// Builds a waypoint sequence in one pass with contiguous 1-based orders.
///
/// Retained waypoints keep their id, name and state. Fresh waypoints get a
/// new id, a `WP{order}_{tag}` name and PENDING state, so ids copied from an
/// independently tracked route never collide.
#[derive(Debug, Clone)]
pub struct WaypointSequenceBuilder {
    tag: String,
    waypoints: Vec<Waypoint>,
}

impl WaypointSequenceBuilder {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            waypoints: Vec::new(),
        }
    }

    fn next_order(&self) -> u32 {
        self.waypoints.len() as u32 + 1
    }

    pub fn retain<'a>(mut self, waypoints: impl IntoIterator<Item = &'a Waypoint>) -> Self {
        for wp in waypoints {
            let order = self.next_order();
            self.waypoints.push(Waypoint {
                order,
                ..wp.clone()
            });
        }
        self
    }

    pub fn append_fresh<'a>(mut self, waypoints: impl IntoIterator<Item = &'a Waypoint>) -> Self {
        for wp in waypoints {
            let order = self.next_order();
            self.waypoints.push(Waypoint {
                id: Uuid::new_v4(),
                name: format!("WP{}_{}", order, self.tag),
                latitude: wp.latitude,
                longitude: wp.longitude,
                order,
                state: WaypointState::Pending,
            });
        }
        self
    }

    /// Finish the sequence, appending a copy of `destination` when the last
    /// waypoint does not already sit exactly on it.
    pub fn build(mut self, destination: Option<&Airport>) -> Vec<Waypoint> {
        let Some(destination) = destination else {
            return self.waypoints;
        };
        let arrived = self
            .waypoints
            .last()
            .is_some_and(|last| last.same_coordinates(destination));
        if !arrived {
            let order = self.next_order();
            let name = if self.waypoints.is_empty() {
                format!("WP{order}_dest")
            } else {
                format!("WP{}_{}", order, self.tag)
            };
            tracing::debug!(
                destination = %destination.code,
                "Appending destination waypoint to close the sequence"
            );
            self.waypoints.push(Waypoint::at(destination, name, order));
        }
        self.waypoints
    }
}

/// How the splice treated the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceMode {
    /// Upstream of the block: joined the alternative path.
    Detour,
    /// At/past the block or block not in the path: kept the original remainder.
    Continuation,
}

/// Inputs to [`splice_reroute`].
#[derive(Debug, Clone, Copy)]
pub struct SpliceRequest<'a> {
    pub original: &'a Route,
    pub blocked: &'a Waypoint,
    pub current_position: &'a Waypoint,
    pub alternative: &'a Route,
    pub target_waypoint: &'a Waypoint,
    pub target_index: usize,
    pub aircraft: Option<&'a Aircraft>,
    pub weights: &'a ScoringWeights,
}

#[derive(Debug, Clone)]
pub struct SplicedRoute {
    pub route: Route,
    pub mode: SpliceMode,
    pub position: Option<ResolvedPosition>,
}

/// Points skipped past the join waypoint to avoid a redundant short hop.
const JOIN_SKIP: usize = 2;

/// Merge the original path up to the current position with the alternative
/// from just past the join target, producing a brand-new route.
pub fn splice_reroute(request: &SpliceRequest<'_>) -> SplicedRoute {
    let original = request.original;
    let alternative = request.alternative;

    let position = resolve_position(&original.waypoints, request.current_position);
    let blocked_index = original.waypoint_index(request.blocked.id);

    let (prefix, suffix, mode): (&[Waypoint], &[Waypoint], SpliceMode) =
        match (position.map(|p| p.index), blocked_index) {
            (Some(current), Some(blocked)) if current < blocked => {
                let alt = &alternative.waypoints;
                let join = (request.target_index + JOIN_SKIP).min(alt.len().saturating_sub(1));
                (
                    &original.waypoints[..=current],
                    alt.get(join..).unwrap_or_default(),
                    SpliceMode::Detour,
                )
            }
            (Some(current), _) => {
                tracing::warn!(
                    current_index = current,
                    blocked_index = ?blocked_index,
                    "Current position is at or past the blocked waypoint, continuing on current route"
                );
                (
                    &original.waypoints[..=current],
                    &original.waypoints[current + 1..],
                    SpliceMode::Continuation,
                )
            }
            (None, _) => (&[], &original.waypoints[..], SpliceMode::Continuation),
        };

    if let Some(resolved) = position {
        if resolved.matched_by == PositionMatch::Nearest {
            tracing::debug!(
                index = resolved.index,
                offset_km = resolved.offset_km,
                "Current position matched by nearest waypoint"
            );
        }
    }

    let waypoints = WaypointSequenceBuilder::new(&alternative.path_type)
        .retain(prefix)
        .append_fresh(suffix)
        .build(original.destination.as_ref());

    tracing::info!(
        join_target = %request.target_waypoint.name,
        retained = prefix.len(),
        appended = suffix.len(),
        total = waypoints.len(),
        mode = ?mode,
        "Spliced rerouted path"
    );

    let mut route = Route::new(
        format!("Rerouted_{}", original.name),
        original.origin.clone(),
        original.destination.clone(),
        waypoints,
        format!("rerouted_{}", alternative.path_type),
    )
    .with_optimization_method(HEURISTIC_METHOD_TAG);

    route.reroute_history = original.reroute_history.clone();
    route.reroute_history.push(RerouteRecord::new(
        &request.blocked.name,
        &alternative.path_type,
    ));

    route.weather = if original.weather.is_empty() {
        alternative.weather.clone()
    } else {
        original.weather.clone()
    };

    recompute_metrics(&mut route, request.aircraft, request.weights);

    SplicedRoute {
        route,
        mode,
        position,
    }
}
