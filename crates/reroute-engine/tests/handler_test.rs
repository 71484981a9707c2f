//! Blocked-waypoint handling against the live registry.

mod common;

use common::{r1, BypassGenerator, EmptyGenerator, FailingGenerator};
use reroute_core::{RerouteError, Route, WaypointState};
use reroute_engine::{
    BlockedWaypointHandler, EngineConfig, LowestFitness, OptimizerRegistry, RouteRegistry,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn optimizers() -> Arc<OptimizerRegistry> {
    Arc::new(OptimizerRegistry::new().with("ppo", Arc::new(LowestFitness)))
}

fn handler(
    registry: &Arc<RouteRegistry>,
    generator: Arc<dyn reroute_engine::CandidateGenerator>,
    config: EngineConfig,
) -> BlockedWaypointHandler {
    BlockedWaypointHandler::new(registry.clone(), generator, optimizers(), config)
}

async fn setup(route: Route) -> (Arc<RouteRegistry>, Uuid) {
    let registry = Arc::new(RouteRegistry::new());
    let id = registry.register(route).await;
    (registry, id)
}

#[tokio::test]
async fn bypasses_only_the_blocked_waypoint() {
    let route = r1();
    let ids: Vec<Uuid> = route.waypoints.iter().map(|wp| wp.id).collect();
    let (registry, route_id) = setup(route).await;
    let generator = Arc::new(BypassGenerator::new());
    let handler = handler(&registry, generator.clone(), EngineConfig::default());

    let updated = handler.handle_blocked_waypoint(route_id, ids[1]).await.unwrap();

    assert!(updated.waypoint_index(ids[1]).is_none());
    assert_eq!(updated.waypoints[0].id, ids[0]);
    assert_eq!(updated.waypoints[0].state, WaypointState::Active);
    assert_eq!(updated.waypoints[1].name, "WP2_left");
    assert_eq!(updated.waypoints[2].id, ids[2]);
    assert_eq!(updated.waypoints.len(), 4);
    assert!(updated.orders_contiguous());
    assert!(updated.ends_at_destination());
    assert!(updated.reroute_history.is_empty());
    assert_eq!(updated.path_type, "direct");
    assert!(updated.estimated_time_hours.is_some());

    let sum: f64 = updated.leg_distances.iter().sum();
    assert!((updated.distance_km - sum).abs() < 1e-9);

    let stored = registry.get(route_id).await.unwrap();
    assert_eq!(stored, updated);

    let calls = generator.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].origin.name, "Current Position");
    assert_eq!(calls[0].origin.latitude, 1.0);
    assert_eq!(calls[0].destination.id, ids[2].to_string());
    assert_eq!(calls[0].zones[0].radius_km, 20.0);
    assert_eq!(calls[0].zones[0].center_lat, 2.0);
}

#[tokio::test]
async fn first_waypoint_blocked_anchors_at_origin() {
    let route = r1();
    let first = route.waypoints[0].id;
    let (registry, route_id) = setup(route).await;
    let generator = Arc::new(BypassGenerator::new());
    let handler = handler(&registry, generator.clone(), EngineConfig::default());

    let updated = handler.handle_blocked_waypoint(route_id, first).await.unwrap();

    assert!(updated.waypoint_index(first).is_none());
    assert_eq!(updated.waypoints[0].name, "WP1_left");
    assert_eq!(updated.waypoints[1].name, "WP2");
    let calls = generator.calls.lock().unwrap();
    assert_eq!((calls[0].origin.latitude, calls[0].origin.longitude), (0.0, 0.0));
}

#[tokio::test]
async fn unknown_route_and_waypoint_are_not_found() {
    let (registry, route_id) = setup(r1()).await;
    let handler = handler(&registry, Arc::new(BypassGenerator::new()), EngineConfig::default());

    let err = handler
        .handle_blocked_waypoint(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RerouteError::NotFound(_)));

    let err = handler
        .handle_blocked_waypoint(route_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RerouteError::NotFound(_)));
}

#[tokio::test]
async fn failures_leave_the_stored_route_untouched() {
    let route = r1();
    let blocked = route.waypoints[1].id;
    let (registry, route_id) = setup(route.clone()).await;

    let failing = handler(&registry, Arc::new(FailingGenerator), EngineConfig::default());
    let err = failing.handle_blocked_waypoint(route_id, blocked).await.unwrap_err();
    assert!(matches!(err, RerouteError::Upstream(_)));
    assert!(err.is_retryable());
    assert_eq!(registry.get(route_id).await.unwrap(), route);

    let empty = handler(&registry, Arc::new(EmptyGenerator), EngineConfig::default());
    let err = empty.handle_blocked_waypoint(route_id, blocked).await.unwrap_err();
    assert!(matches!(err, RerouteError::RerouteFailed(_)));
    assert!(err.is_recoverable());

    let stored = registry.get(route_id).await.unwrap();
    assert_eq!(stored, route);
    assert!(stored.waypoints.iter().all(|wp| wp.state == WaypointState::Pending));
}

#[tokio::test]
async fn unknown_method_tag_has_no_optimizer() {
    let route = r1().with_optimization_method("genetic");
    let blocked = route.waypoints[1].id;
    let (registry, route_id) = setup(route).await;
    let handler = handler(&registry, Arc::new(BypassGenerator::new()), EngineConfig::default());

    let err = handler.handle_blocked_waypoint(route_id, blocked).await.unwrap_err();
    assert!(matches!(err, RerouteError::InvalidInput(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_generator_times_out_as_upstream_failure() {
    let route = r1();
    let blocked = route.waypoints[1].id;
    let (registry, route_id) = setup(route.clone()).await;
    let config = EngineConfig::default().with_upstream_timeout(Duration::from_millis(50));
    let handler = handler(
        &registry,
        Arc::new(BypassGenerator::with_delay(Duration::from_secs(5))),
        config,
    );

    let err = handler.handle_blocked_waypoint(route_id, blocked).await.unwrap_err();
    assert!(matches!(err, RerouteError::Upstream(ref msg) if msg.contains("timed out")));
    assert_eq!(registry.get(route_id).await.unwrap(), route);
}

#[tokio::test(start_paused = true)]
async fn same_route_calls_serialize() {
    let route = r1();
    let (second, third) = (route.waypoints[1].id, route.waypoints[2].id);
    let (registry, route_id) = setup(route).await;
    let generator = Arc::new(BypassGenerator::with_delay(Duration::from_millis(100)));
    let handler = handler(&registry, generator.clone(), EngineConfig::default());

    let (a, b) = tokio::join!(
        handler.handle_blocked_waypoint(route_id, second),
        handler.handle_blocked_waypoint(route_id, third),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(generator.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(generator.call_count(), 2);

    let stored = registry.get(route_id).await.unwrap();
    assert!(stored.waypoint_index(second).is_none());
    assert!(stored.waypoint_index(third).is_none());
    assert!(stored.orders_contiguous());
    assert!(stored.ends_at_destination());
    assert_eq!(
        stored
            .waypoints
            .iter()
            .filter(|wp| wp.state == WaypointState::Active)
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn re_registering_waits_for_in_flight_bypass() {
    let route = r1();
    let blocked = route.waypoints[1].id;
    let mut renamed = route.clone();
    renamed.name = "R1-amended".into();
    let (registry, route_id) = setup(route).await;
    let generator = Arc::new(BypassGenerator::with_delay(Duration::from_millis(100)));
    let handler = handler(&registry, generator, EngineConfig::default());
    let finished = std::sync::Mutex::new(Vec::new());

    let (bypass, _) = tokio::join!(
        async {
            let result = handler.handle_blocked_waypoint(route_id, blocked).await;
            finished.lock().unwrap().push("bypass");
            result
        },
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.register(renamed.clone()).await;
            finished.lock().unwrap().push("register");
        },
    );
    bypass.unwrap();

    assert_eq!(*finished.lock().unwrap(), vec!["bypass", "register"]);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(route_id).await.unwrap(), renamed);
}

#[tokio::test(start_paused = true)]
async fn removal_during_bypass_discards_the_commit() {
    let route = r1();
    let blocked = route.waypoints[1].id;
    let (registry, route_id) = setup(route).await;
    let generator = Arc::new(BypassGenerator::with_delay(Duration::from_millis(100)));
    let handler = handler(&registry, generator, EngineConfig::default());

    let (bypass, removed) = tokio::join!(
        handler.handle_blocked_waypoint(route_id, blocked),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.remove(route_id)
        },
    );

    assert!(removed);
    assert!(bypass.unwrap_err().is_not_found());
    assert!(registry.get(route_id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn different_routes_run_in_parallel() {
    let first = r1();
    let second = r1();
    let (first_wp, second_wp) = (first.waypoints[1].id, second.waypoints[1].id);

    let registry = Arc::new(RouteRegistry::new());
    let first_id = registry.register(first).await;
    let second_id = registry.register(second).await;
    let generator = Arc::new(BypassGenerator::with_delay(Duration::from_millis(100)));
    let handler = handler(&registry, generator.clone(), EngineConfig::default());

    let (a, b) = tokio::join!(
        handler.handle_blocked_waypoint(first_id, first_wp),
        handler.handle_blocked_waypoint(second_id, second_wp),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(generator.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn bound_aircraft_adds_fuel_and_leg_times() {
    let route = r1();
    let blocked = route.waypoints[1].id;
    let (registry, route_id) = setup(route).await;
    let handler = handler(&registry, Arc::new(BypassGenerator::new()), EngineConfig::default())
        .with_aircraft(common::jet());

    let updated = handler.handle_blocked_waypoint(route_id, blocked).await.unwrap();

    assert!(updated.fuel_consumption_kg > 0.0);
    assert_eq!(updated.leg_times.len(), updated.leg_distances.len());
}
