//! Process-wide store of live routes.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reroute_core::Route;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Route id → route. Each route sits behind its own async mutex so a
/// read-modify-write on one id never blocks work on another.
#[derive(Default)]
pub struct RouteRegistry {
    routes: DashMap<Uuid, Arc<Mutex<Route>>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a route under its own id. An existing entry is replaced in
    /// place under its lock, so an in-flight read-modify-write on that id
    /// finishes before the new contents land.
    pub async fn register(&self, route: Route) -> Uuid {
        let id = route.id;
        let existing = match self.routes.entry(id) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(route)));
                tracing::debug!(route_id = %id, "Registered route");
                return id;
            }
        };

        *existing.lock().await = route;
        tracing::debug!(route_id = %id, "Replaced registered route");
        id
    }

    /// Snapshot of the stored route.
    pub async fn get(&self, id: Uuid) -> Option<Route> {
        let entry = self.entry(id)?;
        let route = entry.lock().await;
        Some(route.clone())
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.routes.contains_key(&id)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.routes.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn route_ids(&self) -> Vec<Uuid> {
        self.routes.iter().map(|r| *r.key()).collect()
    }

    /// Lock a route for exclusive read-modify-write. The map shard is
    /// released before awaiting the route lock.
    pub(crate) async fn lock(&self, id: Uuid) -> Option<RouteLease> {
        let entry = self.entry(id)?;
        let guard = Arc::clone(&entry).lock_owned().await;
        Some(RouteLease { entry, guard })
    }

    /// True while `lease` still guards the entry stored under `id`.
    pub(crate) fn holds(&self, id: Uuid, lease: &RouteLease) -> bool {
        self.routes
            .get(&id)
            .is_some_and(|r| Arc::ptr_eq(r.value(), &lease.entry))
    }

    fn entry(&self, id: Uuid) -> Option<Arc<Mutex<Route>>> {
        self.routes.get(&id).map(|r| Arc::clone(r.value()))
    }
}

/// Exclusive hold on one registry entry.
pub(crate) struct RouteLease {
    entry: Arc<Mutex<Route>>,
    pub(crate) guard: OwnedMutexGuard<Route>,
}
