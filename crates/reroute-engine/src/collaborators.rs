//! Seams to the external services the engine depends on.
//!
//! Implementations are injected at construction; the engine holds them as
//! trait objects and never reaches for globals.

use async_trait::async_trait;
use reroute_core::{Aircraft, ExclusionZone, Point, RerouteError, Result, Route, WeatherSamples};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Produces candidate paths between two points that avoid the given zones.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    async fn generate(
        &self,
        origin: &Point,
        destination: &Point,
        excluded_zones: &[ExclusionZone],
        aircraft: Option<&Aircraft>,
    ) -> anyhow::Result<Vec<Route>>;
}

/// Picks the best of a set of candidate paths.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, candidates: Vec<Route>) -> Option<Route>;
}

/// Resolves an optimizer from a route's optimization method tag.
pub trait OptimizerFactory: Send + Sync {
    fn select(&self, method_tag: &str) -> Option<Arc<dyn Optimizer>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather_for_route(&self, route: &Route) -> anyhow::Result<WeatherSamples>;
}

/// Lowest fitness wins; ties keep the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestFitness;

impl Optimizer for LowestFitness {
    fn optimize(&self, candidates: Vec<Route>) -> Option<Route> {
        candidates.into_iter().reduce(|best, next| {
            if next.fitness_score < best.fitness_score {
                next
            } else {
                best
            }
        })
    }
}

/// Factory backed by a fixed tag → optimizer table, with an optional
/// fallback for unknown or empty tags.
#[derive(Clone, Default)]
pub struct OptimizerRegistry {
    by_tag: HashMap<String, Arc<dyn Optimizer>>,
    fallback: Option<Arc<dyn Optimizer>>,
}

impl OptimizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method_tag: impl Into<String>, optimizer: Arc<dyn Optimizer>) -> Self {
        self.by_tag.insert(method_tag.into(), optimizer);
        self
    }

    pub fn with_fallback(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.fallback = Some(optimizer);
        self
    }
}

impl OptimizerFactory for OptimizerRegistry {
    fn select(&self, method_tag: &str) -> Option<Arc<dyn Optimizer>> {
        self.by_tag
            .get(method_tag)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

/// Await a collaborator call under an optional deadline. Transport errors
/// and timeouts both surface as [`RerouteError::Upstream`].
pub(crate) async fn call_upstream<T>(
    timeout: Option<Duration>,
    service: &str,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T> {
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            tracing::error!(service, timeout_ms = limit.as_millis() as u64, "Upstream call timed out");
            RerouteError::Upstream(format!("{service} timed out after {}ms", limit.as_millis()))
        })?,
        None => call.await,
    };
    outcome.map_err(|e| {
        tracing::error!(service, error = %e, "Upstream call failed");
        RerouteError::Upstream(format!("{service}: {e:#}"))
    })
}
