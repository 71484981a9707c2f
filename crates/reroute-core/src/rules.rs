//! Scoring weights for the cost model and alternative ranking.

use serde::{Deserialize, Serialize};

/// Configuration for route scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the weather safety score in fitness
    pub weather_weight: f64,
    /// Weight of the normalized fuel burn in fitness
    pub distance_weight: f64,
    /// Multiplier applied to candidate fuel (kg) when ranking alternatives
    pub fuel_score_weight: f64,
    /// Multiplier applied to candidate weather risk when ranking alternatives
    pub weather_risk_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            weather_weight: 0.6,
            distance_weight: 0.4,
            fuel_score_weight: 0.2,
            weather_risk_weight: 0.1,
        }
    }
}
