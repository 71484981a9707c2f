use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RerouteError {
    /// Unknown route or waypoint id.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Required reroute input missing or unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The evaluator found zero usable alternatives.
    #[error("No alternative route available: {0}")]
    NoAlternative(String),
    /// The bypass generator/optimizer produced nothing usable.
    #[error("Reroute failed: {0}")]
    RerouteFailed(String),
    /// Generator, weather or optimizer transport/internal error, including timeouts.
    #[error("Upstream failure: {0}")]
    Upstream(String),
    /// Reported data does not match the stored route.
    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),
}

impl RerouteError {
    /// "Could not reroute" outcomes the caller's workflow continues past.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoAlternative(_) | Self::RerouteFailed(_))
    }

    /// Fatal to the current request but safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    /// NotFound, or an inconsistency that callers treat the same way.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DataInconsistency(_))
    }
}

pub type Result<T> = std::result::Result<T, RerouteError>;
