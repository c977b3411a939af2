pub mod geo;
pub mod iata;
pub mod location;
pub mod provider;
pub mod repository;
pub mod search;

pub use iata::LocationCode;
pub use location::{Coordinate, Location, LocationCandidate, LocationKind, MapPoint};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CoreError {
    /// Provider and store outages are worth retrying, bad input is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::UpstreamUnavailable(_) | CoreError::StoreUnavailable(_)
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
