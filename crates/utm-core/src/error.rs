//! Error types for the UTM core.

use thiserror::Error;

/// Errors raised while building geometry from request input.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Failure reported by an airspace store.
#[derive(Debug, Error)]
#[error("airspace store query failed: {message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that prevent a flight decision from being computed.
///
/// A rejected flight is not an error; these mean the flight could not be evaluated.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] StoreError),
}

impl From<GeometryError> for DecisionError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InvalidGeometry(detail) => DecisionError::InvalidInput(detail),
        }
    }
}
