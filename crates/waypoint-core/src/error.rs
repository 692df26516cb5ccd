//! Error types for Waypoint

use thiserror::Error;

use crate::identity::StopId;

/// Errors raised while constructing a stop
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StopError {
    #[error("Stop must have a non-empty name")]
    NoName,
}

/// Errors raised by the stop container
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Stop already exists in the network: {0}")]
    DuplicateStop(StopId),

    #[error("Stop not found in the network: {0}")]
    UnknownStop(StopId),
}
