//! Routing error types
//!
//! Wraps the validation errors from `waypoint-core` and adds the errors
//! raised by the convergence algorithm itself.

use thiserror::Error;
use waypoint_core::{NetworkError, StopError, StopId};

/// Errors raised by routing operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Stop construction failed
    #[error("Stop error: {0}")]
    Stop(#[from] StopError),

    /// Stop container operation failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Entries were pushed to a stop that is not adjacent to the sender
    #[error("Invariant violated: {to} is not adjacent to {from}")]
    InvariantViolation { from: StopId, to: StopId },

    /// A stop was offered as its own neighbour
    #[error("Stop cannot be its own neighbour: {0}")]
    SelfLoop(StopId),

    /// Synchronisation hit the configured pass limit
    #[error("Network did not converge within {passes} passes")]
    ConvergenceLimit { passes: u32 },
}

impl RoutingError {
    /// Shorthand for an unknown stop
    pub fn unknown(stop: &StopId) -> Self {
        Self::Network(NetworkError::UnknownStop(stop.clone()))
    }
}

/// Result type for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;
