//! Core traits for Waypoint
//!
//! [`StopGraph`] is the seam between the routing layer and whatever holds
//! the stops. Routing code only needs to know which stops exist, how far
//! apart two of them are, and who is adjacent to whom.

use crate::identity::StopId;

/// Abstraction over the stop graph
///
/// Implementations must report adjacencies in ascending [`StopId`] order
/// so that traversal and synchronisation are deterministic.
pub trait StopGraph {
    /// Check whether a stop is part of the graph
    fn contains(&self, stop: &StopId) -> bool;

    /// Get the metric distance between two stops
    ///
    /// Returns `None` if either stop is unknown.
    fn distance(&self, a: &StopId, b: &StopId) -> Option<u32>;

    /// Record a bidirectional edge between two stops
    ///
    /// Registering an edge that already exists is a no-op. Returns `false`
    /// if either stop is unknown.
    fn add_adjacency(&mut self, a: &StopId, b: &StopId) -> bool;

    /// Get the stops adjacent to `stop`, in ascending order
    fn adjacencies(&self, stop: &StopId) -> Vec<StopId>;

    /// Check whether two stops share an edge
    fn are_adjacent(&self, a: &StopId, b: &StopId) -> bool {
        self.adjacencies(a).iter().any(|n| n == b)
    }
}
